use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use tokio::sync::{Mutex, MutexGuard};

use crate::errors::StoreError;
use crate::types::db::{product, product_type, user};

/// Allocates legacy-compatible integer ids: current max + 1, starting at 1.
///
/// The read-max-then-increment scheme is inherently racy across writers,
/// so each entity has its own async mutex and the guard is handed back to
/// the caller inside the reservation. Holding the reservation across the
/// insert serializes allocation within this process; cross-process
/// collisions are still possible and accepted (legacy numeric-id
/// compatibility).
pub struct SequenceAllocator {
    db: DatabaseConnection,
    users: Mutex<()>,
    product_types: Mutex<()>,
    products: Mutex<()>,
}

/// A reserved id (or the first id of a reserved block). Dropping it
/// releases the per-entity allocation lock, so keep it alive until the
/// corresponding insert has completed.
pub struct IdReservation<'a> {
    id: i64,
    _guard: MutexGuard<'a, ()>,
}

impl IdReservation<'_> {
    pub fn id(&self) -> i64 {
        self.id
    }

    /// The id at `position` within a reserved block (position 0 = `id()`).
    pub fn id_at(&self, position: usize) -> i64 {
        self.id + position as i64
    }
}

impl SequenceAllocator {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            users: Mutex::new(()),
            product_types: Mutex::new(()),
            products: Mutex::new(()),
        }
    }

    pub async fn reserve_user_id(&self) -> Result<IdReservation<'_>, StoreError> {
        let guard = self.users.lock().await;
        let last = user::Entity::find()
            .order_by_desc(user::Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| StoreError::database("allocate_user_id", e))?;
        Ok(IdReservation {
            id: last.map(|u| u.id).unwrap_or(0) + 1,
            _guard: guard,
        })
    }

    pub async fn reserve_product_type_id(&self) -> Result<IdReservation<'_>, StoreError> {
        let guard = self.product_types.lock().await;
        let last = product_type::Entity::find()
            .order_by_desc(product_type::Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| StoreError::database("allocate_product_type_id", e))?;
        Ok(IdReservation {
            id: last.map(|t| t.id).unwrap_or(0) + 1,
            _guard: guard,
        })
    }

    /// Reserve the next product id. For bulk creation the same reservation
    /// covers the whole batch: position N takes `id_at(N)`, with a single
    /// max-id read up front rather than one per entry.
    pub async fn reserve_product_ids(&self) -> Result<IdReservation<'_>, StoreError> {
        let guard = self.products.lock().await;
        let last = product::Entity::find()
            .order_by_desc(product::Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| StoreError::database("allocate_product_id", e))?;
        Ok(IdReservation {
            id: last.map(|p| p.id).unwrap_or(0) + 1,
            _guard: guard,
        })
    }
}
