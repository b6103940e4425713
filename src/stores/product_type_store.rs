use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::errors::StoreError;
use crate::services::catalog_tree::{self, TreeNode, TypeNode};
use crate::services::SequenceAllocator;
use crate::stores::ensure_connected;
use crate::types::db::{product, product_type};

pub struct NewProductType {
    pub label: String,
    pub parent_id: Option<i64>,
    pub has_details: bool,
}

/// Partial update. The outer `Option` on `parent_id` distinguishes "leave
/// the parent alone" from "set it"; `Some(None)` promotes the node to a
/// root.
#[derive(Default)]
pub struct ProductTypeUpdate {
    pub label: Option<String>,
    pub parent_id: Option<Option<i64>>,
    pub has_details: Option<bool>,
}

/// Result of a delete, reporting how many products went with the type.
#[derive(Debug)]
pub struct DeleteOutcome {
    pub deleted_products: u64,
}

/// Product type CRUD plus the assembled catalog tree.
pub struct ProductTypeStore {
    db: DatabaseConnection,
    sequences: Arc<SequenceAllocator>,
}

impl ProductTypeStore {
    pub fn new(db: DatabaseConnection, sequences: Arc<SequenceAllocator>) -> Self {
        Self { db, sequences }
    }

    /// All product types as a forest, nodes in id-ascending input order.
    pub async fn get_tree(&self) -> Result<Vec<TreeNode>, StoreError> {
        ensure_connected(&self.db).await?;

        let types = product_type::Entity::find()
            .order_by_asc(product_type::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| StoreError::database("list_product_types", e))?;

        let nodes = types
            .into_iter()
            .map(|t| TypeNode {
                id: t.id,
                label: t.label,
                parent_id: t.parent_id,
                has_details: t.has_details,
            })
            .collect();
        Ok(catalog_tree::build_tree(nodes))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<product_type::Model, StoreError> {
        ensure_connected(&self.db).await?;
        self.find_required(id).await
    }

    pub async fn create(&self, input: NewProductType) -> Result<product_type::Model, StoreError> {
        ensure_connected(&self.db).await?;

        let label = validate_label(&input.label)?;
        if let Some(parent_id) = input.parent_id {
            self.ensure_parent_exists(parent_id).await?;
        }

        let now = Utc::now().timestamp();
        let reservation = self.sequences.reserve_product_type_id().await?;
        let model = product_type::ActiveModel {
            id: Set(reservation.id()),
            label: Set(label),
            parent_id: Set(input.parent_id),
            has_details: Set(input.has_details),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| StoreError::database("create_product_type", e))?;
        drop(reservation);

        tracing::info!(type_id = model.id, "product type created");
        Ok(model)
    }

    pub async fn update(
        &self,
        id: i64,
        update: ProductTypeUpdate,
    ) -> Result<product_type::Model, StoreError> {
        ensure_connected(&self.db).await?;

        let current = self.find_required(id).await?;

        let label = update.label.as_deref().map(validate_label).transpose()?;
        if let Some(Some(parent_id)) = update.parent_id {
            if parent_id == id {
                return Err(StoreError::validation(
                    "a product type cannot be its own parent",
                ));
            }
            self.ensure_parent_exists(parent_id).await?;
            self.ensure_acyclic(id, parent_id).await?;
        }

        let mut active: product_type::ActiveModel = current.into();
        if let Some(label) = label {
            active.label = Set(label);
        }
        if let Some(parent_id) = update.parent_id {
            // Some(None) promotes the node to a root.
            active.parent_id = Set(parent_id);
        }
        if let Some(has_details) = update.has_details {
            active.has_details = Set(has_details);
        }
        active.updated_at = Set(Utc::now().timestamp());

        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| StoreError::database("update_product_type", e))?;
        tracing::info!(type_id = updated.id, "product type updated");
        Ok(updated)
    }

    /// Delete a type. When products still reference it the call fails with
    /// a Conflict carrying the product count, unless `force` is set, in
    /// which case the products are deleted with the type in one
    /// transaction.
    pub async fn delete(&self, id: i64, force: bool) -> Result<DeleteOutcome, StoreError> {
        ensure_connected(&self.db).await?;

        self.find_required(id).await?;
        let product_count = self.count_products(id).await?;

        if product_count > 0 && !force {
            return Err(StoreError::conflict_with_count(
                "type has dependent products",
                product_count,
            ));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| StoreError::database("delete_product_type", e))?;
        product::Entity::delete_many()
            .filter(product::Column::TypeId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| StoreError::database("delete_products_of_type", e))?;
        product_type::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| StoreError::database("delete_product_type", e))?;
        txn.commit()
            .await
            .map_err(|e| StoreError::database("delete_product_type", e))?;

        tracing::info!(
            type_id = id,
            deleted_products = product_count,
            "product type deleted"
        );
        Ok(DeleteOutcome {
            deleted_products: product_count,
        })
    }

    /// Number of products referencing the type.
    pub async fn get_product_count(&self, id: i64) -> Result<u64, StoreError> {
        ensure_connected(&self.db).await?;
        self.find_required(id).await?;
        self.count_products(id).await
    }

    async fn count_products(&self, type_id: i64) -> Result<u64, StoreError> {
        product::Entity::find()
            .filter(product::Column::TypeId.eq(type_id))
            .count(&self.db)
            .await
            .map_err(|e| StoreError::database("count_products_of_type", e))
    }

    async fn find_required(&self, id: i64) -> Result<product_type::Model, StoreError> {
        product_type::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| StoreError::database("find_product_type", e))?
            .ok_or_else(|| StoreError::not_found("product type not found"))
    }

    async fn ensure_parent_exists(&self, parent_id: i64) -> Result<(), StoreError> {
        product_type::Entity::find_by_id(parent_id)
            .one(&self.db)
            .await
            .map_err(|e| StoreError::database("find_parent_type", e))?
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("parent product type not found"))
    }

    /// Walk the ancestor chain upward from `new_parent`; if it reaches
    /// `id`, the reassignment would close a cycle. The visited set stops
    /// the walk on pre-existing cycles in stored data.
    async fn ensure_acyclic(&self, id: i64, new_parent: i64) -> Result<(), StoreError> {
        let mut visited: HashSet<i64> = HashSet::new();
        let mut cursor = Some(new_parent);
        while let Some(ancestor) = cursor {
            if ancestor == id {
                return Err(StoreError::validation(
                    "parent reassignment would create a cycle",
                ));
            }
            if !visited.insert(ancestor) {
                break;
            }
            cursor = product_type::Entity::find_by_id(ancestor)
                .one(&self.db)
                .await
                .map_err(|e| StoreError::database("walk_type_ancestors", e))?
                .and_then(|t| t.parent_id);
        }
        Ok(())
    }
}

fn validate_label(raw: &str) -> Result<String, StoreError> {
    let label = raw.trim();
    if label.is_empty() {
        return Err(StoreError::validation("label must not be empty"));
    }
    Ok(label.to_string())
}
