use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde_json::Value;

use crate::errors::StoreError;
use crate::services::SequenceAllocator;
use crate::stores::{ensure_connected, escape_like};
use crate::types::db::{product, product_type};

#[derive(Clone, Debug, Default)]
pub struct NewProduct {
    pub product_no: String,
    pub cn_name: Option<String>,
    pub product_spec: Option<String>,
    pub price: Option<String>,
    pub type_id: i64,
    pub details: Option<Value>,
}

/// Partial update. `product_no` is required on every update payload.
#[derive(Clone, Debug, Default)]
pub struct ProductUpdate {
    pub product_no: String,
    pub cn_name: Option<String>,
    pub product_spec: Option<String>,
    pub price: Option<String>,
    pub type_id: Option<i64>,
    pub details: Option<Value>,
}

#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    pub type_id: Option<i64>,
    /// Case-insensitive substring over the Chinese name.
    pub cn_name: Option<String>,
}

pub struct ProductPage {
    pub products: Vec<product::Model>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

/// One failed entry of a bulk create.
#[derive(Debug)]
pub struct BulkEntryError {
    pub index: usize,
    pub message: String,
}

/// Bulk creation never fails atomically: successes and per-index failures
/// are reported side by side.
#[derive(Debug)]
pub struct BulkCreateOutcome {
    pub created: Vec<product::Model>,
    pub errors: Vec<BulkEntryError>,
}

#[derive(Debug)]
pub struct BulkDeleteOutcome {
    pub deleted_count: u64,
    pub requested_count: usize,
}

pub struct ProductStore {
    db: DatabaseConnection,
    sequences: Arc<SequenceAllocator>,
}

impl ProductStore {
    pub fn new(db: DatabaseConnection, sequences: Arc<SequenceAllocator>) -> Self {
        Self { db, sequences }
    }

    /// Create one product. `details` is persisted only when the referenced
    /// type carries `has_details`; otherwise it is nulled without error.
    pub async fn create(&self, input: NewProduct) -> Result<product::Model, StoreError> {
        ensure_connected(&self.db).await?;

        let product_no = validate_product_no(&input.product_no)?;
        let product_type = self.find_type(input.type_id).await?;

        let reservation = self.sequences.reserve_product_ids().await?;
        let model = active_model(
            reservation.id(),
            product_no,
            &input,
            product_type.has_details,
        )
        .insert(&self.db)
        .await
        .map_err(|e| StoreError::database("create_product", e))?;
        drop(reservation);

        tracing::info!(product_id = model.id, "product created");
        Ok(model)
    }

    /// Create a batch of products in input order.
    ///
    /// The max id is read once up front and entry N takes id max+1+N, so
    /// ids within the batch cannot collide. A failing entry is recorded
    /// with its index and does not abort the rest.
    pub async fn bulk_create(&self, inputs: Vec<NewProduct>) -> Result<BulkCreateOutcome, StoreError> {
        ensure_connected(&self.db).await?;
        if inputs.is_empty() {
            return Err(StoreError::validation("a non-empty product list is required"));
        }

        let reservation = self.sequences.reserve_product_ids().await?;
        let mut created = Vec::new();
        let mut errors = Vec::new();

        for (index, input) in inputs.into_iter().enumerate() {
            let result = async {
                let product_no = validate_product_no(&input.product_no)?;
                let product_type = self.find_type(input.type_id).await?;
                active_model(
                    reservation.id_at(index),
                    product_no,
                    &input,
                    product_type.has_details,
                )
                .insert(&self.db)
                .await
                .map_err(|e| StoreError::database("bulk_create_product", e))
            }
            .await;

            match result {
                Ok(model) => created.push(model),
                Err(err) => errors.push(BulkEntryError {
                    index,
                    message: err.to_string(),
                }),
            }
        }
        drop(reservation);

        tracing::info!(
            created = created.len(),
            failed = errors.len(),
            "bulk product creation finished"
        );
        Ok(BulkCreateOutcome { created, errors })
    }

    pub async fn list(
        &self,
        filter: ProductFilter,
        page: u64,
        page_size: u64,
    ) -> Result<ProductPage, StoreError> {
        ensure_connected(&self.db).await?;

        let mut query = product::Entity::find();
        if let Some(type_id) = filter.type_id {
            query = query.filter(product::Column::TypeId.eq(type_id));
        }
        if let Some(term) = filter.cn_name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(term));
            query = query.filter(product::Column::CnName.like(LikeExpr::new(&pattern).escape('\\')));
        }

        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);

        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(|e| StoreError::database("count_products", e))?;

        let products = query
            .order_by_desc(product::Column::Id)
            .offset((page - 1) * page_size)
            .limit(page_size)
            .all(&self.db)
            .await
            .map_err(|e| StoreError::database("list_products", e))?;

        Ok(ProductPage {
            products,
            total,
            page,
            page_size,
            total_pages: total.div_ceil(page_size),
        })
    }

    /// Dual-mode lookup: a numeric identifier is a product id, anything
    /// else is a catalog number.
    pub async fn get(&self, identifier: &str) -> Result<product::Model, StoreError> {
        ensure_connected(&self.db).await?;

        let found = match identifier.trim().parse::<i64>() {
            Ok(id) => product::Entity::find_by_id(id)
                .one(&self.db)
                .await
                .map_err(|e| StoreError::database("find_product", e))?,
            Err(_) => product::Entity::find()
                .filter(product::Column::ProductNo.eq(identifier.trim()))
                .one(&self.db)
                .await
                .map_err(|e| StoreError::database("find_product_by_no", e))?,
        };
        found.ok_or_else(|| StoreError::not_found("product not found"))
    }

    pub async fn update(&self, id: i64, update: ProductUpdate) -> Result<product::Model, StoreError> {
        ensure_connected(&self.db).await?;

        let current = product::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| StoreError::database("find_product", e))?
            .ok_or_else(|| StoreError::not_found("product not found"))?;

        let product_no = validate_product_no(&update.product_no)?;
        let current_type_id = current.type_id;

        let mut active: product::ActiveModel = current.into();
        active.product_no = Set(product_no);

        match update.type_id {
            Some(type_id) => {
                let new_type = self.find_type(type_id).await?;
                active.type_id = Set(type_id);
                if new_type.has_details {
                    // The new type accepts details; adopt them when given.
                    if update.details.is_some() {
                        active.details = Set(update.details.clone());
                    }
                } else {
                    active.details = Set(None);
                }
            }
            None => {
                if update.details.is_some() {
                    // Details-only change: allowed only when the current
                    // type accepts details.
                    let current_type = self.find_type(current_type_id).await?;
                    if !current_type.has_details {
                        return Err(StoreError::validation(
                            "the product's type does not support details",
                        ));
                    }
                    active.details = Set(update.details.clone());
                }
            }
        }

        if let Some(cn_name) = update.cn_name {
            active.cn_name = Set(Some(cn_name));
        }
        if let Some(product_spec) = update.product_spec {
            active.product_spec = Set(Some(product_spec));
        }
        if let Some(price) = update.price {
            active.price = Set(Some(price.trim().to_string()));
        }

        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| StoreError::database("update_product", e))?;
        tracing::info!(product_id = updated.id, "product updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<product::Model, StoreError> {
        ensure_connected(&self.db).await?;

        let existing = product::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| StoreError::database("find_product", e))?
            .ok_or_else(|| StoreError::not_found("product not found"))?;

        product::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| StoreError::database("delete_product", e))?;
        tracing::info!(product_id = id, "product deleted");
        Ok(existing)
    }

    /// Delete a batch by id. Ids that match nothing are skipped; the
    /// outcome reports how many rows actually went away.
    pub async fn bulk_delete(&self, ids: Vec<i64>) -> Result<BulkDeleteOutcome, StoreError> {
        ensure_connected(&self.db).await?;
        if ids.is_empty() {
            return Err(StoreError::validation("a non-empty id list is required"));
        }

        let requested_count = ids.len();
        let result = product::Entity::delete_many()
            .filter(product::Column::Id.is_in(ids))
            .exec(&self.db)
            .await
            .map_err(|e| StoreError::database("bulk_delete_products", e))?;

        tracing::info!(
            deleted = result.rows_affected,
            requested = requested_count,
            "bulk product deletion finished"
        );
        Ok(BulkDeleteOutcome {
            deleted_count: result.rows_affected,
            requested_count,
        })
    }

    async fn find_type(&self, type_id: i64) -> Result<product_type::Model, StoreError> {
        product_type::Entity::find_by_id(type_id)
            .one(&self.db)
            .await
            .map_err(|e| StoreError::database("find_product_type", e))?
            .ok_or_else(|| StoreError::not_found("product type not found"))
    }
}

fn active_model(
    id: i64,
    product_no: String,
    input: &NewProduct,
    type_has_details: bool,
) -> product::ActiveModel {
    product::ActiveModel {
        id: Set(id),
        product_no: Set(product_no),
        cn_name: Set(input.cn_name.clone()),
        product_spec: Set(input.product_spec.clone()),
        // Preserved verbatim apart from trimming; tiered formats like
        // "50UL|1300,100UL|2300" pass through untouched.
        price: Set(input.price.as_deref().map(|p| p.trim().to_string())),
        type_id: Set(input.type_id),
        details: Set(if type_has_details {
            input.details.clone()
        } else {
            None
        }),
        created_at: Set(Utc::now().timestamp()),
    }
}

fn validate_product_no(raw: &str) -> Result<String, StoreError> {
    let product_no = raw.trim();
    if product_no.is_empty() {
        return Err(StoreError::validation("productNo is required"));
    }
    Ok(product_no.to_string())
}
