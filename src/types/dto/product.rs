use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::db::product;

/// A product as exposed by the API
#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: i64,

    /// Catalog number
    pub product_no: String,

    pub cn_name: Option<String>,

    pub product_spec: Option<String>,

    /// Verbatim price string, including tiered formats
    pub price: Option<String>,

    pub type_id: i64,

    /// Arbitrary payload; null unless the type carries has_details
    pub details: Option<Value>,

    pub created_at: i64,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            product_no: model.product_no,
            cn_name: model.cn_name,
            product_spec: model.product_spec,
            price: model.price,
            type_id: model.type_id,
            details: model.details,
            created_at: model.created_at,
        }
    }
}

/// Request model for creating a product
#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    /// Catalog number, required
    pub product_no: String,

    pub cn_name: Option<String>,

    pub product_spec: Option<String>,

    /// String or number on the wire; stored as its trimmed string form
    pub price: Option<Value>,

    pub type_id: i64,

    /// Ignored (nulled) when the type has has_details = false
    pub details: Option<Value>,
}

/// Request model for updating a product
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    /// Required on every update
    pub product_no: String,

    pub cn_name: Option<String>,

    pub product_spec: Option<String>,

    /// String or number on the wire; stored as its trimmed string form
    pub price: Option<Value>,

    pub type_id: Option<i64>,

    pub details: Option<Value>,
}

/// One page of the product listing
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,

    pub total: u64,

    pub page: u64,

    pub page_size: u64,

    pub total_pages: u64,
}

/// Request model for bulk product creation
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct BulkCreateProductsRequest {
    pub products: Vec<CreateProductRequest>,
}

/// One failed entry of a bulk creation
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct BulkEntryErrorResponse {
    /// Zero-based position in the submitted list
    pub index: u64,

    pub message: String,
}

/// Outcome of a bulk creation; partial success is expected
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct BulkCreateProductsResponse {
    pub products: Vec<ProductResponse>,

    pub errors: Vec<BulkEntryErrorResponse>,
}

/// Request model for bulk product deletion
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct BulkDeleteProductsRequest {
    pub ids: Vec<i64>,
}

/// Outcome of a bulk deletion
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct BulkDeleteProductsResponse {
    pub deleted_count: u64,

    pub requested_count: u64,
}
