use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::services::catalog_tree::TreeNode;
use crate::types::db::product_type;

/// A product type as exposed by the API
#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct ProductTypeResponse {
    pub id: i64,

    pub label: String,

    /// Null for root types
    pub parent_id: Option<i64>,

    /// Whether products of this type may carry a details payload
    pub has_details: bool,

    pub created_at: i64,

    pub updated_at: i64,
}

impl From<product_type::Model> for ProductTypeResponse {
    fn from(model: product_type::Model) -> Self {
        Self {
            id: model.id,
            label: model.label,
            parent_id: model.parent_id,
            has_details: model.has_details,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// One node of the assembled catalog tree
#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct ProductTypeTreeNode {
    pub id: i64,

    pub label: String,

    pub parent_id: Option<i64>,

    pub has_details: bool,

    pub children: Vec<ProductTypeTreeNode>,
}

impl From<TreeNode> for ProductTypeTreeNode {
    fn from(node: TreeNode) -> Self {
        Self {
            id: node.id,
            label: node.label,
            parent_id: node.parent_id,
            has_details: node.has_details,
            children: node.children.into_iter().map(Into::into).collect(),
        }
    }
}

/// The whole catalog as a forest of root types
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ProductTypeTreeResponse {
    pub types: Vec<ProductTypeTreeNode>,
}

/// Request model for creating a product type
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct CreateProductTypeRequest {
    pub label: String,

    /// Id of the parent type; omit or null for a root type
    pub parent_id: Option<i64>,

    /// Defaults to false when omitted
    pub has_details: Option<bool>,
}

/// Request model for updating a product type; omitted fields are left
/// unchanged
#[derive(Object, Debug, Default, Serialize, Deserialize)]
pub struct UpdateProductTypeRequest {
    pub label: Option<String>,

    /// Sent as a string so "leave unchanged" (omitted) and "promote to
    /// root" (empty string) stay distinguishable; any other value must
    /// parse as a type id
    pub parent_id: Option<String>,

    pub has_details: Option<bool>,
}

/// Outcome of a product type deletion
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct DeleteProductTypeResponse {
    /// Number of products removed by the cascade (0 without force)
    pub deleted_products: u64,
}

/// Number of products referencing a type
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct ProductCountResponse {
    pub type_id: i64,

    pub type_label: String,

    pub product_count: u64,
}
