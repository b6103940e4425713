use std::sync::Arc;

use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    OpenApi, Tags,
};

use crate::api::{authenticate, require_catalog_admin, BearerAuth};
use crate::app_data::AppData;
use crate::errors::ApiError;
use crate::services::TokenService;
use crate::stores::product_type_store::{NewProductType, ProductTypeStore, ProductTypeUpdate};
use crate::types::dto::product_type::{
    CreateProductTypeRequest, DeleteProductTypeResponse, ProductCountResponse,
    ProductTypeResponse, ProductTypeTreeResponse, UpdateProductTypeRequest,
};

/// Product type (catalog tree) API endpoints
pub struct ProductTypeApi {
    store: Arc<ProductTypeStore>,
    tokens: Arc<TokenService>,
}

impl ProductTypeApi {
    pub fn new(app_data: &AppData) -> Self {
        Self {
            store: Arc::clone(&app_data.product_type_store),
            tokens: Arc::clone(&app_data.tokens),
        }
    }
}

#[derive(Tags)]
enum TypeTags {
    /// Product type endpoints
    ProductTypes,
}

#[OpenApi(prefix_path = "/types")]
impl ProductTypeApi {
    /// Get the whole catalog as a tree (public)
    #[oai(path = "/", method = "get", tag = "TypeTags::ProductTypes")]
    async fn get_tree(&self) -> Result<Json<ProductTypeTreeResponse>, ApiError> {
        let forest = self.store.get_tree().await?;
        Ok(Json(ProductTypeTreeResponse {
            types: forest.into_iter().map(Into::into).collect(),
        }))
    }

    /// Get a single product type by id (public)
    #[oai(path = "/:id", method = "get", tag = "TypeTags::ProductTypes")]
    async fn get_type(&self, id: Path<i64>) -> Result<Json<ProductTypeResponse>, ApiError> {
        let model = self.store.get_by_id(id.0).await?;
        Ok(Json(model.into()))
    }

    /// Number of products referencing a type
    #[oai(path = "/:id/product-count", method = "get", tag = "TypeTags::ProductTypes")]
    async fn product_count(
        &self,
        auth: BearerAuth,
        id: Path<i64>,
    ) -> Result<Json<ProductCountResponse>, ApiError> {
        let claims = authenticate(&self.tokens, &auth)?;
        require_catalog_admin(&claims)?;

        let model = self.store.get_by_id(id.0).await?;
        let count = self.store.get_product_count(id.0).await?;
        Ok(Json(ProductCountResponse {
            type_id: model.id,
            type_label: model.label,
            product_count: count,
        }))
    }

    /// Create a product type
    #[oai(path = "/", method = "post", tag = "TypeTags::ProductTypes")]
    async fn create_type(
        &self,
        auth: BearerAuth,
        body: Json<CreateProductTypeRequest>,
    ) -> Result<Json<ProductTypeResponse>, ApiError> {
        let claims = authenticate(&self.tokens, &auth)?;
        require_catalog_admin(&claims)?;

        let body = body.0;
        let model = self
            .store
            .create(NewProductType {
                label: body.label,
                parent_id: body.parent_id,
                has_details: body.has_details.unwrap_or(false),
            })
            .await?;
        Ok(Json(model.into()))
    }

    /// Update a product type; omitted fields are left unchanged
    #[oai(path = "/:id", method = "put", tag = "TypeTags::ProductTypes")]
    async fn update_type(
        &self,
        auth: BearerAuth,
        id: Path<i64>,
        body: Json<UpdateProductTypeRequest>,
    ) -> Result<Json<ProductTypeResponse>, ApiError> {
        let claims = authenticate(&self.tokens, &auth)?;
        require_catalog_admin(&claims)?;

        let body = body.0;
        let model = self
            .store
            .update(
                id.0,
                ProductTypeUpdate {
                    label: body.label,
                    parent_id: parse_parent_id(body.parent_id.as_deref())?,
                    has_details: body.has_details,
                },
            )
            .await?;
        Ok(Json(model.into()))
    }

    /// Delete a product type; blocked with a 409 when products still
    /// reference it unless force is set
    #[oai(path = "/:id", method = "delete", tag = "TypeTags::ProductTypes")]
    async fn delete_type(
        &self,
        auth: BearerAuth,
        id: Path<i64>,
        force: Query<Option<bool>>,
    ) -> Result<Json<DeleteProductTypeResponse>, ApiError> {
        let claims = authenticate(&self.tokens, &auth)?;
        require_catalog_admin(&claims)?;

        let outcome = self.store.delete(id.0, force.0.unwrap_or(false)).await?;
        Ok(Json(DeleteProductTypeResponse {
            deleted_products: outcome.deleted_products,
        }))
    }
}

/// The wire form keeps three states apart: field omitted (unchanged),
/// empty string (promote to root), numeric string (reparent).
fn parse_parent_id(raw: Option<&str>) -> Result<Option<Option<i64>>, ApiError> {
    match raw.map(str::trim) {
        None => Ok(None),
        Some("") => Ok(Some(None)),
        Some(value) => value
            .parse::<i64>()
            .map(|id| Some(Some(id)))
            .map_err(|_| ApiError::bad_request("invalid parent type id")),
    }
}
