use std::sync::Arc;

use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    OpenApi, Tags,
};

use crate::api::{authenticate, BearerAuth};
use crate::app_data::AppData;
use crate::errors::ApiError;
use crate::services::TokenService;
use crate::stores::product_store::{NewProduct, ProductFilter, ProductStore, ProductUpdate};
use crate::types::dto::product::{
    BulkCreateProductsRequest, BulkCreateProductsResponse, BulkDeleteProductsRequest,
    BulkDeleteProductsResponse, BulkEntryErrorResponse, CreateProductRequest, ProductListResponse,
    ProductResponse, UpdateProductRequest,
};

/// Product catalog API endpoints. Reads are public; every mutation
/// requires an authenticated caller.
pub struct ProductApi {
    store: Arc<ProductStore>,
    tokens: Arc<TokenService>,
}

impl ProductApi {
    pub fn new(app_data: &AppData) -> Self {
        Self {
            store: Arc::clone(&app_data.product_store),
            tokens: Arc::clone(&app_data.tokens),
        }
    }
}

#[derive(Tags)]
enum ProductTags {
    /// Product endpoints
    Products,
}

#[OpenApi(prefix_path = "/products")]
impl ProductApi {
    /// List products, filterable by type and Chinese name substring (public)
    #[oai(path = "/", method = "get", tag = "ProductTags::Products")]
    async fn list_products(
        &self,
        #[oai(name = "type")] type_id: Query<Option<i64>>,
        cn_name: Query<Option<String>>,
        page: Query<Option<u64>>,
        pagesize: Query<Option<u64>>,
    ) -> Result<Json<ProductListResponse>, ApiError> {
        let page = self
            .store
            .list(
                ProductFilter {
                    type_id: type_id.0,
                    cn_name: cn_name.0,
                },
                page.0.unwrap_or(1),
                pagesize.0.unwrap_or(10),
            )
            .await?;

        Ok(Json(ProductListResponse {
            products: page.products.into_iter().map(Into::into).collect(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
        }))
    }

    /// Create a product
    #[oai(path = "/", method = "post", tag = "ProductTags::Products")]
    async fn create_product(
        &self,
        auth: BearerAuth,
        body: Json<CreateProductRequest>,
    ) -> Result<Json<ProductResponse>, ApiError> {
        authenticate(&self.tokens, &auth)?;
        let model = self.store.create(new_product(body.0)).await?;
        Ok(Json(model.into()))
    }

    /// Create a batch of products; partial success is reported per entry
    #[oai(path = "/batch/create", method = "post", tag = "ProductTags::Products")]
    async fn bulk_create_products(
        &self,
        auth: BearerAuth,
        body: Json<BulkCreateProductsRequest>,
    ) -> Result<Json<BulkCreateProductsResponse>, ApiError> {
        authenticate(&self.tokens, &auth)?;

        let inputs = body.0.products.into_iter().map(new_product).collect();
        let outcome = self.store.bulk_create(inputs).await?;
        Ok(Json(BulkCreateProductsResponse {
            products: outcome.created.into_iter().map(Into::into).collect(),
            errors: outcome
                .errors
                .into_iter()
                .map(|e| BulkEntryErrorResponse {
                    index: e.index as u64,
                    message: e.message,
                })
                .collect(),
        }))
    }

    /// Delete a batch of products by id
    #[oai(path = "/batch/delete", method = "delete", tag = "ProductTags::Products")]
    async fn bulk_delete_products(
        &self,
        auth: BearerAuth,
        body: Json<BulkDeleteProductsRequest>,
    ) -> Result<Json<BulkDeleteProductsResponse>, ApiError> {
        authenticate(&self.tokens, &auth)?;

        let outcome = self.store.bulk_delete(body.0.ids).await?;
        Ok(Json(BulkDeleteProductsResponse {
            deleted_count: outcome.deleted_count,
            requested_count: outcome.requested_count as u64,
        }))
    }

    /// Get a single product by numeric id or catalog number (public)
    #[oai(path = "/:id", method = "get", tag = "ProductTags::Products")]
    async fn get_product(&self, id: Path<String>) -> Result<Json<ProductResponse>, ApiError> {
        let model = self.store.get(&id.0).await?;
        Ok(Json(model.into()))
    }

    /// Update a product; productNo is required on every update
    #[oai(path = "/:id", method = "put", tag = "ProductTags::Products")]
    async fn update_product(
        &self,
        auth: BearerAuth,
        id: Path<i64>,
        body: Json<UpdateProductRequest>,
    ) -> Result<Json<ProductResponse>, ApiError> {
        authenticate(&self.tokens, &auth)?;

        let body = body.0;
        let model = self
            .store
            .update(
                id.0,
                ProductUpdate {
                    product_no: body.product_no,
                    cn_name: body.cn_name,
                    product_spec: body.product_spec,
                    price: price_string(body.price),
                    type_id: body.type_id,
                    details: body.details,
                },
            )
            .await?;
        Ok(Json(model.into()))
    }

    /// Delete a product
    #[oai(path = "/:id", method = "delete", tag = "ProductTags::Products")]
    async fn delete_product(
        &self,
        auth: BearerAuth,
        id: Path<i64>,
    ) -> Result<Json<ProductResponse>, ApiError> {
        authenticate(&self.tokens, &auth)?;
        let removed = self.store.delete(id.0).await?;
        Ok(Json(removed.into()))
    }
}

fn new_product(body: CreateProductRequest) -> NewProduct {
    NewProduct {
        product_no: body.product_no,
        cn_name: body.cn_name,
        product_spec: body.product_spec,
        price: price_string(body.price),
        type_id: body.type_id,
        details: body.details,
    }
}

/// Legacy clients send `price` as either a string or a bare number;
/// both are accepted and kept as the value's string form.
fn price_string(value: Option<serde_json::Value>) -> Option<String> {
    match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    }
}
