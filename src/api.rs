//! JSON HTTP routes over the catalog service

use axum::{extract::{Path, State}, http::StatusCode, routing::{delete, get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{ProductMedia, ProductVariant};
use crate::domain::value_objects::MediaType;
use crate::error::CatalogError;
use crate::service::Catalog;
use crate::store::CatalogStore;

type ApiResult<T> = Result<T, (StatusCode, String)>;

pub fn router<S: CatalogStore>(catalog: Catalog<S>) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-catalog"})) }))
        .route("/api/v1/products/:id/media", get(list_media::<S>).post(add_media::<S>))
        .route("/api/v1/media/:id", delete(remove_media::<S>))
        .route("/api/v1/products/:id/variants", post(create_variant::<S>))
        .route("/api/v1/variants/:id", get(get_variant::<S>))
        .with_state(catalog)
}

fn reject(e: CatalogError) -> (StatusCode, String) {
    let status = match &e {
        CatalogError::MediaNotFound | CatalogError::VariantNotFound => StatusCode::NOT_FOUND,
        CatalogError::DuplicateCode { .. } => StatusCode::CONFLICT,
        CatalogError::InvalidInput(_) | CatalogError::InvalidLength { .. } | CatalogError::InvalidMediaType(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CatalogError::ScopeUnresolved | CatalogError::CodeSpaceExhausted { .. } | CatalogError::Storage(_) => {
            tracing::error!(error = %e, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

fn invalid(e: validator::ValidationErrors) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, e.to_string())
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddMediaRequest {
    #[serde(default)]
    pub media_type: MediaType,
    #[validate(url)]
    pub url: String,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub alt: String,
}

#[derive(Debug, Serialize)]
pub struct RemovedResponse { pub shifted: u64 }

async fn list_media<S: CatalogStore>(State(c): State<Catalog<S>>, Path(product_id): Path<Uuid>) -> ApiResult<Json<Vec<ProductMedia>>> {
    c.list_media(product_id).await.map(Json).map_err(reject)
}

async fn add_media<S: CatalogStore>(State(c): State<Catalog<S>>, Path(product_id): Path<Uuid>, Json(r): Json<AddMediaRequest>) -> ApiResult<(StatusCode, Json<ProductMedia>)> {
    r.validate().map_err(invalid)?;
    let media = c.add_media(ProductMedia::create(Some(product_id), r.media_type, r.url, r.alt)).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(media)))
}

async fn remove_media<S: CatalogStore>(State(c): State<Catalog<S>>, Path(id): Path<Uuid>) -> ApiResult<Json<RemovedResponse>> {
    let shifted = c.remove_media(id).await.map_err(reject)?;
    Ok(Json(RemovedResponse { shifted }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVariantRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub product_code: Option<String>,
    pub upc_code: Option<String>,
    pub ean13_code: Option<String>,
}

async fn create_variant<S: CatalogStore>(State(c): State<Catalog<S>>, Path(product_id): Path<Uuid>, Json(r): Json<CreateVariantRequest>) -> ApiResult<(StatusCode, Json<ProductVariant>)> {
    r.validate().map_err(invalid)?;
    let mut variant = ProductVariant::create(product_id, r.name);
    variant.product_code = r.product_code;
    variant.upc_code = r.upc_code;
    variant.ean13_code = r.ean13_code;
    let variant = c.create_variant(variant).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(variant)))
}

async fn get_variant<S: CatalogStore>(State(c): State<Catalog<S>>, Path(id): Path<Uuid>) -> ApiResult<Json<ProductVariant>> {
    c.get_variant(id).await.map(Json).map_err(reject)
}
