//! # Product Routes
//!
//! Catalog maintenance. Stock is only changed here by an explicit update;
//! orders move it through the order routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::orders::MessageResponse;
use crate::error::ApiResult;
use crate::state::AppState;
use tavolo_core::{Product, ProductRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db().products().list().await?))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db().products().get(&id).await?))
}

async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Json(request) = payload?;
    let product = state.db().products().create(&request).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Json(request) = payload?;
    Ok(Json(state.db().products().update(&id, &request).await?))
}

/// Refused with 409 while order items still reference the product.
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.db().products().delete(&id).await?;
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}
