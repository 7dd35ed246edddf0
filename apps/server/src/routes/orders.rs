//! # Order Routes
//!
//! HTTP surface of the order lifecycle.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Lifecycle                                  │
//! │                                                                         │
//! │  POST /orders ──► open ──┬── PUT /orders/{id}        (replace items)   │
//! │                          ├── PUT /orders/{id}/kitchen-status            │
//! │                          └── PUT /orders/{id}/close ──► closed          │
//! │                                                                         │
//! │  DELETE /orders/{id}: any status, stock of every line restored         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;
use tavolo_core::validation::parse_business_date;
use tavolo_core::{OrderRequest, OrderView};

/// Query string of the order listings.
#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// Body of `PUT /orders/{id}/kitchen-status`.
#[derive(Debug, Deserialize)]
pub struct KitchenStatusRequest {
    pub status: String,
}

/// Confirmation returned by close and delete.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/by-date", get(orders_by_date))
        .route(
            "/orders/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/orders/{id}/close", put(close_order))
        .route("/orders/{id}/kitchen-status", put(update_kitchen_status))
}

/// `POST /orders`: opens an order and commits its stock.
async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<OrderView>)> {
    let Json(request) = payload?;
    debug!(table_id = %request.table_id, lines = request.items.len(), "create_order");

    let order = state.db().orders().create(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /orders`, optionally filtered by `?date=YYYY-MM-DD`.
async fn list_orders(
    State(state): State<AppState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<OrderView>>> {
    let Query(query) = query?;

    let orders = match query.date {
        Some(raw) => {
            let day = parse_business_date(&raw)?;
            state.db().orders().list_by_date(day).await?
        }
        None => state.db().orders().list_all().await?,
    };
    Ok(Json(orders))
}

/// `GET /orders/by-date?date=YYYY-MM-DD`: the date is mandatory here.
async fn orders_by_date(
    State(state): State<AppState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<OrderView>>> {
    let Query(query) = query?;
    let day = parse_business_date(query.date.as_deref().unwrap_or_default())?;

    Ok(Json(state.db().orders().list_by_date(day).await?))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    Ok(Json(state.db().orders().get(&id).await?))
}

/// `PUT /orders/{id}`: replaces table, date and items of an open order.
async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> ApiResult<Json<OrderView>> {
    let Json(request) = payload?;
    debug!(order_id = %id, lines = request.items.len(), "update_order");

    Ok(Json(state.db().orders().update(&id, request).await?))
}

/// `PUT /orders/{id}/close`
async fn close_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let order = state.db().orders().close(&id).await?;

    Ok(Json(MessageResponse::new(format!(
        "Order for table {} closed successfully",
        order.table.name
    ))))
}

/// `DELETE /orders/{id}`: removes the order and restores its stock.
async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.db().orders().delete(&id).await?;

    Ok(Json(MessageResponse::new(
        "Order deleted successfully and stock restored",
    )))
}

/// `PUT /orders/{id}/kitchen-status`
async fn update_kitchen_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<KitchenStatusRequest>, JsonRejection>,
) -> ApiResult<Json<OrderView>> {
    let Json(request) = payload?;

    Ok(Json(state.db().kitchen().advance(&id, &request.status).await?))
}
