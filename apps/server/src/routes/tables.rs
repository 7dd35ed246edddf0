//! # Table Routes
//!
//! Dining table maintenance and the availability view used by the
//! "new order" screen.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::orders::MessageResponse;
use crate::error::ApiResult;
use crate::state::AppState;
use tavolo_core::{Table, TableRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tables", get(list_tables).post(create_table))
        .route("/tables/available", get(available_tables))
        .route(
            "/tables/{id}",
            get(get_table).put(update_table).delete(delete_table),
        )
}

async fn list_tables(State(state): State<AppState>) -> ApiResult<Json<Vec<Table>>> {
    Ok(Json(state.db().tables().list().await?))
}

/// Shared tables plus single-tab tables without an open order.
async fn available_tables(State(state): State<AppState>) -> ApiResult<Json<Vec<Table>>> {
    Ok(Json(state.db().tables().list_available().await?))
}

async fn get_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Table>> {
    Ok(Json(state.db().tables().get(&id).await?))
}

async fn create_table(
    State(state): State<AppState>,
    payload: Result<Json<TableRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Table>)> {
    let Json(request) = payload?;
    let table = state.db().tables().create(&request).await?;
    Ok((StatusCode::CREATED, Json(table)))
}

async fn update_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TableRequest>, JsonRejection>,
) -> ApiResult<Json<Table>> {
    let Json(request) = payload?;
    Ok(Json(state.db().tables().update(&id, &request).await?))
}

async fn delete_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.db().tables().delete(&id).await?;
    Ok(Json(MessageResponse::new("Table deleted successfully")))
}
