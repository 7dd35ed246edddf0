//! # Kitchen Routes
//!
//! The kitchen display polls the queue of open orders, oldest first.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::ApiResult;
use crate::state::AppState;
use tavolo_core::OrderView;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/kitchen/orders", get(kitchen_queue))
        .route("/kitchen-orders", get(kitchen_queue))
}

async fn kitchen_queue(State(state): State<AppState>) -> ApiResult<Json<Vec<OrderView>>> {
    Ok(Json(state.db().kitchen().queue().await?))
}
