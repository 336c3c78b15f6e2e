//! Stock movement handlers for parts.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};

use crate::domain::Part;

use super::dto::{StockEntryRequest, StockExitRequest};
use super::error::ApiErrorResponse;
use super::extract::JsonBody;
use super::handlers::AppState;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// `POST /parts/{code}/entry`: adds units to stock.
///
/// # Errors
///
/// 404 for an unknown part, 400 for a zero quantity or overflow.
pub async fn register_stock_entry(
    State(state): State<AppState>,
    Path(code): Path<String>,
    JsonBody(request): JsonBody<StockEntryRequest>,
) -> Result<(StatusCode, Json<Part>), ApiErrorResponse> {
    let date = request.entry_date.unwrap_or_else(today);
    let part = state
        .repository::<Part>()
        .modify(&code, |part: &mut Part| part.receive(request.quantity, date))
        .await?;
    tracing::info!(code = %code, quantity = request.quantity, "Stock entry registered");
    Ok((StatusCode::ACCEPTED, Json(part)))
}

/// `POST /parts/{code}/exit`: removes units from stock.
///
/// # Errors
///
/// 404 for an unknown part, 400 when stock is insufficient.
pub async fn register_stock_exit(
    State(state): State<AppState>,
    Path(code): Path<String>,
    JsonBody(request): JsonBody<StockExitRequest>,
) -> Result<(StatusCode, Json<Part>), ApiErrorResponse> {
    let date = request.exit_date.unwrap_or_else(today);
    let part = state
        .repository::<Part>()
        .modify(&code, |part: &mut Part| part.dispatch(request.quantity, date))
        .await?;
    tracing::info!(code = %code, quantity = request.quantity, "Stock exit registered");
    Ok((StatusCode::ACCEPTED, Json(part)))
}
