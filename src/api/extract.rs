//! Extractors whose rejections use the service's `{"detail"}` error body.

use axum::extract::{FromRequest, FromRequestParts};

use super::error::ApiErrorResponse;

/// JSON request body. Rejections become 422 (or 415 without a JSON content type).
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiErrorResponse))]
pub struct JsonBody<T>(pub T);

/// Query string parameters. Rejections become 422.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiErrorResponse))]
pub struct QueryParams<T>(pub T);
