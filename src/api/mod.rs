//! API module for HTTP handlers.
//!
//! This module contains the resource handlers, request/response payloads,
//! error mapping and the router.

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod stock;

pub use dto::{DeleteResponse, HealthResponse, ListQuery, StockEntryRequest, StockExitRequest};
pub use error::{ApiError, ApiErrorResponse};
pub use extract::{JsonBody, QueryParams};
pub use handlers::{
    AppState, create_entity, delete_entity, get_entity, health_check, list_entities,
    update_entity,
};
pub use routes::router;
pub use stock::{register_stock_entry, register_stock_exit};
