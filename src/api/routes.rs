//! Router assembly.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::{Entity, Machine, MaintenanceTicket, Part, Team, UserAccount};

use super::handlers::{
    AppState, create_entity, delete_entity, get_entity, health_check, list_entities,
    update_entity,
};
use super::stock::{register_stock_entry, register_stock_exit};

/// The five CRUD routes of one record kind, under `/{collection}`.
fn resource_routes<E: Entity>() -> Router<AppState> {
    let collection = E::KIND.collection();
    Router::new()
        .route(
            &format!("/{collection}"),
            get(list_entities::<E>).post(create_entity::<E>),
        )
        .route(
            &format!("/{collection}/{{key}}"),
            get(get_entity::<E>)
                .put(update_entity::<E>)
                .delete(delete_entity::<E>),
        )
}

/// Builds the application router with tracing and permissive CORS.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .merge(resource_routes::<Machine>())
        .merge(resource_routes::<MaintenanceTicket>())
        .merge(resource_routes::<Part>())
        .merge(resource_routes::<Team>())
        .merge(resource_routes::<UserAccount>())
        .route("/parts/{key}/entry", post(register_stock_entry))
        .route("/parts/{key}/exit", post(register_stock_exit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
