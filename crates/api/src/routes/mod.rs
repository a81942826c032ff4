//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod action_logs;
pub mod attachments;
pub mod auth;
pub mod fuel_requests;
pub mod health;
pub mod users;
pub mod vehicle_types;
pub mod vehicles;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(fuel_requests::routes())
        .merge(attachments::routes())
        .merge(vehicles::routes())
        .merge(vehicle_types::routes())
        .merge(users::routes())
        .merge(action_logs::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}
