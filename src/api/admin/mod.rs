pub mod product;

use axum::{middleware::from_fn_with_state, Router};

use product::admin_product_router;

use crate::entities::user::Role;
use crate::middleware::auth::{auth_middleware, AuthState};
use crate::state::AppState;

pub fn admin_api_router(state: &AppState) -> Router {
    Router::new()
        .merge(admin_product_router())
        .route_layer(from_fn_with_state(
            AuthState::new(state.db.clone(), &state.jwt, Role::Admin),
            auth_middleware,
        ))
}
