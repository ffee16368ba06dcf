pub mod cart;
pub mod profile;

use axum::{middleware::from_fn_with_state, Router};

use crate::entities::user::Role;
use crate::middleware::auth::{auth_middleware, AuthState};
use crate::state::AppState;
use cart::cart_router;
use profile::profile_router;

pub fn user_api_router(state: &AppState) -> Router {
    Router::new()
        .merge(cart_router())
        .merge(profile_router())
        .route_layer(from_fn_with_state(
            AuthState::new(state.db.clone(), &state.jwt, Role::User),
            auth_middleware,
        ))
}
