pub mod admin;
pub mod public;
pub mod user;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit},
    http::{StatusCode, Uri},
    middleware::from_fn,
    response::Response,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::entities::user::{Model as UserModel, Role};
use crate::middleware::logging::{logging_middleware, success, ApiError};
use crate::state::AppState;

use admin::admin_api_router;
use public::public_api_router;
use user::user_api_router;

pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub fn create_api_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .merge(public_api_router())
        .merge(user_api_router(&state))
        .merge(admin_api_router(&state));

    Router::new()
        .route("/", get(welcome))
        .nest("/api", api)
        .fallback(route_not_found)
        .layer(Extension(state))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn welcome() -> Response {
    success(
        StatusCode::OK,
        "Welcome to the Shoppy cart API",
        json!({ "version": env!("CARGO_PKG_VERSION") }),
    )
}

async fn health() -> Response {
    success(
        StatusCode::OK,
        "API is running",
        json!({
            "timestamp": Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Route {} not found", uri.path()))
}

/// Unwraps a JSON body, turning axum's plain-text rejection into the JSON
/// error envelope.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

#[derive(Serialize)]
pub(crate) struct UserResponse {
    id: i32,
    name: String,
    email: String,
    role: Role,
}

impl From<UserModel> for UserResponse {
    fn from(value: UserModel) -> Self {
        UserResponse {
            id: value.id,
            name: value.name,
            email: value.email,
            role: value.role,
        }
    }
}
