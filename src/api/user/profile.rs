use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::api::{json_body, UserResponse};
use crate::entities::user::{self, hash_password, Entity as UserEntity};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{success, ApiError};
use crate::state::AppState;

pub fn profile_router() -> Router {
    Router::new().route("/auth/profile", get(get_profile).put(update_profile))
}

async fn current_user(state: &AppState, claims: &Claims) -> Result<user::Model, ApiError> {
    UserEntity::find_by_id(claims.user_id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

async fn get_profile(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let model = current_user(&state, &claims).await?;
    Ok(success(
        StatusCode::OK,
        "Profile retrieved successfully",
        json!({ "user": UserResponse::from(model) }),
    ))
}

async fn update_profile(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<UpdateProfile>, JsonRejection>,
) -> Result<Response, ApiError> {
    let mut payload = json_body(payload)?;
    payload.name = payload.name.map(|name| name.trim().to_owned());
    payload.validate()?;

    let mut model = current_user(&state, &claims).await?.into_active_model();
    if let Some(name) = payload.name {
        model.name = Set(name);
    }
    if let Some(password) = payload.password {
        model.password = Set(hash_password(&password)?);
    }
    model.updated_at = Set(Utc::now());
    let updated = model.update(&*state.db).await?;

    Ok(success(
        StatusCode::OK,
        "Profile updated successfully",
        json!({ "user": UserResponse::from(updated) }),
    ))
}

#[derive(Deserialize, Validate)]
struct UpdateProfile {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    name: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    password: Option<String>,
}
