use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::Response,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::api::{json_body, UserResponse};
use crate::entities::user::{self, hash_password, Entity as UserEntity, Role};
use crate::middleware::auth::{generate_token, AuthError};
use crate::middleware::logging::{success, ApiError};
use crate::state::AppState;

pub fn auth_router() -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

async fn register(
    Extension(state): Extension<AppState>,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> Result<Response, ApiError> {
    let mut payload = json_body(payload)?;
    payload.name = payload.name.trim().to_owned();
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;

    let existing = UserEntity::find()
        .filter(user::Column::Email.eq(payload.email.as_str()))
        .one(&*state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "User already exists with this email".into(),
        ));
    }

    let now = Utc::now();
    let created = user::ActiveModel {
        name: Set(payload.name),
        email: Set(payload.email),
        password: Set(hash_password(&payload.password)?),
        role: Set(Role::User),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*state.db)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ApiError::Conflict("User already exists with this email".into())
        }
        _ => ApiError::from(err),
    })?;

    let token = generate_token(created.id, created.role, &state.jwt)?;
    info!(user_id = created.id, "user registered");

    Ok(success(
        StatusCode::CREATED,
        "User registered successfully",
        json!({ "user": UserResponse::from(created), "token": token }),
    ))
}

async fn login(
    Extension(state): Extension<AppState>,
    payload: Result<Json<UserLogin>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = json_body(payload)?;
    payload.validate()?;

    let model = UserEntity::find()
        .filter(user::Column::Email.eq(payload.email.trim().to_lowercase()))
        .one(&*state.db)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    model.check_hash(&payload.password)?;

    let token = generate_token(model.id, model.role, &state.jwt)?;
    info!(user_id = model.id, "user logged in");

    Ok(success(
        StatusCode::OK,
        "Login successful",
        json!({ "user": UserResponse::from(model), "token": token }),
    ))
}

#[derive(Deserialize, Debug, Validate)]
struct RegisterUser {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    name: String,
    #[validate(email(message = "Please provide a valid email"))]
    email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    password: String,
}

#[derive(Deserialize, Debug, Validate)]
struct UserLogin {
    #[validate(email(message = "Please provide a valid email"))]
    email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}
