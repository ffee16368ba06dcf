use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::entities::user::{Entity as UserEntity, Role};
use crate::middleware::logging::ApiError;
use crate::state::JwtSettings;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Insufficient role")]
    Forbidden,
    #[error("Failed to hash password: {0}")]
    Hashing(String),
    #[error("Failed to generate token")]
    GenerationFail,
    #[error(transparent)]
    Db(#[from] DbErr),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub role: String,
    pub exp: usize,
}

#[derive(Clone, Debug)]
pub struct AuthState {
    pub db: Arc<DatabaseConnection>,
    pub secret: Arc<str>,
    pub role: Role,
}

impl AuthState {
    pub fn new(db: Arc<DatabaseConnection>, jwt: &JwtSettings, role: Role) -> Self {
        AuthState {
            db,
            secret: jwt.secret.clone(),
            role,
        }
    }
}

/// Requires a valid bearer token whose user still exists and whose role passes
/// the gate configured in [`AuthState`]. On success the [`Claims`] are put into
/// the request extensions.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    let claims = validate_token(&state.db, token, &state.secret, state.role)
        .await
        .inspect_err(|err| warn!(error = %err, uri = %req.uri(), "rejected request"))?;

    debug!(user_id = claims.user_id, role = %claims.role, "authenticated");
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub fn generate_token(user_id: i32, role: Role, jwt: &JwtSettings) -> Result<String, AuthError> {
    let exp = Utc::now()
        .checked_add_signed(jwt.ttl)
        .ok_or(AuthError::GenerationFail)?
        .timestamp();
    let claims = Claims {
        user_id,
        role: role.to_string(),
        exp: usize::try_from(exp).map_err(|_| AuthError::GenerationFail)?,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.as_bytes()),
    )
    .map_err(|_| AuthError::GenerationFail)
}

pub async fn validate_token(
    db: &DatabaseConnection,
    token: &str,
    secret: &str,
    required: Role,
) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AuthError::InvalidToken)?
    .claims;

    let role = Role::from_str(&claims.role).map_err(|_| AuthError::InvalidToken)?;
    let user = UserEntity::find_by_id(claims.user_id)
        .one(db)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    // a role change since issuing invalidates the token
    if user.role != role {
        return Err(AuthError::InvalidToken);
    }
    if !role.permits(required) {
        return Err(AuthError::Forbidden);
    }
    Ok(claims)
}
