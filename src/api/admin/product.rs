use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::api::{json_body, public::product::ProductResponse};
use crate::catalog::{self, NewProduct, ProductChanges};
use crate::entities::product::Category;
use crate::middleware::auth::Claims;
use crate::middleware::logging::{success, ApiError};
use crate::state::AppState;

//ROUTERS
pub fn admin_product_router() -> Router {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product).delete(delete_product))
}

//ROUTES
async fn create_product(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateProduct>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = json_body(payload)?;
    payload.validate()?;

    let created = catalog::create(
        &*state.db,
        NewProduct {
            name: payload.name,
            description: payload.description,
            price_cents: payload.price_cents,
            stock: payload.stock,
            category: payload.category.unwrap_or_default(),
            image_url: payload.image_url,
        },
    )
    .await?;
    info!(admin_id = claims.user_id, product_id = created.id, "admin created product");

    Ok(success(
        StatusCode::CREATED,
        "Product created successfully",
        json!({ "product": ProductResponse::from(created) }),
    ))
}

async fn update_product(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
    payload: Result<Json<UpdateProduct>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = json_body(payload)?;
    payload.validate()?;

    let updated = catalog::update(
        &*state.db,
        id,
        ProductChanges {
            name: payload.name,
            description: payload.description,
            price_cents: payload.price_cents,
            stock: payload.stock,
            category: payload.category,
            image_url: payload.image_url,
            is_active: payload.is_active,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("No product with {} id was found", id)))?;

    Ok(success(
        StatusCode::OK,
        "Product updated successfully",
        json!({ "product": ProductResponse::from(updated) }),
    ))
}

async fn delete_product(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<Response, ApiError> {
    if !catalog::deactivate(&*state.db, id).await? {
        return Err(ApiError::NotFound(format!("No product with {} id was found", id)));
    }

    Ok(success(
        StatusCode::OK,
        "Product deleted successfully",
        json!({ "id": id }),
    ))
}

//Structs
#[derive(Deserialize, Debug, Validate)]
struct CreateProduct {
    #[validate(length(min = 2, max = 100, message = "Product name must be between 2 and 100 characters"))]
    name: String,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    description: String,
    #[validate(range(min = 0i64, max = 100_000_000_000i64, message = "Price must be between 0 and 1000000000.00"))]
    price_cents: i64,
    #[validate(range(min = 0, max = 1_000_000, message = "Stock must be between 0 and 1000000"))]
    stock: i32,
    category: Option<Category>,
    #[validate(url(message = "Image URL must be a valid URL"))]
    image_url: Option<String>,
}

#[derive(Deserialize, Debug, Validate)]
struct UpdateProduct {
    #[validate(length(min = 2, max = 100, message = "Product name must be between 2 and 100 characters"))]
    name: Option<String>,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    description: Option<String>,
    #[validate(range(min = 0i64, max = 100_000_000_000i64, message = "Price must be between 0 and 1000000000.00"))]
    price_cents: Option<i64>,
    #[validate(range(min = 0, max = 1_000_000, message = "Stock must be between 0 and 1000000"))]
    stock: Option<i32>,
    category: Option<Category>,
    #[validate(url(message = "Image URL must be a valid URL"))]
    image_url: Option<String>,
    is_active: Option<bool>,
}
