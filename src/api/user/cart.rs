use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::api::json_body;
use crate::cart::CartView;
use crate::middleware::auth::Claims;
use crate::middleware::logging::{success, ApiError};
use crate::state::AppState;

//ROUTERS
pub fn cart_router() -> Router {
    Router::new()
        .route("/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route(
            "/cart/:product_id",
            put(update_cart_item).delete(remove_from_cart),
        )
}

async fn get_cart(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let cart = state.carts.get_cart(claims.user_id).await?;
    let message = if cart.items.is_empty() {
        "Cart is empty"
    } else {
        "Cart retrieved successfully"
    };
    Ok(cart_response(message, cart))
}

async fn add_to_cart(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<AddToCart>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = json_body(payload)?;
    payload.validate()?;

    let cart = state
        .carts
        .add_to_cart(claims.user_id, payload.product_id, payload.quantity)
        .await?;
    Ok(cart_response("Item added to cart successfully", cart))
}

async fn update_cart_item(
    Path(product_id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<UpdateCartItem>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = json_body(payload)?;
    payload.validate()?;

    let cart = state
        .carts
        .update_cart_item(claims.user_id, product_id, payload.quantity)
        .await?;
    Ok(cart_response("Cart item updated successfully", cart))
}

async fn remove_from_cart(
    Path(product_id): Path<i32>,
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let cart = state
        .carts
        .remove_from_cart(claims.user_id, product_id)
        .await?;
    Ok(cart_response("Item removed from cart successfully", cart))
}

async fn clear_cart(
    Extension(state): Extension<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let cart = state.carts.clear_cart(claims.user_id).await?;
    Ok(cart_response("Cart cleared successfully", cart))
}

fn cart_response(message: &str, cart: CartView) -> Response {
    success(StatusCode::OK, message, json!({ "cart": cart }))
}

//Structs
#[derive(Deserialize, Debug, Validate)]
struct AddToCart {
    #[serde(alias = "productId")]
    product_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    quantity: i32,
}

#[derive(Deserialize, Debug, Validate)]
struct UpdateCartItem {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    quantity: i32,
}
