use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::catalog::{self, ProductFilter};
use crate::entities::product::{self, Category};
use crate::middleware::logging::{success, ApiError};
use crate::state::AppState;

pub fn product_router() -> Router {
    Router::new()
        .route("/products", get(get_products))
        .route("/products/categories", get(get_categories))
        .route("/products/:id", get(get_product))
}

async fn get_products(
    Query(params): Query<GetProductsQuery>,
    Extension(state): Extension<AppState>,
) -> Result<Response, ApiError> {
    let page = catalog::list(
        &*state.db,
        ProductFilter {
            category: params.category,
            min_price_cents: params.min_price,
            max_price_cents: params.max_price,
            search: params.search,
            page: params.page,
            limit: params.limit,
        },
    )
    .await?;

    let products: Vec<ProductResponse> = page.products.into_iter().map(ProductResponse::from).collect();
    Ok(success(
        StatusCode::OK,
        "Products retrieved successfully",
        json!({
            "products": products,
            "pagination": {
                "page": page.page,
                "pages": page.pages,
                "total": page.total,
            },
        }),
    ))
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(state): Extension<AppState>,
) -> Result<Response, ApiError> {
    let product = catalog::get_active(&*state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No product with {} id was found", id)))?;

    Ok(success(
        StatusCode::OK,
        "Product retrieved successfully",
        json!({ "product": ProductResponse::from(product) }),
    ))
}

async fn get_categories() -> Response {
    success(
        StatusCode::OK,
        "Categories retrieved successfully",
        json!({ "categories": catalog::categories() }),
    )
}

#[derive(Deserialize)]
struct GetProductsQuery {
    category: Option<Category>,
    min_price: Option<i64>,
    max_price: Option<i64>,
    search: Option<String>,
    page: Option<u64>,
    limit: Option<u64>,
}

#[derive(Serialize)]
pub(crate) struct ProductResponse {
    #[serde(flatten)]
    product: product::Model,
    is_available: bool,
}

impl From<product::Model> for ProductResponse {
    fn from(product: product::Model) -> Self {
        ProductResponse {
            is_available: product.is_available(),
            product,
        }
    }
}
