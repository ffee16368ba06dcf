//! Product catalog.
//!
//! The cart core only ever reads products through [`find_by_id`] and
//! [`find_many`]; both hit storage on every call so stock, price and the active
//! flag are always current. The remaining functions back the catalog routes.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr,
    EntityTrait, IntoActiveModel, Iterable, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::info;

use crate::entities::product::{self, Category, Entity as ProductEntity, PLACEHOLDER_IMAGE};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// The slice of a product the cart core validates against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: i32,
    pub price_cents: i64,
    pub stock: i32,
    pub is_active: bool,
}

impl From<&product::Model> for ProductSnapshot {
    fn from(model: &product::Model) -> Self {
        ProductSnapshot {
            id: model.id,
            price_cents: model.price_cents,
            stock: model.stock,
            is_active: model.is_active,
        }
    }
}

pub async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<ProductSnapshot>, DbErr> {
    let model = ProductEntity::find_by_id(id).one(db).await?;
    Ok(model.as_ref().map(ProductSnapshot::from))
}

/// Loads all listed products in one query, keyed by id. Missing ids are simply
/// absent from the map.
pub async fn find_many<C: ConnectionTrait>(
    db: &C,
    ids: &[i32],
) -> Result<HashMap<i32, product::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let products = ProductEntity::find()
        .filter(product::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await?;
    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}

#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    pub category: Option<Category>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<product::Model>,
    pub total: u64,
    pub page: u64,
    pub pages: u64,
}

/// Lists active products, newest first.
pub async fn list<C: ConnectionTrait>(db: &C, filter: ProductFilter) -> Result<ProductPage, DbErr> {
    let mut query = ProductEntity::find().filter(product::Column::IsActive.eq(true));

    if let Some(category) = filter.category {
        query = query.filter(product::Column::Category.eq(category));
    }
    if let Some(min) = filter.min_price_cents {
        query = query.filter(product::Column::PriceCents.gte(min));
    }
    if let Some(max) = filter.max_price_cents {
        query = query.filter(product::Column::PriceCents.lte(max));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(product::Column::Name.contains(search))
                .add(product::Column::Description.contains(search)),
        );
    }

    let limit = filter
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let page = filter.page.unwrap_or(1).max(1);

    let paginator = query
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id)
        .paginate(db, limit);
    let counts = paginator.num_items_and_pages().await?;
    let products = paginator.fetch_page(page - 1).await?;

    Ok(ProductPage {
        products,
        total: counts.number_of_items,
        page,
        pages: counts.number_of_pages,
    })
}

pub async fn get_active<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<product::Model>, DbErr> {
    ProductEntity::find_by_id(id)
        .filter(product::Column::IsActive.eq(true))
        .one(db)
        .await
}

pub fn categories() -> Vec<Category> {
    Category::iter().collect()
}

#[derive(Clone, Debug)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: i32,
    pub category: Category,
    pub image_url: Option<String>,
}

pub async fn create<C: ConnectionTrait>(db: &C, new: NewProduct) -> Result<product::Model, DbErr> {
    let now = Utc::now();
    let model = product::ActiveModel {
        name: Set(new.name.trim().to_owned()),
        description: Set(new.description.trim().to_owned()),
        price_cents: Set(new.price_cents),
        stock: Set(new.stock),
        category: Set(new.category),
        image_url: Set(new.image_url.unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned())),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(product_id = model.id, name = %model.name, "product created");
    Ok(model)
}

#[derive(Clone, Debug, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i32>,
    pub category: Option<Category>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

/// Applies the given changes. Returns `None` when the product does not exist.
pub async fn update<C: ConnectionTrait>(
    db: &C,
    id: i32,
    changes: ProductChanges,
) -> Result<Option<product::Model>, DbErr> {
    let Some(existing) = ProductEntity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };

    let mut model = existing.into_active_model();
    if let Some(name) = changes.name {
        model.name = Set(name.trim().to_owned());
    }
    if let Some(description) = changes.description {
        model.description = Set(description.trim().to_owned());
    }
    if let Some(price_cents) = changes.price_cents {
        model.price_cents = Set(price_cents);
    }
    if let Some(stock) = changes.stock {
        model.stock = Set(stock);
    }
    if let Some(category) = changes.category {
        model.category = Set(category);
    }
    if let Some(image_url) = changes.image_url {
        model.image_url = Set(image_url);
    }
    if let Some(is_active) = changes.is_active {
        model.is_active = Set(is_active);
    }
    model.updated_at = Set(Utc::now());

    let updated = model.update(db).await?;
    info!(product_id = id, "product updated");
    Ok(Some(updated))
}

/// Soft delete. Returns `false` when no product has that id.
pub async fn deactivate<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, DbErr> {
    let result = ProductEntity::update_many()
        .col_expr(product::Column::IsActive, Expr::value(false))
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product::Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected > 0 {
        info!(product_id = id, "product deactivated");
    }
    Ok(result.rows_affected > 0)
}
