use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::debug;

use super::model::checked_totals;
use crate::cart::{Cart, CartError};
use crate::catalog;
use crate::entities::{cart, cart_item};

/// What readers of a cart get back: only items whose product is still active,
/// with totals computed over exactly those items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub items: Vec<CartViewItem>,
    pub total_items: i64,
    pub total_price_cents: i64,
}

impl CartView {
    pub fn empty() -> Self {
        CartView {
            items: Vec::new(),
            total_items: 0,
            total_price_cents: 0,
        }
    }

    pub fn item(&self, product_id: i32) -> Option<&CartViewItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CartViewItem {
    pub product_id: i32,
    pub quantity: i32,
    pub price_cents: i64,
    pub added_at: DateTime<Utc>,
    pub product: ProductSummary,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub name: String,
    pub price_cents: i64,
    pub image_url: String,
    pub stock: i32,
}

/// Loads and persists carts. Stateless; every call runs on the connection or
/// transaction it is handed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CartStore;

impl CartStore {
    pub async fn find<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i32,
    ) -> Result<Option<Cart>, CartError> {
        let Some(row) = cart::Entity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        let items = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(row.id))
            .order_by_asc(cart_item::Column::Id)
            .all(db)
            .await?;

        Ok(Some(Cart::from_rows(row, items)?))
    }

    pub async fn find_or_create<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i32,
    ) -> Result<Cart, CartError> {
        if let Some(cart) = self.find(db, user_id).await? {
            return Ok(cart);
        }

        let now = Utc::now();
        let row = cart::ActiveModel {
            user_id: Set(user_id),
            total_items: Set(0),
            total_price_cents: Set(0),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        debug!(user_id, cart_id = row.id, "created cart");
        Ok(Cart::new(row.id, user_id))
    }

    /// Writes the cart's items and totals. Rows for removed items are deleted,
    /// existing rows are updated in place and new items are inserted in order,
    /// so ascending row id keeps matching insertion order.
    pub async fn commit<C: ConnectionTrait>(&self, db: &C, cart: &Cart) -> Result<(), DbErr> {
        let kept: HashSet<i32> = cart.items().iter().filter_map(|i| i.row_id).collect();

        let mut stale = cart_item::Entity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id()));
        if !kept.is_empty() {
            stale = stale.filter(cart_item::Column::Id.is_not_in(kept.iter().copied()));
        }
        stale.exec(db).await?;

        for item in cart.items() {
            match item.row_id {
                Some(id) => {
                    cart_item::ActiveModel {
                        id: Unchanged(id),
                        quantity: Set(item.quantity),
                        price_cents: Set(item.price_cents),
                        ..Default::default()
                    }
                    .update(db)
                    .await?;
                }
                None => {
                    cart_item::ActiveModel {
                        cart_id: Set(cart.id()),
                        product_id: Set(item.product_id),
                        quantity: Set(item.quantity),
                        price_cents: Set(item.price_cents),
                        added_at: Set(item.added_at),
                        ..Default::default()
                    }
                    .insert(db)
                    .await?;
                }
            }
        }

        cart::ActiveModel {
            id: Unchanged(cart.id()),
            total_items: Set(cart.total_items()),
            total_price_cents: Set(cart.total_price_cents()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(db)
        .await?;

        debug!(
            cart_id = cart.id(),
            user_id = cart.user_id(),
            total_items = cart.total_items(),
            total_price_cents = cart.total_price_cents(),
            "committed cart"
        );
        Ok(())
    }

    /// The read side of the store: an empty view when the user has no cart,
    /// otherwise the cart filtered to active products.
    pub async fn view<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i32,
    ) -> Result<CartView, CartError> {
        match self.find(db, user_id).await? {
            Some(cart) => self.render(db, &cart).await,
            None => Ok(CartView::empty()),
        }
    }

    /// Resolves each item against the live catalog. Items whose product is
    /// missing or inactive are left out of the view but stay in storage.
    pub async fn render<C: ConnectionTrait>(
        &self,
        db: &C,
        cart: &Cart,
    ) -> Result<CartView, CartError> {
        let ids: Vec<i32> = cart.items().iter().map(|i| i.product_id).collect();
        let products = catalog::find_many(db, &ids).await?;

        let items: Vec<CartViewItem> = cart
            .items()
            .iter()
            .filter_map(|item| {
                let product = products.get(&item.product_id).filter(|p| p.is_active)?;
                Some(CartViewItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price_cents: item.price_cents,
                    added_at: item.added_at,
                    product: ProductSummary {
                        name: product.name.clone(),
                        price_cents: product.price_cents,
                        image_url: product.image_url.clone(),
                        stock: product.stock,
                    },
                })
            })
            .collect();

        let (total_items, total_price_cents) =
            checked_totals(items.iter().map(|i| (i.quantity, i.price_cents)))?;

        Ok(CartView {
            items,
            total_items,
            total_price_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NewProduct, ProductChanges};
    use crate::entities::{connect, product::Category, setup_schema, user};
    use sea_orm::DatabaseConnection;

    async fn db() -> DatabaseConnection {
        let db = connect("sqlite::memory:").await.expect("connect");
        setup_schema(&db).await.expect("schema");
        db
    }

    async fn shopper(db: &DatabaseConnection, email: &str) -> i32 {
        let now = Utc::now();
        user::ActiveModel {
            name: Set("Shopper".to_owned()),
            email: Set(email.to_owned()),
            password: Set("x".to_owned()),
            role: Set(user::Role::User),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("user")
        .id
    }

    async fn product(db: &DatabaseConnection, name: &str, price_cents: i64) -> i32 {
        catalog::create(
            db,
            NewProduct {
                name: name.to_owned(),
                description: String::new(),
                price_cents,
                stock: 10,
                category: Category::Other,
                image_url: None,
            },
        )
        .await
        .expect("product")
        .id
    }

    #[tokio::test]
    async fn view_without_cart_is_empty() {
        let db = db().await;
        let view = CartStore.view(&db, 1).await.unwrap();
        assert_eq!(view, CartView::empty());
    }

    #[tokio::test]
    async fn commit_round_trips_items_in_insertion_order() {
        let db = db().await;
        let user_id = shopper(&db, "a@example.com").await;
        let (p1, p2, p3) = (
            product(&db, "One", 100).await,
            product(&db, "Two", 200).await,
            product(&db, "Three", 300).await,
        );

        let mut cart = CartStore.find_or_create(&db, user_id).await.unwrap();
        cart.upsert_item(p2, 1, 200, Utc::now()).unwrap();
        cart.upsert_item(p1, 2, 100, Utc::now()).unwrap();
        CartStore.commit(&db, &cart).await.unwrap();

        let mut cart = CartStore.find(&db, user_id).await.unwrap().unwrap();
        cart.upsert_item(p3, 1, 300, Utc::now()).unwrap();
        cart.upsert_item(p2, 4, 250, Utc::now()).unwrap();
        cart.remove_item(p1).unwrap();
        CartStore.commit(&db, &cart).await.unwrap();

        let stored = CartStore.find(&db, user_id).await.unwrap().unwrap();
        let order: Vec<i32> = stored.items().iter().map(|i| i.product_id).collect();
        assert_eq!(order, vec![p2, p3]);
        assert_eq!(stored.item(p2).unwrap().quantity, 5);
        assert_eq!(stored.total_items(), 6);
        assert_eq!(stored.total_price_cents(), 5 * 250 + 300);

        let row = cart::Entity::find_by_id(stored.id()).one(&db).await.unwrap().unwrap();
        assert_eq!(row.total_items, 6);
        assert_eq!(row.total_price_cents, 5 * 250 + 300);
    }

    #[tokio::test]
    async fn find_or_create_reuses_existing_cart() {
        let db = db().await;
        let user_id = shopper(&db, "b@example.com").await;

        let first = CartStore.find_or_create(&db, user_id).await.unwrap();
        let second = CartStore.find_or_create(&db, user_id).await.unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(cart::Entity::find().all(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn view_hides_inactive_products_without_deleting_them() {
        let db = db().await;
        let user_id = shopper(&db, "c@example.com").await;
        let keep = product(&db, "Keep", 100).await;
        let hide = product(&db, "Hide", 1_000).await;

        let mut cart = CartStore.find_or_create(&db, user_id).await.unwrap();
        cart.upsert_item(keep, 1, 100, Utc::now()).unwrap();
        cart.upsert_item(hide, 2, 1_000, Utc::now()).unwrap();
        CartStore.commit(&db, &cart).await.unwrap();

        catalog::deactivate(&db, hide).await.unwrap();
        let view = CartStore.view(&db, user_id).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].product_id, keep);
        assert_eq!(view.total_items, 1);
        assert_eq!(view.total_price_cents, 100);

        let stored = CartStore.find(&db, user_id).await.unwrap().unwrap();
        assert_eq!(stored.items().len(), 2);

        catalog::update(
            &db,
            hide,
            ProductChanges {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let view = CartStore.view(&db, user_id).await.unwrap();
        let restored = view.item(hide).unwrap();
        assert_eq!(restored.quantity, 2);
        assert_eq!(restored.price_cents, 1_000);
        assert_eq!(view.total_price_cents, 2_100);
    }
}
