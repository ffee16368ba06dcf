use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{info, warn};

use crate::cart::{CartError, CartLocks, CartStore, CartView};
use crate::catalog::{self, ProductSnapshot};

const LOCK_PRUNE_THRESHOLD: usize = 1024;

/// Cart operations. Each mutation validates against the live catalog, applies
/// the change and commits it in one transaction while holding the user's cart
/// lock; any failure rolls the transaction back.
#[derive(Debug, Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    store: CartStore,
    locks: CartLocks,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        CartService {
            db,
            store: CartStore,
            locks: CartLocks::new(),
        }
    }

    pub async fn get_cart(&self, user_id: i32) -> Result<CartView, CartError> {
        self.store.view(&*self.db, user_id).await
    }

    pub async fn add_to_cart(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        ensure_quantity(quantity)?;
        let store = self.store;

        let view = self
            .mutate(user_id, move |txn| {
                Box::pin(async move {
                    let product = available_product(txn, product_id).await?;
                    if i64::from(product.stock) < i64::from(quantity) {
                        return Err(CartError::InsufficientStock {
                            available: product.stock,
                            requested: i64::from(quantity),
                        });
                    }

                    let mut cart = store.find_or_create(txn, user_id).await?;
                    if let Some(existing) = cart.item(product_id) {
                        let combined = i64::from(existing.quantity) + i64::from(quantity);
                        if combined > i64::from(product.stock) {
                            return Err(CartError::InsufficientStock {
                                available: product.stock,
                                requested: combined,
                            });
                        }
                    }

                    cart.upsert_item(product.id, quantity, product.price_cents, Utc::now())?;
                    store.commit(txn, &cart).await?;
                    Ok(store.render(txn, &cart).await?)
                })
            })
            .await?;

        info!(user_id, product_id, quantity, "added to cart");
        Ok(view)
    }

    pub async fn update_cart_item(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        ensure_quantity(quantity)?;
        let store = self.store;

        let view = self
            .mutate(user_id, move |txn| {
                Box::pin(async move {
                    let mut cart = store
                        .find(txn, user_id)
                        .await?
                        .ok_or(CartError::CartNotFound)?;
                    if cart.item(product_id).is_none() {
                        return Err(CartError::ItemNotFound(product_id));
                    }

                    let product = available_product(txn, product_id).await?;
                    // absolute quantity, unlike add which checks the combined total
                    if quantity > product.stock {
                        return Err(CartError::InsufficientStock {
                            available: product.stock,
                            requested: i64::from(quantity),
                        });
                    }

                    cart.set_item_quantity(product.id, quantity, product.price_cents)?;
                    store.commit(txn, &cart).await?;
                    Ok(store.render(txn, &cart).await?)
                })
            })
            .await?;

        info!(user_id, product_id, quantity, "updated cart item");
        Ok(view)
    }

    pub async fn remove_from_cart(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<CartView, CartError> {
        let store = self.store;

        let view = self
            .mutate(user_id, move |txn| {
                Box::pin(async move {
                    let mut cart = store
                        .find(txn, user_id)
                        .await?
                        .ok_or(CartError::CartNotFound)?;
                    cart.remove_item(product_id)?;
                    store.commit(txn, &cart).await?;
                    Ok(store.render(txn, &cart).await?)
                })
            })
            .await?;

        info!(user_id, product_id, "removed from cart");
        Ok(view)
    }

    pub async fn clear_cart(&self, user_id: i32) -> Result<CartView, CartError> {
        let store = self.store;

        let view = self
            .mutate(user_id, move |txn| {
                Box::pin(async move {
                    let mut cart = store
                        .find(txn, user_id)
                        .await?
                        .ok_or(CartError::CartNotFound)?;
                    cart.clear();
                    store.commit(txn, &cart).await?;
                    Ok(store.render(txn, &cart).await?)
                })
            })
            .await?;

        info!(user_id, "cleared cart");
        Ok(view)
    }

    async fn mutate<F>(&self, user_id: i32, operation: F) -> Result<CartView, CartError>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = Result<CartView, CartError>> + Send + 'c>,
            > + Send,
    {
        let guard = self.locks.acquire(user_id).await;
        let result = self.db.transaction::<_, CartView, CartError>(operation).await;
        drop(guard);

        if self.locks.len() > LOCK_PRUNE_THRESHOLD {
            self.locks.prune();
        }

        result.map_err(|err| {
            let err = CartError::from(err);
            if let CartError::Storage(source) = &err {
                warn!(user_id, error = %source, "cart mutation failed in storage");
            }
            err
        })
    }
}

async fn available_product(
    txn: &DatabaseTransaction,
    product_id: i32,
) -> Result<ProductSnapshot, CartError> {
    catalog::find_by_id(txn, product_id)
        .await?
        .filter(|product| product.is_active)
        .ok_or(CartError::ProductUnavailable(product_id))
}

fn ensure_quantity(quantity: i32) -> Result<(), CartError> {
    if quantity < 1 {
        return Err(CartError::InvalidQuantity(quantity));
    }
    Ok(())
}
