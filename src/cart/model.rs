use chrono::{DateTime, Utc};

use crate::cart::CartError;
use crate::entities::{cart, cart_item};

/// A line item. `price_cents` is the unit price captured when the item was
/// added or last updated, not the product's live price.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartItem {
    pub(crate) row_id: Option<i32>,
    pub product_id: i32,
    pub quantity: i32,
    pub price_cents: i64,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// `None` when the line total does not fit in an `i64`.
    pub fn line_total_cents(&self) -> Option<i64> {
        self.price_cents.checked_mul(i64::from(self.quantity))
    }
}

impl From<cart_item::Model> for CartItem {
    fn from(row: cart_item::Model) -> Self {
        CartItem {
            row_id: Some(row.id),
            product_id: row.product_id,
            quantity: row.quantity,
            price_cents: row.price_cents,
            added_at: row.added_at,
        }
    }
}

/// Item count and price total over `(quantity, unit price)` lines, or
/// [`CartError::TotalOverflow`] when either sum leaves the `i64` range.
pub(crate) fn checked_totals<I>(lines: I) -> Result<(i64, i64), CartError>
where
    I: IntoIterator<Item = (i32, i64)>,
{
    lines
        .into_iter()
        .try_fold((0i64, 0i64), |(items, price), (quantity, unit_cents)| {
            let line = unit_cents.checked_mul(i64::from(quantity))?;
            Some((items.checked_add(i64::from(quantity))?, price.checked_add(line)?))
        })
        .ok_or(CartError::TotalOverflow)
}

/// A user's cart with its ordered items.
///
/// Items keep the order in which products were first added and hold at most
/// one entry per product. The totals are private and every mutator finishes by
/// recomputing them, so they can never be read out of sync with `items`. A
/// change whose totals would overflow is refused and leaves the cart as it was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cart {
    id: i32,
    user_id: i32,
    items: Vec<CartItem>,
    total_items: i64,
    total_price_cents: i64,
}

impl Cart {
    pub fn new(id: i32, user_id: i32) -> Self {
        Cart {
            id,
            user_id,
            items: Vec::new(),
            total_items: 0,
            total_price_cents: 0,
        }
    }

    /// Rebuilds a cart from its stored rows. `items` must already be in
    /// insertion order.
    pub(crate) fn from_rows(
        row: cart::Model,
        items: Vec<cart_item::Model>,
    ) -> Result<Self, CartError> {
        let mut cart = Cart::new(row.id, row.user_id);
        cart.apply(|lines| {
            lines.extend(items.into_iter().map(CartItem::from));
            Ok(())
        })?;
        Ok(cart)
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn item(&self, product_id: i32) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    pub fn total_items(&self) -> i64 {
        self.total_items
    }

    pub fn total_price_cents(&self) -> i64 {
        self.total_price_cents
    }

    /// Adds `quantity` to the existing line for `product_id` and refreshes its
    /// price snapshot, or appends a new line.
    pub fn upsert_item(
        &mut self,
        product_id: i32,
        quantity: i32,
        price_cents: i64,
        now: DateTime<Utc>,
    ) -> Result<(), CartError> {
        self.apply(|items| {
            match items.iter_mut().find(|item| item.product_id == product_id) {
                Some(item) => {
                    item.quantity = item
                        .quantity
                        .checked_add(quantity)
                        .ok_or(CartError::TotalOverflow)?;
                    item.price_cents = price_cents;
                }
                None => items.push(CartItem {
                    row_id: None,
                    product_id,
                    quantity,
                    price_cents,
                    added_at: now,
                }),
            }
            Ok(())
        })
    }

    /// Replaces quantity and price of an existing line in place.
    pub fn set_item_quantity(
        &mut self,
        product_id: i32,
        quantity: i32,
        price_cents: i64,
    ) -> Result<(), CartError> {
        self.apply(|items| {
            let item = items
                .iter_mut()
                .find(|item| item.product_id == product_id)
                .ok_or(CartError::ItemNotFound(product_id))?;
            item.quantity = quantity;
            item.price_cents = price_cents;
            Ok(())
        })
    }

    pub fn remove_item(&mut self, product_id: i32) -> Result<CartItem, CartError> {
        self.apply(|items| {
            let index = items
                .iter()
                .position(|item| item.product_id == product_id)
                .ok_or(CartError::ItemNotFound(product_id))?;
            Ok(items.remove(index))
        })
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.total_items = 0;
        self.total_price_cents = 0;
    }

    /// Runs `change` on a copy of the items and keeps the result only when the
    /// change succeeds and the new totals fit.
    fn apply<T, F>(&mut self, change: F) -> Result<T, CartError>
    where
        F: FnOnce(&mut Vec<CartItem>) -> Result<T, CartError>,
    {
        let mut items = self.items.clone();
        let outcome = change(&mut items)?;
        let (total_items, total_price_cents) =
            checked_totals(items.iter().map(|i| (i.quantity, i.price_cents)))?;

        self.items = items;
        self.total_items = total_items;
        self.total_price_cents = total_price_cents;
        Ok(outcome)
    }
}

mod tests {
    use super::*;

    fn product_ids(cart: &Cart) -> Vec<i32> {
        cart.items().iter().map(|i| i.product_id).collect()
    }

    #[test]
    fn new_cart_is_empty() {
        let cart = Cart::new(1, 7);
        assert!(cart.items().is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price_cents(), 0);
        assert_eq!(cart.user_id(), 7);
    }

    #[test]
    fn upsert_merges_same_product_and_refreshes_price() {
        let mut cart = Cart::new(1, 7);
        let first_added = Utc::now();
        cart.upsert_item(10, 2, 500, first_added).unwrap();
        cart.upsert_item(20, 1, 1_000, Utc::now()).unwrap();
        cart.upsert_item(10, 3, 450, Utc::now()).unwrap();

        assert_eq!(product_ids(&cart), vec![10, 20]);
        let merged = cart.item(10).unwrap();
        assert_eq!(merged.quantity, 5);
        assert_eq!(merged.price_cents, 450);
        assert_eq!(merged.added_at, first_added);
        assert_eq!(cart.total_items(), 6);
        assert_eq!(cart.total_price_cents(), 5 * 450 + 1_000);
    }

    #[test]
    fn set_item_quantity_replaces_in_place() {
        let mut cart = Cart::new(1, 7);
        cart.upsert_item(10, 2, 500, Utc::now()).unwrap();
        cart.upsert_item(20, 1, 1_000, Utc::now()).unwrap();

        cart.set_item_quantity(10, 7, 600).unwrap();

        assert_eq!(product_ids(&cart), vec![10, 20]);
        assert_eq!(cart.item(10).unwrap().quantity, 7);
        assert_eq!(cart.total_items(), 8);
        assert_eq!(cart.total_price_cents(), 7 * 600 + 1_000);
    }

    #[test]
    fn set_item_quantity_on_missing_item_fails_without_change() {
        let mut cart = Cart::new(1, 7);
        cart.upsert_item(10, 2, 500, Utc::now()).unwrap();
        let before = cart.clone();

        let err = cart.set_item_quantity(99, 1, 100).unwrap_err();

        assert!(matches!(err, CartError::ItemNotFound(99)));
        assert_eq!(cart, before);
    }

    #[test]
    fn remove_item_keeps_relative_order() {
        let mut cart = Cart::new(1, 7);
        for product_id in [1, 2, 3, 4] {
            cart.upsert_item(product_id, 1, 100, Utc::now()).unwrap();
        }

        let removed = cart.remove_item(2).unwrap();

        assert_eq!(removed.product_id, 2);
        assert_eq!(product_ids(&cart), vec![1, 3, 4]);
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price_cents(), 300);
        assert!(matches!(cart.remove_item(2), Err(CartError::ItemNotFound(2))));
    }

    #[test]
    fn clear_resets_totals() {
        let mut cart = Cart::new(1, 7);
        cart.upsert_item(1, 4, 250, Utc::now()).unwrap();

        cart.clear();

        assert!(cart.items().is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price_cents(), 0);
    }

    #[test]
    fn overflowing_totals_are_refused_without_change() {
        let huge = i64::MAX / 2 + 1;
        let mut cart = Cart::new(1, 7);
        cart.upsert_item(10, 1, huge, Utc::now()).unwrap();
        let before = cart.clone();

        assert!(matches!(
            cart.upsert_item(10, 1, huge, Utc::now()),
            Err(CartError::TotalOverflow)
        ));
        assert!(matches!(
            cart.upsert_item(20, 1, huge, Utc::now()),
            Err(CartError::TotalOverflow)
        ));
        assert!(matches!(
            cart.set_item_quantity(10, 2, huge),
            Err(CartError::TotalOverflow)
        ));
        assert_eq!(cart, before);
        assert_eq!(cart.total_price_cents(), huge);
    }

    #[test]
    fn line_total_reports_overflow() {
        let item = CartItem {
            row_id: None,
            product_id: 1,
            quantity: 3,
            price_cents: i64::MAX / 2,
            added_at: Utc::now(),
        };
        assert_eq!(item.line_total_cents(), None);
        assert_eq!(
            checked_totals([(2, 150), (1, 1_000)]).unwrap(),
            (3, 1_300)
        );
    }
}
