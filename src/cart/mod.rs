//! Cart consistency core.
//!
//! [`Cart`] owns the item list and its derived totals, [`CartStore`] loads and
//! persists carts and renders the reader-facing [`CartView`], and
//! [`CartService`] validates every mutation against the product catalog before
//! handing it to the store.

mod error;
mod locks;
mod model;
mod service;
mod store;

pub use error::CartError;
pub use locks::CartLocks;
pub use model::{Cart, CartItem};
pub use service::CartService;
pub use store::{CartStore, CartView, CartViewItem, ProductSummary};
