use sea_orm::{DbErr, TransactionError};
use thiserror::Error;

/// Failures of a cart operation. Every business-rule variant leaves the cart
/// exactly as it was before the call.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Product {0} not found or inactive")]
    ProductUnavailable(i32),
    #[error("Insufficient stock. Available: {available}, requested: {requested}")]
    InsufficientStock { available: i32, requested: i64 },
    #[error("Cart not found")]
    CartNotFound,
    #[error("Product {0} is not in the cart")]
    ItemNotFound(i32),
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i32),
    #[error("Cart total exceeds the supported amount")]
    TotalOverflow,
    #[error("storage failure: {0}")]
    Storage(#[from] DbErr),
}

impl From<TransactionError<CartError>> for CartError {
    fn from(err: TransactionError<CartError>) -> Self {
        match err {
            TransactionError::Connection(db) => CartError::Storage(db),
            TransactionError::Transaction(cart) => cart,
        }
    }
}
