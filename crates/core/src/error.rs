//! Domain error model.

use thiserror::Error;

use crate::id::{BranchId, ProductId};

/// Result type used across the domain layer.
pub type StockResult<T> = Result<T, StockError>;

/// Domain-level error for stock and order operations.
///
/// Keep this focused on deterministic business failures (validation,
/// invariants). Infrastructure concerns belong elsewhere; when storage
/// cannot commit, the failure is carried as [`StockError::Transaction`]
/// for the caller to retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// A quantity or amount was zero or negative where a positive value is
    /// required. Detected before any write.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    /// No inventory record exists for the (branch, product) pair where
    /// presence is required.
    #[error("no inventory record for product {product_id} at branch {branch_id}")]
    RecordNotFound {
        branch_id: BranchId,
        product_id: ProductId,
    },

    /// The requested quantity exceeds the quantity on hand.
    #[error(
        "insufficient stock for product {product_id} at branch {branch_id}: \
         requested {requested}, available {available}"
    )]
    InsufficientStock {
        branch_id: BranchId,
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// Transfer source and destination are the same branch.
    #[error("cannot transfer stock to the same branch: {0}")]
    SameBranch(BranchId),

    /// An order draft contained no line items.
    #[error("order must contain at least one line item")]
    EmptyOrder,

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The underlying storage could not complete the transaction. Surfaced
    /// as-is; retry policy belongs to the caller.
    #[error("transaction failed: {0}")]
    Transaction(String),
}

impl StockError {
    pub fn invalid_amount(amount: i64) -> Self {
        Self::InvalidAmount(amount)
    }

    pub fn record_not_found(branch_id: BranchId, product_id: ProductId) -> Self {
        Self::RecordNotFound {
            branch_id,
            product_id,
        }
    }

    pub fn insufficient(
        branch_id: BranchId,
        product_id: ProductId,
        requested: i64,
        available: i64,
    ) -> Self {
        Self::InsufficientStock {
            branch_id,
            product_id,
            requested,
            available,
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn transaction(msg: impl Into<String>) -> Self {
        Self::Transaction(msg.into())
    }
}
