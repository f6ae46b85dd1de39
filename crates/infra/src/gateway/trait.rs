use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use branchstock_core::{BranchId, CustomerId, OrderId, ProductId, StockError};

/// An order header row ready to be inserted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub branch_id: BranchId,
    /// Absent for guest orders.
    pub customer_id: Option<CustomerId>,
    pub ordered_at: DateTime<Utc>,
}

/// An order line row ready to be inserted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

/// Persistence gateway operation error.
///
/// These are **infrastructure errors** (storage, conflicts, connectivity) as
/// opposed to domain errors (validation, invariants). At the service
/// boundary they are carried to callers as `StockError::Transaction`; the
/// core never retries, and it never substitutes fallback data for a failed
/// read or write.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The transaction lost a conflict (serialization failure, deadlock,
    /// unique violation). Retryable by the caller.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// Storage could not be reached (pool closed, connection failure).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Any other storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<GatewayError> for StockError {
    fn from(value: GatewayError) -> Self {
        StockError::transaction(value.to_string())
    }
}

/// One open transaction against the ledger and order storage.
///
/// ## Transaction Semantics
///
/// - Writes become visible to other transactions only after `commit`.
/// - `rollback` discards every staged write; so does dropping the
///   transaction without committing (caller timeout or disconnect therefore
///   rolls back in full).
/// - `read_quantity` is a **locking read**: the (branch, product) row stays
///   locked (or equivalently protected) for the remainder of the
///   transaction, so the quantity observed is still accurate at the moment
///   of a later `write_quantity` in the same transaction. This is what rules
///   out two concurrent operations both passing the same availability check.
/// - The locking read covers rows that do not exist yet: two transactions
///   reading the same never-stocked pair must serialize, so neither of two
///   concurrent first stockings can clobber the other.
///
/// ## Implementation Requirements
///
/// Implementations must:
/// - apply the writes of a committed transaction atomically (all or nothing)
/// - serialize the check-then-write window per ledger row, absent rows
///   included (row locks, a coarser lock, or optimistic retry surfaced as
///   [`GatewayError::Conflict`])
/// - never expose a partially applied transaction to readers
#[async_trait]
pub trait StockTx: Send {
    /// Quantity on hand for one ledger row, locking it for the remainder of
    /// the transaction. `None` when the pair has never been stocked.
    async fn read_quantity(
        &mut self,
        branch_id: BranchId,
        product_id: ProductId,
    ) -> Result<Option<i64>, GatewayError>;

    /// Stage the new quantity for one ledger row, creating the row when
    /// absent (upsert).
    async fn write_quantity(
        &mut self,
        branch_id: BranchId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), GatewayError>;

    /// Stage an order header row.
    async fn insert_order(&mut self, order: &NewOrder) -> Result<(), GatewayError>;

    /// Stage an order line row belonging to a previously inserted order.
    async fn insert_line_item(
        &mut self,
        order_id: OrderId,
        line: &NewLineItem,
    ) -> Result<(), GatewayError>;

    /// Make every staged write durable and visible, atomically.
    async fn commit(self) -> Result<(), GatewayError>;

    /// Discard every staged write.
    async fn rollback(self) -> Result<(), GatewayError>;
}

/// Factory for transactions. Shared across concurrent requests.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    type Tx: StockTx;

    /// Open a new transaction.
    async fn begin(&self) -> Result<Self::Tx, GatewayError>;
}
