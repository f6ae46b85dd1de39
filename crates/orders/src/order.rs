use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use branchstock_core::{BranchId, CustomerId, OrderId, ProductId, StockError, StockResult};

/// Order line: product, quantity, unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents), captured at order
    /// time. Later product price changes do not affect existing orders.
    pub unit_price: u64,
}

/// A persisted order with its line items.
///
/// Immutable once created: payment and status changes live outside this
/// core. An order always carries at least one line; the two are written
/// atomically or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub branch_id: BranchId,
    /// Absent for guest orders.
    pub customer_id: Option<CustomerId>,
    pub ordered_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

/// One requested line of a not-yet-placed order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLine {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

/// A proposed order: branch, optional customer, requested line items.
///
/// `validate` is the fail-fast gate of order placement: every rule it
/// enforces is checked before any transaction is opened, so a rejected
/// draft leaves no partial state anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub branch_id: BranchId,
    pub customer_id: Option<CustomerId>,
    pub lines: Vec<DraftLine>,
}

impl OrderDraft {
    pub fn new(
        branch_id: BranchId,
        customer_id: Option<CustomerId>,
        lines: Vec<DraftLine>,
    ) -> Self {
        Self {
            branch_id,
            customer_id,
            lines,
        }
    }

    /// Check the draft against the pre-transaction rules.
    ///
    /// - at least one line (`EmptyOrder`)
    /// - every quantity positive (`InvalidAmount`)
    /// - every unit price positive (`InvalidAmount`)
    pub fn validate(&self) -> StockResult<()> {
        if self.lines.is_empty() {
            return Err(StockError::EmptyOrder);
        }
        for line in &self.lines {
            if line.quantity <= 0 {
                return Err(StockError::invalid_amount(line.quantity));
            }
            if line.unit_price == 0 {
                return Err(StockError::invalid_amount(0));
            }
        }
        Ok(())
    }
}

impl Order {
    /// Total order value in smallest currency unit.
    pub fn total(&self) -> u64 {
        self.lines
            .iter()
            .map(|l| l.quantity as u64 * l.unit_price)
            .sum()
    }
}
