use serde::{Deserialize, Serialize};

use branchstock_core::{BranchId, ProductId, StockError, StockResult};

/// Quantity on hand for one (branch, product) pair.
///
/// This is the only shared mutable record in the system. The invariant is
/// `quantity >= 0` at all times; both mutation helpers return a new level
/// and refuse any change that would break it, so a caller can only persist
/// states that satisfy the invariant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub branch_id: BranchId,
    pub product_id: ProductId,
    pub quantity: i64,
}

impl StockLevel {
    /// Build a stock level, rejecting negative quantities.
    pub fn new(branch_id: BranchId, product_id: ProductId, quantity: i64) -> StockResult<Self> {
        if quantity < 0 {
            return Err(StockError::invalid_amount(quantity));
        }
        Ok(Self {
            branch_id,
            product_id,
            quantity,
        })
    }

    /// A record that has never been stocked (quantity 0).
    pub fn empty(branch_id: BranchId, product_id: ProductId) -> Self {
        Self {
            branch_id,
            product_id,
            quantity: 0,
        }
    }

    /// Return the level with `amount` added. `amount` must be positive.
    pub fn increased(&self, amount: i64) -> StockResult<Self> {
        if amount <= 0 {
            return Err(StockError::invalid_amount(amount));
        }
        Ok(Self {
            quantity: self.quantity + amount,
            ..*self
        })
    }

    /// Return the level with `amount` removed. `amount` must be positive and
    /// no greater than the quantity on hand; the quantity never goes negative.
    pub fn decreased(&self, amount: i64) -> StockResult<Self> {
        if amount <= 0 {
            return Err(StockError::invalid_amount(amount));
        }
        if self.quantity < amount {
            return Err(StockError::insufficient(
                self.branch_id,
                self.product_id,
                amount,
                self.quantity,
            ));
        }
        Ok(Self {
            quantity: self.quantity - amount,
            ..*self
        })
    }
}
