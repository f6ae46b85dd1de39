use serde::{Deserialize, Serialize};

use branchstock_core::{BranchId, ProductId, StockError, StockResult};

/// One inter-branch transfer request.
///
/// Transient value object: it describes a single transfer operation's input
/// and is never persisted. Construction enforces the pre-transaction
/// validation rules, and deserialization routes through the same
/// constructor, so a `StockTransfer` in hand is always well-formed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTransfer")]
pub struct StockTransfer {
    from_branch: BranchId,
    to_branch: BranchId,
    product_id: ProductId,
    quantity: i64,
}

/// Unvalidated wire shape; converted through [`StockTransfer::new`].
#[derive(Deserialize)]
struct RawTransfer {
    from_branch: BranchId,
    to_branch: BranchId,
    product_id: ProductId,
    quantity: i64,
}

impl TryFrom<RawTransfer> for StockTransfer {
    type Error = StockError;

    fn try_from(raw: RawTransfer) -> StockResult<Self> {
        Self::new(raw.from_branch, raw.to_branch, raw.product_id, raw.quantity)
    }
}

impl StockTransfer {
    /// Validate and build a transfer request.
    ///
    /// Fails with `SameBranch` when source equals destination and with
    /// `InvalidAmount` when the quantity is zero or negative. Neither case
    /// opens a transaction.
    pub fn new(
        from_branch: BranchId,
        to_branch: BranchId,
        product_id: ProductId,
        quantity: i64,
    ) -> StockResult<Self> {
        if from_branch == to_branch {
            return Err(StockError::SameBranch(from_branch));
        }
        if quantity <= 0 {
            return Err(StockError::invalid_amount(quantity));
        }
        Ok(Self {
            from_branch,
            to_branch,
            product_id,
            quantity,
        })
    }

    pub fn from_branch(&self) -> BranchId {
        self.from_branch
    }

    pub fn to_branch(&self) -> BranchId {
        self.to_branch
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }
}
