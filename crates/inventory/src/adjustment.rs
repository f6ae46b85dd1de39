use serde::{Deserialize, Serialize};

use branchstock_core::{BranchId, ProductId, StockError, StockResult};

/// Direction of an administrative stock correction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentMode {
    Add,
    Reduce,
}

/// One administrative stock correction (add or reduce) for a single
/// (branch, product) ledger row.
///
/// Like [`crate::StockTransfer`], construction performs the pre-transaction
/// validation (the quantity must be positive regardless of mode), and
/// deserialization routes through the same constructor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAdjustment")]
pub struct StockAdjustment {
    branch_id: BranchId,
    product_id: ProductId,
    quantity: i64,
    mode: AdjustmentMode,
}

/// Unvalidated wire shape; converted through [`StockAdjustment::new`].
#[derive(Deserialize)]
struct RawAdjustment {
    branch_id: BranchId,
    product_id: ProductId,
    quantity: i64,
    mode: AdjustmentMode,
}

impl TryFrom<RawAdjustment> for StockAdjustment {
    type Error = StockError;

    fn try_from(raw: RawAdjustment) -> StockResult<Self> {
        Self::new(raw.branch_id, raw.product_id, raw.quantity, raw.mode)
    }
}

impl StockAdjustment {
    pub fn new(
        branch_id: BranchId,
        product_id: ProductId,
        quantity: i64,
        mode: AdjustmentMode,
    ) -> StockResult<Self> {
        if quantity <= 0 {
            return Err(StockError::invalid_amount(quantity));
        }
        Ok(Self {
            branch_id,
            product_id,
            quantity,
            mode,
        })
    }

    pub fn branch_id(&self) -> BranchId {
        self.branch_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn mode(&self) -> AdjustmentMode {
        self.mode
    }
}
