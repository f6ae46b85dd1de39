//! Stock adjustments and inter-branch transfers.

use tracing::instrument;

use branchstock_core::{BranchId, ProductId, StockError, StockResult};
use branchstock_inventory::{AdjustmentMode, StockAdjustment, StockTransfer};

use crate::gateway::{PersistenceGateway, StockTx};
use crate::ledger;
use crate::services::finish;

/// Administrative stock operations over the inventory ledger.
#[derive(Debug, Clone)]
pub struct StockService<G> {
    gateway: G,
}

impl<G> StockService<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }
}

impl<G: PersistenceGateway> StockService<G> {
    /// Quantity on hand for one (branch, product) pair; `None` when the pair
    /// has never been stocked.
    ///
    /// Reads current storage state in its own (discarded) transaction; no
    /// quantity is ever cached across requests.
    #[instrument(
        skip(self),
        fields(branch_id = %branch_id, product_id = %product_id),
        err
    )]
    pub async fn quantity_on_hand(
        &self,
        branch_id: BranchId,
        product_id: ProductId,
    ) -> StockResult<Option<i64>> {
        let mut tx = self.gateway.begin().await?;
        let quantity = ledger::quantity(&mut tx, branch_id, product_id).await;

        // Read-only: there is nothing to keep either way.
        if let Err(rollback_err) = tx.rollback().await {
            tracing::warn!(error = %rollback_err, "discarding read-only transaction failed");
        }
        quantity
    }

    /// Apply one administrative correction in its own transaction.
    ///
    /// `Add` creates the record when absent; `Reduce` goes through the strict
    /// ledger decrease so callers can distinguish "never stocked"
    /// (`RecordNotFound`) from "stocked out" (`InsufficientStock`).
    #[instrument(
        skip(self, adjustment),
        fields(
            branch_id = %adjustment.branch_id(),
            product_id = %adjustment.product_id(),
            quantity = adjustment.quantity(),
            mode = ?adjustment.mode(),
        ),
        err
    )]
    pub async fn adjust_stock(&self, adjustment: StockAdjustment) -> StockResult<()> {
        let mut tx = self.gateway.begin().await?;

        let result = match adjustment.mode() {
            AdjustmentMode::Add => {
                ledger::increase(
                    &mut tx,
                    adjustment.branch_id(),
                    adjustment.product_id(),
                    adjustment.quantity(),
                )
                .await
            }
            AdjustmentMode::Reduce => {
                ledger::decrease(
                    &mut tx,
                    adjustment.branch_id(),
                    adjustment.product_id(),
                    adjustment.quantity(),
                )
                .await
            }
        };

        finish(tx, result).await
    }

    /// Overwrite the quantity of one ledger row, creating it when absent.
    ///
    /// Direct administrative correction; the only rule is that the new
    /// quantity must not be negative.
    #[instrument(
        skip(self),
        fields(branch_id = %branch_id, product_id = %product_id, quantity),
        err
    )]
    pub async fn set_quantity(
        &self,
        branch_id: BranchId,
        product_id: ProductId,
        quantity: i64,
    ) -> StockResult<()> {
        if quantity < 0 {
            return Err(StockError::invalid_amount(quantity));
        }

        let mut tx = self.gateway.begin().await?;
        let result = tx
            .write_quantity(branch_id, product_id, quantity)
            .await
            .map_err(StockError::from);

        finish(tx, result).await
    }

    /// Move quantity between two branches' ledger rows as one atomic step.
    ///
    /// Within one transaction: consume from the source (an absent or short
    /// source yields `InsufficientStock`), then increase the destination,
    /// creating its record when absent. Commits only when both legs succeed,
    /// so no partial transfer is ever observable.
    #[instrument(
        skip(self, transfer),
        fields(
            from_branch = %transfer.from_branch(),
            to_branch = %transfer.to_branch(),
            product_id = %transfer.product_id(),
            quantity = transfer.quantity(),
        ),
        err
    )]
    pub async fn transfer_stock(&self, transfer: StockTransfer) -> StockResult<()> {
        let mut tx = self.gateway.begin().await?;
        let result = transfer_legs(&mut tx, &transfer).await;
        finish(tx, result).await
    }
}

/// Both legs of a transfer; a failed source leg prevents the destination leg
/// from being attempted.
async fn transfer_legs<T: StockTx>(tx: &mut T, transfer: &StockTransfer) -> StockResult<()> {
    ledger::consume(
        tx,
        transfer.from_branch(),
        transfer.product_id(),
        transfer.quantity(),
    )
    .await?;

    ledger::increase(
        tx,
        transfer.to_branch(),
        transfer.product_id(),
        transfer.quantity(),
    )
    .await?;

    Ok(())
}
