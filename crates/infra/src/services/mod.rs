//! Transactional services: the operation set exposed to request handlers.
//!
//! Each top-level operation (place order, transfer stock, adjust stock) runs
//! as exactly one gateway transaction. Validation failures are returned
//! before a transaction is opened; mid-transaction failures roll back in
//! full, so the caller never observes a partial effect.

pub mod orders;
pub mod stock;

pub use orders::OrderService;
pub use stock::StockService;

use branchstock_core::StockResult;

use crate::gateway::StockTx;

/// Commit on success, roll back on failure, preserving the original error.
pub(crate) async fn finish<T: StockTx>(tx: T, result: StockResult<()>) -> StockResult<()> {
    match result {
        Ok(()) => {
            tx.commit().await?;
            Ok(())
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback after failed operation also failed");
            }
            Err(err)
        }
    }
}
