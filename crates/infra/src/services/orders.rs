//! Order placement (the order assembler).

use chrono::Utc;
use tracing::instrument;

use branchstock_core::{OrderId, StockResult};
use branchstock_orders::OrderDraft;

use crate::gateway::{NewLineItem, NewOrder, PersistenceGateway, StockTx};
use crate::ledger;
use crate::services::finish;

/// Turns a proposed order into a persisted order plus its line items,
/// contingent on stock availability for every line.
#[derive(Debug, Clone)]
pub struct OrderService<G> {
    gateway: G,
}

impl<G> OrderService<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }
}

impl<G: PersistenceGateway> OrderService<G> {
    /// Place an order.
    ///
    /// The draft is validated before any transaction is opened (`EmptyOrder`,
    /// `InvalidAmount`). The placement itself runs as one transaction: the
    /// order header, every line item and every stock decrement commit
    /// together or not at all. A line exceeding available stock aborts the
    /// whole transaction with `InsufficientStock` naming the offending
    /// product — no line is partially committed and no quantity changes.
    #[instrument(
        skip(self, draft),
        fields(branch_id = %draft.branch_id, lines = draft.lines.len()),
        err
    )]
    pub async fn place_order(&self, draft: OrderDraft) -> StockResult<OrderId> {
        draft.validate()?;

        let order_id = OrderId::new();
        let mut tx = self.gateway.begin().await?;

        tx.insert_order(&NewOrder {
            order_id,
            branch_id: draft.branch_id,
            customer_id: draft.customer_id,
            ordered_at: Utc::now(),
        })
        .await?;

        let result = fulfil_lines(&mut tx, &draft, order_id).await;
        finish(tx, result).await?;

        tracing::debug!(%order_id, "order placed");
        Ok(order_id)
    }
}

/// Insert each requested line and consume its stock, in submitted order.
async fn fulfil_lines<T: StockTx>(
    tx: &mut T,
    draft: &OrderDraft,
    order_id: OrderId,
) -> StockResult<()> {
    for (idx, line) in draft.lines.iter().enumerate() {
        tx.insert_line_item(
            order_id,
            &NewLineItem {
                line_no: idx as u32 + 1,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            },
        )
        .await?;

        ledger::consume(tx, draft.branch_id, line.product_id, line.quantity).await?;
    }
    Ok(())
}
