//! Integration tests for the full transactional pipeline.
//!
//! Tests: OrderDraft / StockTransfer / StockAdjustment → services → gateway.
//!
//! Verifies:
//! - Orders commit fully or not at all (no partial line items, no partial decrements)
//! - Transfers move stock atomically between branches
//! - Concurrent placements against the same row cannot both win
//! - Storage failures propagate instead of being masked by fallback data

#[cfg(test)]
mod tests {
    use branchstock_core::{BranchId, CustomerId, ProductId, StockError};
    use branchstock_inventory::{AdjustmentMode, StockAdjustment, StockTransfer};
    use branchstock_orders::{DraftLine, OrderDraft};

    use crate::gateway::{GatewayError, InMemoryGateway, InMemoryTx, PersistenceGateway};
    use crate::services::{OrderService, StockService};

    fn setup() -> (InMemoryGateway, OrderService<InMemoryGateway>, StockService<InMemoryGateway>) {
        branchstock_observability::tracing::init();
        let gateway = InMemoryGateway::new();
        let orders = OrderService::new(gateway.clone());
        let stock = StockService::new(gateway.clone());
        (gateway, orders, stock)
    }

    fn line(product_id: ProductId, quantity: i64, unit_price: u64) -> DraftLine {
        DraftLine {
            product_id,
            quantity,
            unit_price,
        }
    }

    #[tokio::test]
    async fn add_then_order_lifecycle() {
        let (gateway, orders, stock) = setup();
        let branch = BranchId::new();
        let product = ProductId::new();
        gateway.seed_quantity(branch, product, 10).await;

        // Add 5 → 15.
        stock
            .adjust_stock(
                StockAdjustment::new(branch, product, 5, AdjustmentMode::Add).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(gateway.quantity(branch, product).await, Some(15));

        // Ordering 20 fails and changes nothing.
        let err = orders
            .place_order(OrderDraft::new(branch, None, vec![line(product, 20, 300)]))
            .await
            .unwrap_err();
        assert_eq!(err, StockError::insufficient(branch, product, 20, 15));
        assert_eq!(gateway.quantity(branch, product).await, Some(15));
        assert_eq!(gateway.order_count().await, 0);

        // Ordering 15 succeeds and empties the row.
        let order_id = orders
            .place_order(OrderDraft::new(branch, None, vec![line(product, 15, 300)]))
            .await
            .unwrap();
        assert_eq!(gateway.quantity(branch, product).await, Some(0));

        let order = gateway.order(order_id).await.unwrap();
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].quantity, 15);
        assert_eq!(order.lines[0].unit_price, 300);
    }

    #[tokio::test]
    async fn short_line_rolls_back_the_whole_order() {
        let (gateway, orders, _) = setup();
        let branch = BranchId::new();
        let plentiful = ProductId::new();
        let scarce = ProductId::new();
        gateway.seed_quantity(branch, plentiful, 100).await;
        gateway.seed_quantity(branch, scarce, 1).await;

        let err = orders
            .place_order(OrderDraft::new(
                branch,
                Some(CustomerId::new()),
                vec![line(plentiful, 10, 250), line(scarce, 2, 400)],
            ))
            .await
            .unwrap_err();

        // The error names the offending product, and *all* lines roll back:
        // the plentiful product's decrement is undone too.
        assert_eq!(err, StockError::insufficient(branch, scarce, 2, 1));
        assert_eq!(gateway.quantity(branch, plentiful).await, Some(100));
        assert_eq!(gateway.quantity(branch, scarce).await, Some(1));
        assert_eq!(gateway.order_count().await, 0);
    }

    #[tokio::test]
    async fn order_captures_price_and_customer_at_order_time() {
        let (gateway, orders, _) = setup();
        let branch = BranchId::new();
        let product = ProductId::new();
        let customer = CustomerId::new();
        gateway.seed_quantity(branch, product, 5).await;

        let order_id = orders
            .place_order(OrderDraft::new(
                branch,
                Some(customer),
                vec![line(product, 2, 199)],
            ))
            .await
            .unwrap();

        let order = gateway.order(order_id).await.unwrap();
        assert_eq!(order.branch_id, branch);
        assert_eq!(order.customer_id, Some(customer));
        assert_eq!(order.lines[0].line_no, 1);
        assert_eq!(order.lines[0].unit_price, 199);
        assert_eq!(order.total(), 398);
    }

    #[tokio::test]
    async fn guest_order_without_customer_is_accepted() {
        let (gateway, orders, _) = setup();
        let branch = BranchId::new();
        let product = ProductId::new();
        gateway.seed_quantity(branch, product, 3).await;

        let order_id = orders
            .place_order(OrderDraft::new(branch, None, vec![line(product, 3, 100)]))
            .await
            .unwrap();

        assert_eq!(gateway.order(order_id).await.unwrap().customer_id, None);
    }

    #[tokio::test]
    async fn invalid_drafts_are_rejected_before_any_write() {
        let (gateway, orders, _) = setup();
        let branch = BranchId::new();
        let product = ProductId::new();
        gateway.seed_quantity(branch, product, 10).await;

        let empty = OrderDraft::new(branch, None, vec![]);
        assert_eq!(orders.place_order(empty).await.unwrap_err(), StockError::EmptyOrder);

        let zero_quantity = OrderDraft::new(branch, None, vec![line(product, 0, 100)]);
        assert_eq!(
            orders.place_order(zero_quantity).await.unwrap_err(),
            StockError::InvalidAmount(0)
        );

        let free_item = OrderDraft::new(branch, None, vec![line(product, 1, 0)]);
        assert_eq!(
            orders.place_order(free_item).await.unwrap_err(),
            StockError::InvalidAmount(0)
        );

        assert_eq!(gateway.quantity(branch, product).await, Some(10));
        assert_eq!(gateway.order_count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_orders_cannot_both_drain_the_same_stock() {
        let (gateway, orders, _) = setup();
        let branch = BranchId::new();
        let product = ProductId::new();
        gateway.seed_quantity(branch, product, 5).await;

        let draft = OrderDraft::new(branch, None, vec![line(product, 5, 100)]);

        let orders_a = orders.clone();
        let orders_b = orders.clone();
        let draft_a = draft.clone();
        let draft_b = draft;

        let (a, b) = tokio::join!(
            tokio::spawn(async move { orders_a.place_order(draft_a).await }),
            tokio::spawn(async move { orders_b.place_order(draft_b).await }),
        );
        let results = [a.unwrap(), b.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one placement must win");

        let loser = results.iter().find(|r| r.is_err()).unwrap();
        assert_eq!(
            loser.clone().unwrap_err(),
            StockError::insufficient(branch, product, 5, 0)
        );

        assert_eq!(gateway.quantity(branch, product).await, Some(0));
        assert_eq!(gateway.order_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_first_stockings_both_count() {
        let (gateway, _, stock) = setup();
        let branch = BranchId::new();
        let product = ProductId::new();

        // The pair has never been stocked; both additions create the row.
        let stock_a = stock.clone();
        let stock_b = stock.clone();
        let (a, b) = tokio::join!(
            tokio::spawn(async move {
                stock_a
                    .adjust_stock(
                        StockAdjustment::new(branch, product, 5, AdjustmentMode::Add).unwrap(),
                    )
                    .await
            }),
            tokio::spawn(async move {
                stock_b
                    .adjust_stock(
                        StockAdjustment::new(branch, product, 7, AdjustmentMode::Add).unwrap(),
                    )
                    .await
            }),
        );
        a.unwrap().unwrap();
        b.unwrap().unwrap();

        // Neither first stocking may clobber the other.
        assert_eq!(gateway.quantity(branch, product).await, Some(12));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_transfers_into_new_destination_both_arrive() {
        let (gateway, _, stock) = setup();
        let source_a = BranchId::new();
        let source_b = BranchId::new();
        let destination = BranchId::new();
        let product = ProductId::new();
        gateway.seed_quantity(source_a, product, 10).await;
        gateway.seed_quantity(source_b, product, 7).await;

        let stock_a = stock.clone();
        let stock_b = stock.clone();
        let (a, b) = tokio::join!(
            tokio::spawn(async move {
                stock_a
                    .transfer_stock(
                        StockTransfer::new(source_a, destination, product, 10).unwrap(),
                    )
                    .await
            }),
            tokio::spawn(async move {
                stock_b
                    .transfer_stock(
                        StockTransfer::new(source_b, destination, product, 7).unwrap(),
                    )
                    .await
            }),
        );
        a.unwrap().unwrap();
        b.unwrap().unwrap();

        // Both source decrements committed, so both destination increments
        // must have as well.
        assert_eq!(gateway.quantity(source_a, product).await, Some(0));
        assert_eq!(gateway.quantity(source_b, product).await, Some(0));
        assert_eq!(gateway.quantity(destination, product).await, Some(17));
    }

    #[tokio::test]
    async fn transfer_moves_quantity_between_branches() {
        let (gateway, _, stock) = setup();
        let source = BranchId::new();
        let destination = BranchId::new();
        let product = ProductId::new();
        gateway.seed_quantity(source, product, 50).await;

        // Destination record does not exist yet; the transfer creates it.
        stock
            .transfer_stock(StockTransfer::new(source, destination, product, 20).unwrap())
            .await
            .unwrap();

        assert_eq!(gateway.quantity(source, product).await, Some(30));
        assert_eq!(gateway.quantity(destination, product).await, Some(20));
    }

    #[tokio::test]
    async fn short_transfer_changes_neither_branch() {
        let (gateway, _, stock) = setup();
        let source = BranchId::new();
        let destination = BranchId::new();
        let product = ProductId::new();
        gateway.seed_quantity(source, product, 50).await;
        gateway.seed_quantity(destination, product, 8).await;

        let err = stock
            .transfer_stock(StockTransfer::new(source, destination, product, 100).unwrap())
            .await
            .unwrap_err();

        assert_eq!(err, StockError::insufficient(source, product, 100, 50));
        assert_eq!(gateway.quantity(source, product).await, Some(50));
        assert_eq!(gateway.quantity(destination, product).await, Some(8));
    }

    #[tokio::test]
    async fn transfer_from_never_stocked_branch_reports_insufficient() {
        let (gateway, _, stock) = setup();
        let source = BranchId::new();
        let destination = BranchId::new();
        let product = ProductId::new();

        let err = stock
            .transfer_stock(StockTransfer::new(source, destination, product, 1).unwrap())
            .await
            .unwrap_err();

        assert_eq!(err, StockError::insufficient(source, product, 1, 0));
        assert_eq!(gateway.quantity(destination, product).await, None);
    }

    #[tokio::test]
    async fn reduce_distinguishes_never_stocked_from_stocked_out() {
        let (gateway, _, stock) = setup();
        let branch = BranchId::new();
        let never_stocked = ProductId::new();
        let stocked_out = ProductId::new();
        gateway.seed_quantity(branch, stocked_out, 0).await;

        let err = stock
            .adjust_stock(
                StockAdjustment::new(branch, never_stocked, 1, AdjustmentMode::Reduce).unwrap(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, StockError::record_not_found(branch, never_stocked));

        let err = stock
            .adjust_stock(
                StockAdjustment::new(branch, stocked_out, 1, AdjustmentMode::Reduce).unwrap(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, StockError::insufficient(branch, stocked_out, 1, 0));
    }

    #[tokio::test]
    async fn add_creates_record_on_first_stocking() {
        let (gateway, _, stock) = setup();
        let branch = BranchId::new();
        let product = ProductId::new();

        stock
            .adjust_stock(StockAdjustment::new(branch, product, 12, AdjustmentMode::Add).unwrap())
            .await
            .unwrap();

        assert_eq!(gateway.quantity(branch, product).await, Some(12));
    }

    #[tokio::test]
    async fn set_quantity_overwrites_and_creates() {
        let (gateway, _, stock) = setup();
        let branch = BranchId::new();
        let product = ProductId::new();

        stock.set_quantity(branch, product, 30).await.unwrap();
        assert_eq!(gateway.quantity(branch, product).await, Some(30));

        stock.set_quantity(branch, product, 4).await.unwrap();
        assert_eq!(gateway.quantity(branch, product).await, Some(4));

        let err = stock.set_quantity(branch, product, -1).await.unwrap_err();
        assert_eq!(err, StockError::InvalidAmount(-1));
        assert_eq!(gateway.quantity(branch, product).await, Some(4));
    }

    #[tokio::test]
    async fn quantity_on_hand_reflects_committed_state_only() {
        let (gateway, _, stock) = setup();
        let branch = BranchId::new();
        let product = ProductId::new();

        assert_eq!(stock.quantity_on_hand(branch, product).await.unwrap(), None);

        gateway.seed_quantity(branch, product, 9).await;
        assert_eq!(stock.quantity_on_hand(branch, product).await.unwrap(), Some(9));
    }

    /// Gateway that fails every `begin`, standing in for unreachable storage.
    struct FailingGateway;

    #[async_trait::async_trait]
    impl PersistenceGateway for FailingGateway {
        type Tx = InMemoryTx;

        async fn begin(&self) -> Result<InMemoryTx, GatewayError> {
            Err(GatewayError::Unavailable("storage is down".to_string()))
        }
    }

    #[tokio::test]
    async fn storage_failures_propagate_instead_of_returning_fallback_data() {
        let branch = BranchId::new();
        let product = ProductId::new();

        let stock = StockService::new(FailingGateway);
        let err = stock.quantity_on_hand(branch, product).await.unwrap_err();
        match err {
            StockError::Transaction(msg) => assert!(msg.contains("storage is down")),
            other => panic!("expected Transaction error, got {other:?}"),
        }

        let orders = OrderService::new(FailingGateway);
        let err = orders
            .place_order(OrderDraft::new(branch, None, vec![line(product, 1, 100)]))
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::Transaction(_)));
    }
}
