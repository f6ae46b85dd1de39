use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use branchstock_core::{BranchId, OrderId, ProductId};
use branchstock_orders::{Order, OrderLine};

use super::r#trait::{GatewayError, NewLineItem, NewOrder, PersistenceGateway, StockTx};

#[derive(Debug, Default)]
struct MemState {
    quantities: HashMap<(BranchId, ProductId), i64>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory persistence gateway.
///
/// Intended for tests/dev; selected explicitly at startup, never as a silent
/// fallback for a failing backend. Not optimized for performance: a
/// transaction holds the single state lock for its whole lifetime, which
/// serializes writers — the coarse-grained equivalent of the row locks the
/// Postgres gateway takes, and sufficient for the same correctness
/// guarantee.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<Mutex<MemState>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a quantity directly, outside any transaction. Test/dev seeding.
    pub async fn seed_quantity(&self, branch_id: BranchId, product_id: ProductId, quantity: i64) {
        self.state
            .lock()
            .await
            .quantities
            .insert((branch_id, product_id), quantity);
    }

    /// Committed quantity for one ledger row; `None` when never stocked.
    pub async fn quantity(&self, branch_id: BranchId, product_id: ProductId) -> Option<i64> {
        self.state
            .lock()
            .await
            .quantities
            .get(&(branch_id, product_id))
            .copied()
    }

    /// Committed order by id, including its line items.
    pub async fn order(&self, order_id: OrderId) -> Option<Order> {
        self.state.lock().await.orders.get(&order_id).cloned()
    }

    /// Number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

/// A transaction over [`InMemoryGateway`].
///
/// Writes are staged in overlay maps and applied to the shared state only on
/// `commit`; dropping the transaction (or calling `rollback`) discards them.
pub struct InMemoryTx {
    guard: OwnedMutexGuard<MemState>,
    staged_quantities: HashMap<(BranchId, ProductId), i64>,
    staged_orders: HashMap<OrderId, Order>,
}

#[async_trait::async_trait]
impl PersistenceGateway for InMemoryGateway {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx, GatewayError> {
        let guard = self.state.clone().lock_owned().await;
        Ok(InMemoryTx {
            guard,
            staged_quantities: HashMap::new(),
            staged_orders: HashMap::new(),
        })
    }
}

#[async_trait::async_trait]
impl StockTx for InMemoryTx {
    async fn read_quantity(
        &mut self,
        branch_id: BranchId,
        product_id: ProductId,
    ) -> Result<Option<i64>, GatewayError> {
        let key = (branch_id, product_id);
        Ok(self
            .staged_quantities
            .get(&key)
            .or_else(|| self.guard.quantities.get(&key))
            .copied())
    }

    async fn write_quantity(
        &mut self,
        branch_id: BranchId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), GatewayError> {
        // Mirrors the CHECK (quantity >= 0) constraint of the Postgres schema.
        if quantity < 0 {
            return Err(GatewayError::Storage(format!(
                "negative quantity {quantity} rejected for product {product_id} at branch {branch_id}"
            )));
        }
        self.staged_quantities.insert((branch_id, product_id), quantity);
        Ok(())
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<(), GatewayError> {
        if self.staged_orders.contains_key(&order.order_id)
            || self.guard.orders.contains_key(&order.order_id)
        {
            return Err(GatewayError::Conflict(format!(
                "order {} already exists",
                order.order_id
            )));
        }
        self.staged_orders.insert(
            order.order_id,
            Order {
                order_id: order.order_id,
                branch_id: order.branch_id,
                customer_id: order.customer_id,
                ordered_at: order.ordered_at,
                lines: Vec::new(),
            },
        );
        Ok(())
    }

    async fn insert_line_item(
        &mut self,
        order_id: OrderId,
        line: &NewLineItem,
    ) -> Result<(), GatewayError> {
        let order = self.staged_orders.get_mut(&order_id).ok_or_else(|| {
            GatewayError::Storage(format!("line item references unknown order {order_id}"))
        })?;
        order.lines.push(OrderLine {
            line_no: line.line_no,
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        });
        Ok(())
    }

    async fn commit(self) -> Result<(), GatewayError> {
        let InMemoryTx {
            mut guard,
            staged_quantities,
            staged_orders,
        } = self;

        for (key, quantity) in staged_quantities {
            guard.quantities.insert(key, quantity);
        }
        for (order_id, order) in staged_orders {
            guard.orders.insert(order_id, order);
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), GatewayError> {
        // Staged writes are dropped with the transaction.
        Ok(())
    }
}
