//! Postgres-backed persistence gateway.
//!
//! This module provides the durable gateway implementation using PostgreSQL.
//! Each [`PgStockTx`] wraps one database transaction; the check-then-write
//! window on a ledger row is serialized by a row lock taken at read time.
//!
//! ## Expected Schema
//!
//! ```sql
//! CREATE TABLE branch_inventory (
//!     branch_id   UUID   NOT NULL,
//!     product_id  UUID   NOT NULL,
//!     quantity    BIGINT NOT NULL CHECK (quantity >= 0),
//!     PRIMARY KEY (branch_id, product_id)
//! );
//!
//! CREATE TABLE orders (
//!     order_id    UUID        PRIMARY KEY,
//!     customer_id UUID        NULL,
//!     branch_id   UUID        NOT NULL,
//!     ordered_at  TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE order_items (
//!     order_id   UUID   NOT NULL REFERENCES orders (order_id),
//!     line_no    INT    NOT NULL,
//!     product_id UUID   NOT NULL,
//!     quantity   BIGINT NOT NULL CHECK (quantity > 0),
//!     unit_price BIGINT NOT NULL CHECK (unit_price > 0),
//!     PRIMARY KEY (order_id, line_no)
//! );
//! ```
//!
//! The `CHECK (quantity >= 0)` constraint is a backstop only; the ledger
//! primitives enforce non-negativity before any write is issued.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `GatewayError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | GatewayError | Scenario |
//! |------------|----------------------|--------------|----------|
//! | Database (serialization failure) | `40001` | `Conflict` | Concurrent transaction won the row |
//! | Database (deadlock detected) | `40P01` | `Conflict` | Lock ordering collision; caller may retry |
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate order id / concurrent insert |
//! | Database (check constraint violation) | `23514` | `Storage` | Negative quantity reached the database (bug backstop) |
//! | Database (foreign key violation) | `23503` | `Storage` | Line item without its order |
//! | Database (other) | Any other | `Storage` | Other database errors |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` | Connectivity problems |
//! | Other | N/A | `Storage` | Anything else |
//!
//! ## Thread Safety
//!
//! `PostgresGateway` is `Send + Sync` and can be shared across request
//! handlers. All operations go through the SQLx connection pool.

use std::sync::Arc;

use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use branchstock_core::{BranchId, OrderId, ProductId};

use super::r#trait::{GatewayError, NewLineItem, NewOrder, PersistenceGateway, StockTx};

/// Postgres-backed persistence gateway.
///
/// ## Locking
///
/// `read_quantity` first materializes the ledger row with
/// `INSERT ... ON CONFLICT DO NOTHING` (`FOR UPDATE` cannot lock a row that
/// does not exist), then locks it with `SELECT ... FOR UPDATE`. The row is
/// held from the availability check until commit or rollback, so two
/// concurrent operations against the same (branch, product) pair serialize
/// on it whether or not the pair has been stocked before; the loser re-reads
/// state the winner committed, and therefore cannot act on a stale quantity.
/// A materialized-but-never-written placeholder is discarded with the
/// transaction; no caller commits after a read without a write.
#[derive(Debug, Clone)]
pub struct PostgresGateway {
    pool: Arc<PgPool>,
}

impl PostgresGateway {
    /// Create a new gateway over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

/// One open Postgres transaction.
pub struct PgStockTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl PersistenceGateway for PostgresGateway {
    type Tx = PgStockTx;

    #[instrument(skip(self), err)]
    async fn begin(&self) -> Result<PgStockTx, GatewayError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(PgStockTx { tx })
    }
}

#[async_trait::async_trait]
impl StockTx for PgStockTx {
    #[instrument(
        skip(self),
        fields(branch_id = %branch_id, product_id = %product_id),
        err
    )]
    async fn read_quantity(
        &mut self,
        branch_id: BranchId,
        product_id: ProductId,
    ) -> Result<Option<i64>, GatewayError> {
        // `FOR UPDATE` cannot lock an absent row. Materialize the row first:
        // the insert either creates it (already locked by this transaction)
        // or blocks on a concurrent creator of the same pair and then skips,
        // so first stockings serialize exactly like later updates.
        let inserted = sqlx::query(
            r#"
            INSERT INTO branch_inventory (branch_id, product_id, quantity)
            VALUES ($1, $2, 0)
            ON CONFLICT (branch_id, product_id) DO NOTHING
            "#,
        )
        .bind(branch_id.as_uuid())
        .bind(product_id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("read_quantity", e))?;

        // A freshly materialized row means the pair has never been stocked.
        // The zero placeholder is rolled back with the transaction unless a
        // later `write_quantity` stages a real quantity.
        if inserted.rows_affected() == 1 {
            return Ok(None);
        }

        let row = sqlx::query(
            r#"
            SELECT quantity
            FROM branch_inventory
            WHERE branch_id = $1 AND product_id = $2
            FOR UPDATE
            "#,
        )
        .bind(branch_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("read_quantity", e))?;

        row.try_get::<i64, _>("quantity")
            .map(Some)
            .map_err(|e| GatewayError::Storage(format!("failed to read quantity column: {e}")))
    }

    #[instrument(
        skip(self),
        fields(branch_id = %branch_id, product_id = %product_id, quantity),
        err
    )]
    async fn write_quantity(
        &mut self,
        branch_id: BranchId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            r#"
            INSERT INTO branch_inventory (branch_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (branch_id, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity
            "#,
        )
        .bind(branch_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(quantity)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("write_quantity", e))?;

        Ok(())
    }

    #[instrument(
        skip(self, order),
        fields(order_id = %order.order_id, branch_id = %order.branch_id),
        err
    )]
    async fn insert_order(&mut self, order: &NewOrder) -> Result<(), GatewayError> {
        sqlx::query(
            r#"
            INSERT INTO orders (order_id, customer_id, branch_id, ordered_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order.order_id.as_uuid())
        .bind(order.customer_id.map(|c| *c.as_uuid()))
        .bind(order.branch_id.as_uuid())
        .bind(order.ordered_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        Ok(())
    }

    #[instrument(
        skip(self, line),
        fields(order_id = %order_id, line_no = line.line_no, product_id = %line.product_id),
        err
    )]
    async fn insert_line_item(
        &mut self,
        order_id: OrderId,
        line: &NewLineItem,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, line_no, product_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(line.line_no as i32)
        .bind(line.product_id.as_uuid())
        .bind(line.quantity)
        .bind(line.unit_price as i64)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_line_item", e))?;

        Ok(())
    }

    async fn commit(self) -> Result<(), GatewayError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    async fn rollback(self) -> Result<(), GatewayError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

/// Map SQLx errors to `GatewayError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> GatewayError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                // Serialization failure / deadlock: the caller may retry.
                Some("40001") | Some("40P01") => GatewayError::Conflict(msg),
                // Unique violation (e.g. duplicate order id).
                Some("23505") => GatewayError::Conflict(msg),
                // Check or FK violation: the write itself was invalid.
                Some("23514") | Some("23503") => GatewayError::Storage(msg),
                _ => GatewayError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            GatewayError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            GatewayError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::Io(e) => {
            GatewayError::Unavailable(format!("io error in {operation}: {e}"))
        }
        _ => GatewayError::Storage(format!("sqlx error in {operation}: {err}")),
    }
}
