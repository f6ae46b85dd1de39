//! Transactional persistence boundary.
//!
//! This module defines an infrastructure-facing unit-of-work abstraction for
//! the inventory ledger and order storage without making any storage
//! assumptions. Implementations are selected explicitly at startup — there
//! is no inline fallback from one backend to another inside an operation.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::{InMemoryGateway, InMemoryTx};
pub use postgres::PostgresGateway;
pub use r#trait::{GatewayError, NewLineItem, NewOrder, PersistenceGateway, StockTx};
