//! Inventory domain module.
//!
//! This crate contains business rules for per-branch stock, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod adjustment;
pub mod level;
pub mod transfer;

pub use adjustment::{AdjustmentMode, StockAdjustment};
pub use level::StockLevel;
pub use transfer::StockTransfer;
