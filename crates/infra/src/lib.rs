//! Infrastructure layer: persistence gateway, ledger primitives, services.

pub mod gateway;
pub mod ledger;
pub mod services;

#[cfg(test)]
mod integration_tests;
