//! Inventory ledger primitives.
//!
//! Single source of truth for the quantity on hand per (branch, product)
//! pair. Every function here runs inside the caller's open transaction and
//! never commits independently; because `read_quantity` is a locking read,
//! the quantity checked by a primitive is still accurate at the moment it
//! writes.

use branchstock_core::{BranchId, ProductId, StockError, StockResult};
use branchstock_inventory::StockLevel;

use crate::gateway::StockTx;

/// Current quantity on hand; `None` when the pair has never been stocked.
///
/// Callers doing availability checks treat `None` as 0; callers deciding
/// between create and update (or reporting "never stocked") keep the
/// distinction.
pub async fn quantity<T: StockTx>(
    tx: &mut T,
    branch_id: BranchId,
    product_id: ProductId,
) -> StockResult<Option<i64>> {
    Ok(tx.read_quantity(branch_id, product_id).await?)
}

/// Add `amount` to a ledger row, creating it with `quantity = amount` when
/// absent. Fails with `InvalidAmount` when `amount <= 0`, before touching
/// the row.
pub async fn increase<T: StockTx>(
    tx: &mut T,
    branch_id: BranchId,
    product_id: ProductId,
    amount: i64,
) -> StockResult<()> {
    if amount <= 0 {
        return Err(StockError::invalid_amount(amount));
    }

    let level = match tx.read_quantity(branch_id, product_id).await? {
        Some(current) => StockLevel::new(branch_id, product_id, current)?,
        None => StockLevel::empty(branch_id, product_id),
    };
    let next = level.increased(amount)?;

    tx.write_quantity(branch_id, product_id, next.quantity).await?;
    Ok(())
}

/// Remove `amount` from an existing ledger row.
///
/// Fails with `RecordNotFound` when the pair has never been stocked and with
/// `InsufficientStock` when the quantity on hand is short; the quantity
/// never goes negative.
pub async fn decrease<T: StockTx>(
    tx: &mut T,
    branch_id: BranchId,
    product_id: ProductId,
    amount: i64,
) -> StockResult<()> {
    if amount <= 0 {
        return Err(StockError::invalid_amount(amount));
    }

    let current = tx
        .read_quantity(branch_id, product_id)
        .await?
        .ok_or_else(|| StockError::record_not_found(branch_id, product_id))?;
    let next = StockLevel::new(branch_id, product_id, current)?.decreased(amount)?;

    tx.write_quantity(branch_id, product_id, next.quantity).await?;
    Ok(())
}

/// Availability-check flavor of [`decrease`]: an absent row counts as
/// quantity 0, so a missing record surfaces as `InsufficientStock` (with
/// `available: 0`) rather than `RecordNotFound`. Used by order fulfilment
/// and the source leg of a transfer.
pub async fn consume<T: StockTx>(
    tx: &mut T,
    branch_id: BranchId,
    product_id: ProductId,
    amount: i64,
) -> StockResult<()> {
    if amount <= 0 {
        return Err(StockError::invalid_amount(amount));
    }

    let available = tx.read_quantity(branch_id, product_id).await?.unwrap_or(0);
    let next = StockLevel::new(branch_id, product_id, available)?.decreased(amount)?;

    tx.write_quantity(branch_id, product_id, next.quantity).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{InMemoryGateway, PersistenceGateway};

    #[tokio::test]
    async fn increase_creates_missing_record() {
        let gateway = InMemoryGateway::new();
        let branch = BranchId::new();
        let product = ProductId::new();

        let mut tx = gateway.begin().await.unwrap();
        increase(&mut tx, branch, product, 5).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(gateway.quantity(branch, product).await, Some(5));
    }

    #[tokio::test]
    async fn increase_adds_to_existing_record() {
        let gateway = InMemoryGateway::new();
        let branch = BranchId::new();
        let product = ProductId::new();
        gateway.seed_quantity(branch, product, 10).await;

        let mut tx = gateway.begin().await.unwrap();
        increase(&mut tx, branch, product, 5).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(gateway.quantity(branch, product).await, Some(15));
    }

    #[tokio::test]
    async fn increase_rejects_non_positive_amount() {
        let gateway = InMemoryGateway::new();

        let mut tx = gateway.begin().await.unwrap();
        let err = increase(&mut tx, BranchId::new(), ProductId::new(), 0)
            .await
            .unwrap_err();
        assert_eq!(err, StockError::InvalidAmount(0));
    }

    #[tokio::test]
    async fn decrease_requires_existing_record() {
        let gateway = InMemoryGateway::new();
        let branch = BranchId::new();
        let product = ProductId::new();

        let mut tx = gateway.begin().await.unwrap();
        let err = decrease(&mut tx, branch, product, 1).await.unwrap_err();
        assert_eq!(err, StockError::record_not_found(branch, product));
    }

    #[tokio::test]
    async fn decrease_rejects_overdraw() {
        let gateway = InMemoryGateway::new();
        let branch = BranchId::new();
        let product = ProductId::new();
        gateway.seed_quantity(branch, product, 5).await;

        let mut tx = gateway.begin().await.unwrap();
        let err = decrease(&mut tx, branch, product, 6).await.unwrap_err();
        assert_eq!(err, StockError::insufficient(branch, product, 6, 5));
    }

    #[tokio::test]
    async fn decrease_can_empty_the_record() {
        let gateway = InMemoryGateway::new();
        let branch = BranchId::new();
        let product = ProductId::new();
        gateway.seed_quantity(branch, product, 5).await;

        let mut tx = gateway.begin().await.unwrap();
        decrease(&mut tx, branch, product, 5).await.unwrap();
        tx.commit().await.unwrap();

        // The record stays at zero; it is never deleted.
        assert_eq!(gateway.quantity(branch, product).await, Some(0));
    }

    #[tokio::test]
    async fn consume_treats_missing_record_as_empty() {
        let gateway = InMemoryGateway::new();
        let branch = BranchId::new();
        let product = ProductId::new();

        let mut tx = gateway.begin().await.unwrap();
        let err = consume(&mut tx, branch, product, 3).await.unwrap_err();
        assert_eq!(err, StockError::insufficient(branch, product, 3, 0));
    }

    #[tokio::test]
    async fn quantity_distinguishes_missing_from_zero() {
        let gateway = InMemoryGateway::new();
        let branch = BranchId::new();
        let stocked_out = ProductId::new();
        let never_stocked = ProductId::new();
        gateway.seed_quantity(branch, stocked_out, 0).await;

        let mut tx = gateway.begin().await.unwrap();
        assert_eq!(quantity(&mut tx, branch, stocked_out).await.unwrap(), Some(0));
        assert_eq!(quantity(&mut tx, branch, never_stocked).await.unwrap(), None);
    }
}
