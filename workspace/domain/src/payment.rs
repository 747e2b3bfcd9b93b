//! Payment admission and per-lease totals.

use model::entities::{lease, payment};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::{debug, instrument, warn};

use crate::error::{DomainError, Result};

pub const LEASE_MISSING_MESSAGE: &str = "Lease does not exist.";
pub const LEASE_INACTIVE_MESSAGE: &str = "Cannot record payment on inactive lease.";
pub const AMOUNT_MESSAGE: &str = "Amount must be positive.";

/// Checks a payment against its lease before it is written.
///
/// Rules run in a fixed order and the first failure wins:
/// 1. the lease exists (validation),
/// 2. the lease is active (conflict),
/// 3. the amount is strictly positive (validation).
///
/// Returns the lease on success so callers don't load it twice.
#[instrument(skip(conn))]
pub async fn admit_payment<C: ConnectionTrait>(
    conn: &C,
    lease_id: i32,
    amount: Decimal,
) -> Result<lease::Model> {
    let Some(lease) = lease::Entity::find_by_id(lease_id).one(conn).await? else {
        warn!("Payment rejected: lease {} does not exist", lease_id);
        return Err(DomainError::validation(LEASE_MISSING_MESSAGE));
    };

    if !lease.is_active {
        warn!("Payment rejected: lease {} is inactive", lease_id);
        return Err(DomainError::conflict(LEASE_INACTIVE_MESSAGE));
    }

    if amount <= Decimal::ZERO {
        warn!("Payment rejected: non-positive amount {}", amount);
        return Err(DomainError::validation(AMOUNT_MESSAGE));
    }

    debug!("Payment of {} admitted for lease {}", amount, lease_id);
    Ok(lease)
}

/// Payments of a lease, newest first.
pub async fn payments_for_lease<C: ConnectionTrait>(
    conn: &C,
    lease_id: i32,
) -> Result<Vec<payment::Model>> {
    Ok(payment::Entity::find()
        .filter(payment::Column::LeaseId.eq(lease_id))
        .order_by_desc(payment::Column::PaidOnUtc)
        .order_by_desc(payment::Column::Id)
        .all(conn)
        .await?)
}

/// Exact sum of all payment amounts of a lease.
#[instrument(skip(conn))]
pub async fn total_paid<C: ConnectionTrait>(conn: &C, lease_id: i32) -> Result<Decimal> {
    let total = payment::Entity::find()
        .filter(payment::Column::LeaseId.eq(lease_id))
        .all(conn)
        .await?
        .iter()
        .map(|p| p.amount)
        .sum::<Decimal>();
    debug!("Lease {} total paid {}", lease_id, total);
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        insert_lease, insert_payment, insert_property, insert_tenant, insert_unit, setup_db, ymd,
    };
    use sea_orm::DatabaseConnection;

    async fn lease_fixture(db: &DatabaseConnection, is_active: bool) -> lease::Model {
        let property = insert_property(db).await;
        let unit = insert_unit(db, property.id, "1A").await;
        let tenant = insert_tenant(db, "payer@example.com").await;
        insert_lease(db, unit.id, tenant.id, ymd(2024, 1, 1), ymd(2024, 12, 1), is_active).await
    }

    #[tokio::test]
    async fn test_missing_lease_is_checked_first() {
        let db = setup_db().await;

        match admit_payment(&db, 404, Decimal::ZERO).await {
            Err(DomainError::Validation(msg)) => assert_eq!(msg, LEASE_MISSING_MESSAGE),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_inactive_lease_rejected_regardless_of_amount() {
        let db = setup_db().await;
        let lease = lease_fixture(&db, false).await;

        for amount in [Decimal::new(50000, 2), Decimal::ZERO, Decimal::new(-10, 0)] {
            match admit_payment(&db, lease.id, amount).await {
                Err(DomainError::Conflict(msg)) => assert_eq!(msg, LEASE_INACTIVE_MESSAGE),
                other => panic!("unexpected result for {}: {:?}", amount, other),
            }
        }
    }

    #[tokio::test]
    async fn test_non_positive_amount_always_fails() {
        let db = setup_db().await;
        let lease = lease_fixture(&db, true).await;

        for amount in [Decimal::ZERO, Decimal::new(-1, 2), Decimal::new(-500, 0)] {
            match admit_payment(&db, lease.id, amount).await {
                Err(DomainError::Validation(msg)) => assert_eq!(msg, AMOUNT_MESSAGE),
                other => panic!("unexpected result for {}: {:?}", amount, other),
            }
        }

        let admitted = admit_payment(&db, lease.id, Decimal::new(1, 2)).await.unwrap();
        assert_eq!(admitted.id, lease.id);
    }

    #[tokio::test]
    async fn test_total_is_exact() {
        let db = setup_db().await;
        let lease = lease_fixture(&db, true).await;

        assert_eq!(total_paid(&db, lease.id).await.unwrap(), Decimal::ZERO);

        // Ten cents three times is exactly 0.30
        for _ in 0..3 {
            insert_payment(&db, lease.id, Decimal::new(10, 2)).await;
        }
        insert_payment(&db, lease.id, Decimal::new(120000, 2)).await;

        assert_eq!(total_paid(&db, lease.id).await.unwrap(), Decimal::new(120030, 2));
        assert_eq!(payments_for_lease(&db, lease.id).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_payments_newest_first() {
        let db = setup_db().await;
        let lease = lease_fixture(&db, true).await;
        let first = insert_payment(&db, lease.id, Decimal::new(100, 0)).await;
        let second = insert_payment(&db, lease.id, Decimal::new(200, 0)).await;

        let listed = payments_for_lease(&db, lease.id).await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }
}
