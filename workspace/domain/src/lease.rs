//! Lease lifecycle rules: term validation, the active-lease overlap
//! invariant, and deletion with payment cascade.

use chrono::{DateTime, Utc};
use model::entities::{lease, payment, tenant, unit};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{DomainError, Result};
use crate::interval::LeaseWindow;
use crate::references::ensure_exists;

/// Message returned when the active-lease invariant would be broken.
pub const OVERLAP_MESSAGE: &str = "Unit already has an active overlapping lease.";

/// The editable terms of a lease, as submitted on create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseTerms {
    pub unit_id: i32,
    pub tenant_id: i32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub monthly_rent: Decimal,
    pub security_deposit: Decimal,
}

impl LeaseTerms {
    pub fn window(&self) -> LeaseWindow {
        LeaseWindow::new(self.start, self.end)
    }

    /// Field rules that need no database access.
    pub fn validate(&self) -> Result<()> {
        if self.unit_id <= 0 {
            return Err(DomainError::validation("Unit id must be positive."));
        }
        if self.tenant_id <= 0 {
            return Err(DomainError::validation("Tenant id must be positive."));
        }
        if !self.window().is_valid() {
            return Err(DomainError::validation("Start must be before End."));
        }
        if self.monthly_rent < Decimal::ZERO {
            return Err(DomainError::validation("Monthly rent cannot be negative."));
        }
        if self.security_deposit < Decimal::ZERO {
            return Err(DomainError::validation("Security deposit cannot be negative."));
        }
        Ok(())
    }
}

/// Active leases of `unit_id` whose window overlaps `[start, end)`,
/// skipping `exclude_lease_id`.
///
/// A unit carries a handful of leases, so the rows are scanned in memory
/// with the same predicate the unit tests exercise.
#[instrument(skip(conn))]
pub async fn find_overlapping<C: ConnectionTrait>(
    conn: &C,
    unit_id: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_lease_id: Option<i32>,
) -> Result<Vec<lease::Model>> {
    trace!("Loading active leases for unit {}", unit_id);
    let mut query = lease::Entity::find()
        .filter(lease::Column::UnitId.eq(unit_id))
        .filter(lease::Column::IsActive.eq(true));
    if let Some(id) = exclude_lease_id {
        query = query.filter(lease::Column::Id.ne(id));
    }

    let candidate = LeaseWindow::new(start, end);
    let active = query.all(conn).await?;
    debug!("Unit {} has {} other active lease(s)", unit_id, active.len());

    Ok(active
        .into_iter()
        .filter(|existing| {
            LeaseWindow::new(existing.start_date_utc, existing.end_date_utc).overlaps(&candidate)
        })
        .collect())
}

/// True when another active lease of the unit overlaps `[start, end)`.
pub async fn has_overlap<C: ConnectionTrait>(
    conn: &C,
    unit_id: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_lease_id: Option<i32>,
) -> Result<bool> {
    Ok(!find_overlapping(conn, unit_id, start, end, exclude_lease_id)
        .await?
        .is_empty())
}

pub async fn ensure_no_overlap<C: ConnectionTrait>(
    conn: &C,
    unit_id: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_lease_id: Option<i32>,
) -> Result<()> {
    if has_overlap(conn, unit_id, start, end, exclude_lease_id).await? {
        warn!(
            "Rejecting lease for unit {} over [{}, {}): overlaps an active lease",
            unit_id, start, end
        );
        return Err(DomainError::conflict(OVERLAP_MESSAGE));
    }
    Ok(())
}

/// Runs every rule a new lease must pass. New leases are always active.
#[instrument(skip(conn))]
pub async fn check_new_lease<C: ConnectionTrait>(conn: &C, terms: &LeaseTerms) -> Result<()> {
    terms.validate()?;
    ensure_exists::<unit::Entity, _>(conn, terms.unit_id, "Unit").await?;
    ensure_exists::<tenant::Entity, _>(conn, terms.tenant_id, "Tenant").await?;
    ensure_no_overlap(conn, terms.unit_id, terms.start, terms.end, None).await
}

/// Whether an edit has to re-run the overlap check.
///
/// Only edits that move the lease (unit or dates) or flip `is_active` matter,
/// and an inactive result can never collide.
pub fn needs_overlap_check(existing: &lease::Model, terms: &LeaseTerms, is_active: bool) -> bool {
    let moved = existing.unit_id != terms.unit_id
        || existing.start_date_utc != terms.start
        || existing.end_date_utc != terms.end
        || existing.is_active != is_active;
    moved && is_active
}

/// Runs every rule an edit of `existing` must pass. The lease never blocks itself.
#[instrument(skip(conn, existing))]
pub async fn check_lease_update<C: ConnectionTrait>(
    conn: &C,
    existing: &lease::Model,
    terms: &LeaseTerms,
    is_active: bool,
) -> Result<()> {
    terms.validate()?;
    if existing.unit_id != terms.unit_id {
        ensure_exists::<unit::Entity, _>(conn, terms.unit_id, "Unit").await?;
    }
    if existing.tenant_id != terms.tenant_id {
        ensure_exists::<tenant::Entity, _>(conn, terms.tenant_id, "Tenant").await?;
    }
    if needs_overlap_check(existing, terms, is_active) {
        ensure_no_overlap(conn, terms.unit_id, terms.start, terms.end, Some(existing.id)).await?;
    } else {
        debug!("Lease {} edit does not need an overlap check", existing.id);
    }
    Ok(())
}

/// Deletes a lease and its payments.
///
/// Returns `Ok(None)` when the lease does not exist; that is a not-found
/// signal for the caller, not an error.
#[instrument(skip(conn))]
pub async fn delete_lease<C: ConnectionTrait>(conn: &C, lease_id: i32) -> Result<Option<lease::Model>> {
    let Some(existing) = lease::Entity::find_by_id(lease_id).one(conn).await? else {
        warn!("Lease {} not found for deletion", lease_id);
        return Ok(None);
    };

    let removed = payment::Entity::delete_many()
        .filter(payment::Column::LeaseId.eq(lease_id))
        .exec(conn)
        .await?;
    debug!("Removed {} payment(s) of lease {}", removed.rows_affected, lease_id);

    existing.clone().delete(conn).await?;
    info!("Lease {} deleted", lease_id);
    Ok(Some(existing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        insert_lease, insert_payment, insert_property, insert_tenant, insert_unit, setup_db, ymd,
    };
    use sea_orm::PaginatorTrait;

    fn terms(unit_id: i32, tenant_id: i32, start: DateTime<Utc>, end: DateTime<Utc>) -> LeaseTerms {
        LeaseTerms {
            unit_id,
            tenant_id,
            start,
            end,
            monthly_rent: Decimal::new(120000, 2),
            security_deposit: Decimal::new(120000, 2),
        }
    }

    #[test]
    fn test_terms_validation() {
        let ok = terms(1, 1, ymd(2024, 1, 1), ymd(2024, 6, 1));
        assert!(ok.validate().is_ok());

        let inverted = terms(1, 1, ymd(2024, 6, 1), ymd(2024, 1, 1));
        match inverted.validate() {
            Err(DomainError::Validation(msg)) => assert_eq!(msg, "Start must be before End."),
            other => panic!("unexpected result: {:?}", other),
        }

        let empty = terms(1, 1, ymd(2024, 1, 1), ymd(2024, 1, 1));
        assert!(empty.validate().is_err());

        let mut negative = ok.clone();
        negative.monthly_rent = Decimal::new(-1, 0);
        assert!(negative.validate().is_err());

        let mut negative_deposit = ok.clone();
        negative_deposit.security_deposit = Decimal::new(-1, 0);
        assert!(negative_deposit.validate().is_err());

        let mut free = ok.clone();
        free.monthly_rent = Decimal::ZERO;
        free.security_deposit = Decimal::ZERO;
        assert!(free.validate().is_ok());

        assert!(terms(0, 1, ymd(2024, 1, 1), ymd(2024, 6, 1)).validate().is_err());
        assert!(terms(1, -3, ymd(2024, 1, 1), ymd(2024, 6, 1)).validate().is_err());
    }

    #[tokio::test]
    async fn test_overlapping_candidate_is_rejected() {
        let db = setup_db().await;
        let property = insert_property(&db).await;
        let unit = insert_unit(&db, property.id, "1A").await;
        let tenant = insert_tenant(&db, "jane@example.com").await;
        insert_lease(&db, unit.id, tenant.id, ymd(2024, 1, 1), ymd(2024, 6, 1), true).await;

        let candidate = terms(unit.id, tenant.id, ymd(2024, 3, 1), ymd(2024, 9, 1));
        match check_new_lease(&db, &candidate).await {
            Err(DomainError::Conflict(msg)) => assert_eq!(msg, OVERLAP_MESSAGE),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_abutting_candidate_is_accepted() {
        let db = setup_db().await;
        let property = insert_property(&db).await;
        let unit = insert_unit(&db, property.id, "1A").await;
        let tenant = insert_tenant(&db, "jane@example.com").await;
        insert_lease(&db, unit.id, tenant.id, ymd(2024, 1, 1), ymd(2024, 6, 1), true).await;

        let candidate = terms(unit.id, tenant.id, ymd(2024, 6, 1), ymd(2024, 12, 1));
        assert!(check_new_lease(&db, &candidate).await.is_ok());
    }

    #[tokio::test]
    async fn test_inactive_and_other_unit_leases_do_not_block() {
        let db = setup_db().await;
        let property = insert_property(&db).await;
        let unit = insert_unit(&db, property.id, "1A").await;
        let other_unit = insert_unit(&db, property.id, "1B").await;
        let tenant = insert_tenant(&db, "jane@example.com").await;
        insert_lease(&db, unit.id, tenant.id, ymd(2024, 1, 1), ymd(2024, 6, 1), false).await;
        insert_lease(&db, other_unit.id, tenant.id, ymd(2024, 1, 1), ymd(2024, 6, 1), true).await;

        assert!(!has_overlap(&db, unit.id, ymd(2024, 2, 1), ymd(2024, 3, 1), None).await.unwrap());
        assert!(has_overlap(&db, other_unit.id, ymd(2024, 2, 1), ymd(2024, 3, 1), None).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_references_are_validation_errors() {
        let db = setup_db().await;
        let property = insert_property(&db).await;
        let unit = insert_unit(&db, property.id, "1A").await;
        let tenant = insert_tenant(&db, "jane@example.com").await;

        match check_new_lease(&db, &terms(999, tenant.id, ymd(2024, 1, 1), ymd(2024, 2, 1))).await {
            Err(DomainError::Validation(msg)) => assert_eq!(msg, "Unit does not exist."),
            other => panic!("unexpected result: {:?}", other),
        }
        match check_new_lease(&db, &terms(unit.id, 999, ymd(2024, 1, 1), ymd(2024, 2, 1))).await {
            Err(DomainError::Validation(msg)) => assert_eq!(msg, "Tenant does not exist."),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_excludes_itself() {
        let db = setup_db().await;
        let property = insert_property(&db).await;
        let unit = insert_unit(&db, property.id, "1A").await;
        let tenant = insert_tenant(&db, "jane@example.com").await;
        let existing =
            insert_lease(&db, unit.id, tenant.id, ymd(2024, 1, 1), ymd(2024, 6, 1), true).await;

        // Extending the lease only overlaps its own old window
        let extended = terms(unit.id, tenant.id, ymd(2024, 1, 1), ymd(2024, 8, 1));
        assert!(check_lease_update(&db, &existing, &extended, true).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_into_neighbour_is_rejected() {
        let db = setup_db().await;
        let property = insert_property(&db).await;
        let unit = insert_unit(&db, property.id, "1A").await;
        let tenant = insert_tenant(&db, "jane@example.com").await;
        insert_lease(&db, unit.id, tenant.id, ymd(2024, 1, 1), ymd(2024, 6, 1), true).await;
        let later =
            insert_lease(&db, unit.id, tenant.id, ymd(2024, 6, 1), ymd(2024, 12, 1), true).await;

        let pulled_forward = terms(unit.id, tenant.id, ymd(2024, 5, 1), ymd(2024, 12, 1));
        assert!(matches!(
            check_lease_update(&db, &later, &pulled_forward, true).await,
            Err(DomainError::Conflict(_))
        ));

        // Deactivating instead is always allowed
        assert!(check_lease_update(&db, &later, &pulled_forward, false).await.is_ok());
    }

    #[tokio::test]
    async fn test_reactivation_is_rechecked() {
        let db = setup_db().await;
        let property = insert_property(&db).await;
        let unit = insert_unit(&db, property.id, "1A").await;
        let tenant = insert_tenant(&db, "jane@example.com").await;
        insert_lease(&db, unit.id, tenant.id, ymd(2024, 1, 1), ymd(2024, 6, 1), true).await;
        let dormant =
            insert_lease(&db, unit.id, tenant.id, ymd(2024, 2, 1), ymd(2024, 4, 1), false).await;

        let same_terms = terms(unit.id, tenant.id, ymd(2024, 2, 1), ymd(2024, 4, 1));
        assert!(!needs_overlap_check(&dormant, &same_terms, false));
        assert!(needs_overlap_check(&dormant, &same_terms, true));
        assert!(check_lease_update(&db, &dormant, &same_terms, true).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_cascades_payments_and_reports_missing() {
        let db = setup_db().await;
        let property = insert_property(&db).await;
        let unit = insert_unit(&db, property.id, "1A").await;
        let tenant = insert_tenant(&db, "jane@example.com").await;
        let lease =
            insert_lease(&db, unit.id, tenant.id, ymd(2024, 1, 1), ymd(2024, 6, 1), true).await;
        insert_payment(&db, lease.id, Decimal::new(50000, 2)).await;
        insert_payment(&db, lease.id, Decimal::new(70000, 2)).await;

        let deleted = delete_lease(&db, lease.id).await.unwrap();
        assert_eq!(deleted.map(|l| l.id), Some(lease.id));

        let remaining = payment::Entity::find()
            .filter(payment::Column::LeaseId.eq(lease.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(remaining, 0);

        // Second delete is a not-found signal
        assert!(delete_lease(&db, lease.id).await.unwrap().is_none());
    }
}
