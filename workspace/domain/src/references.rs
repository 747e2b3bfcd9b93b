//! Existence and uniqueness checks run before inserts and deletes.

use model::entities::{lease, tenant, unit};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, PrimaryKeyTrait, QueryFilter,
};
use tracing::{debug, instrument, warn};

use crate::error::{DomainError, Result};

/// Fails with `"<label> does not exist."` when no row of `E` has the given id.
pub async fn ensure_exists<E, C>(conn: &C, id: i32, label: &str) -> Result<()>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
    C: ConnectionTrait,
{
    match E::find_by_id(id).one(conn).await? {
        Some(_) => {
            debug!("{} {} exists", label, id);
            Ok(())
        }
        None => {
            warn!("{} {} does not exist", label, id);
            Err(DomainError::validation(format!("{label} does not exist.")))
        }
    }
}

/// Checks the referenced property, and the unit and tenant when given, of a
/// maintenance request.
pub async fn ensure_maintenance_references<C: ConnectionTrait>(
    conn: &C,
    property_id: i32,
    unit_id: Option<i32>,
    tenant_id: Option<i32>,
) -> Result<()> {
    ensure_exists::<model::entities::property::Entity, _>(conn, property_id, "Property").await?;
    if let Some(unit_id) = unit_id {
        ensure_exists::<unit::Entity, _>(conn, unit_id, "Unit").await?;
    }
    if let Some(tenant_id) = tenant_id {
        ensure_exists::<tenant::Entity, _>(conn, tenant_id, "Tenant").await?;
    }
    Ok(())
}

/// Tenant emails are unique. `exclude_id` skips the tenant being edited.
#[instrument(skip(conn))]
pub async fn ensure_tenant_email_free<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    exclude_id: Option<i32>,
) -> Result<()> {
    let mut query = tenant::Entity::find().filter(tenant::Column::Email.eq(email));
    if let Some(id) = exclude_id {
        query = query.filter(tenant::Column::Id.ne(id));
    }

    if query.count(conn).await? > 0 {
        warn!("Tenant email {} is already taken", email);
        return Err(DomainError::conflict(
            "A tenant with this email already exists.",
        ));
    }
    Ok(())
}

/// Unit numbers are unique within a property.
#[instrument(skip(conn))]
pub async fn ensure_unit_number_free<C: ConnectionTrait>(
    conn: &C,
    property_id: i32,
    unit_number: &str,
    exclude_id: Option<i32>,
) -> Result<()> {
    let mut query = unit::Entity::find()
        .filter(unit::Column::PropertyId.eq(property_id))
        .filter(unit::Column::UnitNumber.eq(unit_number));
    if let Some(id) = exclude_id {
        query = query.filter(unit::Column::Id.ne(id));
    }

    if query.count(conn).await? > 0 {
        warn!(
            "Unit number {} already exists in property {}",
            unit_number, property_id
        );
        return Err(DomainError::conflict(format!(
            "Unit {unit_number} already exists in this property."
        )));
    }
    Ok(())
}

/// A unit with lease history cannot be deleted.
pub async fn ensure_unit_removable<C: ConnectionTrait>(conn: &C, unit_id: i32) -> Result<()> {
    let leases = lease::Entity::find()
        .filter(lease::Column::UnitId.eq(unit_id))
        .count(conn)
        .await?;
    if leases > 0 {
        warn!("Unit {} still has {} lease(s)", unit_id, leases);
        return Err(DomainError::conflict("Unit has leases and cannot be deleted."));
    }
    Ok(())
}

/// A tenant with lease history cannot be deleted.
pub async fn ensure_tenant_removable<C: ConnectionTrait>(conn: &C, tenant_id: i32) -> Result<()> {
    let leases = lease::Entity::find()
        .filter(lease::Column::TenantId.eq(tenant_id))
        .count(conn)
        .await?;
    if leases > 0 {
        warn!("Tenant {} still has {} lease(s)", tenant_id, leases);
        return Err(DomainError::conflict(
            "Tenant has leases and cannot be deleted.",
        ));
    }
    Ok(())
}

/// Deleting a property cascades to its units, so none of them may be leased.
pub async fn ensure_property_removable<C: ConnectionTrait>(
    conn: &C,
    property_id: i32,
) -> Result<()> {
    let unit_ids: Vec<i32> = unit::Entity::find()
        .filter(unit::Column::PropertyId.eq(property_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| u.id)
        .collect();

    if unit_ids.is_empty() {
        return Ok(());
    }

    let leases = lease::Entity::find()
        .filter(lease::Column::UnitId.is_in(unit_ids))
        .count(conn)
        .await?;
    if leases > 0 {
        warn!("Property {} has leased units", property_id);
        return Err(DomainError::conflict(
            "Property has units with leases and cannot be deleted.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{setup_db, insert_lease, insert_property, insert_tenant, insert_unit, ymd};
    use model::entities::property;

    #[tokio::test]
    async fn test_ensure_exists_reports_label() {
        let db = setup_db().await;
        let property = insert_property(&db).await;

        assert!(ensure_exists::<property::Entity, _>(&db, property.id, "Property").await.is_ok());

        match ensure_exists::<unit::Entity, _>(&db, 4242, "Unit").await {
            Err(DomainError::Validation(msg)) => assert_eq!(msg, "Unit does not exist."),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_maintenance_references_optional_parts() {
        let db = setup_db().await;
        let property = insert_property(&db).await;

        assert!(ensure_maintenance_references(&db, property.id, None, None).await.is_ok());
        assert!(matches!(
            ensure_maintenance_references(&db, property.id, Some(999), None).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            ensure_maintenance_references(&db, 999, None, None).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_tenant_email_uniqueness_skips_self() {
        let db = setup_db().await;
        let tenant = insert_tenant(&db, "taken@example.com").await;

        assert!(matches!(
            ensure_tenant_email_free(&db, "taken@example.com", None).await,
            Err(DomainError::Conflict(_))
        ));
        assert!(ensure_tenant_email_free(&db, "taken@example.com", Some(tenant.id)).await.is_ok());
        assert!(ensure_tenant_email_free(&db, "free@example.com", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_unit_number_uniqueness_is_per_property() {
        let db = setup_db().await;
        let first = insert_property(&db).await;
        let second = insert_property(&db).await;
        let unit = insert_unit(&db, first.id, "1A").await;

        assert!(ensure_unit_number_free(&db, first.id, "1A", None).await.is_err());
        assert!(ensure_unit_number_free(&db, first.id, "1A", Some(unit.id)).await.is_ok());
        assert!(ensure_unit_number_free(&db, second.id, "1A", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_leased_records_are_not_removable() {
        let db = setup_db().await;
        let property = insert_property(&db).await;
        let leased = insert_unit(&db, property.id, "1A").await;
        let empty = insert_unit(&db, property.id, "1B").await;
        let tenant = insert_tenant(&db, "jane@example.com").await;
        let idle = insert_tenant(&db, "idle@example.com").await;
        insert_lease(&db, leased.id, tenant.id, ymd(2024, 1, 1), ymd(2024, 6, 1), true).await;

        assert!(matches!(
            ensure_unit_removable(&db, leased.id).await,
            Err(DomainError::Conflict(_))
        ));
        assert!(ensure_unit_removable(&db, empty.id).await.is_ok());

        assert!(ensure_tenant_removable(&db, tenant.id).await.is_err());
        assert!(ensure_tenant_removable(&db, idle.id).await.is_ok());

        assert!(ensure_property_removable(&db, property.id).await.is_err());
        let vacant = insert_property(&db).await;
        insert_unit(&db, vacant.id, "9Z").await;
        assert!(ensure_property_removable(&db, vacant.id).await.is_ok());
    }
}
