//! Append-only audit trail of mutations.

use std::fmt;

use chrono::Utc;
use model::entities::audit_log;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::{debug, instrument};

use crate::error::Result;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 200;
/// Highest page served; keeps the row offset well inside `u64`.
pub const MAX_PAGE: u64 = u32::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "Created",
            AuditAction::Updated => "Updated",
            AuditAction::Deleted => "Deleted",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appends one entry. Callers pass their open transaction so the entry
/// commits or rolls back together with the change it describes.
#[instrument(skip(conn, details))]
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    actor: &str,
    action: AuditAction,
    entity_name: &str,
    entity_id: Option<i32>,
    details: Option<String>,
) -> Result<audit_log::Model> {
    let entry = audit_log::ActiveModel {
        actor: Set(actor.to_string()),
        action: Set(action.as_str().to_string()),
        entity_name: Set(entity_name.to_string()),
        entity_id: Set(entity_id),
        details: Set(details),
        at_utc: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    debug!("Audit entry {} written", entry.id);
    Ok(entry)
}

/// Paging and filter parameters for reading the trail.
///
/// Raw values come straight from the caller and may be zero or negative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub entity_name: Option<String>,
}

impl AuditQuery {
    /// 1-based page, clamped to `1..=MAX_PAGE`.
    pub fn page(&self) -> u64 {
        self.page.map_or(1, |page| page.clamp(1, MAX_PAGE as i64) as u64)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size.map_or(DEFAULT_PAGE_SIZE, |size| {
            size.clamp(1, MAX_PAGE_SIZE as i64) as u64
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditPage {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub items: Vec<audit_log::Model>,
}

/// Reads one page of the trail, newest first.
#[instrument(skip(conn))]
pub async fn page<C: ConnectionTrait>(conn: &C, query: &AuditQuery) -> Result<AuditPage> {
    let page = query.page();
    let page_size = query.page_size();

    let mut select = audit_log::Entity::find();
    if let Some(name) = query.entity_name.as_deref().filter(|n| !n.is_empty()) {
        select = select.filter(audit_log::Column::EntityName.eq(name));
    }

    let total = select.clone().count(conn).await?;
    let items = select
        // Ids grow with insertion order on an append-only table
        .order_by_desc(audit_log::Column::Id)
        .offset((page - 1) * page_size)
        .limit(page_size)
        .all(conn)
        .await?;

    debug!("Audit page {} of size {}: {} of {} entries", page, page_size, items.len(), total);
    Ok(AuditPage {
        total,
        page,
        page_size,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::setup_db;

    #[test]
    fn test_paging_is_normalised() {
        let defaults = AuditQuery::default();
        assert_eq!(defaults.page(), 1);
        assert_eq!(defaults.page_size(), DEFAULT_PAGE_SIZE);

        let odd = AuditQuery {
            page: Some(0),
            page_size: Some(10_000),
            entity_name: None,
        };
        assert_eq!(odd.page(), 1);
        assert_eq!(odd.page_size(), MAX_PAGE_SIZE);

        let tiny = AuditQuery {
            page: Some(3),
            page_size: Some(0),
            entity_name: None,
        };
        assert_eq!(tiny.page(), 3);
        assert_eq!(tiny.page_size(), 1);

        let negative = AuditQuery {
            page: Some(-4),
            page_size: Some(-5),
            entity_name: None,
        };
        assert_eq!(negative.page(), 1);
        assert_eq!(negative.page_size(), 1);

        let huge = AuditQuery {
            page: Some(i64::MAX),
            page_size: Some(i64::MAX),
            entity_name: None,
        };
        assert_eq!(huge.page(), MAX_PAGE);
        assert_eq!(huge.page_size(), MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let db = setup_db().await;
        record(&db, "admin", AuditAction::Created, "Unit", Some(1), None)
            .await
            .unwrap();

        let last = page(
            &db,
            &AuditQuery {
                page: Some(i64::MAX),
                page_size: Some(i64::MAX),
                entity_name: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(last.total, 1);
        assert_eq!(last.page, MAX_PAGE);
        assert!(last.items.is_empty());
    }

    #[tokio::test]
    async fn test_record_and_page_newest_first() {
        let db = setup_db().await;

        for id in 1..=5 {
            record(&db, "admin", AuditAction::Created, "Property", Some(id), None)
                .await
                .unwrap();
        }
        record(
            &db,
            "manager",
            AuditAction::Deleted,
            "Lease",
            Some(9),
            Some("removed with 2 payments".to_string()),
        )
        .await
        .unwrap();

        let first = page(
            &db,
            &AuditQuery {
                page: Some(1),
                page_size: Some(4),
                entity_name: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(first.total, 6);
        assert_eq!(first.items.len(), 4);
        assert_eq!(first.items[0].entity_name, "Lease");
        assert_eq!(first.items[0].action, "Deleted");

        let second = page(
            &db,
            &AuditQuery {
                page: Some(2),
                page_size: Some(4),
                entity_name: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.items.last().and_then(|e| e.entity_id), Some(1));
    }

    #[tokio::test]
    async fn test_entity_filter() {
        let db = setup_db().await;
        record(&db, "admin", AuditAction::Created, "Tenant", Some(1), None)
            .await
            .unwrap();
        record(&db, "admin", AuditAction::Updated, "Unit", Some(2), None)
            .await
            .unwrap();

        let tenants = page(
            &db,
            &AuditQuery {
                entity_name: Some("Tenant".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(tenants.total, 1);
        assert_eq!(tenants.items[0].actor, "admin");
        assert_eq!(AuditAction::Updated.to_string(), "Updated");
    }
}
