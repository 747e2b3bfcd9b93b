use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{tenant, unit};

/// A tenancy of one unit by one tenant over the half-open range
/// `[start_date_utc, end_date_utc)`.
///
/// Active leases of the same unit never overlap; the rule is enforced by the
/// `domain` crate before every insert and update.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "leases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub unit_id: i32,
    pub tenant_id: i32,
    pub start_date_utc: DateTimeUtc,
    pub end_date_utc: DateTimeUtc,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub monthly_rent: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub security_deposit: Decimal,
    /// Only active leases take part in overlap checks and accept payments.
    pub is_active: bool,
    pub created_at_utc: DateTimeUtc,
    pub updated_at_utc: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "unit::Entity",
        from = "Column::UnitId",
        to = "unit::Column::Id",
        on_delete = "Restrict"
    )]
    Unit,
    #[sea_orm(
        belongs_to = "tenant::Entity",
        from = "Column::TenantId",
        to = "tenant::Column::Id",
        on_delete = "Restrict"
    )]
    Tenant,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
}

impl Related<unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Unit.def()
    }
}

impl Related<tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
