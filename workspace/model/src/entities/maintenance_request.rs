use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::property;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum MaintenancePriority {
    #[sea_orm(string_value = "Low")]
    Low,
    #[default]
    #[sea_orm(string_value = "Medium")]
    Medium,
    #[sea_orm(string_value = "High")]
    High,
    #[sea_orm(string_value = "Urgent")]
    Urgent,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum MaintenanceStatus {
    #[default]
    #[sea_orm(string_value = "Open")]
    Open,
    #[sea_orm(string_value = "InProgress")]
    InProgress,
    #[sea_orm(string_value = "OnHold")]
    OnHold,
    #[sea_orm(string_value = "Resolved")]
    Resolved,
    #[sea_orm(string_value = "Closed")]
    Closed,
}

/// A repair or upkeep request filed against a property, optionally narrowed
/// to one unit and/or raised on behalf of a tenant.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "maintenance_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub property_id: i32,
    /// None for common areas.
    pub unit_id: Option<i32>,
    /// None when staff filed the request.
    pub tenant_id: Option<i32>,
    pub title: String,
    pub description: Option<String>,
    pub priority: MaintenancePriority,
    pub status: MaintenanceStatus,
    pub created_at_utc: DateTimeUtc,
    pub updated_at_utc: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "property::Entity",
        from = "Column::PropertyId",
        to = "property::Column::Id",
        on_delete = "Cascade"
    )]
    Property,
}

impl Related<property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
