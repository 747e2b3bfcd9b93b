use sea_orm::entity::prelude::*;

/// Append-only record of who changed what. Rows are never updated.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Username of the caller.
    pub actor: String,
    /// Created / Updated / Deleted
    pub action: String,
    pub entity_name: String,
    pub entity_id: Option<i32>,
    pub details: Option<String>,
    pub at_utc: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
