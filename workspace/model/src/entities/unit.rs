use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::property;

/// A rentable unit (apartment, suite, ...) inside a property.
/// `unit_number` is unique within its property.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "units")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub property_id: i32,
    pub unit_number: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    /// Advertised monthly rent.
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub rent: Decimal,
    pub size_sq_ft: i32,
    pub is_occupied: bool,
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
    #[sea_orm(has_many = "super::lease::Entity")]
    Lease,
}

impl Related<property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl Related<super::lease::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lease.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
