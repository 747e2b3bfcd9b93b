use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::lease;

/// How a payment was made.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentMethod {
    #[default]
    #[sea_orm(string_value = "Cash")]
    Cash,
    #[sea_orm(string_value = "Card")]
    Card,
    #[sea_orm(string_value = "BankTransfer")]
    BankTransfer,
    #[sea_orm(string_value = "Cheque")]
    Cheque,
    #[sea_orm(string_value = "OnlineGateway")]
    OnlineGateway,
}

/// A single rent payment recorded against a lease.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub lease_id: i32,
    pub paid_on_utc: DateTimeUtc,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "lease::Entity",
        from = "Column::LeaseId",
        to = "lease::Column::Id",
        on_delete = "Cascade"
    )]
    Lease,
}

impl Related<lease::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lease.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
