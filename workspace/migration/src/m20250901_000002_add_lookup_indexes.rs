use crate::entity_iden::EntityIden;
use model::entities::{lease, maintenance_request, prelude::*, unit};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // A unit number may repeat across properties but not within one
        manager
            .create_index(
                Index::create()
                    .name("ux_units_property_unit_number")
                    .table(Unit::table())
                    .col(Unit::column(unit::Column::PropertyId))
                    .col(Unit::column(unit::Column::UnitNumber))
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Overlap checks scan active leases of one unit
        manager
            .create_index(
                Index::create()
                    .name("ix_leases_unit_active")
                    .table(Lease::table())
                    .col(Lease::column(lease::Column::UnitId))
                    .col(Lease::column(lease::Column::IsActive))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_maintenance_property_unit_tenant")
                    .table(MaintenanceRequest::table())
                    .col(MaintenanceRequest::column(maintenance_request::Column::PropertyId))
                    .col(MaintenanceRequest::column(maintenance_request::Column::UnitId))
                    .col(MaintenanceRequest::column(maintenance_request::Column::TenantId))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in [
            ("ix_maintenance_property_unit_tenant", MaintenanceRequest::table()),
            ("ix_leases_unit_active", Lease::table()),
            ("ux_units_property_unit_number", Unit::table()),
        ] {
            manager
                .drop_index(Index::drop().name(name).table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}
