use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len(Users::Username, 50).unique_key())
                    .col(string_len(Users::Email, 200).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(string_len(Users::Role, 20).default("Manager"))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .col(timestamp_with_time_zone_null(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create properties table
        manager
            .create_table(
                Table::create()
                    .table(Properties::Table)
                    .if_not_exists()
                    .col(pk_auto(Properties::Id))
                    .col(string_len(Properties::Name, 200))
                    .col(string_null(Properties::Description))
                    .col(string_len(Properties::AddressLine1, 200))
                    .col(string_null(Properties::AddressLine2))
                    .col(string_len(Properties::City, 100))
                    .col(string_len(Properties::State, 100))
                    .col(string_len(Properties::Zip, 20))
                    .col(string_len(Properties::Country, 100))
                    .col(timestamp_with_time_zone(Properties::CreatedAt))
                    .col(timestamp_with_time_zone_null(Properties::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create units table
        manager
            .create_table(
                Table::create()
                    .table(Units::Table)
                    .if_not_exists()
                    .col(pk_auto(Units::Id))
                    .col(integer(Units::PropertyId))
                    .col(string_len(Units::UnitNumber, 50))
                    .col(integer(Units::Bedrooms).default(0))
                    .col(integer(Units::Bathrooms).default(0))
                    .col(decimal(Units::Rent).decimal_len(16, 2))
                    .col(integer(Units::SizeSqFt).default(0))
                    .col(boolean(Units::IsOccupied).default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_unit_property")
                            .from(Units::Table, Units::PropertyId)
                            .to(Properties::Table, Properties::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create tenants table
        manager
            .create_table(
                Table::create()
                    .table(Tenants::Table)
                    .if_not_exists()
                    .col(pk_auto(Tenants::Id))
                    .col(string_len(Tenants::FirstName, 100))
                    .col(string_len(Tenants::LastName, 100))
                    .col(string_len(Tenants::Email, 200).unique_key())
                    .col(string_len_null(Tenants::Phone, 30))
                    .col(timestamp_with_time_zone(Tenants::CreatedAt))
                    .col(timestamp_with_time_zone_null(Tenants::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create leases table. Units and tenants cannot be removed while
        // leases reference them.
        manager
            .create_table(
                Table::create()
                    .table(Leases::Table)
                    .if_not_exists()
                    .col(pk_auto(Leases::Id))
                    .col(integer(Leases::UnitId))
                    .col(integer(Leases::TenantId))
                    .col(timestamp_with_time_zone(Leases::StartDateUtc))
                    .col(timestamp_with_time_zone(Leases::EndDateUtc))
                    .col(decimal(Leases::MonthlyRent).decimal_len(16, 2))
                    .col(decimal(Leases::SecurityDeposit).decimal_len(16, 2))
                    .col(boolean(Leases::IsActive).default(true))
                    .col(timestamp_with_time_zone(Leases::CreatedAtUtc))
                    .col(timestamp_with_time_zone_null(Leases::UpdatedAtUtc))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lease_unit")
                            .from(Leases::Table, Leases::UnitId)
                            .to(Units::Table, Units::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lease_tenant")
                            .from(Leases::Table, Leases::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create payments table
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(pk_auto(Payments::Id))
                    .col(integer(Payments::LeaseId))
                    .col(timestamp_with_time_zone(Payments::PaidOnUtc))
                    .col(decimal(Payments::Amount).decimal_len(16, 2))
                    .col(string_len(Payments::Method, 20).default("Cash"))
                    .col(string_len_null(Payments::Reference, 200))
                    .col(string_len_null(Payments::Notes, 1000))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_lease")
                            .from(Payments::Table, Payments::LeaseId)
                            .to(Leases::Table, Leases::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create maintenance_requests table
        manager
            .create_table(
                Table::create()
                    .table(MaintenanceRequests::Table)
                    .if_not_exists()
                    .col(pk_auto(MaintenanceRequests::Id))
                    .col(integer(MaintenanceRequests::PropertyId))
                    .col(integer_null(MaintenanceRequests::UnitId))
                    .col(integer_null(MaintenanceRequests::TenantId))
                    .col(string_len(MaintenanceRequests::Title, 200))
                    .col(string_len_null(MaintenanceRequests::Description, 2000))
                    .col(string_len(MaintenanceRequests::Priority, 20).default("Medium"))
                    .col(string_len(MaintenanceRequests::Status, 20).default("Open"))
                    .col(timestamp_with_time_zone(MaintenanceRequests::CreatedAtUtc))
                    .col(timestamp_with_time_zone_null(MaintenanceRequests::UpdatedAtUtc))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_maintenance_property")
                            .from(MaintenanceRequests::Table, MaintenanceRequests::PropertyId)
                            .to(Properties::Table, Properties::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_maintenance_unit")
                            .from(MaintenanceRequests::Table, MaintenanceRequests::UnitId)
                            .to(Units::Table, Units::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_maintenance_tenant")
                            .from(MaintenanceRequests::Table, MaintenanceRequests::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create audit_logs table
        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(pk_auto(AuditLogs::Id))
                    .col(string(AuditLogs::Actor))
                    .col(string_len(AuditLogs::Action, 20))
                    .col(string_len(AuditLogs::EntityName, 50))
                    .col(integer_null(AuditLogs::EntityId))
                    .col(text_null(AuditLogs::Details))
                    .col(timestamp_with_time_zone(AuditLogs::AtUtc))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation to respect foreign keys
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MaintenanceRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Leases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tenants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Units::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Properties::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Properties {
    Table,
    Id,
    Name,
    Description,
    AddressLine1,
    AddressLine2,
    City,
    State,
    Zip,
    Country,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Units {
    Table,
    Id,
    PropertyId,
    UnitNumber,
    Bedrooms,
    Bathrooms,
    Rent,
    SizeSqFt,
    IsOccupied,
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Id,
    FirstName,
    LastName,
    Email,
    Phone,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Leases {
    Table,
    Id,
    UnitId,
    TenantId,
    StartDateUtc,
    EndDateUtc,
    MonthlyRent,
    SecurityDeposit,
    IsActive,
    CreatedAtUtc,
    UpdatedAtUtc,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    LeaseId,
    PaidOnUtc,
    Amount,
    Method,
    Reference,
    Notes,
}

#[derive(DeriveIden)]
enum MaintenanceRequests {
    Table,
    Id,
    PropertyId,
    UnitId,
    TenantId,
    Title,
    Description,
    Priority,
    Status,
    CreatedAtUtc,
    UpdatedAtUtc,
}

#[derive(DeriveIden)]
enum AuditLogs {
    Table,
    Id,
    Actor,
    Action,
    EntityName,
    EntityId,
    Details,
    AtUtc,
}
