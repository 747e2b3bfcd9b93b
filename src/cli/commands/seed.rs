use anyhow::Result;
use chrono::Utc;
use model::entities::{property, unit, user};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, Set, TransactionTrait};
use tracing::{debug, info, trace};

use super::initdb::connect_and_migrate;
use crate::auth::password::hash_password;

pub const SEED_ADMIN_USERNAME: &str = "admin";
pub const SEED_ADMIN_PASSWORD: &str = "Admin@12345";

/// What a seeding run inserted
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub sample_property_created: bool,
}

async fn seed_admin<C: ConnectionTrait>(db: &C) -> Result<bool> {
    if user::Entity::find().count(db).await? > 0 {
        debug!("Users exist, skipping admin seed");
        return Ok(false);
    }

    let password_hash = hash_password(SEED_ADMIN_PASSWORD)?;
    user::ActiveModel {
        username: Set(SEED_ADMIN_USERNAME.to_string()),
        email: Set("admin@local.test".to_string()),
        password_hash: Set(password_hash),
        role: Set(user::Role::Admin),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Seeded admin user '{}'", SEED_ADMIN_USERNAME);
    Ok(true)
}

async fn seed_sample_property<C: ConnectionTrait>(db: &C) -> Result<bool> {
    if property::Entity::find().count(db).await? > 0 {
        debug!("Properties exist, skipping sample property");
        return Ok(false);
    }

    let sunset = property::ActiveModel {
        name: Set("Sunset Apartments".to_string()),
        description: Set(Some("Sample seeded property".to_string())),
        address_line1: Set("123 Main Street".to_string()),
        address_line2: Set(None),
        city: Set("Springfield".to_string()),
        state: Set("IL".to_string()),
        zip: Set("62701".to_string()),
        country: Set("USA".to_string()),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for (number, bedrooms, rent, size) in [("1A", 2, 1200, 900), ("1B", 1, 900, 650)] {
        unit::ActiveModel {
            property_id: Set(sunset.id),
            unit_number: Set(number.to_string()),
            bedrooms: Set(bedrooms),
            bathrooms: Set(1),
            rent: Set(Decimal::from(rent)),
            size_sq_ft: Set(size),
            is_occupied: Set(false),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    info!("Seeded sample property '{}' with 2 units", sunset.name);
    Ok(true)
}

/// Inserts the admin user and the sample property when their tables are empty
pub async fn seed<C: TransactionTrait>(db: &C) -> Result<SeedReport> {
    let txn = db.begin().await?;
    let report = SeedReport {
        admin_created: seed_admin(&txn).await?,
        sample_property_created: seed_sample_property(&txn).await?,
    };
    txn.commit().await?;
    Ok(report)
}

pub async fn seed_database(database_url: &str) -> Result<()> {
    trace!("Entering seed_database function");
    let db = connect_and_migrate(database_url).await?;
    let report = seed(&db).await?;
    info!(
        "Seeding finished (admin created: {}, sample property created: {})",
        report.admin_created, report.sample_property_created
    );
    Ok(())
}
