//! Fixtures shared by the unit tests of this crate.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use migration::{Migrator, MigratorTrait};
use model::entities::{lease, payment, property, tenant, unit};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};

static PROPERTY_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database.");
    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys.");
    Migrator::up(&db, None).await.expect("Migrations failed.");
    db
}

pub fn ymd(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub async fn insert_property(db: &DatabaseConnection) -> property::Model {
    let n = PROPERTY_COUNTER.fetch_add(1, Ordering::SeqCst);
    property::ActiveModel {
        name: Set(format!("Property {n}")),
        description: Set(None),
        address_line1: Set("1 Test Way".to_string()),
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
    .await
    .unwrap()
}

pub async fn insert_unit(db: &DatabaseConnection, property_id: i32, number: &str) -> unit::Model {
    unit::ActiveModel {
        property_id: Set(property_id),
        unit_number: Set(number.to_string()),
        bedrooms: Set(1),
        bathrooms: Set(1),
        rent: Set(Decimal::new(100000, 2)),
        size_sq_ft: Set(650),
        is_occupied: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_tenant(db: &DatabaseConnection, email: &str) -> tenant::Model {
    tenant::ActiveModel {
        first_name: Set("Jane".to_string()),
        last_name: Set("Doe".to_string()),
        email: Set(email.to_string()),
        phone: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_lease(
    db: &DatabaseConnection,
    unit_id: i32,
    tenant_id: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    is_active: bool,
) -> lease::Model {
    lease::ActiveModel {
        unit_id: Set(unit_id),
        tenant_id: Set(tenant_id),
        start_date_utc: Set(start),
        end_date_utc: Set(end),
        monthly_rent: Set(Decimal::new(100000, 2)),
        security_deposit: Set(Decimal::ZERO),
        is_active: Set(is_active),
        created_at_utc: Set(Utc::now()),
        updated_at_utc: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_payment(db: &DatabaseConnection, lease_id: i32, amount: Decimal) -> payment::Model {
    payment::ActiveModel {
        lease_id: Set(lease_id),
        paid_on_utc: Set(Utc::now()),
        amount: Set(amount),
        method: Set(payment::PaymentMethod::Cash),
        reference: Set(None),
        notes: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}
