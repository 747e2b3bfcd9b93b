pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_rental_tables;
mod m20250901_000002_add_lookup_indexes;
pub mod entity_iden;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_rental_tables::Migration),
            Box::new(m20250901_000002_add_lookup_indexes::Migration),
        ]
    }
}
