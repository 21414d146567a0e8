use sea_orm_migration::prelude::*;

mod m20240601_000001_create_routing_tables;
mod m20240601_000002_create_chat_logs_table;

/// Database migrator for SeaORM
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_routing_tables::Migration),
            Box::new(m20240601_000002_create_chat_logs_table::Migration),
        ]
    }
}
