//! Database configuration module.
//!
//! Handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated with `Schema::create_table_from_entity`, so the
//! database schema always matches the Rust entity definitions without any
//! hand-written SQL.

use crate::entities::{Meter, Reading, Tariff};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from the environment or returns the default
/// local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/utilities_tracker.sqlite?mode=rwc".to_string())
}

/// Establishes a connection to the database using `DATABASE_URL`, falling
/// back to a local `SQLite` file when the variable is not set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url())
        .await
        .map_err(Into::into)
}

/// Creates all tables from the entity definitions. Safe to call on every
/// startup: statements use `IF NOT EXISTS`.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut meter_table = schema.create_table_from_entity(Meter);
    let mut reading_table = schema.create_table_from_entity(Reading);
    let mut tariff_table = schema.create_table_from_entity(Tariff);

    db.execute(builder.build(meter_table.if_not_exists()))
        .await?;
    db.execute(builder.build(reading_table.if_not_exists()))
        .await?;
    db.execute(builder.build(tariff_table.if_not_exists()))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        meter::Model as MeterModel, reading::Model as ReadingModel, tariff::Model as TariffModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Tables exist if we can query them
        let _: Vec<MeterModel> = Meter::find().limit(1).all(&db).await?;
        let _: Vec<ReadingModel> = Reading::find().limit(1).all(&db).await?;
        let _: Vec<TariffModel> = Tariff::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_twice_is_harmless() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let _: Vec<MeterModel> = Meter::find().limit(1).all(&db).await?;
        Ok(())
    }
}
