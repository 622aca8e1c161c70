//! Shared test utilities for `UtilitiesTracker`.
//!
//! This module provides common helper functions for setting up test
//! databases and creating test entities with sensible defaults.

use crate::{core::meter, entities, entities::MeterType};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

pub use crate::errors::Result;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a `NaiveDate`, panicking on invalid input (test-only).
#[allow(clippy::unwrap_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Creates a test meter for the given type with a default name and unit.
pub async fn create_test_meter(
    db: &DatabaseConnection,
    meter_type: MeterType,
) -> Result<entities::meter::Model> {
    let name = match meter_type {
        MeterType::Water => "Water",
        MeterType::Electricity => "Electricity",
        MeterType::Gas => "Gas",
    };
    meter::create_meter(
        db,
        meter_type,
        name.to_string(),
        meter_type.default_unit().to_string(),
        1,
    )
    .await
}

/// Sets up a complete test environment with one meter.
/// Returns (db, meter) for common test scenarios.
pub async fn setup_with_meter(
    meter_type: MeterType,
) -> Result<(DatabaseConnection, entities::meter::Model)> {
    let db = setup_test_db().await?;
    let meter = create_test_meter(&db, meter_type).await?;
    Ok((db, meter))
}
