//! Meter seed configuration loading from config.toml
//!
//! The meters defined in config.toml are used to seed the database on first
//! run or when meters are missing. Seeding is idempotent: a meter already
//! present (matched by type and name) is left untouched.

use crate::entities::{Meter, MeterType, meter};
use crate::errors::{Error, Result};
use sea_orm::{Set, prelude::*};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct Config {
    /// List of meter configurations to seed
    pub meters: Vec<MeterConfig>,
}

/// Configuration for a single meter
#[derive(Debug, Deserialize, Clone)]
pub struct MeterConfig {
    /// Which utility the meter measures (`WATER`, `ELECTRICITY`, `GAS`)
    pub meter_type: MeterType,
    /// Display name (e.g. "Electricity")
    pub name: String,
    /// Measurement unit of the dial (e.g. "kWh", "m³")
    pub unit: String,
    /// Position in pickers and dashboards
    pub sort_order: i32,
}

/// Loads meter configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML syntax is invalid,
/// or required fields are missing.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads meter configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}

/// Inserts every configured meter that does not already exist.
///
/// Returns the number of meters inserted.
pub async fn seed_initial_meters(db: &DatabaseConnection, config: &Config) -> Result<usize> {
    let mut inserted = 0;

    for meter_config in &config.meters {
        let existing = Meter::find()
            .filter(meter::Column::MeterType.eq(meter_config.meter_type))
            .filter(meter::Column::Name.eq(meter_config.name.as_str()))
            .one(db)
            .await?;

        if existing.is_some() {
            tracing::debug!(name = %meter_config.name, "meter already seeded, skipping");
            continue;
        }

        let new_meter = meter::ActiveModel {
            meter_type: Set(meter_config.meter_type),
            name: Set(meter_config.name.clone()),
            unit: Set(meter_config.unit.clone()),
            sort_order: Set(meter_config.sort_order),
            ..Default::default()
        };
        new_meter.insert(db).await?;

        tracing::info!(name = %meter_config.name, meter_type = %meter_config.meter_type, "seeded meter");
        inserted += 1;
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    fn sample_config() -> Config {
        toml::from_str(
            r#"
            [[meters]]
            meter_type = "WATER"
            name = "Water"
            unit = "m³"
            sort_order = 1

            [[meters]]
            meter_type = "ELECTRICITY"
            name = "Electricity"
            unit = "kWh"
            sort_order = 2

            [[meters]]
            meter_type = "GAS"
            name = "Gas"
            unit = "m³"
            sort_order = 3
        "#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_meter_config() {
        let config = sample_config();
        assert_eq!(config.meters.len(), 3);
        assert_eq!(config.meters[0].meter_type, MeterType::Water);
        assert_eq!(config.meters[1].name, "Electricity");
        assert_eq!(config.meters[1].unit, "kWh");
        assert_eq!(config.meters[2].sort_order, 3);
    }

    #[tokio::test]
    async fn test_seed_initial_meters() -> Result<()> {
        let db = setup_test_db().await?;
        let config = sample_config();

        let inserted = seed_initial_meters(&db, &config).await?;
        assert_eq!(inserted, 3);

        let all = Meter::find().all(&db).await?;
        assert_eq!(all.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_initial_meters_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let config = sample_config();

        seed_initial_meters(&db, &config).await?;
        let inserted_again = seed_initial_meters(&db, &config).await?;
        assert_eq!(inserted_again, 0);

        let all = Meter::find().all(&db).await?;
        assert_eq!(all.len(), 3);

        Ok(())
    }
}
