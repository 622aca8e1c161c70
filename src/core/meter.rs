//! Meter registry - Lookup operations over the configured meters.
//!
//! Meters are created by the seed step at startup and rarely change, so this
//! module is intentionally small: ordered listing and direct lookups used by
//! the reading, dashboard and export paths.

use crate::{
    entities::{Meter, MeterType, meter},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Retrieves all meters ordered by their configured sort order.
pub async fn get_all_meters(db: &DatabaseConnection) -> Result<Vec<meter::Model>> {
    Meter::find()
        .order_by_asc(meter::Column::SortOrder)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all meters of one type, ordered by sort order.
pub async fn get_meters_by_type(
    db: &DatabaseConnection,
    meter_type: MeterType,
) -> Result<Vec<meter::Model>> {
    Meter::find()
        .filter(meter::Column::MeterType.eq(meter_type))
        .order_by_asc(meter::Column::SortOrder)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a meter by its unique ID.
pub async fn get_meter_by_id(db: &DatabaseConnection, meter_id: i64) -> Result<Option<meter::Model>> {
    Meter::find_by_id(meter_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new meter, validating that the name is not blank.
pub async fn create_meter(
    db: &DatabaseConnection,
    meter_type: MeterType,
    name: String,
    unit: String,
    sort_order: i32,
) -> Result<meter::Model> {
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Meter name cannot be empty".to_string(),
        });
    }

    let new_meter = meter::ActiveModel {
        meter_type: Set(meter_type),
        name: Set(name.trim().to_string()),
        unit: Set(unit),
        sort_order: Set(sort_order),
        ..Default::default()
    };

    let result = new_meter.insert(db).await?;
    Ok(result)
}
