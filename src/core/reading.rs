//! Reading store - Validated CRUD over raw meter readings.
//!
//! Every insert and update passes the sequence rules before anything is
//! written: one reading per meter per day, and non-reset values must stay
//! between their chronological neighbors. The rules run inside the same
//! database transaction as the write, so a rejected validation leaves the
//! store unchanged and two concurrent inserts for the same day cannot both
//! pass the uniqueness check. Deletes are unconditional; they only affect
//! the derived consumption of surviving neighbors on the next query.
//!
//! Readings are totally ordered by `(date, id)`. Uniqueness makes same-day
//! ties impossible within one meter, but neighbor queries still order by id
//! as the second key.

use crate::{
    entities::{Meter, Reading, reading},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Finds another reading for the same meter and day, excluding the row
/// being edited.
async fn find_duplicate<C>(
    db: &C,
    meter_id: i64,
    date: NaiveDate,
    exclude_id: Option<i64>,
) -> Result<Option<reading::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Reading::find()
        .filter(reading::Column::MeterId.eq(meter_id))
        .filter(reading::Column::Date.eq(date));
    if let Some(id) = exclude_id {
        query = query.filter(reading::Column::Id.ne(id));
    }
    query.one(db).await.map_err(Into::into)
}

/// The chronologically previous reading for a meter: latest `(date, id)`
/// strictly before `date`.
async fn previous_reading<C>(
    db: &C,
    meter_id: i64,
    date: NaiveDate,
    exclude_id: Option<i64>,
) -> Result<Option<reading::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Reading::find()
        .filter(reading::Column::MeterId.eq(meter_id))
        .filter(reading::Column::Date.lt(date))
        .order_by_desc(reading::Column::Date)
        .order_by_desc(reading::Column::Id);
    if let Some(id) = exclude_id {
        query = query.filter(reading::Column::Id.ne(id));
    }
    query.one(db).await.map_err(Into::into)
}

/// The chronologically next reading for a meter: earliest `(date, id)`
/// strictly after `date`.
async fn next_reading<C>(
    db: &C,
    meter_id: i64,
    date: NaiveDate,
    exclude_id: Option<i64>,
) -> Result<Option<reading::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Reading::find()
        .filter(reading::Column::MeterId.eq(meter_id))
        .filter(reading::Column::Date.gt(date))
        .order_by_asc(reading::Column::Date)
        .order_by_asc(reading::Column::Id);
    if let Some(id) = exclude_id {
        query = query.filter(reading::Column::Id.ne(id));
    }
    query.one(db).await.map_err(Into::into)
}

/// Applies the sequence rules for an insert or update.
///
/// Rules, in order:
/// 1. No other reading may exist for `(meter_id, date)`.
/// 2. Reset readings skip monotonicity entirely: a fresh dial may start
///    below the previous value.
/// 3. Non-reset readings must not be lower than the previous reading, and
///    must not be higher than the next reading unless that next reading is
///    itself a reset (a replacement dial after this date says nothing about
///    this value).
async fn validate_sequence<C>(
    db: &C,
    meter_id: i64,
    date: NaiveDate,
    value: f64,
    is_reset: bool,
    exclude_id: Option<i64>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidReadingValue { value });
    }

    if find_duplicate(db, meter_id, date, exclude_id).await?.is_some() {
        return Err(Error::DuplicateDate { date });
    }

    if is_reset {
        return Ok(());
    }

    if let Some(prev) = previous_reading(db, meter_id, date, exclude_id).await? {
        if value < prev.value {
            return Err(Error::BelowPrevious {
                previous: prev.value,
            });
        }
    }

    if let Some(next) = next_reading(db, meter_id, date, exclude_id).await? {
        if !next.is_reset && value > next.value {
            return Err(Error::AboveNext { next: next.value });
        }
    }

    Ok(())
}

/// Creates a new reading after sequence validation, all in one transaction.
pub async fn create_reading(
    db: &DatabaseConnection,
    meter_id: i64,
    date: NaiveDate,
    value: f64,
    is_reset: bool,
) -> Result<reading::Model> {
    let txn = db.begin().await?;

    Meter::find_by_id(meter_id)
        .one(&txn)
        .await?
        .ok_or(Error::MeterNotFound { id: meter_id })?;

    validate_sequence(&txn, meter_id, date, value, is_reset, None).await?;

    let new_reading = reading::ActiveModel {
        meter_id: Set(meter_id),
        date: Set(date),
        value: Set(value),
        is_reset: Set(is_reset),
        ..Default::default()
    };
    let model = new_reading.insert(&txn).await?;

    txn.commit().await?;

    tracing::debug!(reading_id = model.id, meter_id, %date, value, is_reset, "created reading");
    Ok(model)
}

/// Updates an existing reading after sequence validation, excluding the
/// edited row from its own neighbor and duplicate checks.
pub async fn update_reading(
    db: &DatabaseConnection,
    id: i64,
    meter_id: i64,
    date: NaiveDate,
    value: f64,
    is_reset: bool,
) -> Result<reading::Model> {
    let txn = db.begin().await?;

    let existing = Reading::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(Error::ReadingNotFound { id })?;

    Meter::find_by_id(meter_id)
        .one(&txn)
        .await?
        .ok_or(Error::MeterNotFound { id: meter_id })?;

    validate_sequence(&txn, meter_id, date, value, is_reset, Some(id)).await?;

    let mut active_model: reading::ActiveModel = existing.into();
    active_model.meter_id = Set(meter_id);
    active_model.date = Set(date);
    active_model.value = Set(value);
    active_model.is_reset = Set(is_reset);
    let model = active_model.update(&txn).await?;

    txn.commit().await?;

    tracing::debug!(reading_id = id, meter_id, %date, value, is_reset, "updated reading");
    Ok(model)
}

/// Deletes a reading. No validation is applied: removal only changes the
/// derived consumption of the surviving neighbors on their next query.
pub async fn delete_reading(db: &DatabaseConnection, id: i64) -> Result<()> {
    let result = Reading::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::ReadingNotFound { id });
    }
    tracing::debug!(reading_id = id, "deleted reading");
    Ok(())
}

/// Finds a reading by its unique ID.
pub async fn get_reading_by_id(
    db: &DatabaseConnection,
    id: i64,
) -> Result<Option<reading::Model>> {
    Reading::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Retrieves the full reading history of one meter, ordered `(date, id)`
/// ascending.
pub async fn get_readings_for_meter(
    db: &DatabaseConnection,
    meter_id: i64,
) -> Result<Vec<reading::Model>> {
    Reading::find()
        .filter(reading::Column::MeterId.eq(meter_id))
        .order_by_asc(reading::Column::Date)
        .order_by_asc(reading::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the full reading history across all meters, ordered
/// `(date, id)` ascending.
pub async fn get_all_readings(db: &DatabaseConnection) -> Result<Vec<reading::Model>> {
    Reading::find()
        .order_by_asc(reading::Column::Date)
        .order_by_asc(reading::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
