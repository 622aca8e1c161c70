//! Tariff resolution - AUTO and MANUAL tracks with an active projection.
//!
//! Each meter type has at most one tariff row holding both tracks. The
//! tracks are independent histories: refreshing from the external feed
//! never disturbs the manual values and vice versa, so switching modes
//! never loses previously fetched or previously entered data. The active
//! projection columns are recomputed from the selected track on every
//! mutation; nothing else reads the tracks directly.
//!
//! All mutations are read-modify-write inside one transaction per meter
//! type, which serializes a racing external refresh against a manual save.

use crate::{
    entities::{MeterType, SourceMode, Tariff, tariff},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, TransactionTrait, TryIntoModel, prelude::*};

/// Default currency for tariff prices.
pub const DEFAULT_CURRENCY: &str = "RON";

/// A price obtained from the external tariff feed.
#[derive(Debug, Clone, PartialEq)]
pub struct TariffQuote {
    /// Price per unit in [`DEFAULT_CURRENCY`]
    pub price_per_unit: f64,
    /// Label of the feed that produced the price (e.g. "EUROSTAT")
    pub source: String,
    /// When the feed produced the price
    pub fetched_at: DateTime<Utc>,
}

/// Port for the external tariff feed.
///
/// Implementations own all network I/O and error shaping; the core only
/// sees already-fetched values or an opaque failure message, which it
/// surfaces verbatim as [`Error::ExternalFetchFailed`].
pub trait TariffSource {
    /// Produces the latest known price for one meter type.
    fn fetch_price(&self, meter_type: MeterType) -> std::result::Result<TariffQuote, String>;
}

/// Returns the tariff row for a meter type, if one exists. The model
/// carries the active projection plus both tracks.
pub async fn get_tariff(
    db: &DatabaseConnection,
    meter_type: MeterType,
) -> Result<Option<tariff::Model>> {
    Tariff::find()
        .filter(tariff::Column::MeterType.eq(meter_type))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns all tariff rows.
pub async fn get_all_tariffs(db: &DatabaseConnection) -> Result<Vec<tariff::Model>> {
    Tariff::find().all(db).await.map_err(Into::into)
}

async fn find_by_type<C>(db: &C, meter_type: MeterType) -> Result<Option<tariff::Model>>
where
    C: ConnectionTrait,
{
    Tariff::find()
        .filter(tariff::Column::MeterType.eq(meter_type))
        .one(db)
        .await
        .map_err(Into::into)
}

/// A fresh row for a meter type that has never had a tariff. The
/// projection starts zeroed in AUTO mode and is overwritten by the first
/// mutation that creates the row.
fn new_row(meter_type: MeterType, now: DateTime<Utc>) -> tariff::ActiveModel {
    tariff::ActiveModel {
        meter_type: Set(meter_type),
        price_per_unit: Set(0.0),
        fixed_monthly: Set(0.0),
        currency: Set(DEFAULT_CURRENCY.to_string()),
        updated_at: Set(now),
        source_mode: Set(SourceMode::Auto),
        ..Default::default()
    }
}

/// Writes the AUTO track unconditionally; reprojects the active values
/// only when AUTO is the selected mode.
///
/// When the user is on MANUAL, the fetched price is stored silently for a
/// later mode switch and the active projection stays untouched.
pub async fn refresh_auto(
    db: &DatabaseConnection,
    meter_type: MeterType,
    price_per_unit: f64,
    source: &str,
    fetched_at: DateTime<Utc>,
) -> Result<tariff::Model> {
    let txn = db.begin().await?;

    let existing = find_by_type(&txn, meter_type).await?;
    let mode = existing.as_ref().map_or(SourceMode::Auto, |t| t.source_mode);
    let mut row = match existing {
        Some(model) => tariff::ActiveModel::from(model),
        None => new_row(meter_type, fetched_at),
    };

    row.auto_price_per_unit = Set(Some(price_per_unit));
    row.auto_updated_at = Set(Some(fetched_at));
    row.auto_source = Set(Some(source.to_string()));

    if mode == SourceMode::Auto {
        row.price_per_unit = Set(price_per_unit);
        // The AUTO track carries no fixed charge
        row.fixed_monthly = Set(0.0);
        row.currency = Set(DEFAULT_CURRENCY.to_string());
        row.updated_at = Set(fetched_at);
    }

    let model = row.save(&txn).await?.try_into_model()?;
    txn.commit().await?;

    tracing::info!(%meter_type, price_per_unit, source, "refreshed AUTO tariff");
    Ok(model)
}

/// Writes the MANUAL track and optionally makes it the active mode.
///
/// Field validation only applies when activating: a tariff saved for later
/// may still be incomplete, but it must be sound before it can price
/// readings.
pub async fn save_manual(
    db: &DatabaseConnection,
    meter_type: MeterType,
    provider: &str,
    price_per_unit: f64,
    fixed_monthly: f64,
    make_active: bool,
) -> Result<tariff::Model> {
    if make_active {
        if provider.trim().is_empty() {
            return Err(Error::InvalidManualTariff {
                reason: "provider must not be blank".to_string(),
            });
        }
        if !price_per_unit.is_finite() || price_per_unit < 0.0 {
            return Err(Error::InvalidManualTariff {
                reason: format!("price per unit must be a non-negative number, got {price_per_unit}"),
            });
        }
        if !fixed_monthly.is_finite() || fixed_monthly < 0.0 {
            return Err(Error::InvalidManualTariff {
                reason: format!("fixed monthly must be a non-negative number, got {fixed_monthly}"),
            });
        }
    }

    let now = Utc::now();
    let txn = db.begin().await?;

    let mut row = match find_by_type(&txn, meter_type).await? {
        Some(existing) => tariff::ActiveModel::from(existing),
        None => new_row(meter_type, now),
    };

    row.manual_provider = Set(Some(provider.trim().to_string()));
    row.manual_price_per_unit = Set(Some(price_per_unit));
    row.manual_fixed_monthly = Set(Some(fixed_monthly));
    row.manual_updated_at = Set(Some(now));

    if make_active {
        row.source_mode = Set(SourceMode::Manual);
        row.price_per_unit = Set(price_per_unit);
        row.fixed_monthly = Set(fixed_monthly);
        row.currency = Set(DEFAULT_CURRENCY.to_string());
        row.updated_at = Set(now);
    }

    let model = row.save(&txn).await?.try_into_model()?;
    txn.commit().await?;

    tracing::info!(%meter_type, make_active, "saved MANUAL tariff");
    Ok(model)
}

/// Switches a meter type back to the AUTO track.
///
/// Fails with [`Error::NoAutoTariffYet`] when no AUTO value was ever
/// fetched, leaving the row untouched. The projection takes the AUTO
/// track's own timestamp, not the switch time, and a zero fixed charge:
/// the feed prices are per-unit only.
pub async fn set_mode_auto(
    db: &DatabaseConnection,
    meter_type: MeterType,
) -> Result<tariff::Model> {
    let txn = db.begin().await?;

    let existing = find_by_type(&txn, meter_type)
        .await?
        .ok_or(Error::NoAutoTariffYet { meter_type })?;
    let auto_price = existing
        .auto_price_per_unit
        .ok_or(Error::NoAutoTariffYet { meter_type })?;
    let auto_ts = existing.auto_updated_at.unwrap_or_else(Utc::now);

    let mut row = tariff::ActiveModel::from(existing);
    row.source_mode = Set(SourceMode::Auto);
    row.price_per_unit = Set(auto_price);
    row.fixed_monthly = Set(0.0);
    row.currency = Set(DEFAULT_CURRENCY.to_string());
    row.updated_at = Set(auto_ts);

    let model = row.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(%meter_type, "switched tariff mode to AUTO");
    Ok(model)
}

/// Fetches a quote for each requested meter type from the external feed
/// and applies it to the AUTO track.
///
/// A fetch failure surfaces verbatim and leaves that type's AUTO track
/// unchanged. Types are processed independently; there is no retry logic
/// here.
pub async fn sync_auto_tariffs<S>(
    db: &DatabaseConnection,
    source: &S,
    meter_types: &[MeterType],
) -> Result<Vec<tariff::Model>>
where
    S: TariffSource,
{
    let mut updated = Vec::with_capacity(meter_types.len());

    for &meter_type in meter_types {
        let quote = source
            .fetch_price(meter_type)
            .map_err(|message| Error::ExternalFetchFailed { message })?;
        let model = refresh_auto(
            db,
            meter_type,
            quote.price_per_unit,
            &quote.source,
            quote.fetched_at,
        )
        .await?;
        updated.push(model);
    }

    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    struct FixedSource {
        price: f64,
    }

    impl TariffSource for FixedSource {
        fn fetch_price(&self, _meter_type: MeterType) -> std::result::Result<TariffQuote, String> {
            Ok(TariffQuote {
                price_per_unit: self.price,
                source: "EUROSTAT".to_string(),
                fetched_at: ts(1_700_000_000),
            })
        }
    }

    struct FailingSource;

    impl TariffSource for FailingSource {
        fn fetch_price(&self, _meter_type: MeterType) -> std::result::Result<TariffQuote, String> {
            Err("connection refused".to_string())
        }
    }

    #[tokio::test]
    async fn test_refresh_auto_creates_row_and_projects() -> Result<()> {
        let db = setup_test_db().await?;

        let tariff =
            refresh_auto(&db, MeterType::Electricity, 0.85, "EUROSTAT", ts(1_000)).await?;
        assert_eq!(tariff.source_mode, SourceMode::Auto);
        assert_eq!(tariff.price_per_unit, 0.85);
        assert_eq!(tariff.fixed_monthly, 0.0);
        assert_eq!(tariff.updated_at, ts(1_000));
        assert_eq!(tariff.auto_price_per_unit, Some(0.85));
        assert_eq!(tariff.auto_source.as_deref(), Some("EUROSTAT"));

        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_auto_while_manual_keeps_projection() -> Result<()> {
        let db = setup_test_db().await?;

        save_manual(&db, MeterType::Gas, "Engie", 3.2, 12.0, true).await?;
        let tariff = refresh_auto(&db, MeterType::Gas, 2.9, "EUROSTAT", ts(2_000)).await?;

        // AUTO track stored silently for a later switch
        assert_eq!(tariff.auto_price_per_unit, Some(2.9));
        assert_eq!(tariff.auto_updated_at, Some(ts(2_000)));
        // Active projection still mirrors the manual values
        assert_eq!(tariff.source_mode, SourceMode::Manual);
        assert_eq!(tariff.price_per_unit, 3.2);
        assert_eq!(tariff.fixed_monthly, 12.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_save_manual_validation_only_when_activating() -> Result<()> {
        let db = setup_test_db().await?;

        let result = save_manual(&db, MeterType::Water, "   ", 9.5, 5.0, true).await;
        assert!(matches!(result, Err(Error::InvalidManualTariff { .. })));

        let result = save_manual(&db, MeterType::Water, "Aquaserv", f64::NAN, 5.0, true).await;
        assert!(matches!(result, Err(Error::InvalidManualTariff { .. })));

        let result = save_manual(&db, MeterType::Water, "Aquaserv", 9.5, -1.0, true).await;
        assert!(matches!(result, Err(Error::InvalidManualTariff { .. })));

        // Rejection performed no writes
        assert!(get_tariff(&db, MeterType::Water).await?.is_none());

        // Saving without activating skips the field validation
        let tariff = save_manual(&db, MeterType::Water, "", 9.5, 5.0, false).await?;
        assert_eq!(tariff.source_mode, SourceMode::Auto);
        assert_eq!(tariff.manual_price_per_unit, Some(9.5));

        Ok(())
    }

    #[tokio::test]
    async fn test_save_manual_activates_projection() -> Result<()> {
        let db = setup_test_db().await?;

        let tariff = save_manual(&db, MeterType::Water, "Aquaserv", 9.5, 5.0, true).await?;
        assert_eq!(tariff.source_mode, SourceMode::Manual);
        assert_eq!(tariff.price_per_unit, 9.5);
        assert_eq!(tariff.fixed_monthly, 5.0);
        assert_eq!(tariff.manual_provider.as_deref(), Some("Aquaserv"));

        Ok(())
    }

    #[tokio::test]
    async fn test_set_mode_auto_before_any_fetch_fails() -> Result<()> {
        let db = setup_test_db().await?;

        save_manual(&db, MeterType::Water, "Aquaserv", 9.5, 5.0, true).await?;
        let result = set_mode_auto(&db, MeterType::Water).await;
        assert!(matches!(result, Err(Error::NoAutoTariffYet { .. })));

        // Mode switch rejection left the manual values active and intact
        let tariff = get_tariff(&db, MeterType::Water).await?.unwrap();
        assert_eq!(tariff.source_mode, SourceMode::Manual);
        assert_eq!(tariff.price_per_unit, 9.5);
        assert_eq!(tariff.manual_price_per_unit, Some(9.5));

        Ok(())
    }

    #[tokio::test]
    async fn test_set_mode_auto_missing_row_fails() -> Result<()> {
        let db = setup_test_db().await?;

        let result = set_mode_auto(&db, MeterType::Gas).await;
        assert!(matches!(result, Err(Error::NoAutoTariffYet { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_mode_round_trip_preserves_both_tracks() -> Result<()> {
        let db = setup_test_db().await?;

        refresh_auto(&db, MeterType::Electricity, 0.85, "EUROSTAT", ts(5_000)).await?;
        save_manual(&db, MeterType::Electricity, "Hidroelectrica", 0.75, 10.0, true).await?;

        // Back to AUTO: projection mirrors the stored AUTO track with its
        // own timestamp and no fixed charge.
        let tariff = set_mode_auto(&db, MeterType::Electricity).await?;
        assert_eq!(tariff.source_mode, SourceMode::Auto);
        assert_eq!(tariff.price_per_unit, 0.85);
        assert_eq!(tariff.fixed_monthly, 0.0);
        assert_eq!(tariff.updated_at, ts(5_000));

        // Both tracks survived the round trip untouched
        assert_eq!(tariff.auto_price_per_unit, Some(0.85));
        assert_eq!(tariff.manual_price_per_unit, Some(0.75));
        assert_eq!(tariff.manual_fixed_monthly, Some(10.0));
        assert_eq!(tariff.manual_provider.as_deref(), Some("Hidroelectrica"));

        // And forward again to MANUAL
        let tariff = save_manual(&db, MeterType::Electricity, "Hidroelectrica", 0.75, 10.0, true)
            .await?;
        assert_eq!(tariff.price_per_unit, 0.75);
        assert_eq!(tariff.fixed_monthly, 10.0);
        assert_eq!(tariff.auto_price_per_unit, Some(0.85));

        Ok(())
    }

    #[tokio::test]
    async fn test_sync_auto_tariffs_applies_quotes() -> Result<()> {
        let db = setup_test_db().await?;

        let updated = sync_auto_tariffs(
            &db,
            &FixedSource { price: 0.6 },
            &[MeterType::Electricity, MeterType::Gas],
        )
        .await?;
        assert_eq!(updated.len(), 2);
        assert!(updated.iter().all(|t| t.auto_price_per_unit == Some(0.6)));

        Ok(())
    }

    #[tokio::test]
    async fn test_sync_auto_tariffs_surfaces_fetch_failure() -> Result<()> {
        let db = setup_test_db().await?;

        refresh_auto(&db, MeterType::Gas, 2.9, "EUROSTAT", ts(3_000)).await?;

        let result = sync_auto_tariffs(&db, &FailingSource, &[MeterType::Gas]).await;
        match result {
            Err(Error::ExternalFetchFailed { message }) => {
                assert_eq!(message, "connection refused");
            }
            other => panic!("expected ExternalFetchFailed, got {other:?}"),
        }

        // The failure did not corrupt the stored AUTO track
        let tariff = get_tariff(&db, MeterType::Gas).await?.unwrap();
        assert_eq!(tariff.auto_price_per_unit, Some(2.9));
        assert_eq!(tariff.auto_updated_at, Some(ts(3_000)));

        Ok(())
    }
}
