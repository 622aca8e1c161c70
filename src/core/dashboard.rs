//! Monthly dashboard aggregation.
//!
//! Groups readings and costs per meter type into calendar-month cards.
//! Consumption is always computed over a meter's entire history first and
//! only then filtered to the requested month, so the month's first reading
//! gets a correct delta against the reading before the month started. The
//! fixed monthly charge is applied exactly once per meter type per month,
//! unlike the per-reading cost lines which each carry it.

use crate::{
    core::{consumption, meter, reading, tariff},
    entities::{MeterType, reading::Model as ReadingModel},
    errors::Result,
};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use std::collections::HashSet;

/// A calendar month, the unit of dashboard aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    /// Calendar year
    pub year: i32,
    /// Month of year, 1-12
    pub month: u32,
}

impl YearMonth {
    /// The month a date falls in.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current calendar month (UTC).
    #[must_use]
    pub fn current() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    /// First day of the month.
    ///
    /// The month field always comes from a valid date, so the conversion
    /// cannot fail.
    #[must_use]
    #[allow(clippy::unwrap_used, clippy::missing_panics_doc)]
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap()
    }

    /// Last day of the month.
    #[must_use]
    #[allow(clippy::unwrap_used, clippy::missing_panics_doc)]
    pub fn last_day(self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap() - Duration::days(1)
    }

    /// Whether a date falls inside this month.
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One dashboard card: a meter type's consumption and cost for a month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyCard {
    /// Meter type this card summarizes
    pub meter_type: MeterType,
    /// Display title, taken from the first configured meter of the type
    pub title: String,
    /// Measurement unit for the consumption figure
    pub unit: String,
    /// Total consumption in the month; `None` when no readings fall in it
    pub consumption: Option<f64>,
    /// Total cost for the month; the fixed charge alone when the month is
    /// empty but a tariff exists, `None` without a tariff
    pub cost: Option<f64>,
    /// Fixed monthly charge of the active tariff (0 without one)
    pub fixed_monthly: f64,
    /// Currency of the cost figure
    pub currency: String,
    /// Label describing the chronologically last reading of the month
    pub last_reading_label: String,
    /// Whether the meter type has no reading in the month
    pub missing: bool,
}

/// Builds the dashboard card for one meter type and month.
pub async fn monthly_card(
    db: &DatabaseConnection,
    meter_type: MeterType,
    ym: YearMonth,
) -> Result<MonthlyCard> {
    let meters = meter::get_meters_by_type(db, meter_type).await?;
    let title = meters
        .first()
        .map_or_else(|| meter_type.to_string(), |m| m.name.clone());
    let unit = meters.first().map_or_else(
        || meter_type.default_unit().to_string(),
        |m| m.unit.clone(),
    );

    // Full histories of every meter of this type; filtering happens after
    // the consumption pass.
    let mut readings: Vec<ReadingModel> = Vec::new();
    for m in &meters {
        readings.extend(reading::get_readings_for_meter(db, m.id).await?);
    }
    let consumption_map = consumption::consumption_by_reading(&readings);

    let in_month: Vec<&ReadingModel> = readings.iter().filter(|r| ym.contains(r.date)).collect();
    let missing = in_month.is_empty();

    let total_consumption: f64 = in_month
        .iter()
        .filter_map(|r| consumption_map.get(&r.id).copied().flatten())
        .map(|c| c.max(0.0))
        .sum();

    let active_tariff = tariff::get_tariff(db, meter_type).await?;
    let fixed_monthly = active_tariff.as_ref().map_or(0.0, |t| t.fixed_monthly);
    let currency = active_tariff
        .as_ref()
        .map_or_else(|| tariff::DEFAULT_CURRENCY.to_string(), |t| t.currency.clone());

    let consumption = if missing { None } else { Some(total_consumption) };
    let cost = match (&active_tariff, missing) {
        (Some(t), false) => Some(total_consumption * t.price_per_unit + t.fixed_monthly),
        // No readings this month, but the subscription is still payable
        (Some(t), true) => Some(t.fixed_monthly),
        (None, _) => None,
    };

    let last = in_month
        .iter()
        .max_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    let last_reading_label = last.map_or_else(
        || "No reading in selected month".to_string(),
        |r| {
            format!(
                "Last: {} • {:.2} {}",
                r.date.format("%d.%m.%Y"),
                r.value,
                unit
            )
        },
    );

    Ok(MonthlyCard {
        meter_type,
        title,
        unit,
        consumption,
        cost,
        fixed_monthly,
        currency,
        last_reading_label,
        missing,
    })
}

/// Builds one card per registered meter type, in sort order.
pub async fn monthly_cards(db: &DatabaseConnection, ym: YearMonth) -> Result<Vec<MonthlyCard>> {
    let meters = meter::get_all_meters(db).await?;

    let mut seen = HashSet::new();
    let mut cards = Vec::new();
    for m in meters {
        if seen.insert(m.meter_type) {
            cards.push(monthly_card(db, m.meter_type, ym).await?);
        }
    }
    Ok(cards)
}

/// Distinct calendar months present across the full reading history,
/// newest first. Defaults to the current month when no readings exist.
pub async fn available_months(db: &DatabaseConnection) -> Result<Vec<YearMonth>> {
    let readings = reading::get_all_readings(db).await?;

    let mut months: Vec<YearMonth> = readings
        .iter()
        .map(|r| YearMonth::from_date(r.date))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    months.sort_unstable_by(|a, b| b.cmp(a));

    if months.is_empty() {
        months.push(YearMonth::current());
    }
    Ok(months)
}

/// Whether every registered meter type has at least one reading in the
/// month. This boolean is the only thing the reminder scheduler consumes:
/// a `false` means the user still has meters to read.
pub async fn all_meter_types_read_in(db: &DatabaseConnection, ym: YearMonth) -> Result<bool> {
    let meters = meter::get_all_meters(db).await?;
    let registered: HashSet<MeterType> = meters.iter().map(|m| m.meter_type).collect();
    if registered.is_empty() {
        return Ok(true);
    }

    let readings = reading::get_all_readings(db).await?;
    let mut read_types: HashSet<MeterType> = HashSet::new();
    for r in readings.iter().filter(|r| ym.contains(r.date)) {
        if let Some(m) = meters.iter().find(|m| m.id == r.meter_id) {
            read_types.insert(m.meter_type);
        }
    }

    Ok(registered.iter().all(|t| read_types.contains(t)))
}
