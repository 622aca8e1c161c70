//! Consumption and cost derivation.
//!
//! Consumption is never stored: it is recomputed from the raw readings on
//! every query. Each reading's consumption is its delta against the
//! chronological predecessor within the same meter, with reset readings
//! acting as series boundaries: a reset reading has no consumption of its
//! own, but its value is the baseline for the reading that follows it.
//!
//! These functions must always be fed a meter's entire history, not a
//! filtered window, because the first visible reading's delta depends on
//! readings outside the window. Callers filter the results afterwards.

use crate::entities::{reading, tariff};
use std::collections::HashMap;

/// Computes the consumption of every reading, keyed by reading id.
///
/// Readings may belong to several meters and arrive in any order; they are
/// grouped by meter and sorted by `(date, id)` internally. `None` means the
/// consumption cannot be computed: the reading is a reset marker, or it is
/// the first reading in its meter's history.
#[must_use]
pub fn consumption_by_reading(readings: &[reading::Model]) -> HashMap<i64, Option<f64>> {
    let mut by_meter: HashMap<i64, Vec<&reading::Model>> = HashMap::new();
    for r in readings {
        by_meter.entry(r.meter_id).or_default().push(r);
    }

    let mut out = HashMap::with_capacity(readings.len());
    for list in by_meter.into_values() {
        let mut sorted = list;
        sorted.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

        for (i, current) in sorted.iter().enumerate() {
            let consumption = if current.is_reset {
                // A fresh dial has no delta against pre-replacement history
                None
            } else if i == 0 {
                None
            } else {
                // The predecessor is a valid baseline even when it is a
                // reset: the new series starts at the reset value.
                Some(current.value - sorted[i - 1].value)
            };
            out.insert(current.id, consumption);
        }
    }

    out
}

/// Attributes a monetary cost to one reading.
///
/// `None` when the consumption is absent or no tariff exists. Negative
/// deltas can only come from data corruption outside the validated write
/// path; they are clamped to zero here rather than rejected. The fixed
/// monthly charge is included in every per-reading figure, so per-reading
/// lines are not directly summable: monthly totals apply the fixed charge
/// once (see [`crate::core::dashboard`]).
#[must_use]
pub fn reading_cost(consumption: Option<f64>, tariff: Option<&tariff::Model>) -> Option<f64> {
    let consumption = consumption?;
    let tariff = tariff?;
    Some(consumption.max(0.0) * tariff.price_per_unit + tariff.fixed_monthly)
}
