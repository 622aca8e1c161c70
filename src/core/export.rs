//! CSV rendering of the full reading history.
//!
//! Produces the export as a `String`; where the file lands is the caller's
//! concern. Rows are ordered by meter sort order, then chronologically.
//! Values that cannot be computed (consumption of a first or reset reading,
//! cost without a tariff) render as empty cells.

use crate::{
    core::{consumption, meter, reading, tariff},
    entities::{MeterType, tariff::Model as TariffModel},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::fmt::Write;

/// Column header of the export.
pub const CSV_HEADER: &str =
    "Utility,Date,Reading,Unit,Consumption,EstimatedCost,Currency,FixedMonthly,CostNote,Reset";

/// Renders every reading across all meters as CSV, with derived
/// consumption and per-reading estimated cost columns.
pub async fn render_readings_csv(db: &DatabaseConnection) -> Result<String> {
    let meters = meter::get_all_meters(db).await?;
    let tariffs: HashMap<MeterType, TariffModel> = tariff::get_all_tariffs(db)
        .await?
        .into_iter()
        .map(|t| (t.meter_type, t))
        .collect();

    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');

    for m in &meters {
        let history = reading::get_readings_for_meter(db, m.id).await?;
        let consumption_map = consumption::consumption_by_reading(&history);
        let active_tariff = tariffs.get(&m.meter_type);

        for r in &history {
            let cons = consumption_map.get(&r.id).copied().flatten();
            let cost = consumption::reading_cost(cons, active_tariff);

            let consumption_txt = cons.map_or(String::new(), |c| format!("{c:.2}"));
            let cost_txt = cost.map_or(String::new(), |c| format!("{c:.2}"));
            let currency = active_tariff
                .map_or(tariff::DEFAULT_CURRENCY, |t| t.currency.as_str());
            let fixed_txt =
                active_tariff.map_or(String::new(), |t| format!("{:.2}", t.fixed_monthly));
            let cost_note = match active_tariff {
                Some(t) if t.fixed_monthly > 0.0 => {
                    format!("+ subscription {:.2} {}", t.fixed_monthly, t.currency)
                }
                _ => String::new(),
            };
            let reset_txt = if r.is_reset { "YES" } else { "NO" };
            // Meter names are free text; commas would break the row
            let utility = m.name.replace(',', " ");

            // write! is infallible when writing to String, so unwrap is safe
            writeln!(
                out,
                "{utility},{},{:.2},{},{consumption_txt},{cost_txt},{currency},{fixed_txt},{cost_note},{reset_txt}",
                r.date.format("%Y-%m-%d"),
                r.value,
                m.unit,
            )
            .unwrap();
        }
    }

    Ok(out)
}
