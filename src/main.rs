use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utilities_tracker::{
    config,
    core::dashboard::{self, YearMonth},
    errors::Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the meter seed configuration
    let meter_config = config::meters::load_default_config()?;

    // 4. Initialize the database and seed missing meters
    let db = config::database::create_connection().await?;
    config::database::create_tables(&db).await?;
    let seeded = config::meters::seed_initial_meters(&db, &meter_config).await?;
    info!(seeded, "database ready");

    // 5. Print the dashboard for the current month
    let month = YearMonth::current();
    info!(%month, "monthly dashboard");
    for card in dashboard::monthly_cards(&db, month).await? {
        let consumption = card
            .consumption
            .map_or_else(|| "—".to_string(), |c| format!("{c:.2} {}", card.unit));
        let cost = card
            .cost
            .map_or_else(|| "—".to_string(), |c| format!("{c:.2} {}", card.currency));
        info!(
            meter_type = %card.meter_type,
            title = %card.title,
            %consumption,
            %cost,
            missing = card.missing,
            last = %card.last_reading_label,
        );
    }

    if !dashboard::all_meter_types_read_in(&db, month).await? {
        info!("some meters still have no reading this month");
    }

    Ok(())
}
