use crate::entities::meter::MeterType;
use chrono::NaiveDate;
use thiserror::Error;

/// Unified error type for all validation and infrastructure failures.
///
/// Validation outcomes (duplicate dates, monotonicity violations, tariff
/// rejections) are returned to the caller as typed variants and never
/// escalate past the library boundary. A rejected validation performs no
/// writes.
#[derive(Debug, Error)]
pub enum Error {
    /// Another reading already exists for the same meter and date
    #[error("A reading already exists for this meter on {date}.")]
    DuplicateDate {
        /// Date of the conflicting reading
        date: NaiveDate,
    },

    /// A non-reset reading was lower than its chronological predecessor
    #[error(
        "Reading cannot be lower than the previous reading ({previous}). \
         If the meter was replaced, mark this entry as a reset."
    )]
    BelowPrevious {
        /// Value of the previous reading
        previous: f64,
    },

    /// A non-reset reading was higher than its chronological successor
    #[error("Reading cannot be higher than the next reading ({next}).")]
    AboveNext {
        /// Value of the next reading
        next: f64,
    },

    /// A reading value was negative or not a finite number
    #[error("Reading value must be a non-negative number, got {value}")]
    InvalidReadingValue {
        /// The rejected value
        value: f64,
    },

    /// Manual tariff activation was rejected due to invalid fields
    #[error("Invalid manual tariff: {reason}")]
    InvalidManualTariff {
        /// Which field was rejected and why
        reason: String,
    },

    /// Switching to AUTO was requested before any AUTO value was fetched
    #[error(
        "No AUTO tariff has been fetched yet for {meter_type}. \
         Refresh from the tariff source first."
    )]
    NoAutoTariffYet {
        /// Meter type whose AUTO track is empty
        meter_type: MeterType,
    },

    /// The external tariff source failed; its message is carried verbatim
    #[error("Tariff source fetch failed: {message}")]
    ExternalFetchFailed {
        /// Collaborator error message
        message: String,
    },

    /// No meter exists with the given id
    #[error("Meter not found: {id}")]
    MeterNotFound {
        /// Requested meter id
        id: i64,
    },

    /// No reading exists with the given id
    #[error("Reading not found: {id}")]
    ReadingNotFound {
        /// Requested reading id
        id: i64,
    },

    /// Configuration loading or parsing error
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Database error from the underlying store
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
