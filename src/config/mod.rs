/// Database configuration and connection management
pub mod database;

/// Meter seed configuration loading from config.toml
pub mod meters;
