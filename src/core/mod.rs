//! Core business logic - framework-agnostic reading validation,
//! consumption/cost derivation, tariff resolution and monthly aggregation.
//!
//! Everything here operates on data already in the store; network I/O
//! (the external tariff feed) sits behind the [`tariff::TariffSource`]
//! port and file placement of exports belongs to the caller.

/// Consumption deltas and per-reading cost attribution
pub mod consumption;
/// Monthly dashboard cards, month enumeration and the reminder predicate
pub mod dashboard;
/// CSV rendering of the reading history
pub mod export;
/// Meter registry lookups
pub mod meter;
/// Validated CRUD over raw readings
pub mod reading;
/// AUTO/MANUAL tariff tracks and the active projection
pub mod tariff;
