//! Tariff entity - One row per meter type.
//!
//! Each row carries two independent tracks plus a denormalized active
//! projection. The AUTO track holds the values last fetched from the
//! external source; the MANUAL track holds the values last entered by the
//! user. `source_mode` names the track currently in effect, and the
//! projection columns (`price_per_unit`, `fixed_monthly`, `updated_at`)
//! always mirror that track. Switching modes never touches the other
//! track's stored values, so the user can flip back and forth without
//! re-entering anything.

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

use super::meter::MeterType;

/// Which tariff track is currently active.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceMode {
    /// Values come from the external tariff feed
    #[sea_orm(string_value = "AUTO")]
    Auto,
    /// Values come from manual user entry
    #[sea_orm(string_value = "MANUAL")]
    Manual,
}

/// Tariff database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tariffs")]
pub struct Model {
    /// Unique identifier for the tariff row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Meter type this tariff applies to (one row per type)
    #[sea_orm(unique)]
    pub meter_type: MeterType,
    /// Active price per unit (mirrors the track named by `source_mode`)
    pub price_per_unit: f64,
    /// Active fixed monthly charge; 0 when the active track has none
    pub fixed_monthly: f64,
    /// Currency of the active price
    pub currency: String,
    /// When the active values last changed
    pub updated_at: DateTimeUtc,
    /// Which track the projection currently mirrors
    pub source_mode: SourceMode,

    /// AUTO track: price last fetched from the external source
    pub auto_price_per_unit: Option<f64>,
    /// AUTO track: when that fetch happened
    pub auto_updated_at: Option<DateTimeUtc>,
    /// AUTO track: label of the source that produced the price
    pub auto_source: Option<String>,

    /// MANUAL track: price last entered by the user
    pub manual_price_per_unit: Option<f64>,
    /// MANUAL track: fixed monthly charge last entered by the user
    pub manual_fixed_monthly: Option<f64>,
    /// MANUAL track: provider name last entered by the user
    pub manual_provider: Option<String>,
    /// MANUAL track: when the user last saved it
    pub manual_updated_at: Option<DateTimeUtc>,
}

/// `Tariff` has no relationships with other entities; it is keyed by
/// meter type rather than meter id.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
