//! Meter entity - Represents one physical utility meter.
//!
//! Meters are created at setup time from the seed configuration and are
//! rarely mutated afterwards. Every reading belongs to exactly one meter.

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

/// Kind of utility a meter measures. Stored as its `SCREAMING_CASE`
/// string value in the database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeterType {
    /// Water meter, usually read in m³
    #[sea_orm(string_value = "WATER")]
    Water,
    /// Electricity meter, usually read in kWh
    #[sea_orm(string_value = "ELECTRICITY")]
    Electricity,
    /// Natural gas meter, usually read in m³
    #[sea_orm(string_value = "GAS")]
    Gas,
}

impl MeterType {
    /// All supported meter types, in dashboard order.
    pub const ALL: [Self; 3] = [Self::Water, Self::Electricity, Self::Gas];

    /// The string value stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Water => "WATER",
            Self::Electricity => "ELECTRICITY",
            Self::Gas => "GAS",
        }
    }

    /// Fallback measurement unit used when no meter row carries one.
    #[must_use]
    pub const fn default_unit(self) -> &'static str {
        match self {
            Self::Electricity => "kWh",
            Self::Water | Self::Gas => "m³",
        }
    }
}

impl std::fmt::Display for MeterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Meter database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meters")]
pub struct Model {
    /// Unique identifier for the meter
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Which utility this meter measures
    pub meter_type: MeterType,
    /// Human-readable display name (e.g. "Electricity")
    pub name: String,
    /// Measurement unit of the dial (e.g. "kWh", "m³")
    pub unit: String,
    /// Position in meter pickers and dashboards
    pub sort_order: i32,
}

/// Defines relationships between Meter and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each meter has many readings
    #[sea_orm(has_many = "super::reading::Entity")]
    Reading,
}

impl Related<super::reading::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reading.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
