//! Reading entity - Represents one raw cumulative meter reading.
//!
//! `value` is the cumulative dial value at `date`, unless `is_reset` is set,
//! in which case it is the dial value after a physical meter replacement and
//! starts a new cumulative series with no arithmetic relationship to prior
//! readings. At most one reading may exist per `(meter_id, date)`; the write
//! path in [`crate::core::reading`] enforces this inside a transaction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reading database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "readings")]
pub struct Model {
    /// Unique identifier for the reading
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the meter this reading belongs to
    pub meter_id: i64,
    /// Calendar day of the reading (no time component)
    pub date: Date,
    /// Cumulative dial value at `date`
    pub value: f64,
    /// Whether this reading marks a meter replacement (series boundary)
    pub is_reset: bool,
}

/// Defines relationships between Reading and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each reading belongs to one meter
    #[sea_orm(
        belongs_to = "super::meter::Entity",
        from = "Column::MeterId",
        to = "super::meter::Column::Id"
    )]
    Meter,
}

impl Related<super::meter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
