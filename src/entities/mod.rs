//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod meter;
pub mod reading;
pub mod tariff;

// Re-export specific types to avoid conflicts
pub use meter::{Column as MeterColumn, Entity as Meter, MeterType, Model as MeterModel};
pub use reading::{Column as ReadingColumn, Entity as Reading, Model as ReadingModel};
pub use tariff::{Column as TariffColumn, Entity as Tariff, Model as TariffModel, SourceMode};
