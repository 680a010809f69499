//! Danish Motor Register (DMR) exports
//!
//! The DMR publishes its statistics export as one zipped XML document of
//! `<ns:Statistik>` records. Records of kind 1 describe registered vehicles
//! and are the only ones kept.

pub mod models;
pub mod parser;

pub use models::VehicleStat;
pub use parser::DmrParser;
