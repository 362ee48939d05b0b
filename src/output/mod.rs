//! Output module for reporting on harvest progress
//!
//! Statistics are read back from the storage layer, so they cover every
//! process run that shared the same database.

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};
