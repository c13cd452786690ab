//! Tabular input and output
//!
//! - [`loader`]: survey CSV → [`RawObservation`](crate::model::RawObservation) rows
//! - [`export`]: [`ResultTable`](crate::table::ResultTable) → result CSV

pub mod export;
pub mod loader;

pub use export::export_table;
pub use loader::{load_observations, read_observations};
