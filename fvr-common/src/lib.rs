//! # FVR Common Library
//!
//! Shared code for the food venue recommender binaries:
//! - Common error and result types
//! - TOML configuration schema, path resolution and loading
//! - Tracing subscriber initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
