//! fvr-engine library interface
//!
//! Food venue recommender pipeline: survey rows are normalized, aggregated per
//! venue, clustered into behavioural segments and scored by a fuzzy rule base.
//! The resulting table is exported as CSV and served read-only over HTTP.

pub mod aggregator;
pub mod api;
pub mod cluster;
pub mod config;
pub mod error;
pub mod fuzzy;
pub mod io;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod query;
pub mod store;
pub mod table;

pub use crate::error::{ApiError, ApiResult, PipelineError, ScoringError};
pub use crate::pipeline::Pipeline;
pub use crate::store::ResultStore;
pub use crate::table::ResultTable;

use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Published result table and rebuild gate
    pub store: ResultStore,
    /// Rows returned by `GET /api/venues` when no limit is given
    pub default_limit: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: ResultStore, default_limit: usize) -> Self {
        Self {
            store,
            default_limit,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::venue_routes())
        .merge(api::reload_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
