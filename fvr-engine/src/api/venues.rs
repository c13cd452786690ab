//! Read-only venue and cluster endpoints
//!
//! - `GET /api/venues`: filtered, sorted top-N list ([`VenueQuery`] parameters)
//! - `GET /api/venues/:name`: one venue, any spelling of its canonical name
//! - `GET /api/clusters`: per-segment summaries of the published run

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::cluster::ClusterSummary;
use crate::error::{ApiError, ApiResult};
use crate::query::VenueQuery;
use crate::table::{RunStats, ScoredVenue};
use crate::AppState;

/// Venue list response
#[derive(Debug, Serialize)]
pub struct VenueListResponse {
    pub run_id: Uuid,
    pub count: usize,
    pub venues: Vec<ScoredVenue>,
}

/// Cluster summary response
#[derive(Debug, Serialize)]
pub struct ClusterListResponse {
    pub run_id: Uuid,
    pub clusters: usize,
    pub seed: u64,
    pub inertia: f64,
    pub stats: RunStats,
    pub summaries: Vec<ClusterSummary>,
}

/// GET /api/venues
pub async fn list_venues(
    State(state): State<AppState>,
    Query(query): Query<VenueQuery>,
) -> ApiResult<Json<VenueListResponse>> {
    if [query.max_price, query.min_taste, query.min_wifi, query.min_outlet]
        .iter()
        .flatten()
        .any(|v| !v.is_finite())
    {
        return Err(ApiError::BadRequest(
            "numeric filters must be finite numbers".to_string(),
        ));
    }

    let table = state.store.snapshot().await;
    let venues = query.apply(&table, state.default_limit);

    Ok(Json(VenueListResponse {
        run_id: table.info().run_id,
        count: venues.len(),
        venues,
    }))
}

/// GET /api/venues/:name
pub async fn get_venue(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ScoredVenue>> {
    let table = state.store.snapshot().await;
    table
        .get(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("venue '{}'", name)))
}

/// GET /api/clusters
pub async fn list_clusters(State(state): State<AppState>) -> Json<ClusterListResponse> {
    let table = state.store.snapshot().await;
    let info = table.info();
    Json(ClusterListResponse {
        run_id: info.run_id,
        clusters: info.clusters,
        seed: info.seed,
        inertia: info.inertia,
        stats: info.stats,
        summaries: info.summaries.clone(),
    })
}

/// Build venue and cluster routes
pub fn venue_routes() -> Router<AppState> {
    Router::new()
        .route("/api/venues", get(list_venues))
        .route("/api/venues/:name", get(get_venue))
        .route("/api/clusters", get(list_clusters))
}
