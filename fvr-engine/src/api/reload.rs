//! Rebuild trigger

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::table::RunStats;
use crate::AppState;

/// Reload response
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub run_id: Uuid,
    pub venues: usize,
    pub stats: RunStats,
}

/// POST /api/reload
///
/// Re-reads the input file and publishes a fresh table. 409 while another
/// rebuild is running; on failure the previous table stays published.
pub async fn reload(State(state): State<AppState>) -> ApiResult<Json<ReloadResponse>> {
    let table = state.store.rebuild().await?;
    Ok(Json(ReloadResponse {
        run_id: table.info().run_id,
        venues: table.len(),
        stats: table.info().stats,
    }))
}

/// Build reload routes
pub fn reload_routes() -> Router<AppState> {
    Router::new().route("/api/reload", post(reload))
}
