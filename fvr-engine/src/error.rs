//! Error types for fvr-engine
//!
//! - [`PipelineError`]: conditions that invalidate a whole pipeline run
//! - [`ScoringError`]: per-venue scoring failure, absorbed by the pipeline
//! - [`ApiError`]: HTTP edge, rendered as a JSON error body

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline failure; no result table is produced
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input file absent
    #[error("Input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    /// Mandatory column absent from the input header
    #[error("Input is missing required column: {0}")]
    MissingColumn(String),

    /// Malformed CSV record
    #[error("CSV error: {0}")]
    Csv(#[from] csv_async::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer distinct venues than requested clusters
    #[error("Cannot form {clusters} clusters from {venues} distinct venues")]
    ClusteringInfeasible { venues: usize, clusters: usize },

    /// Configuration rejected at start-up
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Another rebuild is already running
    #[error("A pipeline rebuild is already in progress")]
    RebuildInProgress,

    /// Blocking pipeline task panicked or was cancelled
    #[error("Pipeline task failed: {0}")]
    Task(String),

    /// fvr-common error
    #[error("Common error: {0}")]
    Common(#[from] fvr_common::Error),
}

/// Per-venue scoring failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// Every antecedent evaluated to zero; the centroid is undefined
    #[error("No fuzzy rule fired for price={price}, distance={distance}, taste={taste}")]
    NoRuleFired { price: f64, distance: f64, taste: f64 },

    /// An input is NaN or infinite
    #[error("Non-finite scoring input: {name}={value}")]
    NonFiniteInput { name: &'static str, value: f64 },
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g. rebuild already running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Pipeline failure; status depends on the variant
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Pipeline(ref err) => {
                let (status, code) = match err {
                    PipelineError::RebuildInProgress => {
                        (StatusCode::CONFLICT, "REBUILD_IN_PROGRESS")
                    }
                    PipelineError::MissingInput { .. } => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "MISSING_INPUT")
                    }
                    PipelineError::ClusteringInfeasible { .. } => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "CLUSTERING_INFEASIBLE")
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "PIPELINE_ERROR"),
                };
                (status, code, err.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
