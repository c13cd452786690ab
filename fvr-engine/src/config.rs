//! Typed pipeline configuration
//!
//! Converts the string-typed `[pipeline]` TOML section into validated engine
//! settings. Everything is checked once at start-up; an invalid value is a
//! [`PipelineError::InvalidConfig`] and nothing runs.

use crate::aggregator::MissingValuePolicy;
use crate::cluster::{ClusterConfig, LabelStrategy};
use crate::error::PipelineError;
use crate::model::Feature;
use fvr_common::config::PipelineSettings;

/// Validated pipeline settings
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub cluster: ClusterConfig,
    pub missing_values: MissingValuePolicy,
    /// Score given to a venue for which no fuzzy rule fires
    pub fallback_score: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            missing_values: MissingValuePolicy::default(),
            fallback_score: 0.0,
        }
    }
}

impl PipelineConfig {
    /// Validate TOML pipeline settings
    pub fn from_settings(settings: &PipelineSettings) -> Result<Self, PipelineError> {
        if settings.clusters == 0 {
            return Err(PipelineError::InvalidConfig(
                "pipeline.clusters must be at least 1".to_string(),
            ));
        }
        if settings.max_iterations == 0 {
            return Err(PipelineError::InvalidConfig(
                "pipeline.max_iterations must be at least 1".to_string(),
            ));
        }
        if !settings.tolerance.is_finite() || settings.tolerance < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "pipeline.tolerance must be a non-negative number, got {}",
                settings.tolerance
            )));
        }
        if !(0.0..=100.0).contains(&settings.fallback_score) {
            return Err(PipelineError::InvalidConfig(format!(
                "pipeline.fallback_score must be within [0, 100], got {}",
                settings.fallback_score
            )));
        }

        let mut features = Vec::with_capacity(settings.features.len());
        for name in &settings.features {
            let feature = Feature::from_name(name).ok_or_else(|| {
                PipelineError::InvalidConfig(format!("unknown clustering feature '{}'", name))
            })?;
            if features.contains(&feature) {
                return Err(PipelineError::InvalidConfig(format!(
                    "clustering feature '{}' listed twice",
                    feature
                )));
            }
            features.push(feature);
        }
        if features.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "pipeline.features must name at least one feature".to_string(),
            ));
        }

        let missing_values =
            MissingValuePolicy::from_name(&settings.missing_values).ok_or_else(|| {
                PipelineError::InvalidConfig(format!(
                    "pipeline.missing_values must be \"zero\" or \"exclude\", got '{}'",
                    settings.missing_values
                ))
            })?;
        let labels = LabelStrategy::from_name(&settings.cluster_labels).ok_or_else(|| {
            PipelineError::InvalidConfig(format!(
                "pipeline.cluster_labels must be \"centroid\" or \"fixed\", got '{}'",
                settings.cluster_labels
            ))
        })?;

        Ok(Self {
            cluster: ClusterConfig {
                clusters: settings.clusters,
                seed: settings.seed,
                restarts: settings.restarts.max(1),
                max_iterations: settings.max_iterations,
                tolerance: settings.tolerance,
                features,
                labels,
            },
            missing_values,
            fallback_score: settings.fallback_score,
        })
    }
}
