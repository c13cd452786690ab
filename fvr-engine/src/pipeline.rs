//! Scoring pipeline
//!
//! raw rows → Normalizer → Aggregator → Cluster Engine → Fuzzy Scoring Engine →
//! Result Table
//!
//! A run is a pure, synchronous transform over one batch of observations.
//! Cell-level failures are absorbed with documented defaults; only conditions
//! that invalidate the whole table (infeasible cluster count) abort the run,
//! and then no table is produced.

use crate::aggregator::Aggregator;
use crate::cluster::ClusterEngine;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::fuzzy::{FuzzyEngine, ScoreInputs};
use crate::model::RawObservation;
use crate::normalizer::normalize;
use crate::table::{ResultTable, RunInfo, RunStats, ScoredVenue};
use chrono::Utc;
use fvr_common::config::TomlConfig;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Configured pipeline; cheap to clone and safe to move onto a worker thread
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    engine: Arc<FuzzyEngine>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, engine: Arc<FuzzyEngine>) -> Self {
        Self { config, engine }
    }

    /// Validate the TOML pipeline and fuzzy sections and compile the rule base
    pub fn from_toml(toml: &TomlConfig) -> Result<Self, PipelineError> {
        let config = PipelineConfig::from_settings(&toml.pipeline)?;
        let engine = FuzzyEngine::from_overrides(&toml.fuzzy)?;
        Ok(Self::new(config, Arc::new(engine)))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<FuzzyEngine> {
        &self.engine
    }

    /// Run the whole pipeline over one batch of observations
    pub fn run(&self, observations: &[RawObservation]) -> Result<ResultTable, PipelineError> {
        let run_id = Uuid::new_v4();
        info!("Pipeline run {} started with {} rows", run_id, observations.len());

        let normalized: Vec<_> = observations.iter().map(normalize).collect();
        let defaulted_cells = normalized.iter().map(|o| o.defaulted_cells()).sum();

        let aggregation = Aggregator::new(self.config.missing_values).aggregate(&normalized);
        let venues = aggregation.venues;
        info!(
            "Aggregated {} rows into {} venues ({} skipped)",
            observations.len(),
            venues.len(),
            aggregation.skipped
        );

        let outcome = ClusterEngine::new(self.config.cluster.clone()).cluster(&venues)?;

        let mut fallback_scores = 0;
        let rows: Vec<ScoredVenue> = venues
            .iter()
            .zip(outcome.assignments)
            .map(|(venue, assignment)| {
                let inputs = ScoreInputs {
                    price: venue.price(),
                    distance: venue.distance(),
                    taste: venue.taste(),
                };
                let score = match self.engine.score(inputs) {
                    Ok(score) => score,
                    Err(e) => {
                        warn!(
                            "{}: {} - scoring {} instead",
                            venue.name, e, self.config.fallback_score
                        );
                        fallback_scores += 1;
                        self.config.fallback_score
                    }
                };
                debug!(venue = %venue.name, cluster = assignment.cluster, score, "Venue scored");
                ScoredVenue::new(venue, assignment.cluster, assignment.label, score)
            })
            .collect();

        let stats = RunStats {
            rows_read: observations.len(),
            rows_skipped: aggregation.skipped,
            defaulted_cells,
            fallback_scores,
        };
        let table = ResultTable::new(
            RunInfo {
                run_id,
                built_at: Utc::now(),
                clusters: self.config.cluster.clusters,
                seed: self.config.cluster.seed,
                inertia: outcome.inertia,
                stats,
                summaries: outcome.summaries,
            },
            rows,
        );

        info!(
            "Pipeline run {} complete: {} venues, {} defaulted cells, {} fallback scores",
            run_id,
            table.len(),
            stats.defaulted_cells,
            stats.fallback_scores
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(venue: &str, price: &str, distance: &str, taste: &str) -> RawObservation {
        RawObservation {
            venue: venue.to_string(),
            price: Some(price.to_string()),
            distance: Some(distance.to_string()),
            taste: Some(taste.to_string()),
            comfort: Some("4".to_string()),
            wifi: Some("Ada dan cepat".to_string()),
            outlet: Some("Ada beberapa".to_string()),
            wait: Some("Cepat (< 10 menit)".to_string()),
            ..Default::default()
        }
    }

    fn pipeline(clusters: usize) -> Pipeline {
        let mut toml = TomlConfig::default();
        toml.pipeline.clusters = clusters;
        Pipeline::from_toml(&toml).unwrap()
    }

    #[test]
    fn test_counts_fallbacks_and_defaulted_cells() {
        let rows = vec![
            observation("Kulos", "12000", "500", "4.8"),
            // nothing in the rule base covers medium price, medium distance, middling taste
            observation("Warung Tengah", "16000", "1500", "3.6"),
            observation("Kafe Senja", "45000", "3000", "2.0"),
            observation("Kafe Senja", "abc", "3000", "2.0"),
        ];
        let table = pipeline(3).run(&rows).unwrap();

        assert_eq!(table.len(), 3);
        let stats = table.info().stats;
        assert_eq!(stats.rows_read, 4);
        assert_eq!(stats.defaulted_cells, 1);
        assert_eq!(stats.fallback_scores, 1);
        assert_eq!(table.get("Warung Tengah").map(|r| r.score), Some(0.0));
    }

    #[test]
    fn test_infeasible_cluster_count_produces_no_table() {
        let rows = vec![
            observation("A", "10000", "100", "4.0"),
            observation("B", "20000", "200", "3.0"),
        ];
        assert!(matches!(
            pipeline(3).run(&rows),
            Err(PipelineError::ClusteringInfeasible {
                venues: 2,
                clusters: 3
            })
        ));
    }
}
