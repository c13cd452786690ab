//! Cluster Engine
//!
//! Partitions aggregated venues into `k` behavioural segments:
//! 1. Select the configured feature subset
//! 2. Standardise each feature over the current venue set
//! 3. Run seeded k-means with restarts
//! 4. Renumber clusters by centroid and attach a label
//!
//! # Determinism
//! Venues are clustered in canonical-name order and cluster ids are renumbered
//! by ascending raw centroid, so the same venue set with the same seed and `k`
//! yields the same ids whatever order the rows arrived in. Standardisation is
//! data-dependent: ids are not comparable across runs on different data.

pub mod kmeans;
pub mod labels;
pub mod scaler;

pub use labels::LabelStrategy;

use crate::error::PipelineError;
use crate::model::{Feature, Venue};
use kmeans::{KMeansFit, KMeansParams};
use scaler::StandardScaler;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Cluster engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    /// Number of segments (k)
    pub clusters: usize,
    pub seed: u64,
    pub restarts: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Features the segments are computed over
    pub features: Vec<Feature>,
    pub labels: LabelStrategy,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            clusters: 3,
            seed: 42,
            restarts: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            features: vec![Feature::Price, Feature::Distance, Feature::Taste],
            labels: LabelStrategy::Centroid,
        }
    }
}

/// Cluster id and label for one venue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterAssignment {
    pub cluster: usize,
    pub label: String,
}

/// Per-segment description of a clustering run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub id: usize,
    pub label: String,
    /// Venues in the segment
    pub size: usize,
    /// Centroid in raw feature units, keyed by feature name
    pub centroid: BTreeMap<String, f64>,
    /// Mean price of the member venues
    pub mean_price: f64,
}

/// Result of one clustering run
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterOutcome {
    /// One assignment per input venue, in input order
    pub assignments: Vec<ClusterAssignment>,
    /// One summary per cluster id
    pub summaries: Vec<ClusterSummary>,
    /// Within-cluster sum of squares in standardised space
    pub inertia: f64,
}

/// Groups venues into behavioural segments
#[derive(Debug, Clone)]
pub struct ClusterEngine {
    config: ClusterConfig,
}

impl ClusterEngine {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Assign every venue a cluster id and label
    ///
    /// Fails with [`PipelineError::ClusteringInfeasible`] when there are fewer
    /// venues than requested clusters; `k` is never reduced silently.
    pub fn cluster(&self, venues: &[Venue]) -> Result<ClusterOutcome, PipelineError> {
        let k = self.config.clusters;
        if k == 0 || venues.len() < k {
            return Err(PipelineError::ClusteringInfeasible {
                venues: venues.len(),
                clusters: k,
            });
        }
        if self.config.features.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "at least one clustering feature is required".to_string(),
            ));
        }

        // Canonical processing order: by venue name
        let mut order: Vec<usize> = (0..venues.len()).collect();
        order.sort_by(|&a, &b| venues[a].name.cmp(&venues[b].name));

        let raw: Vec<Vec<f64>> = order
            .iter()
            .map(|&i| venues[i].features.select(&self.config.features))
            .collect();
        let scaler = StandardScaler::fit(&raw);
        let points: Vec<Vec<f64>> = raw.iter().map(|r| scaler.transform(r)).collect();

        let fit = kmeans::fit(
            &points,
            &KMeansParams {
                k,
                restarts: self.config.restarts,
                max_iterations: self.config.max_iterations,
                tolerance: self.config.tolerance,
                seed: self.config.seed,
            },
        );
        debug!(
            inertia = fit.inertia,
            iterations = fit.iterations,
            "k-means fit complete"
        );

        let raw_centroids: Vec<Vec<f64>> = fit
            .centroids
            .iter()
            .map(|c| scaler.inverse_transform(c))
            .collect();
        let renumber = canonical_ids(&raw_centroids);

        // Cluster id per venue, back in input order
        let mut ids = vec![0usize; venues.len()];
        for (pos, &venue_idx) in order.iter().enumerate() {
            ids[venue_idx] = renumber[fit.assignments[pos]];
        }

        let summaries = self.summarise(venues, &ids, &fit, &raw_centroids, &renumber);
        let assignments = ids
            .iter()
            .map(|&cluster| ClusterAssignment {
                cluster,
                label: summaries[cluster].label.clone(),
            })
            .collect();

        info!(
            "Clustered {} venues into {} segments (seed {}, inertia {:.4})",
            venues.len(),
            k,
            self.config.seed,
            fit.inertia
        );

        Ok(ClusterOutcome {
            assignments,
            summaries,
            inertia: fit.inertia,
        })
    }

    fn summarise(
        &self,
        venues: &[Venue],
        ids: &[usize],
        fit: &KMeansFit,
        raw_centroids: &[Vec<f64>],
        renumber: &[usize],
    ) -> Vec<ClusterSummary> {
        let k = fit.centroids.len();
        let mut sizes = vec![0usize; k];
        let mut price_sums = vec![0.0_f64; k];
        for (venue, &id) in venues.iter().zip(ids) {
            sizes[id] += 1;
            price_sums[id] += venue.price();
        }
        let mean_prices: Vec<f64> = sizes
            .iter()
            .zip(&price_sums)
            .map(|(&n, &sum)| if n > 0 { sum / n as f64 } else { f64::INFINITY })
            .collect();

        let names = labels::assign_labels(self.config.labels, &mean_prices);

        let mut centroids = vec![BTreeMap::new(); k];
        for (old_id, centroid) in raw_centroids.iter().enumerate() {
            centroids[renumber[old_id]] = self
                .config
                .features
                .iter()
                .zip(centroid)
                .map(|(f, v)| (f.name().to_string(), *v))
                .collect();
        }

        (0..k)
            .map(|id| ClusterSummary {
                id,
                label: names[id].clone(),
                size: sizes[id],
                centroid: centroids[id].clone(),
                mean_price: if sizes[id] > 0 { mean_prices[id] } else { 0.0 },
            })
            .collect()
    }
}

/// Map fitted cluster index → canonical id, ordering centroids lexicographically
fn canonical_ids(centroids: &[Vec<f64>]) -> Vec<usize> {
    let mut by_centroid: Vec<usize> = (0..centroids.len()).collect();
    by_centroid.sort_by(|&a, &b| {
        centroids[a]
            .iter()
            .zip(&centroids[b])
            .map(|(x, y)| x.total_cmp(y))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut renumber = vec![0usize; centroids.len()];
    for (new_id, &old_id) in by_centroid.iter().enumerate() {
        renumber[old_id] = new_id;
    }
    renumber
}
