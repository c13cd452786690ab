//! Result Table
//!
//! The merged per-venue output of one pipeline run: aggregated features, cluster
//! id and label, and fuzzy score, plus the run's metadata. A table is never
//! patched; each run builds a fresh one and consumers only read it.

use crate::aggregator::canonical_venue_name;
use crate::cluster::ClusterSummary;
use crate::model::{Feature, Venue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One venue row of the result table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredVenue {
    /// Canonical venue name (unique within a table)
    pub venue: String,
    /// Observations aggregated into this row
    pub observations: usize,
    /// Mean price (currency units)
    pub price: f64,
    /// Mean distance (meters)
    pub distance: f64,
    /// Mean taste rating (1-5)
    pub taste: f64,
    /// Mean comfort rating (1-5)
    pub comfort: f64,
    /// Mean wifi score (0-2)
    pub wifi_score: f64,
    /// Mean outlet score (0-2)
    pub outlet_score: f64,
    /// Mean serving speed score (0-2)
    pub wait_score: f64,
    pub cluster: usize,
    pub cluster_label: String,
    /// Recommendation score (0-100)
    pub score: f64,
}

impl ScoredVenue {
    pub fn new(venue: &Venue, cluster: usize, cluster_label: String, score: f64) -> Self {
        let f = &venue.features;
        Self {
            venue: venue.name.clone(),
            observations: venue.observations,
            price: f[Feature::Price],
            distance: f[Feature::Distance],
            taste: f[Feature::Taste],
            comfort: f[Feature::Comfort],
            wifi_score: f[Feature::Wifi],
            outlet_score: f[Feature::Outlet],
            wait_score: f[Feature::Wait],
            cluster,
            cluster_label,
            score,
        }
    }
}

/// Row-level counters of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Input rows read
    pub rows_read: usize,
    /// Rows dropped for lack of a venue name
    pub rows_skipped: usize,
    /// Cells that failed to parse or were absent and took the default
    pub defaulted_cells: usize,
    /// Venues scored with the fallback because no rule fired
    pub fallback_scores: usize,
}

/// Metadata of the run that produced a table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunInfo {
    pub run_id: Uuid,
    pub built_at: DateTime<Utc>,
    /// Requested cluster count (k)
    pub clusters: usize,
    pub seed: u64,
    /// Within-cluster sum of squares (standardised space)
    pub inertia: f64,
    pub stats: RunStats,
    pub summaries: Vec<ClusterSummary>,
}

/// Immutable result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    info: RunInfo,
    rows: Vec<ScoredVenue>,
}

impl ResultTable {
    /// Build a table; rows are kept in canonical-name order
    pub fn new(info: RunInfo, mut rows: Vec<ScoredVenue>) -> Self {
        rows.sort_by(|a, b| a.venue.cmp(&b.venue));
        Self { info, rows }
    }

    /// Placeholder published before the first successful run
    pub fn empty() -> Self {
        Self {
            info: RunInfo {
                run_id: Uuid::nil(),
                built_at: DateTime::<Utc>::default(),
                clusters: 0,
                seed: 0,
                inertia: 0.0,
                stats: RunStats::default(),
                summaries: Vec::new(),
            },
            rows: Vec::new(),
        }
    }

    pub fn info(&self) -> &RunInfo {
        &self.info
    }

    pub fn rows(&self) -> &[ScoredVenue] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a venue by name; any spelling with the same canonical form matches
    pub fn get(&self, name: &str) -> Option<&ScoredVenue> {
        let canonical = canonical_venue_name(name);
        self.rows
            .binary_search_by(|row| row.venue.as_str().cmp(canonical.as_str()))
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn summaries(&self) -> &[ClusterSummary] {
        &self.info.summaries
    }

    /// Whether any segment carries `label` (case-insensitive)
    pub fn has_label(&self, label: &str) -> bool {
        self.info
            .summaries
            .iter()
            .any(|s| s.label.eq_ignore_ascii_case(label.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, price: f64, score: f64) -> ScoredVenue {
        ScoredVenue {
            venue: name.to_string(),
            observations: 1,
            price,
            distance: 500.0,
            taste: 4.0,
            comfort: 4.0,
            wifi_score: 1.0,
            outlet_score: 1.0,
            wait_score: 1.0,
            cluster: 0,
            cluster_label: "Budget".to_string(),
            score,
        }
    }

    #[test]
    fn test_rows_sorted_and_found_by_any_spelling() {
        let table = ResultTable::new(
            ResultTable::empty().info().clone(),
            vec![row("Warung Bu Sri", 9000.0, 80.0), row("Kulos", 12000.0, 90.0)],
        );
        assert_eq!(table.rows()[0].venue, "Kulos");
        assert_eq!(table.get("  KULOS ").map(|r| r.price), Some(12000.0));
        assert_eq!(table.get("warung  bu sri").map(|r| r.score), Some(80.0));
        assert!(table.get("Bakso").is_none());
    }

    #[test]
    fn test_empty_table() {
        let table = ResultTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.info().run_id, Uuid::nil());
        assert!(!table.has_label("Budget"));
    }
}
