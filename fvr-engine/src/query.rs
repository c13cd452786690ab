//! Read-only query surface over a [`ResultTable`]
//!
//! Filter by cluster label and numeric thresholds, sort, then take the top N.
//! Results are owned copies; the table itself is never reordered.

use crate::table::{ResultTable, ScoredVenue};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Ordering applied before the top-N cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Highest recommendation score first
    #[default]
    Score,
    /// Cheapest first
    Price,
    /// Priciest first
    PriceDesc,
    /// Closest first
    Distance,
    /// Farthest first
    DistanceDesc,
    /// Tastiest first
    Taste,
    /// Most comfortable first
    Comfort,
}

impl SortKey {
    fn compare(self, a: &ScoredVenue, b: &ScoredVenue) -> Ordering {
        match self {
            SortKey::Score => b.score.total_cmp(&a.score),
            SortKey::Price => a.price.total_cmp(&b.price),
            SortKey::PriceDesc => b.price.total_cmp(&a.price),
            SortKey::Distance => a.distance.total_cmp(&b.distance),
            SortKey::DistanceDesc => b.distance.total_cmp(&a.distance),
            SortKey::Taste => b.taste.total_cmp(&a.taste),
            SortKey::Comfort => b.comfort.total_cmp(&a.comfort),
        }
    }
}

/// Consumer query; every filter is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueQuery {
    /// Cluster label, case-insensitive
    pub label: Option<String>,
    /// Price ceiling (inclusive)
    pub max_price: Option<f64>,
    /// Taste floor (inclusive)
    pub min_taste: Option<f64>,
    /// Minimum wifi score (inclusive)
    pub min_wifi: Option<f64>,
    /// Minimum outlet score (inclusive)
    pub min_outlet: Option<f64>,
    pub sort: Option<SortKey>,
    /// Rows to return; defaulted, then clamped to [1, matching rows]
    pub limit: Option<usize>,
}

impl VenueQuery {
    fn matches(&self, row: &ScoredVenue) -> bool {
        if let Some(label) = &self.label {
            if !row.cluster_label.eq_ignore_ascii_case(label.trim()) {
                return false;
            }
        }
        self.max_price.map_or(true, |max| row.price <= max)
            && self.min_taste.map_or(true, |min| row.taste >= min)
            && self.min_wifi.map_or(true, |min| row.wifi_score >= min)
            && self.min_outlet.map_or(true, |min| row.outlet_score >= min)
    }

    /// Run the query against `table`
    ///
    /// Ties keep canonical-name order. An empty result means nothing matched.
    pub fn apply(&self, table: &ResultTable, default_limit: usize) -> Vec<ScoredVenue> {
        let mut rows: Vec<ScoredVenue> = table
            .rows()
            .iter()
            .filter(|row| self.matches(row))
            .cloned()
            .collect();
        if rows.is_empty() {
            return rows;
        }

        let key = self.sort.unwrap_or_default();
        rows.sort_by(|a, b| key.compare(a, b));

        let limit = clamp_limit(self.limit.unwrap_or(default_limit), rows.len());
        rows.truncate(limit);
        rows
    }
}

/// Clamp a requested row count to [1, available]
pub fn clamp_limit(requested: usize, available: usize) -> usize {
    requested.clamp(1, available.max(1))
}
