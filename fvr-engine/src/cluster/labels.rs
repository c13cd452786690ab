//! Human-readable names for behavioural segments

use serde::Serialize;

/// How segment names are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStrategy {
    /// Rank segments by the mean price of their venues:
    /// cheapest "Budget", dearest "Premium", the rest "Standard"
    #[default]
    Centroid,
    /// Legacy id → name table, only meaningful for a fixed, pre-validated data set
    Fixed,
}

impl LabelStrategy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "centroid" => Some(LabelStrategy::Centroid),
            "fixed" => Some(LabelStrategy::Fixed),
            _ => None,
        }
    }
}

pub const BUDGET: &str = "Budget";
pub const STANDARD: &str = "Standard";
pub const PREMIUM: &str = "Premium";

/// Legacy name for a cluster id
pub fn fixed_label(cluster: usize) -> String {
    match cluster {
        0 => "Budget & Tasty",
        1 => "Premium / Hangout",
        _ => "Everyday",
    }
    .to_string()
}

/// Names for clusters `0..mean_prices.len()` ranked by mean price
///
/// Ties keep id order. A single cluster is "Standard"; with more than one
/// middle cluster the middles are numbered "Standard 1", "Standard 2", ...
pub fn centroid_labels(mean_prices: &[f64]) -> Vec<String> {
    let k = mean_prices.len();
    let mut ranked: Vec<usize> = (0..k).collect();
    ranked.sort_by(|&a, &b| mean_prices[a].total_cmp(&mean_prices[b]).then(a.cmp(&b)));

    let mut labels = vec![String::new(); k];
    for (rank, &cluster) in ranked.iter().enumerate() {
        labels[cluster] = if k == 1 {
            STANDARD.to_string()
        } else if rank == 0 {
            BUDGET.to_string()
        } else if rank == k - 1 {
            PREMIUM.to_string()
        } else if k == 3 {
            STANDARD.to_string()
        } else {
            format!("{} {}", STANDARD, rank)
        };
    }
    labels
}

/// Labels for every cluster under the given strategy
pub fn assign_labels(strategy: LabelStrategy, mean_prices: &[f64]) -> Vec<String> {
    match strategy {
        LabelStrategy::Centroid => centroid_labels(mean_prices),
        LabelStrategy::Fixed => (0..mean_prices.len()).map(fixed_label).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_clusters_ranked_by_price() {
        let labels = centroid_labels(&[30000.0, 9000.0, 18000.0]);
        assert_eq!(labels, vec!["Premium", "Budget", "Standard"]);
    }

    #[test]
    fn test_labels_follow_price_not_id() {
        let a = centroid_labels(&[9000.0, 18000.0, 30000.0]);
        let b = centroid_labels(&[18000.0, 30000.0, 9000.0]);
        assert_eq!(a[0], b[2]);
        assert_eq!(a[2], b[1]);
    }

    #[test]
    fn test_many_middle_clusters_are_numbered() {
        let labels = centroid_labels(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(labels, vec!["Budget", "Standard 1", "Standard 2", "Premium"]);
    }

    #[test]
    fn test_single_and_pair() {
        assert_eq!(centroid_labels(&[5.0]), vec!["Standard"]);
        assert_eq!(centroid_labels(&[5.0, 1.0]), vec!["Premium", "Budget"]);
    }

    #[test]
    fn test_fixed_table() {
        let labels = assign_labels(LabelStrategy::Fixed, &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(
            labels,
            vec!["Budget & Tasty", "Premium / Hangout", "Everyday", "Everyday"]
        );
    }
}
