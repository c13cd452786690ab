//! Venue Aggregator
//!
//! Collapses per-respondent observations into one row per venue:
//! 1. Resolve the effective name (the "other" sentinel defers to the free-text field)
//! 2. Canonicalise it so visually-equal names share one identity
//! 3. Group by canonical name
//! 4. Average every feature over the group
//!
//! Under the default [`MissingValuePolicy::Zero`] policy a defaulted cell takes
//! part in the mean as 0, which pulls partially-missing venues toward 0. This is
//! the legacy behaviour and stays the default.

use crate::model::{Feature, FeatureVector, NormalizedObservation, Venue};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Survey values meaning "the venue is not in the list, see the free-text field"
const OTHER_SENTINELS: [&str; 2] = ["lainnya", "other"];

/// How defaulted cells enter a venue's mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Defaulted cells count as 0
    #[default]
    Zero,
    /// Defaulted cells are left out; a feature with no valid cell is 0
    Exclude,
}

impl MissingValuePolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "zero" => Some(MissingValuePolicy::Zero),
            "exclude" => Some(MissingValuePolicy::Exclude),
            _ => None,
        }
    }
}

/// Canonical form of a venue name
///
/// Trims, collapses inner whitespace and title-cases each word, so
/// "Kulos", " kulos " and "KULOS" all become "Kulos".
pub fn canonical_venue_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Effective canonical name of an observation, `None` if it has no usable name
pub fn resolve_venue_name(venue: &str, other_venue: Option<&str>) -> Option<String> {
    let is_sentinel = OTHER_SENTINELS.contains(&venue.trim().to_lowercase().as_str());
    let effective = if is_sentinel {
        other_venue.unwrap_or_default()
    } else {
        venue
    };

    let canonical = canonical_venue_name(effective);
    if canonical.is_empty() {
        None
    } else {
        Some(canonical)
    }
}

/// Result of aggregating one batch of observations
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// One row per canonical name, ordered by name
    pub venues: Vec<Venue>,
    /// Observations dropped because no venue name could be resolved
    pub skipped: usize,
}

/// Collected cell values for one venue
///
/// Values are kept rather than summed on arrival so the mean can be summed in
/// sorted order: the same multiset of rows yields bit-identical means whatever
/// order they were read in.
#[derive(Default)]
struct Accumulator {
    observations: usize,
    values: [Vec<f64>; Feature::COUNT],
}

impl Accumulator {
    fn add(&mut self, observation: &NormalizedObservation, policy: MissingValuePolicy) {
        self.observations += 1;
        for (values, cell) in self.values.iter_mut().zip(observation.cells.iter()) {
            match (cell, policy) {
                (Some(value), _) => values.push(*value),
                (None, MissingValuePolicy::Zero) => values.push(0.0),
                (None, MissingValuePolicy::Exclude) => {}
            }
        }
    }

    fn means(mut self) -> FeatureVector {
        let mut means = [0.0_f64; Feature::COUNT];
        for (mean, values) in means.iter_mut().zip(self.values.iter_mut()) {
            if !values.is_empty() {
                values.sort_by(f64::total_cmp);
                *mean = values.iter().sum::<f64>() / values.len() as f64;
            }
        }
        FeatureVector::new(means)
    }
}

/// Groups normalised observations into venues
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    policy: MissingValuePolicy,
}

impl Aggregator {
    pub fn new(policy: MissingValuePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MissingValuePolicy {
        self.policy
    }

    /// Aggregate observations into per-venue means
    ///
    /// The output does not depend on the order of the input rows.
    pub fn aggregate(&self, observations: &[NormalizedObservation]) -> Aggregation {
        let mut groups: BTreeMap<String, Accumulator> = BTreeMap::new();
        let mut skipped = 0;

        for observation in observations {
            match resolve_venue_name(&observation.venue, observation.other_venue.as_deref()) {
                Some(name) => groups.entry(name).or_default().add(observation, self.policy),
                None => {
                    warn!(
                        venue = %observation.venue,
                        "Skipping observation without a resolvable venue name"
                    );
                    skipped += 1;
                }
            }
        }

        let venues: Vec<Venue> = groups
            .into_iter()
            .map(|(name, acc)| Venue {
                name,
                observations: acc.observations,
                features: acc.means(),
            })
            .collect();

        debug!(
            venues = venues.len(),
            skipped,
            policy = ?self.policy,
            "Aggregation complete"
        );

        Aggregation { venues, skipped }
    }
}
