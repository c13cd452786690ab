//! Core data types flowing through the scoring pipeline
//!
//! - [`RawObservation`]: one survey row as read from the input file
//! - [`NormalizedObservation`]: the same row with every feature coerced to a number
//! - [`Venue`]: one aggregated row per canonical venue name

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Numeric feature of a venue
///
/// The discriminant is the position in a [`FeatureVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Amount spent per visit (currency units)
    Price = 0,
    /// Distance from the reference point (meters)
    Distance = 1,
    /// Taste rating (1-5)
    Taste = 2,
    /// Comfort rating (1-5)
    Comfort = 3,
    /// Wifi quality (ordinal 0-2)
    Wifi = 4,
    /// Power outlet availability (ordinal 0-2)
    Outlet = 5,
    /// Serving speed (ordinal 0-2, higher is quicker)
    Wait = 6,
}

impl Feature {
    /// Number of features in a [`FeatureVector`]
    pub const COUNT: usize = 7;

    /// All features in vector order
    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::Price,
        Feature::Distance,
        Feature::Taste,
        Feature::Comfort,
        Feature::Wifi,
        Feature::Outlet,
        Feature::Wait,
    ];

    /// Configuration name of the feature
    pub fn name(self) -> &'static str {
        match self {
            Feature::Price => "price",
            Feature::Distance => "distance",
            Feature::Taste => "taste",
            Feature::Comfort => "comfort",
            Feature::Wifi => "wifi",
            Feature::Outlet => "outlet",
            Feature::Wait => "wait",
        }
    }

    /// Parse a configuration name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Feature::ALL.into_iter().find(|f| f.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-size vector of feature values, indexed by [`Feature`]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector([f64; Feature::COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; Feature::COUNT]) -> Self {
        Self(values)
    }

    /// Values of the selected features, in selection order
    pub fn select(&self, features: &[Feature]) -> Vec<f64> {
        features.iter().map(|f| self[*f]).collect()
    }
}

impl Index<Feature> for FeatureVector {
    type Output = f64;

    fn index(&self, feature: Feature) -> &f64 {
        &self.0[feature.index()]
    }
}

impl IndexMut<Feature> for FeatureVector {
    fn index_mut(&mut self, feature: Feature) -> &mut f64 {
        &mut self.0[feature.index()]
    }
}

/// One respondent's report about one venue visit, as read from the input file
///
/// `None` means the column is absent from the file; `Some("")` is an empty cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawObservation {
    /// Venue name as selected in the survey (may be the "other" sentinel)
    pub venue: String,
    /// Free-text venue name used when `venue` is the sentinel
    pub other_venue: Option<String>,
    pub price: Option<String>,
    pub distance: Option<String>,
    pub taste: Option<String>,
    pub comfort: Option<String>,
    pub wifi: Option<String>,
    pub outlet: Option<String>,
    pub wait: Option<String>,
}

/// A survey row after feature normalisation
///
/// A `None` cell was missing or unparsable and has been defaulted; the
/// aggregator decides how such cells enter the venue mean.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedObservation {
    pub venue: String,
    pub other_venue: Option<String>,
    pub cells: [Option<f64>; Feature::COUNT],
}

impl NormalizedObservation {
    pub fn cell(&self, feature: Feature) -> Option<f64> {
        self.cells[feature.index()]
    }

    /// Number of cells that were defaulted during normalisation
    pub fn defaulted_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }
}

/// The unit of recommendation: one row per canonical venue name
///
/// All numeric attributes are per-venue means.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Venue {
    /// Canonical name (trimmed, whitespace collapsed, title case)
    pub name: String,
    /// Number of observations aggregated into this row
    pub observations: usize,
    pub features: FeatureVector,
}

impl Venue {
    pub fn price(&self) -> f64 {
        self.features[Feature::Price]
    }

    pub fn distance(&self) -> f64 {
        self.features[Feature::Distance]
    }

    pub fn taste(&self) -> f64 {
        self.features[Feature::Taste]
    }

    pub fn comfort(&self) -> f64 {
        self.features[Feature::Comfort]
    }
}
