//! Feature Normalizer
//!
//! Maps categorical survey answers to ordinal scores and coerces numeric text
//! to numbers. A bad cell never fails the row: it is marked as defaulted and
//! takes the value 0 under the legacy missing-value policy.
//!
//! # Ordinal scales
//! | Field  | 0                   | 1                      | 2                   |
//! |--------|---------------------|------------------------|---------------------|
//! | wifi   | Tidak ada / none    | Ada tapi lemot / slow  | Ada dan cepat / fast|
//! | outlet | Tidak ada / none    | Ada beberapa / few     | Ada banyak / many   |
//! | wait   | Lama (> 20 menit)   | Sedang (10-20 menit)   | Cepat (< 10 menit)  |
//!
//! Unrecognised labels score 0, the same as a missing cell.

use crate::model::{Feature, NormalizedObservation, RawObservation};
use tracing::debug;

/// Value substituted for a missing, unparsable or unmapped cell
pub const DEFAULT_VALUE: f64 = 0.0;

/// Categorical answer with a fixed ordinal score
pub trait OrdinalLevel: Sized + Copy {
    /// Recognise a survey label (already trimmed and lowercased)
    fn from_label(label: &str) -> Option<Self>;

    /// Ordinal score of the level
    fn ordinal(self) -> u8;
}

/// Wifi quality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiLevel {
    None,
    Slow,
    Fast,
}

impl OrdinalLevel for WifiLevel {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "tidak ada" | "none" | "no" => Some(WifiLevel::None),
            "ada tapi lemot" | "slow" => Some(WifiLevel::Slow),
            "ada dan cepat" | "fast" => Some(WifiLevel::Fast),
            _ => None,
        }
    }

    fn ordinal(self) -> u8 {
        match self {
            WifiLevel::None => 0,
            WifiLevel::Slow => 1,
            WifiLevel::Fast => 2,
        }
    }
}

/// Power outlet availability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutletLevel {
    None,
    Few,
    Many,
}

impl OrdinalLevel for OutletLevel {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "tidak ada" | "none" | "no" => Some(OutletLevel::None),
            "ada beberapa" | "few" | "some" => Some(OutletLevel::Few),
            "ada banyak" | "many" => Some(OutletLevel::Many),
            _ => None,
        }
    }

    fn ordinal(self) -> u8 {
        match self {
            OutletLevel::None => 0,
            OutletLevel::Few => 1,
            OutletLevel::Many => 2,
        }
    }
}

/// Serving latency, scored so that quicker service is higher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitLevel {
    Long,
    Medium,
    Quick,
}

impl OrdinalLevel for WaitLevel {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "lama (> 20 menit)" | "long" | "slow" => Some(WaitLevel::Long),
            "sedang (10-20 menit)" | "medium" => Some(WaitLevel::Medium),
            "cepat (< 10 menit)" | "quick" | "fast" => Some(WaitLevel::Quick),
            _ => None,
        }
    }

    fn ordinal(self) -> u8 {
        match self {
            WaitLevel::Long => 0,
            WaitLevel::Medium => 1,
            WaitLevel::Quick => 2,
        }
    }
}

/// Lowercase, trim and collapse inner whitespace runs
fn normalize_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Map a categorical cell to its ordinal score
///
/// Returns `None` when the column is absent, the cell is empty, or the label is
/// not one of the known answers.
pub fn ordinal_score<L: OrdinalLevel>(raw: Option<&str>) -> Option<f64> {
    let label = normalize_label(raw?);
    if label.is_empty() {
        return None;
    }
    L::from_label(&label).map(|level| f64::from(level.ordinal()))
}

/// Parse a numeric cell
///
/// Returns `None` when the column is absent or the text is not a finite number.
pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a numeric cell, substituting [`DEFAULT_VALUE`] on failure
pub fn number_or_default(raw: Option<&str>) -> f64 {
    parse_number(raw).unwrap_or(DEFAULT_VALUE)
}

/// Normalise one raw observation
///
/// Pure function of its input; defaulted cells are logged at debug level.
pub fn normalize(raw: &RawObservation) -> NormalizedObservation {
    let mut cells = [None; Feature::COUNT];
    cells[Feature::Price as usize] = parse_number(raw.price.as_deref());
    cells[Feature::Distance as usize] = parse_number(raw.distance.as_deref());
    cells[Feature::Taste as usize] = parse_number(raw.taste.as_deref());
    cells[Feature::Comfort as usize] = parse_number(raw.comfort.as_deref());
    cells[Feature::Wifi as usize] = ordinal_score::<WifiLevel>(raw.wifi.as_deref());
    cells[Feature::Outlet as usize] = ordinal_score::<OutletLevel>(raw.outlet.as_deref());
    cells[Feature::Wait as usize] = ordinal_score::<WaitLevel>(raw.wait.as_deref());

    let observation = NormalizedObservation {
        venue: raw.venue.clone(),
        other_venue: raw.other_venue.clone(),
        cells,
    };

    let defaulted = observation.defaulted_cells();
    if defaulted > 0 {
        debug!(
            venue = %raw.venue,
            defaulted,
            "Defaulted unparsable or missing cells"
        );
    }

    observation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survey_labels_map_to_ordinals() {
        assert_eq!(ordinal_score::<WifiLevel>(Some("Tidak ada")), Some(0.0));
        assert_eq!(ordinal_score::<WifiLevel>(Some("Ada tapi lemot")), Some(1.0));
        assert_eq!(ordinal_score::<WifiLevel>(Some("Ada dan cepat")), Some(2.0));
        assert_eq!(ordinal_score::<OutletLevel>(Some("Ada beberapa")), Some(1.0));
        assert_eq!(ordinal_score::<OutletLevel>(Some("Ada banyak")), Some(2.0));
        assert_eq!(ordinal_score::<WaitLevel>(Some("Lama (> 20 menit)")), Some(0.0));
        assert_eq!(ordinal_score::<WaitLevel>(Some("Sedang (10-20 menit)")), Some(1.0));
        assert_eq!(ordinal_score::<WaitLevel>(Some("Cepat (< 10 menit)")), Some(2.0));
    }

    #[test]
    fn test_labels_ignore_case_and_spacing() {
        assert_eq!(ordinal_score::<WifiLevel>(Some("  ADA   dan Cepat ")), Some(2.0));
        assert_eq!(ordinal_score::<OutletLevel>(Some("Many")), Some(2.0));
    }

    #[test]
    fn test_unknown_or_missing_labels_default() {
        assert_eq!(ordinal_score::<WifiLevel>(Some("kadang ada")), None);
        assert_eq!(ordinal_score::<WifiLevel>(Some("   ")), None);
        assert_eq!(ordinal_score::<WifiLevel>(None), None);
    }

    #[test]
    fn test_numbers_parse_or_default() {
        assert_eq!(parse_number(Some(" 15000 ")), Some(15000.0));
        assert_eq!(parse_number(Some("4.5")), Some(4.5));
        assert_eq!(parse_number(Some("lima belas ribu")), None);
        assert_eq!(parse_number(Some("NaN")), None);
        assert_eq!(parse_number(None), None);
        assert_eq!(number_or_default(Some("abc")), 0.0);
    }

    #[test]
    fn test_unparsable_price_becomes_zero_not_error() {
        let raw = RawObservation {
            venue: "Kulos".to_string(),
            price: Some("mahal".to_string()),
            taste: Some("4".to_string()),
            ..Default::default()
        };

        let normalized = normalize(&raw);
        assert_eq!(normalized.cell(Feature::Price), None);
        assert_eq!(normalized.cell(Feature::Price).unwrap_or(DEFAULT_VALUE), 0.0);
        assert_eq!(normalized.cell(Feature::Taste), Some(4.0));
        // price, distance, comfort, wifi, outlet, wait
        assert_eq!(normalized.defaulted_cells(), 6);
    }
}
