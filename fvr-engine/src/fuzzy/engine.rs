//! Mamdani inference over the compiled rule base
//!
//! # Algorithm
//! 1. Fuzzify price, distance and taste (inputs clamped to their universes)
//! 2. Rule strength = minimum membership over the rule's clauses
//! 3. Each output term is clipped at the strongest rule concluding it; the
//!    aggregated curve is the pointwise maximum of the clipped terms
//! 4. Score = centre of area of the aggregated curve over 0..=100
//!
//! When no rule fires the curve is flat zero and the centroid is undefined:
//! [`FuzzyEngine::score`] reports [`ScoringError::NoRuleFired`] and
//! [`FuzzyEngine::score_or`] substitutes the caller's fallback.
//!
//! The engine holds no mutable state. One instance is built at start-up and
//! shared by reference (it is `Send + Sync`); every call works on local buffers.

use super::membership::MembershipFunction;
use super::rules::{default_rules, terms, InputVariable, Rule};
use super::variable::{FuzzyVariable, Universe};
use crate::error::{PipelineError, ScoringError};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Name of the output variable
pub const OUTPUT_VARIABLE: &str = "score";

/// Crisp inputs for one venue
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreInputs {
    /// Currency units
    pub price: f64,
    /// Meters
    pub distance: f64,
    /// Rating 1-5
    pub taste: f64,
}

impl ScoreInputs {
    /// Inputs from user-supplied values; NaN and infinities are rejected
    pub fn checked(price: f64, distance: f64, taste: f64) -> Result<Self, ScoringError> {
        for (name, value) in [("price", price), ("distance", distance), ("taste", taste)] {
            if !value.is_finite() {
                return Err(ScoringError::NonFiniteInput { name, value });
            }
        }
        Ok(Self {
            price,
            distance,
            taste,
        })
    }
}

/// Firing strength of one rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleFiring {
    pub rule: String,
    pub strength: f64,
}

/// Everything the engine computed for one set of inputs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceTrace {
    pub inputs: ScoreInputs,
    /// Variable name → term name → membership degree
    pub memberships: BTreeMap<&'static str, BTreeMap<&'static str, f64>>,
    pub rules: Vec<RuleFiring>,
    /// Output term → clipping level
    pub activations: BTreeMap<&'static str, f64>,
    /// Crisp score, `None` when no rule fired
    pub score: Option<f64>,
}

/// Rule with variable terms resolved to indices
#[derive(Debug, Clone)]
struct CompiledRule {
    clauses: Vec<(InputVariable, usize)>,
    consequent: usize,
}

/// Default price variable (currency units)
pub fn default_price() -> FuzzyVariable {
    FuzzyVariable::new("price", Universe::new(0.0, 50000.0, 1000.0))
        .with_term(terms::CHEAP, MembershipFunction::trapezoid(0.0, 0.0, 12000.0, 15000.0))
        .with_term(terms::MEDIUM, MembershipFunction::triangle(12000.0, 18000.0, 25000.0))
        .with_term(
            terms::EXPENSIVE,
            MembershipFunction::trapezoid(20000.0, 30000.0, 50000.0, 50000.0),
        )
}

/// Default distance variable (meters)
pub fn default_distance() -> FuzzyVariable {
    FuzzyVariable::new("distance", Universe::new(0.0, 5000.0, 100.0))
        .with_term(terms::CLOSE, MembershipFunction::trapezoid(0.0, 0.0, 800.0, 1200.0))
        .with_term(terms::MEDIUM, MembershipFunction::triangle(800.0, 1800.0, 3000.0))
        .with_term(terms::FAR, MembershipFunction::trapezoid(2000.0, 3500.0, 5000.0, 5000.0))
}

/// Default taste variable (rating 1-5)
pub fn default_taste() -> FuzzyVariable {
    FuzzyVariable::new("taste", Universe::new(1.0, 5.0, 0.1))
        .with_term(terms::BLAND, MembershipFunction::trapezoid(1.0, 1.0, 3.5, 4.2))
        .with_term(terms::TASTY, MembershipFunction::trapezoid(3.8, 4.5, 5.0, 5.0))
}

/// Default output variable (recommendation score 0-100)
pub fn default_score() -> FuzzyVariable {
    FuzzyVariable::new(OUTPUT_VARIABLE, Universe::new(0.0, 100.0, 1.0))
        .with_term(terms::LOW, MembershipFunction::triangle(0.0, 0.0, 50.0))
        .with_term(terms::MEDIUM, MembershipFunction::triangle(40.0, 60.0, 80.0))
        .with_term(terms::HIGH, MembershipFunction::triangle(70.0, 100.0, 100.0))
}

/// Immutable compiled fuzzy rule base
#[derive(Debug, Clone)]
pub struct FuzzyEngine {
    price: FuzzyVariable,
    distance: FuzzyVariable,
    taste: FuzzyVariable,
    output: FuzzyVariable,
    rules: Vec<Rule>,
    compiled: Vec<CompiledRule>,
    output_points: Vec<f64>,
    /// Membership of every output term at every output point
    output_curves: Vec<Vec<f64>>,
}

impl FuzzyEngine {
    /// Compile variables and rules; every referenced term must exist
    pub fn new(
        price: FuzzyVariable,
        distance: FuzzyVariable,
        taste: FuzzyVariable,
        output: FuzzyVariable,
        rules: Vec<Rule>,
    ) -> Result<Self, PipelineError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in &rules {
            let mut clauses = Vec::with_capacity(rule.antecedent.len());
            for clause in &rule.antecedent {
                let variable = match clause.variable {
                    InputVariable::Price => &price,
                    InputVariable::Distance => &distance,
                    InputVariable::Taste => &taste,
                };
                let index = variable.term_index(clause.term).ok_or_else(|| {
                    PipelineError::InvalidConfig(format!(
                        "rule '{}' references unknown term '{}' of '{}'",
                        rule, clause.term, variable.name
                    ))
                })?;
                clauses.push((clause.variable, index));
            }
            let consequent = output.term_index(rule.consequent).ok_or_else(|| {
                PipelineError::InvalidConfig(format!(
                    "rule '{}' concludes unknown output term '{}'",
                    rule, rule.consequent
                ))
            })?;
            compiled.push(CompiledRule {
                clauses,
                consequent,
            });
        }

        let output_points = output.universe.points();
        let output_curves = output
            .terms
            .iter()
            .map(|t| output_points.iter().map(|&x| t.function.degree(x)).collect())
            .collect();

        Ok(Self {
            price,
            distance,
            taste,
            output,
            rules,
            compiled,
            output_points,
            output_curves,
        })
    }

    /// Engine with the default breakpoints and rule base
    pub fn standard() -> Result<Self, PipelineError> {
        Self::from_overrides(&BTreeMap::new())
    }

    /// Default engine with membership breakpoints replaced per variable and term
    ///
    /// Rejects unknown variables or terms, malformed breakpoints, and overrides
    /// under which the best corner (cheapest, closest, tastiest) would score
    /// below the worst corner.
    pub fn from_overrides(
        overrides: &BTreeMap<String, BTreeMap<String, Vec<f64>>>,
    ) -> Result<Self, PipelineError> {
        let mut price = default_price();
        let mut distance = default_distance();
        let mut taste = default_taste();
        let mut output = default_score();

        for (variable_name, term_overrides) in overrides {
            let variable = match variable_name.trim().to_ascii_lowercase().as_str() {
                "price" => &mut price,
                "distance" => &mut distance,
                "taste" => &mut taste,
                OUTPUT_VARIABLE => &mut output,
                other => {
                    return Err(PipelineError::InvalidConfig(format!(
                        "unknown fuzzy variable '{}'",
                        other
                    )))
                }
            };
            for (term_name, points) in term_overrides {
                let function = MembershipFunction::from_points(points).map_err(|e| {
                    PipelineError::InvalidConfig(format!(
                        "fuzzy.{}.{}: {}",
                        variable_name, term_name, e
                    ))
                })?;
                variable
                    .set_term(term_name.trim(), function)
                    .map_err(PipelineError::InvalidConfig)?;
            }
        }

        let engine = Self::new(price, distance, taste, output, default_rules())?;
        engine.check_ordering()?;
        Ok(engine)
    }

    /// Cheap, close and tasty must not score below expensive, far and bland,
    /// and both corners must fire at least one rule
    fn check_ordering(&self) -> Result<(), PipelineError> {
        let best = ScoreInputs {
            price: self.price.universe.min,
            distance: self.distance.universe.min,
            taste: self.taste.universe.max,
        };
        let worst = ScoreInputs {
            price: self.price.universe.max,
            distance: self.distance.universe.max,
            taste: self.taste.universe.min,
        };

        let uncovered = |e: ScoringError| {
            PipelineError::InvalidConfig(format!("membership overrides leave a corner uncovered: {}", e))
        };
        let best_score = self.score(best).map_err(uncovered)?;
        let worst_score = self.score(worst).map_err(uncovered)?;
        if best_score < worst_score {
            return Err(PipelineError::InvalidConfig(format!(
                "membership overrides invert the rule base: best corner scores {:.1}, worst corner {:.1}",
                best_score, worst_score
            )));
        }
        Ok(())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Input and output variables, in price/distance/taste/score order
    pub fn variables(&self) -> [&FuzzyVariable; 4] {
        [&self.price, &self.distance, &self.taste, &self.output]
    }

    fn degrees(&self, inputs: ScoreInputs) -> [Vec<f64>; 3] {
        [
            self.price.fuzzify(inputs.price),
            self.distance.fuzzify(inputs.distance),
            self.taste.fuzzify(inputs.taste),
        ]
    }

    fn rule_strengths(&self, degrees: &[Vec<f64>; 3]) -> Vec<f64> {
        self.compiled
            .iter()
            .map(|rule| {
                rule.clauses
                    .iter()
                    .map(|&(variable, term)| {
                        let slot = match variable {
                            InputVariable::Price => 0,
                            InputVariable::Distance => 1,
                            InputVariable::Taste => 2,
                        };
                        degrees[slot][term]
                    })
                    .fold(1.0, f64::min)
            })
            .collect()
    }

    /// Clipping level per output term: the strongest rule concluding it
    fn activations(&self, strengths: &[f64]) -> Vec<f64> {
        let mut activations = vec![0.0_f64; self.output.terms.len()];
        for (rule, &strength) in self.compiled.iter().zip(strengths) {
            let slot = &mut activations[rule.consequent];
            *slot = slot.max(strength);
        }
        activations
    }

    /// Centre of area of the aggregated curve, `None` when the curve is empty
    fn defuzzify(&self, activations: &[f64]) -> Option<f64> {
        let mut area = 0.0_f64;
        let mut moment = 0.0_f64;
        for (i, &x) in self.output_points.iter().enumerate() {
            let height = self
                .output_curves
                .iter()
                .zip(activations)
                .map(|(curve, &level)| curve[i].min(level))
                .fold(0.0, f64::max);
            area += height;
            moment += x * height;
        }

        if area <= f64::EPSILON {
            None
        } else {
            let universe = self.output.universe;
            Some((moment / area).clamp(universe.min, universe.max))
        }
    }

    /// Recommendation score in [0, 100]
    pub fn score(&self, inputs: ScoreInputs) -> Result<f64, ScoringError> {
        let inputs = ScoreInputs::checked(inputs.price, inputs.distance, inputs.taste)?;
        let degrees = self.degrees(inputs);
        let strengths = self.rule_strengths(&degrees);
        let activations = self.activations(&strengths);
        self.defuzzify(&activations)
            .ok_or(ScoringError::NoRuleFired {
                price: inputs.price,
                distance: inputs.distance,
                taste: inputs.taste,
            })
    }

    /// Recommendation score, substituting `fallback` when no rule fires
    pub fn score_or(&self, inputs: ScoreInputs, fallback: f64) -> f64 {
        match self.score(inputs) {
            Ok(score) => score,
            Err(e) => {
                debug!("{} - using fallback {}", e, fallback);
                fallback
            }
        }
    }

    /// Full fuzzification and rule trace for one set of inputs
    pub fn explain(&self, inputs: ScoreInputs) -> InferenceTrace {
        let degrees = self.degrees(inputs);
        let strengths = self.rule_strengths(&degrees);
        let activations = self.activations(&strengths);
        let score = self.defuzzify(&activations);

        let inputs_vars = [&self.price, &self.distance, &self.taste];
        let memberships = inputs_vars
            .iter()
            .zip(&degrees)
            .map(|(variable, degrees)| {
                let terms: BTreeMap<&'static str, f64> = variable
                    .terms
                    .iter()
                    .zip(degrees)
                    .map(|(t, &d)| (t.name, d))
                    .collect();
                (variable.name, terms)
            })
            .collect();

        let rules = self
            .rules
            .iter()
            .zip(&strengths)
            .map(|(rule, &strength)| RuleFiring {
                rule: rule.to_string(),
                strength,
            })
            .collect();

        let activations = self
            .output
            .terms
            .iter()
            .zip(&activations)
            .map(|(t, &level)| (t.name, level))
            .collect();

        InferenceTrace {
            inputs,
            memberships,
            rules,
            activations,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> FuzzyEngine {
        FuzzyEngine::standard().unwrap()
    }

    fn inputs(price: f64, distance: f64, taste: f64) -> ScoreInputs {
        ScoreInputs {
            price,
            distance,
            taste,
        }
    }

    #[test]
    fn test_cheap_and_tasty_scores_high() {
        let score = engine().score(inputs(12000.0, 1500.0, 4.8)).unwrap();
        assert!(score > 70.0, "score was {}", score);
    }

    #[test]
    fn test_expensive_and_bland_scores_low() {
        let score = engine().score(inputs(45000.0, 1500.0, 2.0)).unwrap();
        assert!(score < 30.0, "score was {}", score);
    }

    #[test]
    fn test_expensive_and_tasty_scores_medium() {
        let score = engine().score(inputs(45000.0, 1500.0, 4.8)).unwrap();
        assert!((score - 60.0).abs() < 1.0, "score was {}", score);
    }

    #[test]
    fn test_scores_stay_within_bounds() {
        let engine = engine();
        for price in (0..=50000).step_by(2500) {
            for distance in (0..=5000).step_by(250) {
                for taste10 in 10..=50 {
                    let i = inputs(price as f64, distance as f64, taste10 as f64 / 10.0);
                    if let Ok(score) = engine.score(i) {
                        assert!((0.0..=100.0).contains(&score), "{:?} -> {}", i, score);
                    }
                }
            }
        }
    }

    #[test]
    fn test_cheaper_never_scores_lower() {
        let engine = engine();
        for &(distance, taste) in &[(1000.0, 4.8), (300.0, 4.6)] {
            let mut previous = f64::NEG_INFINITY;
            for price in [48000.0, 40000.0, 30000.0, 22000.0, 15000.0, 10000.0, 5000.0, 0.0] {
                let score = engine.score_or(inputs(price, distance, taste), 0.0);
                assert!(
                    score >= previous - 1e-9,
                    "price {} (d={}, t={}) scored {} after {}",
                    price,
                    distance,
                    taste,
                    score,
                    previous
                );
                previous = score;
            }
        }
    }

    #[test]
    fn test_mid_price_tasty_beyond_close_has_no_rule() {
        // Only the expensive+tasty rule covers a tasty venue past "close" once
        // price leaves "cheap", so the mid band falls through to the fallback
        let engine = engine();
        assert!(matches!(
            engine.score(inputs(15000.0, 1500.0, 4.9)),
            Err(ScoringError::NoRuleFired { .. })
        ));
        let dearer = engine.score(inputs(22000.0, 1500.0, 4.9)).unwrap();
        assert!((dearer - 60.0).abs() < 1e-6, "score was {}", dearer);
    }

    #[test]
    fn test_activation_is_strongest_rule_per_term() {
        // cheap 0.5, medium 0.25, close 0.5, tasty 1: three rules conclude "high"
        let trace = engine().explain(inputs(13500.0, 1000.0, 4.8));
        assert!((trace.rules[0].strength - 0.5).abs() < 1e-12);
        assert!((trace.rules[1].strength - 0.5).abs() < 1e-12);
        assert!((trace.rules[2].strength - 0.25).abs() < 1e-12);
        assert!((trace.activations["high"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_inputs_are_rejected() {
        assert!(matches!(
            ScoreInputs::checked(f64::NAN, 500.0, 4.5),
            Err(ScoringError::NonFiniteInput { name: "price", .. })
        ));
        assert!(matches!(
            ScoreInputs::checked(12000.0, f64::INFINITY, 4.5),
            Err(ScoringError::NonFiniteInput { name: "distance", .. })
        ));
        assert!(ScoreInputs::checked(12000.0, 500.0, 4.5).is_ok());
        assert!(matches!(
            engine().score(inputs(12000.0, 500.0, f64::NAN)),
            Err(ScoringError::NonFiniteInput { name: "taste", .. })
        ));
        assert_eq!(engine().score_or(inputs(f64::NAN, 500.0, 4.5), 0.0), 0.0);
    }

    #[test]
    fn test_no_rule_fired_is_reported() {
        // medium price, medium distance, middling taste: nothing in the rule base applies
        let i = inputs(16000.0, 1500.0, 3.6);
        let err = engine().score(i).unwrap_err();
        assert!(matches!(err, ScoringError::NoRuleFired { .. }));
        assert_eq!(engine().score_or(i, 0.0), 0.0);
        assert_eq!(engine().score_or(i, 50.0), 50.0);
    }

    #[test]
    fn test_out_of_universe_inputs_clamp() {
        let engine = engine();
        assert_eq!(
            engine.score(inputs(-500.0, -10.0, 9.0)),
            engine.score(inputs(0.0, 0.0, 5.0))
        );
        assert_eq!(
            engine.score(inputs(90000.0, 8000.0, 0.0)),
            engine.score(inputs(50000.0, 5000.0, 1.0))
        );
    }

    #[test]
    fn test_calls_do_not_share_state() {
        let engine = engine();
        let a = inputs(10000.0, 500.0, 4.9);
        let b = inputs(45000.0, 4500.0, 1.5);
        let first = engine.score(a).unwrap();
        let _ = engine.score(b).unwrap();
        assert_eq!(engine.score(a).unwrap(), first);
    }

    #[test]
    fn test_explain_reports_memberships_and_strengths() {
        let trace = engine().explain(inputs(12000.0, 1000.0, 4.8));
        assert_eq!(trace.memberships["price"]["cheap"], 1.0);
        assert_eq!(trace.memberships["taste"]["tasty"], 1.0);
        assert!((trace.memberships["distance"]["close"] - 0.5).abs() < 1e-12);
        assert_eq!(trace.rules.len(), 6);
        assert_eq!(trace.rules[0].strength, 1.0);
        assert_eq!(trace.activations["high"], 1.0);
        assert_eq!(trace.activations["low"], 0.0);
        assert!(trace.score.unwrap() > 70.0);
    }

    #[test]
    fn test_overrides_replace_breakpoints() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "price".to_string(),
            BTreeMap::from([("cheap".to_string(), vec![0.0, 0.0, 20000.0, 24000.0])]),
        );
        let engine = FuzzyEngine::from_overrides(&overrides).unwrap();
        let trace = engine.explain(inputs(19000.0, 1000.0, 4.8));
        assert_eq!(trace.memberships["price"]["cheap"], 1.0);
    }

    #[test]
    fn test_overrides_reject_unknown_names_and_bad_points() {
        let unknown_var = BTreeMap::from([(
            "noise".to_string(),
            BTreeMap::from([("loud".to_string(), vec![0.0, 1.0, 2.0])]),
        )]);
        assert!(FuzzyEngine::from_overrides(&unknown_var).is_err());

        let unknown_term = BTreeMap::from([(
            "taste".to_string(),
            BTreeMap::from([("spicy".to_string(), vec![0.0, 1.0, 2.0])]),
        )]);
        assert!(FuzzyEngine::from_overrides(&unknown_term).is_err());

        let bad_points = BTreeMap::from([(
            "taste".to_string(),
            BTreeMap::from([("tasty".to_string(), vec![5.0, 4.0])]),
        )]);
        assert!(FuzzyEngine::from_overrides(&bad_points).is_err());
    }

    #[test]
    fn test_overrides_that_invert_the_rule_base_are_rejected() {
        let inverted = BTreeMap::from([(
            OUTPUT_VARIABLE.to_string(),
            BTreeMap::from([
                ("low".to_string(), vec![70.0, 100.0, 100.0]),
                ("high".to_string(), vec![0.0, 0.0, 50.0]),
            ]),
        )]);
        assert!(matches!(
            FuzzyEngine::from_overrides(&inverted),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_overrides_leaving_best_corner_uncovered_are_rejected() {
        // cheap no longer reaches price 0, and no other rule fires there
        let uncovered = BTreeMap::from([(
            "price".to_string(),
            BTreeMap::from([("cheap".to_string(), vec![10000.0, 20000.0, 30000.0])]),
        )]);
        match FuzzyEngine::from_overrides(&uncovered) {
            Err(PipelineError::InvalidConfig(msg)) => assert!(msg.contains("uncovered"), "{}", msg),
            other => panic!("expected InvalidConfig, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FuzzyEngine>();
    }
}
