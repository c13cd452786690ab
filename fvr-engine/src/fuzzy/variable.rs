//! Linguistic variables: a numeric universe plus named membership terms

use super::membership::MembershipFunction;
use serde::Serialize;

/// Discretised range of a fuzzy variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Universe {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Universe {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Clamp a crisp value into the universe
    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.min, self.max)
    }

    /// Sample points `min, min + step, ..., max` (max always included)
    pub fn points(&self) -> Vec<f64> {
        let count = ((self.max - self.min) / self.step).round() as usize;
        (0..=count)
            .map(|i| (self.min + i as f64 * self.step).min(self.max))
            .collect()
    }
}

/// Named membership function of a variable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinguisticTerm {
    pub name: &'static str,
    pub function: MembershipFunction,
}

/// Named dimension with a universe and its linguistic terms
///
/// Immutable once built; shared read-only by every scoring call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzyVariable {
    pub name: &'static str,
    pub universe: Universe,
    pub terms: Vec<LinguisticTerm>,
}

impl FuzzyVariable {
    pub fn new(name: &'static str, universe: Universe) -> Self {
        Self {
            name,
            universe,
            terms: Vec::new(),
        }
    }

    /// Builder-style term registration
    pub fn with_term(mut self, name: &'static str, function: MembershipFunction) -> Self {
        self.terms.push(LinguisticTerm { name, function });
        self
    }

    pub fn term_index(&self, name: &str) -> Option<usize> {
        self.terms.iter().position(|t| t.name == name)
    }

    /// Replace a term's membership function
    pub fn set_term(&mut self, name: &str, function: MembershipFunction) -> Result<(), String> {
        let term = self
            .terms
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| format!("variable '{}' has no term '{}'", self.name, name))?;
        term.function = function;
        Ok(())
    }

    /// Membership degree in every term, in term order
    ///
    /// Values outside the universe are clamped to the nearest boundary first.
    pub fn fuzzify(&self, x: f64) -> Vec<f64> {
        let x = self.universe.clamp(x);
        self.terms.iter().map(|t| t.function.degree(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance() -> FuzzyVariable {
        FuzzyVariable::new("distance", Universe::new(0.0, 5000.0, 100.0))
            .with_term("close", MembershipFunction::trapezoid(0.0, 0.0, 800.0, 1200.0))
            .with_term("far", MembershipFunction::trapezoid(2000.0, 3500.0, 5000.0, 5000.0))
    }

    #[test]
    fn test_universe_points_include_both_ends() {
        let points = Universe::new(0.0, 100.0, 1.0).points();
        assert_eq!(points.len(), 101);
        assert_eq!(points[0], 0.0);
        assert_eq!(points[100], 100.0);

        let taste = Universe::new(1.0, 5.0, 0.1).points();
        assert_eq!(taste.len(), 41);
        assert_eq!(*taste.last().unwrap(), 5.0);
    }

    #[test]
    fn test_out_of_universe_inputs_clamp() {
        let var = distance();
        assert_eq!(var.fuzzify(-50.0), var.fuzzify(0.0));
        assert_eq!(var.fuzzify(12000.0), vec![0.0, 1.0]);
    }

    #[test]
    fn test_set_term_rejects_unknown_names() {
        let mut var = distance();
        assert!(var
            .set_term("close", MembershipFunction::triangle(0.0, 0.0, 500.0))
            .is_ok());
        assert_eq!(var.fuzzify(250.0)[0], 0.5);
        assert!(var
            .set_term("nearby", MembershipFunction::triangle(0.0, 0.0, 500.0))
            .is_err());
    }
}
