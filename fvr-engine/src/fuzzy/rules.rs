//! Rule base: conjunctive antecedents with a single output term

use serde::Serialize;
use std::fmt;

/// Term names shared by the default variables and rules
pub mod terms {
    pub const CHEAP: &str = "cheap";
    pub const MEDIUM: &str = "medium";
    pub const EXPENSIVE: &str = "expensive";
    pub const CLOSE: &str = "close";
    pub const FAR: &str = "far";
    pub const BLAND: &str = "bland";
    pub const TASTY: &str = "tasty";
    pub const LOW: &str = "low";
    pub const HIGH: &str = "high";
}

/// Input dimension of the scoring engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputVariable {
    Price,
    Distance,
    Taste,
}

impl InputVariable {
    pub const ALL: [InputVariable; 3] = [
        InputVariable::Price,
        InputVariable::Distance,
        InputVariable::Taste,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InputVariable::Price => "price",
            InputVariable::Distance => "distance",
            InputVariable::Taste => "taste",
        }
    }
}

/// One `variable IS term` condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Clause {
    pub variable: InputVariable,
    pub term: &'static str,
}

/// `IF clause AND clause ... THEN score IS consequent`
///
/// The antecedent's truth is the minimum of its clause memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub antecedent: Vec<Clause>,
    pub consequent: &'static str,
}

impl Rule {
    pub fn new(antecedent: &[(InputVariable, &'static str)], consequent: &'static str) -> Self {
        Self {
            antecedent: antecedent
                .iter()
                .map(|&(variable, term)| Clause { variable, term })
                .collect(),
            consequent,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IF ")?;
        for (i, clause) in self.antecedent.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{} IS {}", clause.variable.name(), clause.term)?;
        }
        write!(f, " THEN score IS {}", self.consequent)
    }
}

/// The hand-authored rule base
pub fn default_rules() -> Vec<Rule> {
    use terms::*;
    use InputVariable::{Distance, Price, Taste};

    vec![
        Rule::new(&[(Price, CHEAP), (Taste, TASTY)], HIGH),
        Rule::new(&[(Price, CHEAP), (Distance, CLOSE)], HIGH),
        Rule::new(&[(Price, MEDIUM), (Taste, TASTY), (Distance, CLOSE)], HIGH),
        Rule::new(&[(Price, EXPENSIVE), (Taste, TASTY)], MEDIUM),
        Rule::new(&[(Price, EXPENSIVE), (Taste, BLAND)], LOW),
        Rule::new(&[(Distance, FAR), (Taste, BLAND)], LOW),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_display() {
        let rule = &default_rules()[2];
        assert_eq!(
            rule.to_string(),
            "IF price IS medium AND taste IS tasty AND distance IS close THEN score IS high"
        );
    }

    #[test]
    fn test_default_rule_base_shape() {
        let rules = default_rules();
        assert_eq!(rules.len(), 6);
        assert_eq!(rules.iter().filter(|r| r.consequent == terms::HIGH).count(), 3);
        assert_eq!(rules.iter().filter(|r| r.consequent == terms::LOW).count(), 2);
    }
}
