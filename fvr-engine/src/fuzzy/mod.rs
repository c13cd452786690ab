//! Fuzzy Scoring Engine
//!
//! Mamdani inference turning (price, distance, taste) into a 0-100
//! recommendation score with a hand-authored rule base.

pub mod engine;
pub mod membership;
pub mod rules;
pub mod variable;

pub use engine::{FuzzyEngine, InferenceTrace, RuleFiring, ScoreInputs};
pub use membership::MembershipFunction;
pub use rules::{default_rules, InputVariable, Rule};
pub use variable::{FuzzyVariable, Universe};
