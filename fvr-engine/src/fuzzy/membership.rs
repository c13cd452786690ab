//! Triangular and trapezoidal membership functions

use serde::Serialize;

/// Membership function over a numeric universe, values in [0, 1]
///
/// Points must be non-decreasing. Coincident outer points make a shoulder:
/// `Trapezoid { a: 0, b: 0, .. }` is fully true at 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MembershipFunction {
    /// Rises from `a` to a peak at `b`, falls to zero at `c`
    Triangle { a: f64, b: f64, c: f64 },
    /// Rises from `a` to `b`, plateau to `c`, falls to zero at `d`
    Trapezoid { a: f64, b: f64, c: f64, d: f64 },
}

impl MembershipFunction {
    pub fn triangle(a: f64, b: f64, c: f64) -> Self {
        MembershipFunction::Triangle { a, b, c }
    }

    pub fn trapezoid(a: f64, b: f64, c: f64, d: f64) -> Self {
        MembershipFunction::Trapezoid { a, b, c, d }
    }

    /// Build from breakpoints: three points make a triangle, four a trapezoid
    pub fn from_points(points: &[f64]) -> Result<Self, String> {
        if points.iter().any(|p| !p.is_finite()) {
            return Err(format!("breakpoints must be finite: {:?}", points));
        }
        if points.windows(2).any(|w| w[0] > w[1]) {
            return Err(format!("breakpoints must be non-decreasing: {:?}", points));
        }
        match *points {
            [a, b, c] => Ok(Self::triangle(a, b, c)),
            [a, b, c, d] => Ok(Self::trapezoid(a, b, c, d)),
            _ => Err(format!(
                "expected 3 (triangle) or 4 (trapezoid) breakpoints, got {}",
                points.len()
            )),
        }
    }

    /// Breakpoints as a slice-friendly vector
    pub fn points(&self) -> Vec<f64> {
        match *self {
            MembershipFunction::Triangle { a, b, c } => vec![a, b, c],
            MembershipFunction::Trapezoid { a, b, c, d } => vec![a, b, c, d],
        }
    }

    /// Degree of membership of `x`
    pub fn degree(&self, x: f64) -> f64 {
        let (a, b, c, d) = match *self {
            MembershipFunction::Triangle { a, b, c } => (a, b, b, c),
            MembershipFunction::Trapezoid { a, b, c, d } => (a, b, c, d),
        };

        if x < a || x > d {
            0.0
        } else if x >= b && x <= c {
            1.0
        } else if x < b {
            (x - a) / (b - a)
        } else {
            (d - x) / (d - c)
        }
    }

    /// Interval where the degree is non-zero (closed bounds)
    pub fn support(&self) -> (f64, f64) {
        match *self {
            MembershipFunction::Triangle { a, c, .. } => (a, c),
            MembershipFunction::Trapezoid { a, d, .. } => (a, d),
        }
    }
}
