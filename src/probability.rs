//! Attacker-success probabilities for edge instances
//!
//! Every edge instance in the attack graph carries a probability that an
//! attacker standing on the source object can actually abuse the relationship
//! to reach the target. Three outcomes must stay distinguishable:
//!
//! ```text
//! INAPPLICABLE (-1)   edge exists, but must be treated as infeasible
//! NEVER        (0)    real edge, no chance of success
//! 1..=100             percent chance of success
//! ```
//!
//! "Not yet computed" is not a probability; callers that need it hold an
//! `Option<Probability>`.
//!
//! # Example
//!
//! ```
//! use trustgraph::probability::Probability;
//!
//! let p = Probability::new(50);
//! assert_eq!(p.percent(), Some(50));
//! assert!(Probability::INAPPLICABLE < Probability::NEVER);
//! assert_eq!(Probability::from_raw(-7), Probability::INAPPLICABLE);
//! ```

use crate::object::GraphObject;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Percent chance of attacker success, or the inapplicable sentinel
///
/// The inner value is always `-1` or within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Probability(i8);

impl Probability {
    /// Edge instance exists but is infeasible
    pub const INAPPLICABLE: Self = Self(-1);
    /// Real edge with zero chance of success
    pub const NEVER: Self = Self(0);
    /// Fixed, maximal-confidence relationship
    pub const CERTAIN: Self = Self(100);

    /// Create a probability from a percentage, saturating at 100
    pub const fn new(percent: u8) -> Self {
        if percent > 100 {
            Self(100)
        } else {
            Self(percent as i8)
        }
    }

    /// Create a probability from a raw signed value
    ///
    /// Any negative value maps to [`Probability::INAPPLICABLE`]; values above
    /// 100 saturate.
    pub const fn from_raw(raw: i8) -> Self {
        if raw < 0 {
            Self::INAPPLICABLE
        } else if raw > 100 {
            Self::CERTAIN
        } else {
            Self(raw)
        }
    }

    /// Raw signed value (`-1` or `0..=100`)
    pub const fn raw(self) -> i8 {
        self.0
    }

    /// Percentage, or `None` for the inapplicable sentinel
    pub const fn percent(self) -> Option<u8> {
        if self.0 < 0 {
            None
        } else {
            Some(self.0 as u8)
        }
    }

    pub const fn is_inapplicable(self) -> bool {
        self.0 < 0
    }

    /// Probability as a ratio in `0.0..=1.0` for path weighting
    pub fn as_ratio(self) -> Option<f64> {
        self.percent().map(|p| f64::from(p) / 100.0)
    }
}

impl From<Probability> for i8 {
    fn from(p: Probability) -> Self {
        p.0
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent() {
            Some(p) => write!(f, "{}%", p),
            None => write!(f, "inapplicable"),
        }
    }
}

/// Function computing the probability of one edge instance
///
/// Receives the source and target endpoints. Calculators must be total and
/// side-effect free: they may read attributes of either endpoint and inspect
/// the source's outgoing edges, and must treat anything absent as unset.
pub type ProbabilityCalculator =
    Arc<dyn Fn(&dyn GraphObject, &dyn GraphObject) -> Probability + Send + Sync>;

/// Wrap a closure as a [`ProbabilityCalculator`]
pub fn calculator<F>(f: F) -> ProbabilityCalculator
where
    F: Fn(&dyn GraphObject, &dyn GraphObject) -> Probability + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Calculator returning the same value for every edge instance
pub fn constant(p: Probability) -> ProbabilityCalculator {
    calculator(move |_, _| p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_saturates() {
        assert_eq!(Probability::new(0), Probability::NEVER);
        assert_eq!(Probability::new(100), Probability::CERTAIN);
        assert_eq!(Probability::new(250), Probability::CERTAIN);
    }

    #[test]
    fn test_from_raw_collapses_negatives() {
        assert_eq!(Probability::from_raw(-1), Probability::INAPPLICABLE);
        assert_eq!(Probability::from_raw(i8::MIN), Probability::INAPPLICABLE);
        assert_eq!(Probability::from_raw(127), Probability::CERTAIN);
        assert_eq!(Probability::from_raw(30).raw(), 30);
    }

    #[test]
    fn test_three_way_distinction() {
        // Zero is a real edge, inapplicable is not
        assert_ne!(Probability::NEVER, Probability::INAPPLICABLE);
        assert_eq!(Probability::NEVER.percent(), Some(0));
        assert_eq!(Probability::INAPPLICABLE.percent(), None);
        assert!(!Probability::NEVER.is_inapplicable());
        assert!(Probability::INAPPLICABLE.is_inapplicable());
    }

    #[test]
    fn test_ordering() {
        assert!(Probability::INAPPLICABLE < Probability::NEVER);
        assert!(Probability::NEVER < Probability::new(5));
        assert!(Probability::new(50) < Probability::CERTAIN);
    }

    #[test]
    fn test_ratio_and_display() {
        assert_eq!(Probability::new(30).as_ratio(), Some(0.3));
        assert_eq!(Probability::INAPPLICABLE.as_ratio(), None);
        assert_eq!(Probability::new(30).to_string(), "30%");
        assert_eq!(Probability::INAPPLICABLE.to_string(), "inapplicable");
        assert_eq!(i8::from(Probability::INAPPLICABLE), -1);
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Probability::new(50)).unwrap();
        assert_eq!(json, "50");
        let json = serde_json::to_string(&Probability::INAPPLICABLE).unwrap();
        assert_eq!(json, "-1");
    }
}
