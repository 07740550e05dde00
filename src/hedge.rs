use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::math::is_le;

/// A linguistic modifier over a membership degree, e.g. "very" or "somewhat".
///
/// Hedges are stateless, so a proposition simply stores them by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hedge {
    /// Ignores its input and returns `1.0`. Written in place of a term:
    /// `if service is any then ...`
    Any,
    Extremely,
    Not,
    Seldom,
    Somewhat,
    Very,
}

impl Hedge {
    pub const ALL: [Hedge; 6] = [
        Self::Any,
        Self::Extremely,
        Self::Not,
        Self::Seldom,
        Self::Somewhat,
        Self::Very,
    ];

    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Any => 1.0,
            Self::Extremely => {
                if is_le(x, 0.5) {
                    2.0 * x * x
                } else {
                    1.0 - 2.0 * (1.0 - x) * (1.0 - x)
                }
            },
            Self::Not => 1.0 - x,
            Self::Seldom => {
                if is_le(x, 0.5) {
                    (x / 2.0).sqrt()
                } else {
                    1.0 - ((1.0 - x) / 2.0).sqrt()
                }
            },
            Self::Somewhat => x.sqrt(),
            Self::Very => x * x,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Extremely => "extremely",
            Self::Not => "not",
            Self::Seldom => "seldom",
            Self::Somewhat => "somewhat",
            Self::Very => "very",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        HEDGES.get(name).copied()
    }

    pub fn is_any(self) -> bool {
        self == Self::Any
    }
}

impl fmt::Display for Hedge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static HEDGES: Lazy<HashMap<&'static str, Hedge>> =
    Lazy::new(|| Hedge::ALL.into_iter().map(|hedge| (hedge.name(), hedge)).collect());

/// Applies a hedge chain to `x`.
///
/// `hedges` is in the order the hedges were written: the first one sits next
/// to `is`, the last one next to the term. The hedge nearest the term is
/// applied first, so `[h1, h2, h3]` yields `h1(h2(h3(x)))`.
pub fn fold_hedges(hedges: &[Hedge], x: f64) -> f64 {
    hedges.iter().rev().fold(x, |degree, hedge| hedge.apply(degree))
}

#[test]
fn test_hedge_formulas() {
    assert_eq!(Hedge::Any.apply(0.3), 1.0);
    assert_eq!(Hedge::Any.apply(f64::NAN), 1.0);
    assert_eq!(Hedge::Not.apply(0.25), 0.75);
    assert_eq!(Hedge::Very.apply(0.5), 0.25);
    assert_eq!(Hedge::Somewhat.apply(0.25), 0.5);
    assert_eq!(Hedge::Extremely.apply(0.5), 0.5);
    assert_eq!(Hedge::Extremely.apply(0.25), 0.125);
    assert_eq!(Hedge::Extremely.apply(0.75), 0.875);
    assert_eq!(Hedge::Seldom.apply(0.5), 0.5);
    assert!((Hedge::Seldom.apply(0.08) - 0.2).abs() < 1e-12);
    assert!((Hedge::Seldom.apply(0.92) - 0.8).abs() < 1e-12);
    assert!(Hedge::Very.apply(f64::NAN).is_nan());
    assert!(Hedge::Extremely.apply(f64::NAN).is_nan());
}

#[test]
fn test_hedge_registry() {
    for hedge in Hedge::ALL {
        assert_eq!(Hedge::from_name(&hedge.to_string()), Some(hedge));
    }

    assert_eq!(Hedge::from_name("Very"), None);
    assert_eq!(Hedge::from_name("rather"), None);
}

#[test]
fn test_fold_order() {
    // "not very": very first, then not
    assert_eq!(fold_hedges(&[Hedge::Not, Hedge::Very], 0.5), 0.75);
    // "very not": not first, then very
    assert_eq!(fold_hedges(&[Hedge::Very, Hedge::Not], 0.5), 0.25);
    assert!((fold_hedges(&[Hedge::Very, Hedge::Not], 0.2) - 0.64).abs() < 1e-12);
    assert_eq!(fold_hedges(&[], 0.4), 0.4);
}
