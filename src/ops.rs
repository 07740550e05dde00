use std::collections::HashMap;
use std::fmt;

use num::Float;
use once_cell::sync::Lazy;

use crate::error::{FuzzyError, Result};
use crate::math::{is_eq, is_gt, is_lt};

/// Triangular norm. Used for the conjunction and implication operators
/// of a rule block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TNorm {
    AlgebraicProduct,
    BoundedDifference,
    DrasticProduct,
    EinsteinProduct,
    HamacherProduct,
    Minimum,
    NilpotentMinimum,
}

impl TNorm {
    pub const ALL: [TNorm; 7] = [
        Self::AlgebraicProduct,
        Self::BoundedDifference,
        Self::DrasticProduct,
        Self::EinsteinProduct,
        Self::HamacherProduct,
        Self::Minimum,
        Self::NilpotentMinimum,
    ];

    pub fn compute<F: Float>(self, a: F, b: F) -> F {
        let one = F::one();
        let two = one + one;

        match self {
            Self::AlgebraicProduct => a * b,
            Self::BoundedDifference => F::max(F::zero(), a + b - one),
            Self::DrasticProduct => {
                if is_eq(F::max(a, b), one) {
                    F::min(a, b)
                } else {
                    F::zero()
                }
            },
            Self::EinsteinProduct => (a * b) / (two - (a + b - a * b)),
            Self::HamacherProduct => {
                if is_eq(a + b, F::zero()) {
                    F::zero()
                } else {
                    (a * b) / (a + b - a * b)
                }
            },
            Self::Minimum => F::min(a, b),
            Self::NilpotentMinimum => {
                if is_gt(a + b, one) {
                    F::min(a, b)
                } else {
                    F::zero()
                }
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::AlgebraicProduct => "AlgebraicProduct",
            Self::BoundedDifference => "BoundedDifference",
            Self::DrasticProduct => "DrasticProduct",
            Self::EinsteinProduct => "EinsteinProduct",
            Self::HamacherProduct => "HamacherProduct",
            Self::Minimum => "Minimum",
            Self::NilpotentMinimum => "NilpotentMinimum",
        }
    }

    /// Looks up a t-norm by name. The empty name means "no operator".
    pub fn from_name(name: &str) -> Result<Option<Self>> {
        lookup(&T_NORMS, "t-norm", name)
    }
}

/// Triangular conorm. Used for the disjunction operator of a rule block and
/// the aggregation operator of an output variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SNorm {
    AlgebraicSum,
    BoundedSum,
    DrasticSum,
    EinsteinSum,
    HamacherSum,
    Maximum,
    NilpotentMaximum,
    NormalizedSum,
    UnboundedSum,
}

impl SNorm {
    pub const ALL: [SNorm; 9] = [
        Self::AlgebraicSum,
        Self::BoundedSum,
        Self::DrasticSum,
        Self::EinsteinSum,
        Self::HamacherSum,
        Self::Maximum,
        Self::NilpotentMaximum,
        Self::NormalizedSum,
        Self::UnboundedSum,
    ];

    pub fn compute<F: Float>(self, a: F, b: F) -> F {
        let one = F::one();
        let two = one + one;

        match self {
            Self::AlgebraicSum => a + b - a * b,
            Self::BoundedSum => F::min(one, a + b),
            Self::DrasticSum => {
                if is_eq(F::min(a, b), F::zero()) {
                    F::max(a, b)
                } else {
                    one
                }
            },
            Self::EinsteinSum => (a + b) / (one + a * b),
            Self::HamacherSum => {
                if is_eq(a * b, one) {
                    one
                } else {
                    (a + b - two * a * b) / (one - a * b)
                }
            },
            Self::Maximum => F::max(a, b),
            Self::NilpotentMaximum => {
                if is_lt(a + b, one) {
                    F::max(a, b)
                } else {
                    one
                }
            },
            Self::NormalizedSum => (a + b) / F::max(one, a + b),
            Self::UnboundedSum => a + b,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::AlgebraicSum => "AlgebraicSum",
            Self::BoundedSum => "BoundedSum",
            Self::DrasticSum => "DrasticSum",
            Self::EinsteinSum => "EinsteinSum",
            Self::HamacherSum => "HamacherSum",
            Self::Maximum => "Maximum",
            Self::NilpotentMaximum => "NilpotentMaximum",
            Self::NormalizedSum => "NormalizedSum",
            Self::UnboundedSum => "UnboundedSum",
        }
    }

    /// Looks up an s-norm by name. The empty name means "no operator".
    pub fn from_name(name: &str) -> Result<Option<Self>> {
        lookup(&S_NORMS, "s-norm", name)
    }
}

impl fmt::Display for TNorm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for SNorm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static T_NORMS: Lazy<HashMap<&'static str, TNorm>> =
    Lazy::new(|| TNorm::ALL.into_iter().map(|norm| (norm.name(), norm)).collect());

static S_NORMS: Lazy<HashMap<&'static str, SNorm>> =
    Lazy::new(|| SNorm::ALL.into_iter().map(|norm| (norm.name(), norm)).collect());

fn lookup<N: Copy>(registry: &HashMap<&'static str, N>, kind: &str, name: &str) -> Result<Option<N>> {
    let name = name.trim();

    if name.is_empty() {
        return Ok(None);
    }

    registry
        .get(name)
        .copied()
        .map(Some)
        .ok_or_else(|| FuzzyError::Configuration(format!("{kind} <{name}> is not registered")))
}

#[test]
fn test_t_norms() {
    let (a, b) = (0.6f64, 0.4f64);

    assert_eq!(TNorm::Minimum.compute(a, b), 0.4);
    assert!((TNorm::AlgebraicProduct.compute(a, b) - 0.24).abs() < 1e-12);
    assert_eq!(TNorm::BoundedDifference.compute(a, b), 0.0);
    assert_eq!(TNorm::BoundedDifference.compute(0.7, 0.6), 0.7 + 0.6 - 1.0);
    assert_eq!(TNorm::DrasticProduct.compute(1.0, 0.3), 0.3);
    assert_eq!(TNorm::DrasticProduct.compute(a, b), 0.0);
    assert!((TNorm::EinsteinProduct.compute(a, b) - 0.24 / 1.24).abs() < 1e-12);
    assert!((TNorm::HamacherProduct.compute(a, b) - 0.24 / 0.76).abs() < 1e-12);
    assert_eq!(TNorm::HamacherProduct.compute(0.0, 0.0), 0.0);
    assert_eq!(TNorm::NilpotentMinimum.compute(0.7, 0.6), 0.6);
    assert_eq!(TNorm::NilpotentMinimum.compute(a, b), 0.0);

    // f32 works the same way
    assert_eq!(TNorm::Minimum.compute(0.6f32, 0.4f32), 0.4f32);
}

#[test]
fn test_s_norms() {
    let (a, b) = (0.6f64, 0.4f64);

    assert_eq!(SNorm::Maximum.compute(a, b), 0.6);
    assert!((SNorm::AlgebraicSum.compute(a, b) - 0.76).abs() < 1e-12);
    assert_eq!(SNorm::BoundedSum.compute(a, b), 1.0);
    assert_eq!(SNorm::DrasticSum.compute(0.0, 0.3), 0.3);
    assert_eq!(SNorm::DrasticSum.compute(a, b), 1.0);
    assert!((SNorm::EinsteinSum.compute(a, b) - 1.0 / 1.24).abs() < 1e-12);
    assert_eq!(SNorm::HamacherSum.compute(1.0, 1.0), 1.0);
    assert_eq!(SNorm::NilpotentMaximum.compute(0.2, 0.3), 0.3);
    assert_eq!(SNorm::NilpotentMaximum.compute(a, b), 1.0);
    assert_eq!(SNorm::NormalizedSum.compute(0.2, 0.3), 0.5);
    assert_eq!(SNorm::NormalizedSum.compute(0.8, 0.7), 1.0);
    assert!((SNorm::UnboundedSum.compute(0.8, 0.7) - 1.5).abs() < 1e-12);
}

#[test]
fn test_norm_registry() {
    assert_eq!(TNorm::from_name("Minimum"), Ok(Some(TNorm::Minimum)));
    assert_eq!(SNorm::from_name(" Maximum "), Ok(Some(SNorm::Maximum)));
    assert_eq!(TNorm::from_name(""), Ok(None));

    for norm in TNorm::ALL {
        assert_eq!(TNorm::from_name(&norm.to_string()), Ok(Some(norm)));
    }
    for norm in SNorm::ALL {
        assert_eq!(SNorm::from_name(norm.name()), Ok(Some(norm)));
    }

    assert!(matches!(
        TNorm::from_name("Maximum"),
        Err(FuzzyError::Configuration(_))
    ));
}
