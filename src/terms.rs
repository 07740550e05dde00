use std::fmt;

use crate::error::{FuzzyError, Result};
use crate::math::{interp, is_eq};

/// Index of a term within the variable that declares it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermKey(pub(crate) usize);

/// Shape of a membership function
#[derive(Clone, Debug, PartialEq)]
pub enum Membership {
    /// Piecewise linear through `(x, degree)` coordinates sorted by `x`
    Points(Vec<(f64, f64)>),
    Triangle { a: f64, b: f64, c: f64 },
    /// Edge at `start`, rising towards `direction`
    Binary { start: f64, direction: f64 },
    Constant(f64),
}

impl Membership {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Points(_) => "Points",
            Self::Triangle { .. } => "Triangle",
            Self::Binary { .. } => "Binary",
            Self::Constant(_) => "Constant",
        }
    }

    pub fn membership(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }

        match *self {
            Self::Points(ref coords) => interp(x, coords),
            Self::Triangle { a, b, c } => {
                if x < a || x > c {
                    0.0
                } else if is_eq(x, b) {
                    1.0
                } else if x < b {
                    if a == f64::NEG_INFINITY {
                        1.0
                    } else {
                        (x - a) / (b - a)
                    }
                } else if c == f64::INFINITY {
                    1.0
                } else {
                    (c - x) / (c - b)
                }
            },
            Self::Binary { start, direction } => {
                if direction > start && x >= start {
                    1.0
                } else if direction < start && x <= start {
                    1.0
                } else {
                    0.0
                }
            },
            Self::Constant(value) => value,
        }
    }

    pub fn parameters(&self) -> String {
        match self {
            Self::Points(coords) => coords
                .iter()
                .map(|(x, y)| format!("{x} {y}"))
                .collect::<Vec<_>>()
                .join(" "),
            Self::Triangle { a, b, c } => format!("{a} {b} {c}"),
            Self::Binary { start, direction } => format!("{start} {direction}"),
            Self::Constant(value) => value.to_string(),
        }
    }

    /// Replaces the parameters of this shape from a space separated list,
    /// in the same layout `parameters` produces. An empty string is a no-op.
    pub fn configure(&mut self, parameters: &str) -> Result<()> {
        if parameters.trim().is_empty() {
            return Ok(());
        }

        let name = self.name();
        let values = parse_values(parameters)?;
        let require = |n: usize| {
            if values.len() < n {
                Err(FuzzyError::Configuration(format!(
                    "term <{name}> requires <{n}> parameters"
                )))
            } else {
                Ok(())
            }
        };

        match self {
            Self::Points(coords) => {
                if values.len() % 2 != 0 {
                    return Err(FuzzyError::Configuration(format!(
                        "term <{name}> requires an even number of parameters"
                    )));
                }
                *coords = values.chunks(2).map(|pair| (pair[0], pair[1])).collect();
            },
            Self::Triangle { a, b, c } => {
                require(3)?;
                (*a, *b, *c) = (values[0], values[1], values[2]);
            },
            Self::Binary { start, direction } => {
                require(2)?;
                (*start, *direction) = (values[0], values[1]);
            },
            Self::Constant(value) => {
                require(1)?;
                *value = values[0];
            },
        }

        Ok(())
    }
}

pub(crate) fn parse_values(parameters: &str) -> Result<Vec<f64>> {
    parameters
        .split_whitespace()
        .map(parse_real)
        .collect()
}

/// Parses a real number, accepting the `nan`/`inf`/`-inf` spellings.
pub(crate) fn parse_real(token: &str) -> Result<f64> {
    match token {
        "nan" | "NaN" => Ok(f64::NAN),
        "inf" | "+inf" => Ok(f64::INFINITY),
        "-inf" => Ok(f64::NEG_INFINITY),
        _ => token
            .parse::<f64>()
            .map_err(|_| FuzzyError::Configuration(format!("<{token}> is not a real number"))),
    }
}

/// A named linguistic term of a variable
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    name: String,
    shape: Membership,
}

impl Term {
    pub fn new(name: impl Into<String>, shape: Membership) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    pub fn points(name: impl Into<String>, coords: &[(f64, f64)]) -> Self {
        Self::new(name, Membership::Points(coords.to_vec()))
    }

    pub fn triangle(name: impl Into<String>, a: f64, b: f64, c: f64) -> Self {
        Self::new(name, Membership::Triangle { a, b, c })
    }

    pub fn binary(name: impl Into<String>, start: f64, direction: f64) -> Self {
        Self::new(name, Membership::Binary { start, direction })
    }

    pub fn constant(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, Membership::Constant(value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &Membership {
        &self.shape
    }

    pub fn shape_mut(&mut self) -> &mut Membership {
        &mut self.shape
    }

    pub fn membership(&self, x: f64) -> f64 {
        self.shape.membership(x)
    }

    pub fn configure(&mut self, parameters: &str) -> Result<()> {
        self.shape.configure(parameters)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "term: {} {} {}", self.name, self.shape.name(), self.shape.parameters())
    }
}

#[test]
fn test_memberships() {
    let high = Term::points("high", &[(175.0, 0.0), (180., 0.2), (185., 0.7), (190., 1.)]);

    assert_eq!(high.membership(170.), 0.);
    assert_eq!(high.membership(190.), 1.);
    assert_eq!(high.membership(200.), 1.);
    assert!((high.membership(182.5) - 0.45).abs() < 1e-12);
    assert!(high.membership(f64::NAN).is_nan());

    let tri = Term::triangle("mid", 0., 5., 10.);

    assert_eq!(tri.membership(5.), 1.);
    assert_eq!(tri.membership(2.5), 0.5);
    assert_eq!(tri.membership(7.5), 0.5);
    assert_eq!(tri.membership(11.), 0.);

    let up = Term::binary("up", 3., f64::INFINITY);
    let down = Term::binary("down", 3., f64::NEG_INFINITY);

    assert_eq!(up.membership(3.), 1.);
    assert_eq!(up.membership(2.), 0.);
    assert_eq!(down.membership(2.), 1.);
    assert_eq!(down.membership(4.), 0.);

    assert_eq!(Term::constant("k", 0.6).membership(123.), 0.6);
}

#[test]
fn test_configure() {
    let mut term = Term::triangle("mid", 0., 0., 0.);

    term.configure("1 2 3").unwrap();
    assert_eq!(term.shape(), &Membership::Triangle { a: 1., b: 2., c: 3. });
    assert_eq!(term.shape().parameters(), "1 2 3");

    assert!(matches!(term.configure("1 2"), Err(FuzzyError::Configuration(_))));
    assert!(matches!(term.configure("1 two 3"), Err(FuzzyError::Configuration(_))));

    let mut points = Term::points("p", &[]);

    points.configure("0 0 1 1").unwrap();
    assert_eq!(points.membership(0.5), 0.5);
    assert!(points.configure("0 0 1").is_err());

    let mut edge = Term::binary("edge", 0., 1.);

    edge.configure("5 -inf").unwrap();
    assert_eq!(edge.membership(4.), 1.);

    // Empty parameters leave the term untouched
    term.configure("  ").unwrap();
    assert_eq!(term.to_string(), "term: mid Triangle 1 2 3");
}
