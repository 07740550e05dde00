//! Activation methods decide which rules of a block fire, and in what order.
//!
//! Every method resets each rule it visits, computes its degree and then
//! decides whether to trigger it. Rules are never reordered.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{FuzzyError, Result};
use crate::math::{is_eq, is_ge, is_gt, is_le, is_lt};
use crate::rules::{Cycle, Operators, Rule};
use crate::terms::parse_real;

pub trait ActivationMethod {
    fn name(&self) -> &'static str;

    /// Space separated parameters, in the layout `configure` accepts
    fn parameters(&self) -> String;

    /// Reconfigures from a space separated parameter list. An empty string
    /// leaves the current configuration untouched.
    fn configure(&mut self, parameters: &str) -> Result<()>;

    fn activate(&self, rules: &mut [Rule], operators: Operators, cycle: &mut Cycle) -> Result<()>;
}

/// Splits `parameters` and checks that at least `required` values are present
fn positional<'p>(method: &str, parameters: &'p str, required: usize) -> Result<Vec<&'p str>> {
    let values: Vec<&str> = parameters.split_whitespace().collect();

    if values.len() < required {
        return Err(FuzzyError::Configuration(format!(
            "activation {method} requires {required} parameters"
        )));
    }

    Ok(values)
}

fn parse_count(method: &str, token: &str) -> Result<usize> {
    token.parse().map_err(|_| {
        FuzzyError::Configuration(format!(
            "activation {method} expects a number of rules, but found <{token}>"
        ))
    })
}

/// Resets, evaluates and possibly triggers `rule`. `fire` decides from the
/// computed degree; it is only asked for loaded rules.
fn visit(
    rule: &mut Rule,
    operators: Operators,
    cycle: &mut Cycle,
    fire: impl FnOnce(f64) -> bool,
) -> Result<bool> {
    rule.deactivate();

    if !rule.is_loaded() {
        return Ok(false);
    }

    let degree = rule.activate_with(operators.conjunction, operators.disjunction, cycle)?;

    if fire(degree) {
        rule.trigger(operators.implication, cycle)?;
        return Ok(true);
    }

    Ok(false)
}

/// Fires every loaded rule, in insertion order
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct General;

impl ActivationMethod for General {
    fn name(&self) -> &'static str {
        "General"
    }

    fn parameters(&self) -> String {
        String::new()
    }

    fn configure(&mut self, _parameters: &str) -> Result<()> {
        Ok(())
    }

    fn activate(&self, rules: &mut [Rule], operators: Operators, cycle: &mut Cycle) -> Result<()> {
        for rule in rules.iter_mut() {
            visit(rule, operators, cycle, |_| true)?;
        }

        Ok(())
    }
}

/// Fires the first `rules` rules, in insertion order, whose degree is above
/// zero and at least `threshold`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct First {
    pub rules: usize,
    pub threshold: f64,
}

impl Default for First {
    fn default() -> Self {
        Self {
            rules: 1,
            threshold: 0.0,
        }
    }
}

impl ActivationMethod for First {
    fn name(&self) -> &'static str {
        "First"
    }

    fn parameters(&self) -> String {
        format!("{} {}", self.rules, self.threshold)
    }

    fn configure(&mut self, parameters: &str) -> Result<()> {
        if parameters.trim().is_empty() {
            return Ok(());
        }

        let values = positional(self.name(), parameters, 2)?;

        self.rules = parse_count(self.name(), values[0])?;
        self.threshold = parse_real(values[1])?;

        Ok(())
    }

    fn activate(&self, rules: &mut [Rule], operators: Operators, cycle: &mut Cycle) -> Result<()> {
        let mut activated = 0;

        for rule in rules.iter_mut() {
            let fire = |degree: f64| activated < self.rules && is_gt(degree, 0.0) && is_ge(degree, self.threshold);

            if visit(rule, operators, cycle, fire)? {
                activated += 1;
            }
        }

        Ok(())
    }
}

/// Fires the last `rules` rules whose degree is above zero and at least
/// `threshold`. Rules are visited from the last one added to the first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Last {
    pub rules: usize,
    pub threshold: f64,
}

impl Default for Last {
    fn default() -> Self {
        Self {
            rules: 1,
            threshold: 0.0,
        }
    }
}

impl ActivationMethod for Last {
    fn name(&self) -> &'static str {
        "Last"
    }

    fn parameters(&self) -> String {
        format!("{} {}", self.rules, self.threshold)
    }

    fn configure(&mut self, parameters: &str) -> Result<()> {
        if parameters.trim().is_empty() {
            return Ok(());
        }

        let values = positional(self.name(), parameters, 2)?;

        self.rules = parse_count(self.name(), values[0])?;
        self.threshold = parse_real(values[1])?;

        Ok(())
    }

    fn activate(&self, rules: &mut [Rule], operators: Operators, cycle: &mut Cycle) -> Result<()> {
        let mut activated = 0;

        // Every loaded rule is evaluated, even once the quota is used up
        for rule in rules.iter_mut().rev() {
            let fire = |degree: f64| activated < self.rules && is_gt(degree, 0.0) && is_ge(degree, self.threshold);

            if visit(rule, operators, cycle, fire)? {
                activated += 1;
            }
        }

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    EqualTo,
    NotEqualTo,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::EqualTo => "==",
            Self::NotEqualTo => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEqualTo => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqualTo => ">=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(Self::EqualTo),
            "!=" => Some(Self::NotEqualTo),
            "<" => Some(Self::LessThan),
            "<=" => Some(Self::LessThanOrEqualTo),
            ">" => Some(Self::GreaterThan),
            ">=" => Some(Self::GreaterThanOrEqualTo),
            _ => None,
        }
    }

    pub fn holds(self, a: f64, b: f64) -> bool {
        match self {
            Self::EqualTo => is_eq(a, b),
            Self::NotEqualTo => !is_eq(a, b),
            Self::LessThan => is_lt(a, b),
            Self::LessThanOrEqualTo => is_le(a, b),
            Self::GreaterThan => is_gt(a, b),
            Self::GreaterThanOrEqualTo => is_ge(a, b),
        }
    }
}

/// Fires every rule, in insertion order, whose degree satisfies
/// `comparison` against `value`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Threshold {
    pub comparison: Comparison,
    pub value: f64,
}

impl Default for Threshold {
    fn default() -> Self {
        Self {
            comparison: Comparison::GreaterThan,
            value: 0.0,
        }
    }
}

impl ActivationMethod for Threshold {
    fn name(&self) -> &'static str {
        "Threshold"
    }

    fn parameters(&self) -> String {
        format!("{} {}", self.comparison.symbol(), self.value)
    }

    fn configure(&mut self, parameters: &str) -> Result<()> {
        if parameters.trim().is_empty() {
            return Ok(());
        }

        let values = positional(self.name(), parameters, 2)?;

        self.comparison = Comparison::from_symbol(values[0]).ok_or_else(|| {
            FuzzyError::Configuration(format!("unknown comparison <{}>", values[0]))
        })?;
        self.value = parse_real(values[1])?;

        Ok(())
    }

    fn activate(&self, rules: &mut [Rule], operators: Operators, cycle: &mut Cycle) -> Result<()> {
        for rule in rules.iter_mut() {
            visit(rule, operators, cycle, |degree| self.comparison.holds(degree, self.value))?;
        }

        Ok(())
    }
}

/// The activation method held by a rule block
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Activation {
    General(General),
    First(First),
    Last(Last),
    Threshold(Threshold),
}

impl Default for Activation {
    fn default() -> Self {
        Self::General(General)
    }
}

impl Activation {
    /// Builds a registered activation method and configures it with `parameters`
    pub fn from_name(name: &str, parameters: &str) -> Result<Self> {
        let build = ACTIVATIONS
            .get(name)
            .ok_or_else(|| FuzzyError::Configuration(format!("activation <{name}> is not registered")))?;
        let mut activation = build();

        activation.configure(parameters)?;

        Ok(activation)
    }

    fn method(&self) -> &dyn ActivationMethod {
        match self {
            Self::General(m) => m,
            Self::First(m) => m,
            Self::Last(m) => m,
            Self::Threshold(m) => m,
        }
    }

    fn method_mut(&mut self) -> &mut dyn ActivationMethod {
        match self {
            Self::General(m) => m,
            Self::First(m) => m,
            Self::Last(m) => m,
            Self::Threshold(m) => m,
        }
    }
}

impl ActivationMethod for Activation {
    fn name(&self) -> &'static str {
        self.method().name()
    }

    fn parameters(&self) -> String {
        self.method().parameters()
    }

    fn configure(&mut self, parameters: &str) -> Result<()> {
        self.method_mut().configure(parameters)
    }

    fn activate(&self, rules: &mut [Rule], operators: Operators, cycle: &mut Cycle) -> Result<()> {
        self.method().activate(rules, operators, cycle)
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parameters = self.parameters();

        if parameters.is_empty() {
            f.write_str(self.name())
        } else {
            write!(f, "{} {}", self.name(), parameters)
        }
    }
}

static ACTIVATIONS: Lazy<HashMap<&'static str, fn() -> Activation>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, fn() -> Activation> = HashMap::with_capacity(4);

    map.insert("General", || Activation::General(General));
    map.insert("First", || Activation::First(First::default()));
    map.insert("Last", || Activation::Last(Last::default()));
    map.insert("Threshold", || Activation::Threshold(Threshold::default()));
    map
});
