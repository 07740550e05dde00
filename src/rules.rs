use std::fmt;

use tracing::debug;

use crate::activation::{Activation, ActivationMethod};
use crate::antecedent::Antecedent;
use crate::consequent::Consequent;
use crate::dsl::Notation;
use crate::error::{FuzzyError, Result};
use crate::inputs::Inputs;
use crate::math::is_gt;
use crate::ops::{SNorm, TNorm};
use crate::outputs::Outputs;
use crate::terms::parse_real;
use crate::variable::Variables;

pub const IF: &str = "if";
pub const IS: &str = "is";
pub const THEN: &str = "then";
pub const AND: &str = "and";
pub const OR: &str = "or";
pub const WITH: &str = "with";

/// Everything a rule reads and writes during one evaluation cycle
pub struct Cycle<'a> {
    pub variables: &'a Variables,
    pub inputs: &'a Inputs,
    pub outputs: &'a mut Outputs,
}

impl<'a> Cycle<'a> {
    pub fn new(variables: &'a Variables, inputs: &'a Inputs, outputs: &'a mut Outputs) -> Self {
        Self {
            variables,
            inputs,
            outputs,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    text: String,
    weight: f64,
    enabled: bool,
    activation_degree: f64,
    triggered: bool,
    antecedent: Antecedent,
    consequent: Consequent,
}

impl Rule {
    /// Parses and loads `text`, e.g. `if service is good then tip is high with 0.5`
    pub fn parse(text: &str, vars: &Variables) -> Result<Self> {
        let mut rule = Self::unloaded(text)?;

        rule.load(vars)?;

        Ok(rule)
    }

    /// Splits `text` into its parts without resolving any variable
    pub fn unloaded(text: &str) -> Result<Self> {
        let (antecedent, consequent, weight) = split(text)?;

        Ok(Self {
            text: text.trim().to_owned(),
            weight,
            enabled: true,
            activation_degree: 0.0,
            triggered: false,
            antecedent: Antecedent::new(antecedent),
            consequent: Consequent::new(consequent),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn antecedent(&self) -> &Antecedent {
        &self.antecedent
    }

    pub fn consequent(&self) -> &Consequent {
        &self.consequent
    }

    /// Degree computed by the last call to `activate_with`
    pub fn activation_degree(&self) -> f64 {
        self.activation_degree
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    pub fn is_loaded(&self) -> bool {
        self.antecedent.is_loaded() && self.consequent.is_loaded()
    }

    /// Resolves antecedent and consequent against `vars`. Either both end up
    /// loaded or neither does.
    pub fn load(&mut self, vars: &Variables) -> Result<()> {
        let loaded = self.antecedent.load(vars).and_then(|()| self.consequent.load(vars));

        if loaded.is_err() {
            self.unload();
        }

        loaded
    }

    pub fn unload(&mut self) {
        self.deactivate();
        self.antecedent.unload();
        self.consequent.unload();
    }

    pub fn deactivate(&mut self) {
        self.activation_degree = 0.0;
        self.triggered = false;
    }

    /// Computes and stores the weighted degree of the antecedent
    pub fn activate_with(&mut self, conjunction: Option<TNorm>, disjunction: Option<SNorm>, cycle: &Cycle) -> Result<f64> {
        if !self.is_loaded() {
            return Err(FuzzyError::Invariant(format!("rule <{}> is not loaded", self.text)));
        }

        self.activation_degree = self.weight * self.antecedent.activation_degree(conjunction, disjunction, cycle)?;

        Ok(self.activation_degree)
    }

    /// Fires the consequent with the stored degree, if the rule is enabled and
    /// the degree is above zero
    pub fn trigger(&mut self, implication: Option<TNorm>, cycle: &mut Cycle) -> Result<()> {
        if !self.is_loaded() {
            return Err(FuzzyError::Invariant(format!("rule <{}> is not loaded", self.text)));
        }

        if self.enabled && is_gt(self.activation_degree, 0.0) {
            debug!(rule = self.text.as_str(), degree = self.activation_degree, "triggering rule");
            self.consequent.modify(self.activation_degree, implication, cycle)?;
            self.triggered = true;
        }

        Ok(())
    }

    /// Renders the loaded rule back to text. The antecedent is fully
    /// parenthesized.
    pub fn display<'a>(&'a self, vars: &'a Variables) -> RuleDisplay<'a> {
        RuleDisplay { rule: self, vars }
    }
}

pub struct RuleDisplay<'a> {
    rule: &'a Rule,
    vars: &'a Variables,
}

impl fmt::Display for RuleDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = self.rule;

        match rule.antecedent.display(self.vars, Notation::Infix) {
            Some(antecedent) => write!(f, "{IF} {antecedent}")?,
            None => write!(f, "{IF} {}", rule.antecedent.text())?,
        }
        if rule.consequent.is_loaded() {
            write!(f, " {THEN} {}", rule.consequent.display(self.vars))?;
        } else {
            write!(f, " {THEN} {}", rule.consequent.text())?;
        }
        if rule.weight != 1.0 {
            write!(f, " {WITH} {}", rule.weight)?;
        }

        Ok(())
    }
}

/// Splits `if <antecedent> then <consequent> [with <weight>]`
fn split(text: &str) -> Result<(String, String, f64)> {
    #[derive(PartialEq)]
    enum Part {
        None,
        If,
        Then,
        With,
        End,
    }

    let mut part = Part::None;
    let mut antecedent = Vec::new();
    let mut consequent = Vec::new();
    let mut weight = None;

    for token in text.split_whitespace() {
        match part {
            Part::None => {
                if token != IF {
                    return Err(FuzzyError::syntax_at(
                        format!("expected keyword <{IF}>, but found <{token}>"),
                        token,
                    ));
                }
                part = Part::If;
            },
            Part::If => {
                if token == THEN {
                    part = Part::Then;
                } else {
                    antecedent.push(token);
                }
            },
            Part::Then => {
                if token == WITH {
                    part = Part::With;
                } else {
                    consequent.push(token);
                }
            },
            Part::With => {
                weight = Some(parse_real(token).map_err(|_| {
                    FuzzyError::syntax_at(format!("expected a numeric weight, but found <{token}>"), token)
                })?);
                part = Part::End;
            },
            Part::End => {
                return Err(FuzzyError::syntax_at(format!("unexpected token <{token}>"), token));
            },
        }
    }

    match part {
        Part::None => return Err(FuzzyError::syntax(format!("keyword <{IF}> not found in rule <{text}>"))),
        Part::If => return Err(FuzzyError::syntax(format!("keyword <{THEN}> not found in rule <{text}>"))),
        Part::With => return Err(FuzzyError::syntax(format!("expected a numeric weight in rule <{text}>"))),
        Part::Then | Part::End => {},
    }

    if antecedent.is_empty() {
        return Err(FuzzyError::syntax(format!("antecedent not found in rule <{text}>")));
    }
    if consequent.is_empty() {
        return Err(FuzzyError::syntax(format!("consequent not found in rule <{text}>")));
    }

    Ok((antecedent.join(" "), consequent.join(" "), weight.unwrap_or(1.0)))
}

/// An ordered set of rules sharing operators and an activation method
#[derive(Clone, Debug)]
pub struct RuleBlock {
    name: String,
    enabled: bool,
    rules: Vec<Rule>,
    conjunction: Option<TNorm>,
    disjunction: Option<SNorm>,
    implication: Option<TNorm>,
    activation: Activation,
}

impl Default for RuleBlock {
    fn default() -> Self {
        Self::new("")
    }
}

impl RuleBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            rules: Vec::new(),
            conjunction: None,
            disjunction: None,
            implication: None,
            activation: Activation::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule_mut(&mut self, index: usize) -> Option<&mut Rule> {
        self.rules.get_mut(index)
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Parses `text` and appends the resulting rule
    pub fn add(&mut self, text: &str, vars: &Variables) -> Result<()> {
        self.rules.push(Rule::parse(text, vars)?);
        Ok(())
    }

    pub fn conjunction(&self) -> Option<TNorm> {
        self.conjunction
    }

    pub fn disjunction(&self) -> Option<SNorm> {
        self.disjunction
    }

    pub fn implication(&self) -> Option<TNorm> {
        self.implication
    }

    pub fn set_conjunction(&mut self, conjunction: Option<TNorm>) {
        self.conjunction = conjunction;
    }

    pub fn set_disjunction(&mut self, disjunction: Option<SNorm>) {
        self.disjunction = disjunction;
    }

    pub fn set_implication(&mut self, implication: Option<TNorm>) {
        self.implication = implication;
    }

    pub fn set_conjunction_named(&mut self, name: &str) -> Result<()> {
        self.conjunction = TNorm::from_name(name)?;
        Ok(())
    }

    pub fn set_disjunction_named(&mut self, name: &str) -> Result<()> {
        self.disjunction = SNorm::from_name(name)?;
        Ok(())
    }

    pub fn set_implication_named(&mut self, name: &str) -> Result<()> {
        self.implication = TNorm::from_name(name)?;
        Ok(())
    }

    pub fn activation(&self) -> &Activation {
        &self.activation
    }

    pub fn set_activation(&mut self, activation: Activation) {
        self.activation = activation;
    }

    /// Reloads every rule against `vars`. All rules are attempted; the first
    /// failure is returned.
    pub fn load_rules(&mut self, vars: &Variables) -> Result<()> {
        let mut first_error = None;

        for rule in &mut self.rules {
            if let Err(err) = rule.load(vars) {
                debug!(rule = rule.text(), error = %err, "unable to load rule");
                first_error.get_or_insert(err);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    pub fn unload_rules(&mut self) {
        for rule in &mut self.rules {
            rule.unload();
        }
    }

    /// Runs the activation method over the rules. A disabled block does nothing.
    pub fn activate(&mut self, cycle: &mut Cycle) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        debug!(
            block = self.name.as_str(),
            activation = self.activation.name(),
            parameters = %self.activation.parameters(),
            "activating rule block"
        );

        let operators = Operators {
            conjunction: self.conjunction,
            disjunction: self.disjunction,
            implication: self.implication,
        };

        self.activation.activate(&mut self.rules, operators, cycle)
    }
}

/// The operator slots of a rule block, as handed to an activation method
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Operators {
    pub conjunction: Option<TNorm>,
    pub disjunction: Option<SNorm>,
    pub implication: Option<TNorm>,
}
