//! The `if` part of a rule.
//!
//! Text is rewritten to postfix and scanned once, left to right. Propositions
//! are pushed on a stack and every `and`/`or` pops its two operands, so the
//! single expression left at the end is the root of the tree.

use tracing::{debug, trace};

use crate::dsl::{Connective, Expr, Notation, Proposition};
use crate::error::{FuzzyError, Result};
use crate::hedge::{fold_hedges, Hedge};
use crate::ops::{SNorm, TNorm};
use crate::postfix::to_postfix;
use crate::rules::{Cycle, IS};
use crate::variable::{VariableKind, Variables};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Variable,
    Is,
    HedgeOrTerm,
    VariableOrConnective,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Antecedent {
    text: String,
    expression: Option<Expr>,
}

impl Antecedent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            expression: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn expression(&self) -> Option<&Expr> {
        self.expression.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.expression.is_some()
    }

    pub fn unload(&mut self) {
        self.expression = None;
    }

    /// Parses the stored text against `vars`. On failure the antecedent is
    /// left unloaded.
    pub fn load(&mut self, vars: &Variables) -> Result<()> {
        self.unload();
        self.expression = Some(parse(&self.text, vars)?);

        Ok(())
    }

    /// Degree to which the antecedent holds in the current cycle
    pub fn activation_degree(&self, conjunction: Option<TNorm>, disjunction: Option<SNorm>, cycle: &Cycle) -> Result<f64> {
        let Some(expression) = &self.expression else {
            return Err(FuzzyError::Invariant(format!("antecedent <{}> is not loaded", self.text)));
        };

        self.degree_of(expression, conjunction, disjunction, cycle)
    }

    fn degree_of(
        &self,
        node: &Expr,
        conjunction: Option<TNorm>,
        disjunction: Option<SNorm>,
        cycle: &Cycle,
    ) -> Result<f64> {
        match node {
            Expr::Proposition(prop) => proposition_degree(prop, cycle),
            Expr::Operator {
                connective,
                left,
                right,
            } => match connective {
                Connective::And => {
                    let Some(conjunction) = conjunction else {
                        return Err(FuzzyError::Configuration(format!(
                            "the following rule requires a conjunction operator: {}",
                            self.text
                        )));
                    };
                    let left = self.degree_of(left, Some(conjunction), disjunction, cycle)?;
                    let right = self.degree_of(right, Some(conjunction), disjunction, cycle)?;

                    Ok(conjunction.compute(left, right))
                },
                Connective::Or => {
                    let Some(disjunction) = disjunction else {
                        return Err(FuzzyError::Configuration(format!(
                            "the following rule requires a disjunction operator: {}",
                            self.text
                        )));
                    };
                    let left = self.degree_of(left, conjunction, Some(disjunction), cycle)?;
                    let right = self.degree_of(right, conjunction, Some(disjunction), cycle)?;

                    Ok(disjunction.compute(left, right))
                },
            },
        }
    }

    pub fn display<'a>(&'a self, vars: &'a Variables, notation: Notation) -> Option<impl std::fmt::Display + 'a> {
        self.expression.as_ref().map(|expr| expr.display(vars, notation))
    }
}

fn proposition_degree(prop: &Proposition, cycle: &Cycle) -> Result<f64> {
    let Some(variable) = cycle.variables.get(prop.variable) else {
        return Err(FuzzyError::Invariant("proposition refers to an unknown variable".into()));
    };

    if !variable.is_enabled() {
        return Ok(0.0);
    }

    // `any` skips the term entirely; the hedges written before it still apply
    if let Some((Hedge::Any, rest)) = prop.hedges.split_last() {
        return Ok(fold_hedges(rest, Hedge::Any.apply(f64::NAN)));
    }

    let Some(term_key) = prop.term else {
        return Err(FuzzyError::Invariant(format!(
            "proposition on <{}> has no term",
            variable.name()
        )));
    };

    let base = match variable.kind() {
        VariableKind::Input => variable
            .term(term_key)
            .map_or(f64::NAN, |term| term.membership(cycle.inputs.value(prop.variable))),
        VariableKind::Output => cycle.outputs.activation_degree(prop.variable, term_key),
    };

    Ok(fold_hedges(&prop.hedges, base))
}

/// Builds the expression tree of `text`
pub(crate) fn parse(text: &str, vars: &Variables) -> Result<Expr> {
    debug!(antecedent = text, "parsing antecedent");

    if text.trim().is_empty() {
        return Err(FuzzyError::syntax("antecedent is empty"));
    }

    let postfix = to_postfix(text)?;

    debug!(postfix = %postfix.join(" "), "antecedent in postfix");

    let mut state = State::Variable;
    let mut stack: Vec<Expr> = Vec::new();
    let mut last = "";

    for token in postfix {
        last = token;

        match state {
            State::Variable | State::VariableOrConnective => {
                if let Some(variable) = vars.find(token) {
                    trace!(token, "variable");
                    stack.push(Expr::Proposition(Proposition {
                        variable,
                        hedges: Vec::new(),
                        term: None,
                    }));
                    state = State::Is;
                    continue;
                }

                if state == State::VariableOrConnective {
                    if let Some(connective) = Connective::from_keyword(token) {
                        if stack.len() < 2 {
                            return Err(FuzzyError::syntax_at(
                                format!(
                                    "logical operator <{token}> expects at least two operands, but found <{}>",
                                    stack.len()
                                ),
                                token,
                            ));
                        }

                        let right = stack.pop().map(Box::new);
                        let left = stack.pop().map(Box::new);
                        let (Some(left), Some(right)) = (left, right) else {
                            return Err(FuzzyError::Invariant("operand stack underflow".into()));
                        };

                        trace!(token, "connective");
                        stack.push(Expr::Operator {
                            connective,
                            left,
                            right,
                        });
                        continue;
                    }
                }

                return Err(FuzzyError::syntax_at(
                    format!("expected variable or logical operator, but found <{token}>"),
                    token,
                ));
            },
            State::Is => {
                if token == IS {
                    trace!(token, "keyword");
                    state = State::HedgeOrTerm;
                    continue;
                }

                return Err(FuzzyError::syntax_at(
                    format!("expected keyword <{IS}>, but found <{token}>"),
                    token,
                ));
            },
            State::HedgeOrTerm => {
                let Some(Expr::Proposition(prop)) = stack.last_mut() else {
                    return Err(FuzzyError::Invariant("expected a proposition on top of the stack".into()));
                };

                if let Some(hedge) = Hedge::from_name(token) {
                    trace!(token, "hedge");
                    prop.hedges.push(hedge);
                    if hedge.is_any() {
                        state = State::VariableOrConnective;
                    }
                    continue;
                }

                if let Some(term) = vars[prop.variable].find_term(token) {
                    trace!(token, "term");
                    prop.term = Some(term);
                    state = State::VariableOrConnective;
                    continue;
                }

                return Err(FuzzyError::syntax_at(
                    format!("expected hedge or term, but found <{token}>"),
                    token,
                ));
            },
        }
    }

    match state {
        State::VariableOrConnective => {},
        State::Variable => return Err(FuzzyError::syntax("expected a variable")),
        State::Is => {
            return Err(FuzzyError::syntax_at(format!("expected keyword <{IS}> after <{last}>"), last));
        },
        State::HedgeOrTerm => {
            return Err(FuzzyError::syntax_at(format!("expected hedge or term after <{last}>"), last));
        },
    }

    if stack.len() != 1 {
        let leftovers = stack
            .iter()
            .map(|expr| expr.display(vars, Notation::Infix).to_string())
            .collect::<Vec<_>>();

        return Err(FuzzyError::syntax(format!(
            "unable to parse the following expressions: <{}>",
            leftovers.join("> <")
        )));
    }

    stack.pop().ok_or_else(|| FuzzyError::Invariant("operand stack underflow".into()))
}
