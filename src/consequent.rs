use std::fmt;

use tracing::{debug, trace};

use crate::dsl::Proposition;
use crate::error::{FuzzyError, Result};
use crate::hedge::{fold_hedges, Hedge};
use crate::ops::TNorm;
use crate::outputs::Activated;
use crate::rules::{Cycle, AND, IS};
use crate::variable::Variables;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Variable,
    Is,
    HedgeOrTerm,
    And,
}

/// The `then` part of a rule: independent conclusions joined by `and`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Consequent {
    text: String,
    conclusions: Vec<Proposition>,
}

impl Consequent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            conclusions: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn conclusions(&self) -> &[Proposition] {
        &self.conclusions
    }

    pub fn is_loaded(&self) -> bool {
        !self.conclusions.is_empty()
    }

    pub fn unload(&mut self) {
        self.conclusions.clear();
    }

    /// Parses the stored text against `vars`. Only output variables may be
    /// concluded. On failure the consequent is left unloaded.
    pub fn load(&mut self, vars: &Variables) -> Result<()> {
        self.unload();

        if let Err(err) = self.parse(vars) {
            self.unload();
            return Err(err);
        }

        Ok(())
    }

    fn parse(&mut self, vars: &Variables) -> Result<()> {
        debug!(consequent = self.text.as_str(), "parsing consequent");

        if self.text.trim().is_empty() {
            return Err(FuzzyError::syntax("consequent is empty"));
        }

        let mut state = State::Variable;
        let mut last = "";

        for token in self.text.split_whitespace() {
            last = token;

            match state {
                State::Variable => {
                    if let Some(variable) = vars.find_output(token) {
                        trace!(token, "output variable");
                        self.conclusions.push(Proposition {
                            variable,
                            hedges: Vec::new(),
                            term: None,
                        });
                        state = State::Is;
                        continue;
                    }

                    return Err(FuzzyError::syntax_at(
                        format!("consequent expected output variable, but found <{token}>"),
                        token,
                    ));
                },
                State::Is => {
                    if token == IS {
                        state = State::HedgeOrTerm;
                        continue;
                    }

                    return Err(FuzzyError::syntax_at(
                        format!("consequent expected keyword <{IS}>, but found <{token}>"),
                        token,
                    ));
                },
                State::HedgeOrTerm => {
                    let Some(prop) = self.conclusions.last_mut() else {
                        return Err(FuzzyError::Invariant("consequent has no open proposition".into()));
                    };

                    if let Some(hedge) = Hedge::from_name(token) {
                        trace!(token, "hedge");
                        prop.hedges.push(hedge);
                        continue;
                    }

                    if let Some(term) = vars[prop.variable].find_term(token) {
                        trace!(token, "term");
                        prop.term = Some(term);
                        state = State::And;
                        continue;
                    }

                    return Err(FuzzyError::syntax_at(
                        format!("consequent expected hedge or term, but found <{token}>"),
                        token,
                    ));
                },
                State::And => {
                    if token == AND {
                        state = State::Variable;
                        continue;
                    }

                    return Err(FuzzyError::syntax_at(
                        format!("consequent expected operator <{AND}>, but found <{token}>"),
                        token,
                    ));
                },
            }
        }

        match state {
            State::And => Ok(()),
            State::Variable => Err(FuzzyError::syntax_at(
                format!("consequent expected output variable after <{last}>"),
                last,
            )),
            State::Is => Err(FuzzyError::syntax_at(
                format!("consequent expected keyword <{IS}> after <{last}>"),
                last,
            )),
            State::HedgeOrTerm => Err(FuzzyError::syntax_at(
                format!("consequent expected hedge or term after <{last}>"),
                last,
            )),
        }
    }

    /// Appends one activation per enabled conclusion to the cycle's outputs,
    /// with the conclusion's hedges applied to `degree`.
    pub fn modify(&self, degree: f64, implication: Option<TNorm>, cycle: &mut Cycle) -> Result<()> {
        if !self.is_loaded() {
            return Err(FuzzyError::Invariant(format!("consequent <{}> is not loaded", self.text)));
        }

        for prop in &self.conclusions {
            let enabled = cycle.variables.get(prop.variable).is_some_and(|var| var.is_enabled());

            if !enabled {
                continue;
            }

            let Some(term) = prop.term else {
                return Err(FuzzyError::Invariant(format!("consequent <{}> has a conclusion without term", self.text)));
            };
            let strength = fold_hedges(&prop.hedges, degree);

            cycle.outputs.append(prop.variable, Activated::new(term, strength, implication));
        }

        Ok(())
    }

    pub fn display<'a>(&'a self, vars: &'a Variables) -> ConsequentDisplay<'a> {
        ConsequentDisplay { consequent: self, vars }
    }
}

pub struct ConsequentDisplay<'a> {
    consequent: &'a Consequent,
    vars: &'a Variables,
}

impl fmt::Display for ConsequentDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, prop) in self.consequent.conclusions.iter().enumerate() {
            if i > 0 {
                write!(f, " {AND} ")?;
            }
            write!(f, "{}", prop.display(self.vars))?;
        }

        Ok(())
    }
}
