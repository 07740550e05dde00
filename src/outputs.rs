use std::collections::HashMap;

use tracing::trace;

use crate::ops::{SNorm, TNorm};
use crate::terms::TermKey;
use crate::variable::{Variable, VariableKey, Variables};

/// One firing of a consequent proposition: the term it concluded, the degree
/// it fired with and the implication operator that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Activated {
    pub term: TermKey,
    pub degree: f64,
    pub implication: Option<TNorm>,
}

impl Activated {
    pub fn new(term: TermKey, degree: f64, implication: Option<TNorm>) -> Self {
        Self {
            term,
            degree,
            implication,
        }
    }

    /// Membership of the implied term at `x`. Without an implication operator
    /// the result is NaN.
    pub fn membership(&self, variable: &Variable, x: f64) -> f64 {
        let Some(implication) = self.implication else {
            return f64::NAN;
        };
        let Some(term) = variable.term(self.term) else {
            return f64::NAN;
        };

        implication.compute(term.membership(x), self.degree)
    }
}

/// Accumulated activations of a single output variable
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aggregated {
    aggregation: Option<SNorm>,
    terms: Vec<Activated>,
}

impl Aggregated {
    pub fn new(aggregation: Option<SNorm>) -> Self {
        Self {
            aggregation,
            terms: Vec::new(),
        }
    }

    pub fn aggregation(&self) -> Option<SNorm> {
        self.aggregation
    }

    pub fn terms(&self) -> &[Activated] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn push(&mut self, activated: Activated) {
        self.terms.push(activated);
    }

    pub fn clear(&mut self) {
        self.terms.clear();
    }

    /// Combined degree of every activation of `term`: folded with the
    /// aggregation operator, or summed when there is none.
    pub fn activation_degree(&self, term: TermKey) -> f64 {
        self.terms
            .iter()
            .filter(|activated| activated.term == term)
            .fold(0.0, |result, activated| match self.aggregation {
                Some(aggregation) => aggregation.compute(result, activated.degree),
                None => result + activated.degree,
            })
    }

    /// Membership of the aggregated fuzzy set at `x`
    pub fn membership(&self, variable: &Variable, x: f64) -> f64 {
        self.terms.iter().fold(0.0, |result, activated| {
            let y = activated.membership(variable, x);

            match self.aggregation {
                Some(aggregation) => aggregation.compute(result, y),
                None => result + y,
            }
        })
    }

    /// The activation with the greatest degree, ignoring degrees of zero.
    /// Ties keep the earliest one.
    pub fn highest_activated_term(&self) -> Option<&Activated> {
        self.terms
            .iter()
            .filter(|activated| activated.degree > 0.0)
            .fold(None, |best: Option<&Activated>, activated| match best {
                Some(best) if best.degree >= activated.degree => Some(best),
                _ => Some(activated),
            })
    }
}

/// Per-cycle accumulators of every output variable.
///
/// Rules append to these while a rule block is activated; whoever drives the
/// cycles clears them before the next one.
#[derive(Clone, Debug, Default)]
pub struct Outputs(HashMap<VariableKey, Aggregated>);

impl Outputs {
    /// Creates an empty accumulator for every output variable in `vars`
    pub fn new(vars: &Variables) -> Self {
        Outputs(
            vars.outputs()
                .map(|(key, var)| (key, Aggregated::new(var.aggregation())))
                .collect(),
        )
    }

    pub fn get(&self, var: VariableKey) -> Option<&Aggregated> {
        self.0.get(&var)
    }

    /// Degree already accumulated for `term` of `var`, zero if nothing fired
    pub fn activation_degree(&self, var: VariableKey, term: TermKey) -> f64 {
        self.0.get(&var).map_or(0.0, |aggregated| aggregated.activation_degree(term))
    }

    pub fn append(&mut self, var: VariableKey, activated: Activated) {
        trace!(term = activated.term.0, degree = activated.degree, "aggregating activation");

        self.0.entry(var).or_default().push(activated);
    }

    pub fn clear(&mut self) {
        for aggregated in self.0.values_mut() {
            aggregated.clear();
        }
    }
}

#[test]
fn test_activation_degree() {
    let mut summed = Aggregated::new(None);

    summed.push(Activated::new(TermKey(0), 0.25, Some(TNorm::Minimum)));
    summed.push(Activated::new(TermKey(1), 0.5, Some(TNorm::Minimum)));
    summed.push(Activated::new(TermKey(0), 0.5, Some(TNorm::Minimum)));

    assert_eq!(summed.activation_degree(TermKey(0)), 0.75);
    assert_eq!(summed.activation_degree(TermKey(2)), 0.0);

    let mut maxed = summed.clone();
    maxed.aggregation = Some(SNorm::Maximum);

    assert_eq!(maxed.activation_degree(TermKey(0)), 0.5);
    assert_eq!(maxed.highest_activated_term().map(|a| a.term), Some(TermKey(1)));

    maxed.clear();
    assert!(maxed.is_empty());
    assert_eq!(maxed.highest_activated_term(), None);
}

#[test]
fn test_aggregated_membership() {
    use crate::terms::Term;

    let mut vars = Variables::new();
    let tip = vars
        .add_output("tip", 0. ..=10., [Term::triangle("low", 0., 0., 10.), Term::triangle("high", 0., 10., 10.)])
        .unwrap();
    vars.get_mut(tip).unwrap().set_aggregation(Some(SNorm::Maximum));

    let mut outputs = Outputs::new(&vars);

    assert_eq!(outputs.activation_degree(tip, TermKey(0)), 0.0);

    outputs.append(tip, Activated::new(TermKey(0), 0.5, Some(TNorm::Minimum)));
    outputs.append(tip, Activated::new(TermKey(1), 0.25, Some(TNorm::AlgebraicProduct)));

    let aggregated = outputs.get(tip).unwrap();

    assert_eq!(aggregated.aggregation(), Some(SNorm::Maximum));
    // low(2) = 0.8 clipped at 0.5, high(2) = 0.2 scaled by 0.25
    assert_eq!(aggregated.membership(&vars[tip], 2.), 0.5);
    assert_eq!(aggregated.terms()[1].membership(&vars[tip], 8.), 0.8 * 0.25);
    assert!(Activated::new(TermKey(0), 0.5, None).membership(&vars[tip], 2.).is_nan());

    outputs.clear();
    assert!(outputs.get(tip).unwrap().is_empty());
}
