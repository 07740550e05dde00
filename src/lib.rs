//! Parsing and evaluation of linguistic fuzzy control rules.
//!
//! Rules are written as text, `if service is very good and food is not rancid
//! then tip is high with 0.8`, and resolved against a registry of input and
//! output variables. A [`RuleBlock`] evaluates its rules once per cycle: each
//! antecedent is reduced to a degree with the block's conjunction and
//! disjunction operators, and the rules chosen by the block's activation
//! method append their conclusions to the cycle's [`Outputs`].
//!
//! ```
//! use fuzzy_rules::{Cycle, Inputs, Outputs, RuleBlock, TNorm, Term, Variables};
//!
//! let mut vars = Variables::new();
//! let service = vars.add_input("service", 0. ..=10., [Term::triangle("good", 0., 10., 10.)])?;
//! let tip = vars.add_output("tip", 0. ..=30., [Term::triangle("high", 15., 30., 30.)])?;
//!
//! let mut block = RuleBlock::new("tipping");
//! block.set_implication(Some(TNorm::Minimum));
//! block.add("if service is very good then tip is high", &vars)?;
//!
//! let mut inputs = Inputs::new();
//! inputs.add(service, 5.);
//!
//! let mut outputs = Outputs::new(&vars);
//! block.activate(&mut Cycle::new(&vars, &inputs, &mut outputs))?;
//!
//! assert_eq!(outputs.get(tip).unwrap().terms()[0].degree, 0.25);
//! # Ok::<(), fuzzy_rules::FuzzyError>(())
//! ```

mod activation;
mod antecedent;
mod consequent;
mod dsl;
mod error;
mod hedge;
mod inputs;
mod math;
mod ops;
mod outputs;
mod postfix;
mod rules;
mod terms;
mod variable;

#[cfg(test)]
mod tests;

pub use activation::{Activation, ActivationMethod, Comparison, First, General, Last, Threshold};
pub use antecedent::Antecedent;
pub use consequent::Consequent;
pub use dsl::{Connective, Expr, Notation, Proposition};
pub use error::{FuzzyError, Result};
pub use hedge::{fold_hedges, Hedge};
pub use inputs::Inputs;
pub use math::{is_eq, is_ge, is_gt, is_le, is_lt, MACHEPS};
pub use ops::{SNorm, TNorm};
pub use outputs::{Activated, Aggregated, Outputs};
pub use postfix::to_postfix;
pub use rules::{Cycle, Operators, Rule, RuleBlock, AND, IF, IS, OR, THEN, WITH};
pub use terms::{Membership, Term, TermKey};
pub use variable::{Variable, VariableKey, VariableKind, Variables};
