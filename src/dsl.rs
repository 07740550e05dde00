use std::fmt;

use crate::hedge::Hedge;
use crate::rules::{AND, IS, OR};
use crate::terms::TermKey;
use crate::variable::{VariableKey, Variables};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn from_keyword(token: &str) -> Option<Self> {
        match token {
            AND => Some(Self::And),
            OR => Some(Self::Or),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::And => AND,
            Self::Or => OR,
        }
    }
}

/// `variable is [hedge]* term`
///
/// `term` is only absent for `variable is [hedge]* any`.
#[derive(Clone, Debug, PartialEq)]
pub struct Proposition {
    pub variable: VariableKey,
    /// In the order they were written, the first one next to `is`
    pub hedges: Vec<Hedge>,
    pub term: Option<TermKey>,
}

impl Proposition {
    pub fn new(variable: VariableKey, term: TermKey) -> Self {
        Self {
            variable,
            hedges: Vec::new(),
            term: Some(term),
        }
    }

    pub fn any(variable: VariableKey) -> Self {
        Self {
            variable,
            hedges: vec![Hedge::Any],
            term: None,
        }
    }

    pub fn hedged(mut self, hedge: Hedge) -> Self {
        self.hedges.push(hedge);
        self
    }

    /// Whether the hedge nearest the term is `any`
    pub fn ends_with_any(&self) -> bool {
        self.hedges.last().is_some_and(|hedge| hedge.is_any())
    }

    pub fn display<'a>(&'a self, vars: &'a Variables) -> PropositionDisplay<'a> {
        PropositionDisplay { proposition: self, vars }
    }
}

pub struct PropositionDisplay<'a> {
    proposition: &'a Proposition,
    vars: &'a Variables,
}

impl fmt::Display for PropositionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prop = self.proposition;

        write!(f, "{} {}", self.vars.name_of(prop.variable), IS)?;
        for hedge in &prop.hedges {
            write!(f, " {hedge}")?;
        }
        if let Some(term) = prop.term {
            write!(f, " {}", self.vars.term_name_of(prop.variable, term))?;
        }

        Ok(())
    }
}

/// Expression tree of an antecedent
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Proposition(Proposition),
    Operator {
        connective: Connective,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn or(self, rhs: Expr) -> Self {
        Expr::Operator {
            connective: Connective::Or,
            left: Box::new(self),
            right: Box::new(rhs),
        }
    }

    pub fn and(self, rhs: Expr) -> Self {
        Expr::Operator {
            connective: Connective::And,
            left: Box::new(self),
            right: Box::new(rhs),
        }
    }

    pub fn propositions(&self) -> Vec<&Proposition> {
        let mut props = Vec::new();

        fn collect<'p>(expr: &'p Expr, out: &mut Vec<&'p Proposition>) {
            match expr {
                Expr::Proposition(prop) => out.push(prop),
                Expr::Operator { left, right, .. } => {
                    collect(left, out);
                    collect(right, out);
                },
            }
        }

        collect(self, &mut props);

        props
    }

    pub fn display<'a>(&'a self, vars: &'a Variables, notation: Notation) -> ExprDisplay<'a> {
        ExprDisplay {
            expr: self,
            vars,
            notation,
        }
    }
}

impl From<Proposition> for Expr {
    fn from(prop: Proposition) -> Self {
        Expr::Proposition(prop)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notation {
    Prefix,
    /// Every operator is wrapped in parentheses, so the text parses back to
    /// the same tree
    Infix,
    Postfix,
}

pub struct ExprDisplay<'a> {
    expr: &'a Expr,
    vars: &'a Variables,
    notation: Notation,
}

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expr {
            Expr::Proposition(prop) => write!(f, "{}", prop.display(self.vars)),
            Expr::Operator {
                connective,
                left,
                right,
            } => {
                let left = left.display(self.vars, self.notation);
                let right = right.display(self.vars, self.notation);
                let op = connective.keyword();

                match self.notation {
                    Notation::Prefix => write!(f, "{op} {left} {right}"),
                    Notation::Infix => write!(f, "({left} {op} {right})"),
                    Notation::Postfix => write!(f, "{left} {right} {op}"),
                }
            },
        }
    }
}

#[test]
fn test_notations() {
    use crate::terms::Term;

    let mut vars = Variables::new();
    let x = vars.add_input("x", 0. ..=1., [Term::constant("A", 0.6)]).unwrap();
    let y = vars.add_input("y", 0. ..=1., [Term::constant("B", 0.4)]).unwrap();
    let a = vars[x].find_term("A").unwrap();
    let b = vars[y].find_term("B").unwrap();

    let expr = Expr::from(Proposition::new(x, a))
        .and(Proposition::new(y, b).hedged(Hedge::Not).hedged(Hedge::Very).into())
        .or(Proposition::any(y).into());

    assert_eq!(
        expr.display(&vars, Notation::Infix).to_string(),
        "((x is A and y is not very B) or y is any)"
    );
    assert_eq!(
        expr.display(&vars, Notation::Prefix).to_string(),
        "or and x is A y is not very B y is any"
    );
    assert_eq!(
        expr.display(&vars, Notation::Postfix).to_string(),
        "x is A y is not very B and y is any or"
    );
    assert_eq!(expr.propositions().len(), 3);
    assert!(expr.propositions()[2].ends_with_any());
    assert!(!expr.propositions()[1].ends_with_any());
}
