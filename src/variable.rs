use std::collections::HashMap;
use std::ops::{Index, RangeInclusive};

use slotmap::{new_key_type, SlotMap};

use crate::error::{FuzzyError, Result};
use crate::ops::SNorm;
use crate::terms::{Term, TermKey};

new_key_type! {
    /// A variable key
    pub struct VariableKey;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Input,
    Output,
}

#[derive(Clone, Debug)]
pub struct Variable {
    name: String,
    kind: VariableKind,
    enabled: bool,
    range: RangeInclusive<f64>,
    terms: Vec<Term>,
    /// Only meaningful for output variables
    aggregation: Option<SNorm>,
}

impl Variable {
    fn new(name: String, kind: VariableKind, range: RangeInclusive<f64>, terms: Vec<Term>) -> Self {
        Self {
            name,
            kind,
            enabled: true,
            range,
            terms,
            aggregation: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn is_input(&self) -> bool {
        self.kind == VariableKind::Input
    }

    pub fn is_output(&self) -> bool {
        self.kind == VariableKind::Output
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn range(&self) -> &RangeInclusive<f64> {
        &self.range
    }

    pub fn aggregation(&self) -> Option<SNorm> {
        self.aggregation
    }

    pub fn set_aggregation(&mut self, aggregation: Option<SNorm>) {
        self.aggregation = aggregation;
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn add_term(&mut self, term: Term) -> TermKey {
        self.terms.push(term);
        TermKey(self.terms.len() - 1)
    }

    pub fn has_term(&self, name: &str) -> bool {
        self.find_term(name).is_some()
    }

    /// Finds the first term declared with `name`
    pub fn find_term(&self, name: &str) -> Option<TermKey> {
        self.terms.iter().position(|term| term.name() == name).map(TermKey)
    }

    pub fn term(&self, key: TermKey) -> Option<&Term> {
        self.terms.get(key.0)
    }

    pub fn term_mut(&mut self, key: TermKey) -> Option<&mut Term> {
        self.terms.get_mut(key.0)
    }
}

/// Registry of the input and output variables rules may refer to
#[derive(Clone, Debug, Default)]
pub struct Variables {
    slots: SlotMap<VariableKey, Variable>,
    by_name: HashMap<String, VariableKey>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(
        &mut self,
        name: impl Into<String>,
        range: RangeInclusive<f64>,
        terms: impl IntoIterator<Item = Term>,
    ) -> Result<VariableKey> {
        self.add(name.into(), VariableKind::Input, range, terms.into_iter().collect())
    }

    pub fn add_output(
        &mut self,
        name: impl Into<String>,
        range: RangeInclusive<f64>,
        terms: impl IntoIterator<Item = Term>,
    ) -> Result<VariableKey> {
        self.add(name.into(), VariableKind::Output, range, terms.into_iter().collect())
    }

    fn add(
        &mut self,
        name: String,
        kind: VariableKind,
        range: RangeInclusive<f64>,
        terms: Vec<Term>,
    ) -> Result<VariableKey> {
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(FuzzyError::Configuration(format!("invalid variable name <{name}>")));
        }
        if self.by_name.contains_key(&name) {
            return Err(FuzzyError::Configuration(format!("variable <{name}> already exists")));
        }

        let key = self.slots.insert(Variable::new(name.clone(), kind, range, terms));
        self.by_name.insert(name, key);

        Ok(key)
    }

    pub fn find(&self, name: &str) -> Option<VariableKey> {
        self.by_name.get(name).copied()
    }

    pub fn find_input(&self, name: &str) -> Option<VariableKey> {
        self.find(name).filter(|key| self.slots[*key].is_input())
    }

    pub fn find_output(&self, name: &str) -> Option<VariableKey> {
        self.find(name).filter(|key| self.slots[*key].is_output())
    }

    pub fn get(&self, key: VariableKey) -> Option<&Variable> {
        self.slots.get(key)
    }

    pub fn get_mut(&mut self, key: VariableKey) -> Option<&mut Variable> {
        self.slots.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableKey, &Variable)> {
        self.slots.iter()
    }

    pub fn outputs(&self) -> impl Iterator<Item = (VariableKey, &Variable)> {
        self.slots.iter().filter(|(_, var)| var.is_output())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Name of `key`, or `?` when it is not in this registry
    pub(crate) fn name_of(&self, key: VariableKey) -> &str {
        self.slots.get(key).map_or("?", Variable::name)
    }

    /// Name of the term `term` of `key`, or `?` when unknown
    pub(crate) fn term_name_of(&self, key: VariableKey, term: TermKey) -> &str {
        self.slots
            .get(key)
            .and_then(|var| var.term(term))
            .map_or("?", Term::name)
    }
}

impl Index<VariableKey> for Variables {
    type Output = Variable;

    fn index(&self, key: VariableKey) -> &Variable {
        &self.slots[key]
    }
}

#[test]
fn test_registry() {
    let mut vars = Variables::new();
    let service = vars
        .add_input("service", 0. ..=10., [Term::triangle("poor", 0., 0., 5.), Term::triangle("good", 0., 5., 10.)])
        .unwrap();
    let tip = vars.add_output("tip", 0. ..=30., [Term::triangle("low", 0., 5., 10.)]).unwrap();

    assert_eq!(vars.len(), 2);
    assert_eq!(vars.find("service"), Some(service));
    assert_eq!(vars.find_input("service"), Some(service));
    assert_eq!(vars.find_output("service"), None);
    assert_eq!(vars.find_output("tip"), Some(tip));
    assert_eq!(vars.outputs().count(), 1);
    assert_eq!(vars[service].find_term("good"), Some(TermKey(1)));
    assert!(!vars[tip].has_term("good"));
    assert_eq!(vars.term_name_of(service, TermKey(0)), "poor");
    assert_eq!(vars.term_name_of(service, TermKey(7)), "?");

    assert!(vars.add_output("tip", 0. ..=1., []).is_err());
    assert!(vars.add_input("two words", 0. ..=1., []).is_err());

    let generous = vars.get_mut(tip).unwrap().add_term(Term::triangle("generous", 20., 25., 30.));

    assert_eq!(vars[tip].term(generous).map(Term::name), Some("generous"));
}
