use std::collections::HashMap;

use crate::variable::VariableKey;

/// Crisp values of the input variables for one evaluation cycle
#[derive(Clone, Debug, Default)]
pub struct Inputs(pub(crate) HashMap<VariableKey, f64>);

impl Inputs {
    pub fn new() -> Self {
        Inputs(HashMap::new())
    }

    pub fn add(&mut self, var: VariableKey, val: f64) {
        self.0.insert(var, val);
    }

    /// Value of `var`, NaN when none was given
    pub fn value(&self, var: VariableKey) -> f64 {
        self.0.get(&var).copied().unwrap_or(f64::NAN)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
