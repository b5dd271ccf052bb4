use serde::{Deserialize, Serialize};
use std::fmt;

/// A recipe ingredient line. Amounts are free text ("2 cups", "a pinch").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ingredient {
    pub amount: String,
    pub name: String,
}

impl Ingredient {
    pub fn new(amount: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.amount.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.amount, self.name)
        }
    }
}
