use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::Ingredient;

/// One line of the shopping list.
///
/// Identity is the pair (`name`, `recipe_id`): the same ingredient name
/// pulled from two different recipes is two separate entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    pub name: String,
    pub amount: String,
    pub recipe_id: Uuid,
    pub recipe_name: String,
}

impl ShoppingListItem {
    pub fn new(
        name: impl Into<String>,
        amount: impl Into<String>,
        recipe_id: Uuid,
        recipe_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            amount: amount.into(),
            recipe_id,
            recipe_name: recipe_name.into(),
        }
    }

    pub fn from_ingredient(ingredient: &Ingredient, recipe_id: Uuid, recipe_name: &str) -> Self {
        Self::new(&ingredient.name, &ingredient.amount, recipe_id, recipe_name)
    }

    /// True when both items denote the same list entry.
    pub fn same_entry(&self, other: &ShoppingListItem) -> bool {
        self.matches(&other.name, other.recipe_id)
    }

    pub fn matches(&self, name: &str, recipe_id: Uuid) -> bool {
        self.name == name && self.recipe_id == recipe_id
    }
}

impl fmt::Display for ShoppingListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.amount.is_empty() {
            write!(f, "{} ({})", self.name, self.recipe_name)
        } else {
            write!(f, "{} {} ({})", self.amount, self.name, self.recipe_name)
        }
    }
}
