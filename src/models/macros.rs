use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-serving macronutrients. Values are free text ("350 kcal", "12g").
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Macros {
    pub calories: Option<String>,
    pub carbs: Option<String>,
    pub protein: Option<String>,
    pub fat: Option<String>,
}

impl Macros {
    pub fn is_empty(&self) -> bool {
        self.calories.is_none() && self.carbs.is_none() && self.protein.is_none() && self.fat.is_none()
    }
}

impl fmt::Display for Macros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("Calories", &self.calories),
            ("Carbs", &self.carbs),
            ("Protein", &self.protein),
            ("Fat", &self.fat),
        ];
        for (label, value) in rows {
            if let Some(value) = value {
                writeln!(f, "  {:<10} {}", label, value)?;
            }
        }
        Ok(())
    }
}
