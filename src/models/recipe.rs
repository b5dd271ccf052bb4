use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::ingredient::Ingredient;
use super::instruction::{normalize_steps, Instruction};
use super::macros::Macros;

/// Malformed recipe or user input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub duration: String,
    pub image_url: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<Instruction>,
    pub macros: Macros,
    /// Legacy recipes may have no owner recorded.
    pub owner: Option<Uuid>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        duration: impl Into<String>,
        owner: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            category: category.into(),
            duration: duration.into(),
            image_url: None,
            ingredients: Vec::new(),
            instructions: Vec::new(),
            macros: Macros::default(),
            owner: Some(owner),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_ingredients(mut self, ingredients: Vec<Ingredient>) -> Self {
        self.ingredients = ingredients;
        self
    }

    pub fn with_instructions(mut self, mut instructions: Vec<Instruction>) -> Self {
        normalize_steps(&mut instructions);
        self.instructions = instructions;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = dedup_tags(tags);
        self
    }

    pub fn with_macros(mut self, macros: Macros) -> Self {
        self.macros = macros;
        self
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner == Some(user_id)
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.chars().count()))?;
        writeln!(f, "Category: {}", self.category)?;
        writeln!(f, "Duration: {}", self.duration)?;

        if !self.tags.is_empty() {
            writeln!(f, "Tags: {}", self.tags.join(", "))?;
        }
        if let Some(url) = &self.image_url {
            writeln!(f, "Image: {}", url)?;
        }

        if !self.ingredients.is_empty() {
            writeln!(f, "\nIngredients:")?;
            for ingredient in &self.ingredients {
                writeln!(f, "  - {}", ingredient)?;
            }
        }

        if !self.instructions.is_empty() {
            writeln!(f, "\nInstructions:")?;
            for step in &self.instructions {
                writeln!(f, "  {}. {}", step.step_number, step.description)?;
            }
        }

        if !self.macros.is_empty() {
            writeln!(f, "\nMacros:")?;
            write!(f, "{}", self.macros)?;
        }

        Ok(())
    }
}

/// Payload for creating a recipe. The owner always comes from the
/// authenticated identity, never from the payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipeInput {
    pub title: String,
    pub category: String,
    pub duration: String,
    pub image_url: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<Instruction>,
    pub macros: Macros,
    pub tags: Vec<String>,
}

impl RecipeInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        require("category", &self.category)?;
        require("duration", &self.duration)?;
        validate_ingredients(&self.ingredients)?;
        validate_instructions(&self.instructions)
    }

    /// Validates the payload and builds a new recipe owned by `owner`.
    pub fn into_recipe(self, owner: Uuid) -> Result<Recipe, ValidationError> {
        self.validate()?;

        let mut recipe = Recipe::new(
            self.title.trim(),
            self.category.trim(),
            self.duration.trim(),
            owner,
        )
        .with_ingredients(self.ingredients)
        .with_instructions(self.instructions)
        .with_tags(self.tags)
        .with_macros(self.macros);
        recipe.image_url = self.image_url.filter(|url| !url.trim().is_empty());

        Ok(recipe)
    }
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<Ingredient>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Vec<Instruction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macros: Option<Macros>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl RecipePatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require("title", title)?;
        }
        if let Some(category) = &self.category {
            require("category", category)?;
        }
        if let Some(duration) = &self.duration {
            require("duration", duration)?;
        }
        if let Some(ingredients) = &self.ingredients {
            validate_ingredients(ingredients)?;
        }
        if let Some(instructions) = &self.instructions {
            validate_instructions(instructions)?;
        }
        Ok(())
    }

    /// Applies the present fields to `recipe`, renumbering instructions
    /// when they are part of the patch.
    pub fn apply(self, recipe: &mut Recipe) {
        if let Some(title) = self.title {
            recipe.title = title.trim().to_string();
        }
        if let Some(category) = self.category {
            recipe.category = category.trim().to_string();
        }
        if let Some(duration) = self.duration {
            recipe.duration = duration.trim().to_string();
        }
        if let Some(url) = self.image_url {
            recipe.image_url = if url.trim().is_empty() { None } else { Some(url) };
        }
        if let Some(ingredients) = self.ingredients {
            recipe.ingredients = ingredients;
        }
        if let Some(mut instructions) = self.instructions {
            normalize_steps(&mut instructions);
            recipe.instructions = instructions;
        }
        if let Some(macros) = self.macros {
            recipe.macros = macros;
        }
        if let Some(tags) = self.tags {
            recipe.tags = dedup_tags(tags);
        }
        recipe.updated_at = Utc::now();
    }
}

fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_ingredients(ingredients: &[Ingredient]) -> Result<(), ValidationError> {
    for (index, ingredient) in ingredients.iter().enumerate() {
        if ingredient.name.trim().is_empty() || ingredient.amount.trim().is_empty() {
            return Err(ValidationError(format!(
                "ingredient {} needs both an amount and a name",
                index + 1
            )));
        }
    }
    Ok(())
}

fn validate_instructions(instructions: &[Instruction]) -> Result<(), ValidationError> {
    for (index, step) in instructions.iter().enumerate() {
        if step.description.trim().is_empty() {
            return Err(ValidationError(format!(
                "instruction {} needs a description",
                index + 1
            )));
        }
    }
    Ok(())
}

/// Trims tags and drops blanks and duplicates, keeping first occurrence.
fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
