mod auth;
mod config_cmd;
mod favorite;
mod recipe;
mod shopping;

pub use auth::AuthCommand;
pub use config_cmd::ConfigCommand;
pub use favorite::FavoriteCommand;
pub use recipe::RecipeCommand;
pub use shopping::ShoppingCommand;

use clap::ValueEnum;
use uuid::Uuid;

use recipebox::models::Recipe;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

fn parse_recipe_id(raw: &str) -> Result<Uuid, Box<dyn std::error::Error>> {
    Uuid::parse_str(raw).map_err(|_| format!("'{}' is not a valid recipe id", raw).into())
}

/// Prints a recipe table, or JSON.
fn print_recipes(recipes: &[Recipe], format: &OutputFormat) -> CommandResult {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(recipes)?);
        return Ok(());
    }

    if recipes.is_empty() {
        println!("No recipes found");
        return Ok(());
    }

    println!("{:<36}  {:<30}  {:<14}  TAGS", "ID", "TITLE", "CATEGORY");
    println!("{}", "-".repeat(96));
    for recipe in recipes {
        println!(
            "{:<36}  {:<30}  {:<14}  {}",
            recipe.id,
            truncate(&recipe.title, 30),
            truncate(&recipe.category, 14),
            recipe.tags.join(", ")
        );
    }
    println!("\nTotal: {} recipe(s)", recipes.len());
    Ok(())
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let cut: String = s.chars().take(width - 3).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}
