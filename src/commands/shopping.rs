use clap::{Args, Subcommand};

use super::{parse_recipe_id, CommandResult, OutputFormat};
use recipebox::client::ApiClient;
use recipebox::models::{Ingredient, Recipe, ShoppingListItem};
use recipebox::shopping::{ShoppingList, Toggle};
use recipebox::storage::KeyValueStore;

#[derive(Args)]
pub struct ShoppingCommand {
    #[command(subcommand)]
    pub command: ShoppingSubcommand,
}

#[derive(Subcommand)]
pub enum ShoppingSubcommand {
    /// Show the list grouped by ingredient
    List {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a recipe's ingredients (all of them unless names are given)
    Add {
        /// Recipe ID (UUID)
        recipe_id: String,

        /// Ingredient names to add
        names: Vec<String>,
    },

    /// Remove one entry
    Remove {
        /// Recipe ID (UUID)
        recipe_id: String,

        /// Ingredient name
        name: String,
    },

    /// Check or uncheck one of a recipe's ingredients
    Toggle {
        /// Recipe ID (UUID)
        recipe_id: String,

        /// Ingredient name
        name: String,
    },

    /// Show which of a recipe's ingredients are on the list
    Checked {
        /// Recipe ID (UUID)
        recipe_id: String,
    },

    /// Empty the list
    Clear,
}

impl ShoppingCommand {
    pub async fn run<S: KeyValueStore>(
        &self,
        api: &ApiClient,
        list: &mut ShoppingList<S>,
    ) -> CommandResult {
        match &self.command {
            ShoppingSubcommand::List { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(list.items())?);
                    }
                    OutputFormat::Text => {
                        if list.is_empty() {
                            println!("Shopping list is empty");
                            return Ok(());
                        }
                        for group in list.grouped() {
                            println!("{}", group.name);
                            for item in group.items {
                                if item.amount.is_empty() {
                                    println!("  - ({})", item.recipe_name);
                                } else {
                                    println!("  - {} ({})", item.amount, item.recipe_name);
                                }
                            }
                        }
                        println!("\nTotal: {} item(s)", list.len());
                    }
                }
                return Ok(());
            }

            ShoppingSubcommand::Add { recipe_id, names } => {
                let recipe = api.get_recipe(parse_recipe_id(recipe_id)?).await?;
                let selected: Vec<&Ingredient> = if names.is_empty() {
                    recipe.ingredients.iter().collect()
                } else {
                    names
                        .iter()
                        .map(|name| find_ingredient(&recipe, name))
                        .collect::<Result<_, _>>()?
                };

                let mut added = 0;
                for ingredient in selected {
                    let item = ShoppingListItem::from_ingredient(ingredient, recipe.id, &recipe.title);
                    if list.add(item) {
                        added += 1;
                    }
                }
                println!("Added {} item(s) from '{}'", added, recipe.title);
            }

            ShoppingSubcommand::Remove { recipe_id, name } => {
                if list.remove_entry(name, parse_recipe_id(recipe_id)?) {
                    println!("Removed {}", name);
                } else {
                    println!("{} is not on the list", name);
                }
            }

            ShoppingSubcommand::Toggle { recipe_id, name } => {
                let recipe = api.get_recipe(parse_recipe_id(recipe_id)?).await?;
                let ingredient = find_ingredient(&recipe, name)?;

                match list.toggle(ingredient, recipe.id, &recipe.title) {
                    Toggle::Added => println!("Checked {}", ingredient.name),
                    Toggle::Removed => println!("Unchecked {}", ingredient.name),
                }
            }

            ShoppingSubcommand::Checked { recipe_id } => {
                let names = list.checked_names_for(parse_recipe_id(recipe_id)?);
                if names.is_empty() {
                    println!("Nothing checked");
                }
                for name in names {
                    println!("{}", name);
                }
                return Ok(());
            }

            ShoppingSubcommand::Clear => {
                list.clear();
                println!("Shopping list cleared");
            }
        }

        if let Some(e) = list.persist_error() {
            eprintln!("Warning: shopping list was not saved: {}", e);
        }
        Ok(())
    }
}

fn find_ingredient<'a>(recipe: &'a Recipe, name: &str) -> Result<&'a Ingredient, String> {
    recipe
        .ingredients
        .iter()
        .find(|i| i.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| format!("'{}' has no ingredient named '{}'", recipe.title, name))
}
