use clap::{Args, Subcommand};
use serde::de::DeserializeOwned;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{parse_recipe_id, print_recipes, CommandResult, OutputFormat};
use recipebox::client::Session;
use recipebox::models::{RecipeInput, RecipePatch};
use recipebox::shopping::ShoppingList;
use recipebox::storage::KeyValueStore;

#[derive(Args)]
pub struct RecipeCommand {
    #[command(subcommand)]
    pub command: RecipeSubcommand,
}

#[derive(Subcommand)]
pub enum RecipeSubcommand {
    /// List all recipes
    List {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a recipe, marking ingredients already on the shopping list
    Show {
        /// Recipe ID (UUID)
        id: String,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Search by title and/or tags
    Search {
        /// Case-insensitive title fragment
        #[arg(long)]
        title: Option<String>,

        /// Match any of these tags (can be repeated)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List recipes in a category
    Category {
        name: String,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List every tag in use
    Tags,

    /// Create a recipe from a YAML or JSON file
    Create {
        #[arg(long)]
        file: PathBuf,
    },

    /// Update a recipe from a YAML or JSON file holding the changed fields
    Update {
        /// Recipe ID (UUID)
        id: String,

        #[arg(long)]
        file: PathBuf,
    },

    /// Delete a recipe
    Delete {
        /// Recipe ID (UUID)
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl RecipeCommand {
    pub async fn run<S: KeyValueStore, L: KeyValueStore>(
        &self,
        session: &Session<S>,
        shopping: &ShoppingList<L>,
    ) -> CommandResult {
        let api = session.api();

        match &self.command {
            RecipeSubcommand::List { format } => {
                print_recipes(&api.list_recipes().await?, format)
            }

            RecipeSubcommand::Show { id, format } => {
                let recipe = api.get_recipe(parse_recipe_id(id)?).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&recipe)?);
                    }
                    OutputFormat::Text => {
                        let favorite = if session.is_favorite(recipe.id) {
                            " *"
                        } else {
                            ""
                        };
                        println!("{}{}", recipe.title, favorite);
                        println!("{}", "=".repeat(recipe.title.chars().count()));
                        println!("ID: {}", recipe.id);
                        println!("Category: {}", recipe.category);
                        println!("Duration: {}", recipe.duration);
                        if !recipe.tags.is_empty() {
                            println!("Tags: {}", recipe.tags.join(", "));
                        }

                        if !recipe.ingredients.is_empty() {
                            println!("\nIngredients:");
                            let checked = shopping.checked_names_for(recipe.id);
                            for ingredient in &recipe.ingredients {
                                let mark = if checked.contains(&ingredient.name.as_str()) {
                                    "x"
                                } else {
                                    " "
                                };
                                println!("  [{}] {}", mark, ingredient);
                            }
                        }

                        if !recipe.instructions.is_empty() {
                            println!("\nInstructions:");
                            for step in &recipe.instructions {
                                println!("  {}. {}", step.step_number, step.description);
                            }
                        }

                        if !recipe.macros.is_empty() {
                            println!("\nMacros:");
                            print!("{}", recipe.macros);
                        }
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Search {
                title,
                tags,
                format,
            } => {
                let recipes = api.search(title.as_deref(), tags).await?;
                print_recipes(&recipes, format)
            }

            RecipeSubcommand::Category { name, format } => {
                print_recipes(&api.by_category(name).await?, format)
            }

            RecipeSubcommand::Tags => {
                let tags = api.tags().await?;
                if tags.is_empty() {
                    println!("No tags found");
                }
                for tag in tags {
                    println!("{}", tag);
                }
                Ok(())
            }

            RecipeSubcommand::Create { file } => {
                let input: RecipeInput = read_document(file)?;
                let created = api.create_recipe(session.token()?, &input).await?;
                println!("Created recipe:");
                println!("{}", created);
                println!("ID: {}", created.id);
                Ok(())
            }

            RecipeSubcommand::Update { id, file } => {
                let patch: RecipePatch = read_document(file)?;
                let updated = api
                    .update_recipe(session.token()?, parse_recipe_id(id)?, &patch)
                    .await?;
                println!("Updated recipe:");
                println!("{}", updated);
                Ok(())
            }

            RecipeSubcommand::Delete { id, force } => {
                let id = parse_recipe_id(id)?;
                let token = session.token()?;
                let recipe = api.get_recipe(id).await?;

                if !force {
                    print!("Delete recipe '{}'? [y/N] ", recipe.title);
                    io::stdout().flush()?;
                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;
                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Cancelled");
                        return Ok(());
                    }
                }

                let message = api.delete_recipe(token, id).await?;
                println!("{}", message);
                Ok(())
            }
        }
    }
}

/// Reads a JSON (`.json`) or YAML (anything else) document.
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&contents)?)
    } else {
        Ok(serde_yaml::from_str(&contents)?)
    }
}
