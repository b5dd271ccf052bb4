use clap::{Args, Subcommand};

use super::{parse_recipe_id, print_recipes, CommandResult, OutputFormat};
use recipebox::client::Session;
use recipebox::storage::KeyValueStore;

#[derive(Args)]
pub struct FavoriteCommand {
    #[command(subcommand)]
    pub command: FavoriteSubcommand,
}

#[derive(Subcommand)]
pub enum FavoriteSubcommand {
    /// Mark a recipe as a favorite
    Add {
        /// Recipe ID (UUID)
        id: String,
    },
    /// Unmark a favorite recipe
    Remove {
        /// Recipe ID (UUID)
        id: String,
    },
    /// List favorite recipes
    List {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl FavoriteCommand {
    pub async fn run<S: KeyValueStore>(&self, session: &mut Session<S>) -> CommandResult {
        match &self.command {
            FavoriteSubcommand::Add { id } => {
                let favorites = session.add_favorite(parse_recipe_id(id)?).await?;
                println!("Favorites: {}", favorites.len());
                Ok(())
            }
            FavoriteSubcommand::Remove { id } => {
                let favorites = session.remove_favorite(parse_recipe_id(id)?).await?;
                println!("Favorites: {}", favorites.len());
                Ok(())
            }
            FavoriteSubcommand::List { format } => {
                let favorites = session.fetch_favorites().await?;
                print_recipes(&favorites, format)
            }
        }
    }
}
