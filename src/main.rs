use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{AuthCommand, ConfigCommand, FavoriteCommand, RecipeCommand, ShoppingCommand};
use recipebox::client::{ApiClient, Session};
use recipebox::config::Config;
use recipebox::shopping::ShoppingList;
use recipebox::storage::FileStore;

#[derive(Parser)]
#[command(name = "recipebox")]
#[command(version)]
#[command(about = "Browse recipes, keep favorites and build a shopping list", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register, log in and out
    Auth(AuthCommand),

    /// Browse and manage recipes
    Recipe(RecipeCommand),

    /// Manage favorite recipes
    Favorite(FavoriteCommand),

    /// Manage the local shopping list
    Shopping(ShoppingCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recipebox=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    let Some(command) = cli.command else {
        println!("Use --help to see available commands");
        return Ok(());
    };

    if let Commands::Config(cmd) = &command {
        return cmd.run(&config);
    }

    let store = FileStore::open(&config.data_dir);
    let api = ApiClient::new(config.server_url.clone());

    match command {
        Commands::Auth(cmd) => {
            let mut session = Session::load(api, store).await;
            cmd.run(&mut session).await?;
        }
        Commands::Recipe(cmd) => {
            let session = Session::load(api, store.clone()).await;
            let shopping = ShoppingList::load(store);
            cmd.run(&session, &shopping).await?;
        }
        Commands::Favorite(cmd) => {
            let mut session = Session::load(api, store).await;
            cmd.run(&mut session).await?;
        }
        Commands::Shopping(cmd) => {
            let mut shopping = ShoppingList::load(store);
            cmd.run(&api, &mut shopping).await?;
        }
        Commands::Config(_) => {}
    }

    Ok(())
}
