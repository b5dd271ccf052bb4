//! Recipebox Admin CLI
//!
//! Administration tool for managing accounts in the server's database.
//!
//! # Usage
//!
//! ```bash
//! recipebox-admin user list
//! recipebox-admin user promote erik@example.com
//! recipebox-admin user demote erik@example.com
//! recipebox-admin user remove erik@example.com
//! ```
//!
//! The database location comes from the same config as the server
//! (`RECIPEBOX_DATABASE_PATH` overrides it).

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use recipebox::config::Config;
use recipebox::db::{init_db, UserRepository};
use recipebox::models::Role;

#[derive(Parser)]
#[command(name = "recipebox-admin")]
#[command(version)]
#[command(about = "Recipebox server administration tool")]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User(UserCommand),
}

#[derive(Args)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand)]
enum UserSubcommand {
    /// List all users
    List,
    /// Grant the admin role
    Promote {
        /// User's email address
        email: String,
    },
    /// Revoke the admin role
    Demote {
        /// User's email address
        email: String,
    },
    /// Remove a user. Their recipes are kept without an owner.
    Remove {
        /// User's email address
        email: String,
    },
}

async fn list_users(users: &UserRepository) -> Result<(), Box<dyn std::error::Error>> {
    let all = users.list().await?;

    if all.is_empty() {
        println!("No users registered.");
        return Ok(());
    }

    println!("{:<40} {:<20} {:<6}", "EMAIL", "USERNAME", "ROLE");
    println!("{}", "-".repeat(68));

    for user in &all {
        println!("{:<40} {:<20} {:<6}", user.email, user.username, user.role.as_str());
    }

    println!();
    println!("Total: {} user(s)", all.len());

    Ok(())
}

async fn set_role(
    users: &UserRepository,
    email: &str,
    role: Role,
) -> Result<(), Box<dyn std::error::Error>> {
    match users.set_role(email, role).await? {
        Some(user) => {
            println!("{} is now {}", user.email, user.role);
            Ok(())
        }
        None => Err(format!("User '{}' not found", email).into()),
    }
}

async fn remove_user(users: &UserRepository, email: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !users.delete_by_email(email).await? {
        return Err(format!("User '{}' not found", email).into());
    }

    println!("Removed user: {}", email);
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    let pool = init_db(&config.database_path).await?;
    let users = UserRepository::new(pool);

    match cli.command {
        Commands::User(user_cmd) => match user_cmd.command {
            UserSubcommand::List => list_users(&users).await,
            UserSubcommand::Promote { email } => set_role(&users, &email, Role::Admin).await,
            UserSubcommand::Demote { email } => set_role(&users, &email, Role::User).await,
            UserSubcommand::Remove { email } => remove_user(&users, &email).await,
        },
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
