//! Account commands: register, login, logout, status.

use clap::{Args, Subcommand};
use std::io::{self, Write};

use super::CommandResult;
use recipebox::client::Session;
use recipebox::storage::KeyValueStore;

#[derive(Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand)]
enum AuthSubcommand {
    /// Create an account
    Register {
        username: String,
        email: String,
        /// Password (prompted for if omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Log in and remember the session
    Login {
        email: String,
        /// Password (prompted for if omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Log out and forget the session
    Logout,
    /// Show who is logged in
    Status,
}

impl AuthCommand {
    pub async fn run<S: KeyValueStore>(&self, session: &mut Session<S>) -> CommandResult {
        match &self.command {
            AuthSubcommand::Register {
                username,
                email,
                password,
            } => {
                let password = password_or_prompt(password.as_deref())?;
                let message = session.register(username, email, &password).await?;
                println!("{}", message);
                println!("Log in with: recipebox auth login {}", email);
                Ok(())
            }
            AuthSubcommand::Login { email, password } => {
                let password = password_or_prompt(password.as_deref())?;
                let user = session.login(email, &password).await?;
                println!("Logged in as {} <{}>", user.username, user.email);
                Ok(())
            }
            AuthSubcommand::Logout => {
                if !session.is_authenticated() {
                    println!("Not logged in");
                }
                session.logout().await;
                println!("Logged out");
                Ok(())
            }
            AuthSubcommand::Status => {
                match session.user() {
                    Some(user) => {
                        println!("Logged in as {} <{}>", user.username, user.email);
                        println!("  Role: {}", user.role);
                        println!("  Favorites: {}", user.favorites.len());
                    }
                    None => println!("Not logged in"),
                }
                println!("  Server: {}", session.api().base_url());
                Ok(())
            }
        }
    }
}

fn password_or_prompt(password: Option<&str>) -> io::Result<String> {
    if let Some(password) = password {
        return Ok(password.to_string());
    }

    print!("Password: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim_end_matches(['\r', '\n']).to_string();

    if input.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Password cannot be empty",
        ));
    }
    Ok(input)
}
