use clap::{Args, Subcommand};

use super::{CommandResult, OutputFormat};
use recipebox::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print the default config file path
    Path,
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> CommandResult {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
                    OutputFormat::Text => print!("{}", serde_yaml::to_string(config)?),
                }
                Ok(())
            }
            ConfigSubcommand::Path => {
                println!("{}", Config::default_config_path().display());
                Ok(())
            }
        }
    }
}
