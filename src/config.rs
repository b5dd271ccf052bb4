use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Application configuration shared by the server, the CLI and the admin tool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the server's SQLite database
    pub database_path: PathBuf,
    /// Port the server listens on
    pub port: u16,
    /// Lifetime of issued session tokens
    pub token_expiry_minutes: u64,
    /// Base URL the CLI talks to
    pub server_url: String,
    /// Directory for the CLI's durable storage (session, shopping list)
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recipebox");
        Self {
            database_path: data_dir.join("server").join("recipebox.db"),
            port: 5000,
            token_expiry_minutes: 60,
            server_url: "http://localhost:5000".to_string(),
            data_dir,
        }
    }
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Self::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
        }

        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(db_path) = std::env::var("RECIPEBOX_DATABASE_PATH") {
            self.database_path = PathBuf::from(db_path);
        }
        if let Some(port) = env_parse("RECIPEBOX_PORT") {
            self.port = port;
        }
        if let Some(minutes) = env_parse("RECIPEBOX_TOKEN_EXPIRY_MINUTES") {
            self.token_expiry_minutes = minutes;
        }
        if let Ok(url) = std::env::var("RECIPEBOX_SERVER_URL") {
            self.server_url = url;
        }
        if let Ok(dir) = std::env::var("RECIPEBOX_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
    }

    /// Default config file path: ~/.config/recipebox/config.yaml
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recipebox")
            .join("config.yaml")
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {}: {}", name, raw);
            None
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    ReadError(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database_path.to_string_lossy().contains("recipebox.db"));
        assert_eq!(config.port, 5000);
        assert_eq!(config.token_expiry_minutes, 60);
    }

    #[test]
    fn test_load_no_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.server_url, Config::default().server_url);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: /custom/path/db.sqlite").unwrap();
        writeln!(file, "server_url: http://recipes.local:8080").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/custom/path/db.sqlite"));
        assert_eq!(config.server_url, "http://recipes.local:8080");
        // Unset keys keep their defaults
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "token_expiry_minutes: 15").unwrap();

        std::env::set_var("RECIPEBOX_TOKEN_EXPIRY_MINUTES", "90");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.token_expiry_minutes, 90);

        std::env::remove_var("RECIPEBOX_TOKEN_EXPIRY_MINUTES");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
