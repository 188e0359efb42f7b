//! Configuration module for hello-listener.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

/// Command-line arguments for the listener
#[derive(Parser, Debug)]
#[command(name = "hello-listener")]
#[command(author = "hello-listener authors")]
#[command(version = "0.1.0")]
#[command(about = "A blocking TCP listener that greets one client at a time", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 127.0.0.1:18080)
    #[arg(short = 'l', long, global = true)]
    pub listen: Option<String>,

    /// Listen backlog for pending connections
    #[arg(long)]
    pub backlog: Option<i32>,

    /// Maximum number of bytes read from each client
    #[arg(long)]
    pub read_limit: Option<usize>,

    /// Text sent back to every client
    #[arg(long)]
    pub reply: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub mode: Option<Mode>,
}

/// What the binary does once configured.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Accept clients forever (default)
    Serve,
    /// Send one message to the listen address and print the reply
    Send {
        /// Message to send; may be empty
        #[arg(default_value = "")]
        message: String,
    },
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Pending connection queue length
    #[serde(default = "default_backlog")]
    pub backlog: i32,
    /// Bytes read per connection
    #[serde(default = "default_read_limit")]
    pub read_limit: usize,
    /// Fixed response text
    #[serde(default = "default_reply")]
    pub reply: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            backlog: default_backlog(),
            read_limit: default_read_limit(),
            reply: default_reply(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:18080".to_string()
}

fn default_backlog() -> i32 {
    5
}

fn default_read_limit() -> usize {
    1024
}

fn default_reply() -> String {
    "Hello, client!".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: String,
    pub backlog: i32,
    pub read_limit: usize,
    pub reply: String,
    pub log_level: String,
    pub mode: Mode,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(CliArgs::parse())
    }

    /// Resolve already-parsed CLI args against the optional TOML file.
    pub fn from_cli(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        let config = Self::merge(cli, toml_config);
        config.validate()?;
        Ok(config)
    }

    fn merge(cli: CliArgs, toml_config: TomlConfig) -> Self {
        Config {
            listen: cli.listen.unwrap_or(toml_config.server.listen),
            backlog: cli.backlog.unwrap_or(toml_config.server.backlog),
            read_limit: cli.read_limit.unwrap_or(toml_config.server.read_limit),
            reply: cli.reply.unwrap_or(toml_config.server.reply),
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
            mode: cli.mode.unwrap_or(Mode::Serve),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.read_limit == 0 {
            return Err(ConfigError::Invalid("read_limit must be at least 1".into()));
        }
        if self.backlog <= 0 {
            return Err(ConfigError::Invalid("backlog must be at least 1".into()));
        }
        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::Invalid(reason) => write!(f, "Invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TomlConfig::default();
        assert_eq!(config.server.listen, "127.0.0.1:18080");
        assert_eq!(config.server.backlog, 5);
        assert_eq!(config.server.read_limit, 1024);
        assert_eq!(config.server.reply, "Hello, client!");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [server]
            listen = "0.0.0.0:9000"
            backlog = 16
            read_limit = 4096
            reply = "hi"

            [logging]
            level = "debug"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:9000");
        assert_eq!(config.server.backlog, 16);
        assert_eq!(config.server.read_limit, 4096);
        assert_eq!(config.server.reply, "hi");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TomlConfig = toml::from_str("[server]\nbacklog = 1\n").unwrap();
        assert_eq!(config.server.backlog, 1);
        assert_eq!(config.server.listen, "127.0.0.1:18080");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_cli_overrides_file() {
        let path = std::env::temp_dir().join(format!(
            "hello-listener-config-{}.toml",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nlisten = \"127.0.0.1:1\"\nread_limit = 64\n[logging]\nlevel = \"warn\""
        )
        .unwrap();

        let cli = CliArgs::parse_from([
            "hello-listener",
            "--config",
            path.to_str().unwrap(),
            "--listen",
            "127.0.0.1:2",
        ]);
        let config = Config::from_cli(cli).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.listen, "127.0.0.1:2");
        assert_eq!(config.read_limit, 64);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.mode, Mode::Serve);
    }

    #[test]
    fn test_send_subcommand() {
        let cli = CliArgs::parse_from(["hello-listener", "send", "ping"]);
        let config = Config::from_cli(cli).unwrap();
        assert_eq!(
            config.mode,
            Mode::Send {
                message: "ping".to_string()
            }
        );
    }

    #[test]
    fn test_missing_file() {
        let cli = CliArgs::parse_from([
            "hello-listener",
            "--config",
            "/nonexistent/hello-listener.toml",
        ]);
        assert!(matches!(
            Config::from_cli(cli),
            Err(ConfigError::FileRead(..))
        ));
    }

    #[test]
    fn test_zero_read_limit_rejected() {
        let cli = CliArgs::parse_from(["hello-listener", "--read-limit", "0"]);
        assert!(matches!(Config::from_cli(cli), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_backlog_rejected() {
        let cli = CliArgs::parse_from(["hello-listener", "--backlog", "0"]);
        assert!(matches!(Config::from_cli(cli), Err(ConfigError::Invalid(_))));
    }
}
