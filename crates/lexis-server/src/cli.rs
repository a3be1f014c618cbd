//! Command-line arguments for the server binary.

use crate::config::{ConfigError, ServerConfig};
use clap::Parser;
use std::path::PathBuf;

/// Lexis - String analyzer HTTP service
#[derive(Debug, Parser)]
#[command(name = "lexis-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// SQLite database path, overrides the config file
    #[arg(short, long, env = "LEXIS_DATABASE")]
    pub database: Option<String>,

    /// Port to listen on, overrides the config file
    #[arg(short, long, env = "LEXIS_PORT")]
    pub port: Option<u16>,
}

impl Cli {
    /// Load the config file (or defaults) and apply command-line overrides
    pub fn load_config(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(database) = &self.database {
            config.database_path = database.clone();
        }
        if let Some(port) = self.port {
            config.bind_port = port;
        }

        config.validate()?;
        Ok(config)
    }
}
