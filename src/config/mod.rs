//! Application configuration module
//!
//! Type-safe configuration loaded with the `config` and `dotenvy` crates.
//! Environment variables use the `ACCREDITATION` prefix with `__` separating
//! nested values; an optional YAML file provides the base layer.
//!
//! # Example
//!
//! ```no_run
//! use accreditation_scoring::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod database;
mod error;
mod scoring;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use scoring::{DesiredGradeSource, ScoringConfig};
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;
use std::path::Path;

const ENV_PREFIX: &str = "ACCREDITATION";

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL; scores are kept in memory when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `ACCREDITATION__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `ACCREDITATION__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// A `.env` file is read first when present.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(None)
    }

    /// Like [`AppConfig::load`], layered over a YAML/TOML/JSON file.
    /// Environment variables win over file values.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::build(Some(path.as_ref()))
    }

    fn build(file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any section is invalid, or if the desired
    /// grade is read from the database but no database is configured.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.scoring.validate()?;
        if self.scoring.desired_grade_source == DesiredGradeSource::Database
            && self.database.is_none()
        {
            return Err(ValidationError::DesiredGradeSourceNeedsDatabase);
        }
        Ok(())
    }
}
