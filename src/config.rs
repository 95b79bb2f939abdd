use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "trivia";

/// Runtime settings for the trivia server.
///
/// Values are layered: built-in defaults, then an optional config file,
/// then `TRIVIA_*` environment variables (e.g. `TRIVIA_PORT=9000`).
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Loads `.env`, then `trivia.{toml,json,yaml,...}` from the working
    /// directory if present, then the environment.
    pub fn load() -> Result<Settings, ConfigError> {
        dotenv::dotenv().ok();
        Self::build(File::with_name(DEFAULT_CONFIG_FILE).required(false))
    }

    /// Same as [`Settings::load`] but reads the given file, which must exist.
    pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
        dotenv::dotenv().ok();
        Self::build(File::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Settings, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .set_default("database_url", "sqlite:trivia.db")?
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .add_source(file)
            .add_source(Environment::with_prefix("TRIVIA").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
