use config::{Config, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub database_url: Option<String>,
    pub database_path: Option<String>,

    /// Shared secret for the stats endpoints. Unset means the stats API
    /// rejects every request; ingestion stays open either way.
    pub api_token: Option<String>,

    pub maxmind_country_db: Option<String>,

    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: u64,

    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cache_max_entries() -> u64 {
    10000
}

fn default_cache_ttl() -> u64 {
    3600
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            .add_source(
                Environment::with_prefix("NANOLYTICS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database_url {
            url.clone()
        } else if let Some(path) = &self.database_path {
            format!("sqlite:{path}?mode=rwc")
        } else {
            "sqlite:nanolytics.db?mode=rwc".to_string()
        }
    }
}
