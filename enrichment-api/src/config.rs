use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub cors: Option<CorsConfig>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// Defaults to the platform data directory when unset
    pub path: Option<PathBuf>,
    pub pool_size: Option<u32>,
}

/// Deadlines, in milliseconds
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TimeoutConfig {
    pub store_ms: u64,
    pub bulk_ms: u64,
    pub enrichment_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            store_ms: 10_000,
            bulk_ms: 300_000,
            enrichment_ms: 30_000,
        }
    }
}

impl TimeoutConfig {
    pub fn store(&self) -> Duration {
        Duration::from_millis(self.store_ms)
    }

    pub fn bulk(&self) -> Duration {
        Duration::from_millis(self.bulk_ms)
    }

    pub fn enrichment(&self) -> Duration {
        Duration::from_millis(self.enrichment_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    /// Upper bound on provider calls in flight; unbounded when unset
    pub max_concurrent: Option<usize>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001/api/contact-enrichment".to_string(),
            api_key: None,
            max_concurrent: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ImportConfig {
    pub chunk_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { chunk_size: 1000 }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

/// A bearer token and the user it authenticates
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TokenEntry {
    pub token: String,
    pub user_id: String,
}

const DEFAULT_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8080

[cors]
allowed_origins = ["http://localhost:3000"]

[database]
# path = "/var/lib/contact-enrichment/contacts.db"
# pool_size = 8

[timeouts]
store_ms = 10000
bulk_ms = 300000
enrichment_ms = 30000

[enrichment]
api_url = "http://localhost:3001/api/contact-enrichment"
# api_key = "your-enrichment-api-key"
# max_concurrent = 16

[import]
chunk_size = 1000

# [[auth.tokens]]
# token = "some-long-random-token"
# user_id = "6f1c2c36-5b8e-4d64-9a0e-0d9b3f0c1a11"
"#;

impl ApiConfig {
    /// Load from `path` (or the default location), then apply `CONTACTS__*` env overrides
    pub fn load(path: Option<PathBuf>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = path.unwrap_or_else(get_config_path);

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        // Create default config file if it doesn't exist
        if !config_path.exists() {
            std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .add_source(
                Environment::with_prefix("CONTACTS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ApiConfig = builder.try_deserialize()?;

        if config.import.chunk_size == 0 {
            return Err(ConfigError::Message(
                "import.chunk_size must be greater than zero".to_string(),
            ));
        }

        Ok((config, config_path))
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("contact-enrichment").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}
