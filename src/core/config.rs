//! Configuration module for the gateway
//!
//! Settings are layered: built-in defaults, then an optional
//! `gateway.{toml,json,yaml}` file, then `RAG_`-prefixed environment
//! variables using `__` between sections (e.g. `RAG_AI__ENDPOINT`).

use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LoggingConfig;

/// Base name of the optional configuration file
pub const DEFAULT_CONFIG_NAME: &str = "gateway";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "RAG";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration result type
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub queue: QueueConfig,
    pub storage: StorageConfig,
    pub vector: VectorConfig,
    pub ai: AiConfig,
    pub ingestion: IngestionConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    pub bind_addr: String,

    /// Largest accepted upload body in bytes
    pub max_upload_bytes: usize,
}

/// Work queue settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Queue that carries parse jobs
    pub name: String,

    /// Bounded wait per pop so workers can observe shutdown
    pub pop_timeout_secs: u64,

    /// Pause after the queue reports itself unavailable
    pub unavailable_backoff_secs: u64,
}

/// Object store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket holding uploaded documents
    pub bucket: String,

    /// Root directory for the filesystem-backed store
    pub root_dir: String,
}

/// Vector index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    /// Collection holding document chunks
    pub collection: String,

    /// Dimensionality the collection is created with
    pub vector_size: u64,

    /// Qdrant gRPC endpoint (used with the `qdrant` feature)
    pub qdrant_url: String,

    /// Neighbours retrieved per query
    pub top_k: u64,
}

/// AI capability client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Base URL of the parse/embed/generate service
    pub endpoint: String,

    /// Bearer token, if the service requires one
    #[serde(skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Ceiling for a single request or response body
    pub max_message_bytes: usize,

    /// Per-request timeout for unary calls
    pub timeout_secs: u64,
}

/// Ingestion worker pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Number of concurrent worker loops
    pub pool_size: usize,
}

/// Query orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Events buffered between orchestrator and transport
    pub bridge_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            max_upload_bytes: 100 * 1024 * 1024,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "task:parse_pdf".to_string(),
            pop_timeout_secs: 5,
            unavailable_backoff_secs: 3,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "chimera-docs".to_string(),
            root_dir: "data/objects".to_string(),
        }
    }
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            collection: "chimera_docs".to_string(),
            vector_size: 384, // all-MiniLM-L6-v2 output dimension
            qdrant_url: "http://localhost:6334".to_string(),
            top_k: 15,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:50051".to_string(),
            api_key: None,
            max_message_bytes: 100 * 1024 * 1024,
            timeout_secs: 300,
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self { pool_size: 3 }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { bridge_capacity: 10 }
    }
}

impl QueueConfig {
    pub fn pop_timeout(&self) -> Duration {
        Duration::from_secs(self.pop_timeout_secs)
    }

    pub fn unavailable_backoff(&self) -> Duration {
        Duration::from_secs(self.unavailable_backoff_secs)
    }
}

impl GatewayConfig {
    /// Load from the default file location and the environment
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(None)
    }

    /// Load from an explicit file (required to exist) and the environment
    pub fn load_from(path: Option<&Path>) -> ConfigResult<Self> {
        let builder = config::Config::builder();

        let builder = match path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: GatewayConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the components cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.ingestion.pool_size == 0 {
            return Err(ConfigError::Invalid("ingestion.pool_size must be at least 1".into()));
        }
        if self.query.bridge_capacity == 0 {
            return Err(ConfigError::Invalid("query.bridge_capacity must be at least 1".into()));
        }
        if self.vector.vector_size == 0 {
            return Err(ConfigError::Invalid("vector.vector_size must be at least 1".into()));
        }
        if self.vector.top_k == 0 {
            return Err(ConfigError::Invalid("vector.top_k must be at least 1".into()));
        }
        if self.queue.name.trim().is_empty() {
            return Err(ConfigError::Invalid("queue.name must not be empty".into()));
        }
        if self.vector.collection.trim().is_empty() {
            return Err(ConfigError::Invalid("vector.collection must not be empty".into()));
        }
        Ok(())
    }
}
