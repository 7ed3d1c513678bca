//! Gateway core module
//!
//! Shared building blocks for the ingestion and query halves:
//! - Configuration management
//! - Error types
//! - Core data types

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use config::{GatewayConfig, ConfigError};
pub use error::{GatewayError, Result};
