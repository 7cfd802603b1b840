/// Error types for the client, collector and configuration
pub mod error;

/// FlashBlade REST payload types
pub mod models;

/// JSON-fetch seam and the FlashBlade REST client
pub mod client;

/// File system filter and usage collector
pub mod collectors;

/// Configuration management
pub mod config;

/// Output rendering
pub mod report;

// Re-export commonly used types
pub use client::{FlashbladeClient, JsonFetcher};
pub use collectors::{FilesystemFilter, UsageCollector};
pub use error::{ClientError, ConfigError, UsageError};
pub use models::UsageResponse;
