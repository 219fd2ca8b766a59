//! Configuration loading for the sync session.
//!
//! Configuration is loaded from a TOML file (default: `monto.toml`). Every
//! section and key is optional.

use serde::Deserialize;
use std::path::PathBuf;

use monto_sync_types::{MontoError, UriCodec, DEFAULT_SCHEME, DEFAULT_SOURCE_SCHEME};

use crate::editor::{Reveal, ViewPlacement};

/// Root configuration for a sync session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Document identifier configuration.
    #[serde(default)]
    pub documents: DocumentsConfig,
    /// View placement configuration.
    #[serde(default)]
    pub views: ViewsConfig,
    /// Event queue configuration.
    #[serde(default)]
    pub session: RuntimeConfig,
}

/// Document identifier configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentsConfig {
    /// Scheme of product documents (default: "monto").
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Scheme restored on source documents (default: "file").
    #[serde(default = "default_source_scheme")]
    pub source_scheme: String,
    /// Text served for product documents that were never published.
    #[serde(default = "default_unknown_content")]
    pub unknown_content: String,
}

/// View placement configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewsConfig {
    /// Scroll behavior after selections are applied.
    #[serde(default)]
    pub reveal: Reveal,
    /// Column product views open in (default: 2).
    #[serde(default = "default_target_column")]
    pub target_column: u8,
    /// Column source views open in (default: 1).
    #[serde(default = "default_source_column")]
    pub source_column: u8,
}

/// Event queue configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Capacity of the session event queue (default: 256).
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Buffer of the content-change broadcast (default: 64).
    #[serde(default = "default_change_capacity")]
    pub change_capacity: usize,
    /// Log filter used when `RUST_LOG` is unset (default: "info").
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

// Default value functions
fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}

fn default_source_scheme() -> String {
    DEFAULT_SOURCE_SCHEME.to_string()
}

fn default_unknown_content() -> String {
    "unknown content".to_string()
}

fn default_target_column() -> u8 {
    2
}

fn default_source_column() -> u8 {
    1
}

fn default_event_capacity() -> usize {
    256
}

fn default_change_capacity() -> usize {
    64
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            source_scheme: default_source_scheme(),
            unknown_content: default_unknown_content(),
        }
    }
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            reveal: Reveal::default(),
            target_column: default_target_column(),
            source_column: default_source_column(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            change_capacity: default_change_capacity(),
            log_filter: default_log_filter(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Build the identifier codec for the configured schemes.
    pub fn codec(&self) -> Result<UriCodec, MontoError> {
        UriCodec::new(&self.documents.scheme, &self.documents.source_scheme)
    }

    /// Placement of product views: beside the source, focus kept.
    pub fn target_placement(&self) -> ViewPlacement {
        ViewPlacement {
            column: self.views.target_column,
            preserve_focus: true,
        }
    }

    /// Placement of source views: their own column, focused.
    pub fn source_placement(&self) -> ViewPlacement {
        ViewPlacement {
            column: self.views.source_column,
            preserve_focus: false,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
