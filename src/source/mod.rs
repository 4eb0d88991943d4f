//! Entry Sources
//!
//! Data-access collaborators that retrieve a user's emotion entries:
//! - In-memory store (tests, demos, locally recorded entries)
//! - CSV export file
//! - Remote HTTP backend
//!
//! Sources only fetch; they never aggregate. Failures are reported as
//! `SourceError` and it is up to the caller to degrade (see
//! [`crate::dashboard::StatsDashboard::load`]).

mod csv_file;
mod http;
mod memory;

pub use csv_file::{CsvImportResult, CsvSource};
pub use http::{HttpSource, HttpSourceConfig};
pub use memory::MemorySource;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{SourceConfig, SourceKind};
use crate::emotion::{EmotionEntry, UserId};

/// Common trait for all entry sources
#[async_trait]
pub trait EntrySource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Retrieve every entry owned by `user_id`
    async fn fetch_entries(&self, user_id: &UserId) -> Result<Vec<EmotionEntry>, SourceError>;
}

/// Build the source described by the configuration
pub fn from_config(config: &SourceConfig) -> Result<Arc<dyn EntrySource>, SourceError> {
    let source: Arc<dyn EntrySource> = match config.kind {
        SourceKind::Memory => Arc::new(MemorySource::new()),
        SourceKind::Csv => {
            let path = config
                .csv_path
                .as_ref()
                .ok_or_else(|| SourceError::Config("source.csv_path is not set".to_string()))?;
            Arc::new(CsvSource::new(path))
        }
        SourceKind::Http => Arc::new(HttpSource::new(HttpSourceConfig {
            base_url: config.url.clone(),
            token: config.token.clone(),
            request_timeout_ms: config.request_timeout_ms,
        })?),
    };

    tracing::debug!(source = source.name(), "Entry source configured");
    Ok(source)
}

/// Errors that can occur while fetching entries
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Backend unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Not authorized to read entries of {0}")]
    Unauthorized(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SourceError {
    /// Short message suitable for showing to the person using the app
    pub fn user_message(&self) -> String {
        match self {
            SourceError::Unavailable | SourceError::Timeout | SourceError::Request(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            SourceError::Unauthorized(_) => {
                "You are not allowed to view these emotions.".to_string()
            }
            _ => "Could not load emotions.".to_string(),
        }
    }
}
