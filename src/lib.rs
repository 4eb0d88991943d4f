//! # Emotrack
//!
//! Emotional well-being tracking for users supervised by caregivers
//! (supervisors, professors, family members).
//!
//! ## Modules
//!
//! - [`emotion`]: Domain types (entries, categories, selection windows, roles)
//! - [`stats`]: Per-window statistics over a user's emotion history
//! - [`source`]: Where entries come from (memory, CSV export, HTTP backend)
//! - [`dashboard`]: State container that recomputes and publishes statistics
//! - [`supervision`]: Supervision links and resource assignment
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use emotrack::config::DashboardConfig;
//! use emotrack::dashboard::StatsDashboard;
//! use emotrack::emotion::{EmotionCategory, EmotionEntry, TimeSelection, UserId};
//! use emotrack::source::MemorySource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let kid = UserId::from("kid-1");
//!     let source = MemorySource::new();
//!     source.record(EmotionEntry::new(kid.clone(), EmotionCategory::Happy, 5)?).await?;
//!
//!     let mut dashboard = StatsDashboard::new(&DashboardConfig::default());
//!     let mut updates = dashboard.subscribe();
//!     dashboard.load(&source, &kid).await?;
//!
//!     println!("{}", dashboard.summary());
//!     let _event = updates.recv().await?;
//!
//!     dashboard.set_selection(TimeSelection::year(2024));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dashboard;
pub mod emotion;
pub mod source;
pub mod stats;
pub mod supervision;

// Re-export top-level types for convenience
pub use emotion::{
    EmotionCategory, EmotionEntry, EmotionError, Granularity, Role, TimeSelection, UserId,
    UserProfile,
};

pub use stats::{compute_summary, compute_summary_at, filter_entries, StatisticsSummary};

pub use source::{CsvSource, EntrySource, HttpSource, HttpSourceConfig, MemorySource, SourceError};

pub use dashboard::{DashboardEvent, StatsDashboard};

pub use supervision::{Resource, ResourceKind, SupervisionDirectory, SupervisionError};

pub use config::{Config, ConfigError, DashboardConfig, LoggingConfig, SourceConfig, SourceKind};
