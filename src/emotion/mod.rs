//! Emotion domain model
//!
//! - **types**: Emotion entries, categories, selection windows, users and roles
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust
//! use emotrack::emotion::{EmotionCategory, EmotionEntry, TimeSelection, UserId};
//!
//! let entry = EmotionEntry::new(UserId::from("kid-1"), EmotionCategory::Happy, 4)
//!     .unwrap()
//!     .comment("Played outside");
//!
//! let today = TimeSelection::Day(entry.timestamp.date_naive());
//! assert!(today.contains(&entry.timestamp));
//! ```

pub mod error;
pub mod types;

pub use error::{EmotionError, EmotionResult};
pub use types::{
    parse_timestamp, EmotionCategory, EmotionEntry, Granularity, Role, TimeSelection, UserId, UserProfile,
    MAX_RATING,
};
