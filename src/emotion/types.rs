//! Core data types for emotion tracking
//!
//! This module defines the fundamental types used throughout the crate:
//! - `EmotionEntry`: A single recorded emotional state
//! - `EmotionCategory`: The enumerated emotion labels
//! - `TimeSelection`: The day/week/month/year window used to filter entries
//! - `UserProfile` and `Role`: Who records entries and who supervises them

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::{EmotionError, EmotionResult};

/// Highest value on the rating scale (inclusive)
pub const MAX_RATING: u8 = 5;

/// Opaque identifier of a user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Emotion label attached to an entry
///
/// Declaration order is the canonical display order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmotionCategory {
    Happy,
    Sad,
    Angry,
    Scared,
    Surprised,
    Calm,
    Tired,
}

impl EmotionCategory {
    /// Get all categories for iteration
    pub fn all() -> &'static [EmotionCategory] {
        &[
            EmotionCategory::Happy,
            EmotionCategory::Sad,
            EmotionCategory::Angry,
            EmotionCategory::Scared,
            EmotionCategory::Surprised,
            EmotionCategory::Calm,
            EmotionCategory::Tired,
        ]
    }

    /// Upper-case label, as stored and serialized
    pub fn label(&self) -> &'static str {
        match self {
            EmotionCategory::Happy => "HAPPY",
            EmotionCategory::Sad => "SAD",
            EmotionCategory::Angry => "ANGRY",
            EmotionCategory::Scared => "SCARED",
            EmotionCategory::Surprised => "SURPRISED",
            EmotionCategory::Calm => "CALM",
            EmotionCategory::Tired => "TIRED",
        }
    }
}

impl fmt::Display for EmotionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EmotionCategory {
    type Err = EmotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| EmotionError::UnknownCategory(wanted.to_string()))
    }
}

/// A single recorded emotional state
///
/// Entries are immutable once persisted and owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmotionEntry {
    pub id: Uuid,
    pub category: EmotionCategory,
    /// Rating on a 0..=5 scale
    pub rating: u8,
    pub timestamp: DateTime<Utc>,
    pub owner_id: UserId,
    #[serde(default)]
    pub comment: Option<String>,
    /// URI of an attached photo
    #[serde(default)]
    pub photo_ref: Option<String>,
}

impl EmotionEntry {
    /// Create a new entry stamped with the current time
    pub fn new(owner_id: UserId, category: EmotionCategory, rating: u8) -> EmotionResult<Self> {
        Self::with_timestamp(owner_id, category, rating, Utc::now())
    }

    /// Create an entry with a specific timestamp
    pub fn with_timestamp(
        owner_id: UserId,
        category: EmotionCategory,
        rating: u8,
        timestamp: DateTime<Utc>,
    ) -> EmotionResult<Self> {
        if rating > MAX_RATING {
            return Err(EmotionError::InvalidRating(rating as i64));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            category,
            rating,
            timestamp,
            owner_id,
            comment: None,
            photo_ref: None,
        })
    }

    /// Builder method: attach a comment
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Builder method: attach a photo reference
    pub fn photo(mut self, photo_ref: impl Into<String>) -> Self {
        self.photo_ref = Some(photo_ref.into());
        self
    }

    /// Check invariants on entries that did not go through the constructors
    /// (deserialized from CSV or JSON)
    pub fn validate(&self) -> EmotionResult<()> {
        if self.rating > MAX_RATING {
            return Err(EmotionError::InvalidRating(self.rating as i64));
        }
        Ok(())
    }
}

/// Window used to filter entries before aggregation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeSelection {
    /// One calendar day (UTC)
    Day(NaiveDate),
    /// One ISO week; `year` is the ISO week-numbering year
    Week { year: i32, week: u32 },
    /// One calendar month
    Month { year: i32, month: u32 },
    /// One calendar year
    Year { year: i32 },
}

impl TimeSelection {
    /// ISO week selection, `None` if the week does not exist in that year
    pub fn week(year: i32, week: u32) -> Option<Self> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
        Some(TimeSelection::Week { year, week })
    }

    /// Month selection, `None` if month is outside 1..=12
    pub fn month(year: i32, month: u32) -> Option<Self> {
        (1..=12)
            .contains(&month)
            .then_some(TimeSelection::Month { year, month })
    }

    pub fn year(year: i32) -> Self {
        TimeSelection::Year { year }
    }

    /// The ISO week containing `date`
    pub fn week_containing(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        TimeSelection::Week {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// The month containing `date`
    pub fn month_containing(date: NaiveDate) -> Self {
        TimeSelection::Month {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Check if a timestamp falls within this window
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        match *self {
            TimeSelection::Day(date) => timestamp.date_naive() == date,
            TimeSelection::Week { year, week } => {
                let iso = timestamp.iso_week();
                iso.year() == year && iso.week() == week
            }
            TimeSelection::Month { year, month } => {
                timestamp.year() == year && timestamp.month() == month
            }
            TimeSelection::Year { year } => timestamp.year() == year,
        }
    }
}

impl fmt::Display for TimeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSelection::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            TimeSelection::Week { year, week } => write!(f, "{:04}-W{:02}", year, week),
            TimeSelection::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            TimeSelection::Year { year } => write!(f, "{:04}", year),
        }
    }
}

impl FromStr for TimeSelection {
    type Err = EmotionError;

    /// Accepts `YYYY-MM-DD`, `YYYY-Www`, `YYYY-MM` or `YYYY`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || EmotionError::InvalidSelection(s.to_string());

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(TimeSelection::Day(date));
        }

        let mut parts = s.splitn(2, '-');
        let year: i32 = parts
            .next()
            .filter(|p| p.len() == 4)
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;

        match parts.next() {
            None => Ok(TimeSelection::year(year)),
            Some(rest) => {
                if let Some(week) = rest.strip_prefix('W').or_else(|| rest.strip_prefix('w')) {
                    let week: u32 = week.parse().map_err(|_| invalid())?;
                    TimeSelection::week(year, week).ok_or_else(invalid)
                } else {
                    let month: u32 = rest.parse().map_err(|_| invalid())?;
                    TimeSelection::month(year, month).ok_or_else(invalid)
                }
            }
        }
    }
}

/// Width of a selection window, without a position in time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl Granularity {
    /// The window of this width containing `date`
    pub fn selection_for(&self, date: NaiveDate) -> TimeSelection {
        match self {
            Granularity::Day => TimeSelection::Day(date),
            Granularity::Week => TimeSelection::week_containing(date),
            Granularity::Month => TimeSelection::month_containing(date),
            Granularity::Year => TimeSelection::year(date.year()),
        }
    }
}

impl FromStr for Granularity {
    type Err = EmotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "year" => Ok(Granularity::Year),
            _ => Err(EmotionError::InvalidSelection(s.to_string())),
        }
    }
}

/// Parse a timestamp in RFC 3339, `%Y-%m-%d %H:%M:%S` or `%Y-%m-%d` (UTC)
pub fn parse_timestamp(s: &str) -> EmotionResult<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| EmotionError::InvalidTimestamp(s.to_string()))
}

/// Role a user plays in the application
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Records their own emotions
    User,
    Supervisor,
    Professor,
    Family,
}

impl Role {
    /// Whether this role can be assigned users and hand out resources
    pub fn can_supervise(&self) -> bool {
        !matches!(self, Role::User)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Supervisor => write!(f, "supervisor"),
            Role::Professor => write!(f, "professor"),
            Role::Family => write!(f, "family"),
        }
    }
}

/// Profile of a registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub role: Role,
}

impl UserProfile {
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role,
        }
    }
}
