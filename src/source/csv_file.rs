//! CSV Entry Source
//!
//! Reads emotion entries from a CSV export. Columns are located by header
//! name (case-insensitive):
//!
//! ```text
//! id,timestamp,owner_id,category,rating,comment,photo_ref
//! ```
//!
//! `timestamp`, `owner_id`, `category` and `rating` are required; `id`,
//! `comment` and `photo_ref` are optional. Rows that fail to parse are
//! skipped and reported in the import result.

use super::*;
use crate::emotion::{parse_timestamp, EmotionCategory};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Maximum number of row errors kept in an import result
const MAX_REPORTED_ERRORS: usize = 100;

const HEADER: [&str; 7] = [
    "id",
    "timestamp",
    "owner_id",
    "category",
    "rating",
    "comment",
    "photo_ref",
];

/// Entry source backed by a CSV file
pub struct CsvSource {
    path: PathBuf,
}

/// Result of a CSV import operation
#[derive(Debug, Default)]
pub struct CsvImportResult {
    pub entries: Vec<EmotionEntry>,
    pub rows_processed: usize,
    pub rows_failed: usize,
    pub errors: Vec<String>,
}

/// Column positions resolved from the header row
struct Columns {
    id: Option<usize>,
    timestamp: usize,
    owner_id: usize,
    category: usize,
    rating: usize,
    comment: Option<usize>,
    photo_ref: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, SourceError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| SourceError::Parse(format!("missing column '{}'", name)))
        };

        Ok(Self {
            id: find("id"),
            timestamp: require("timestamp")?,
            owner_id: require("owner_id")?,
            category: require("category")?,
            rating: require("rating")?,
            comment: find("comment"),
            photo_ref: find("photo_ref"),
        })
    }
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Import every entry in the file
    pub fn import(&self) -> Result<CsvImportResult, SourceError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;
        Self::import_reader(reader)
    }

    /// Import from a CSV string (useful for testing)
    pub fn import_str(csv_data: &str) -> Result<CsvImportResult, SourceError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());
        Self::import_reader(reader)
    }

    fn import_reader<R: std::io::Read>(
        mut reader: csv::Reader<R>,
    ) -> Result<CsvImportResult, SourceError> {
        let columns = Columns::from_headers(reader.headers()?)?;
        let mut result = CsvImportResult::default();

        for (line_num, record) in reader.records().enumerate() {
            // Header is line 1
            let line = line_num + 2;

            let parsed = record
                .map_err(|e| e.to_string())
                .and_then(|r| parse_record(&columns, &r));

            match parsed {
                Ok(entry) => {
                    result.entries.push(entry);
                    result.rows_processed += 1;
                }
                Err(e) => {
                    tracing::warn!(line, error = %e, "Skipping CSV row");
                    result.rows_failed += 1;
                    result.errors.push(format!("Line {}: {}", line, e));
                }
            }
        }

        if result.errors.len() > MAX_REPORTED_ERRORS {
            let total = result.errors.len();
            result.errors.truncate(MAX_REPORTED_ERRORS);
            result
                .errors
                .push(format!("... and {} more errors", total - MAX_REPORTED_ERRORS));
        }

        Ok(result)
    }

    /// Append one entry, writing the header first if the file is new or empty
    ///
    /// Fields follow the file's existing header so the row can be read back;
    /// a header missing a required column is rejected.
    pub fn append(&self, entry: &EmotionEntry) -> Result<(), SourceError> {
        let existing = self.existing_header()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let header = match existing {
            Some(header) => header,
            None => {
                let header = csv::StringRecord::from(HEADER.to_vec());
                writer.write_record(&header)?;
                header
            }
        };

        let row: Vec<String> = header.iter().map(|name| entry_field(entry, name)).collect();
        writer.write_record(&row)?;
        writer.flush()?;

        tracing::debug!(path = ?self.path, owner = %entry.owner_id, "Appended entry to CSV");
        Ok(())
    }

    /// Header row of an existing, non-empty file
    fn existing_header(&self) -> Result<Option<csv::StringRecord>, SourceError> {
        match std::fs::metadata(&self.path) {
            Ok(meta) if meta.len() > 0 => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;
        let header = reader.headers()?.clone();
        Columns::from_headers(&header)?;
        Ok(Some(header))
    }
}

/// Value of the column `name` for `entry`; unknown columns are left empty
fn entry_field(entry: &EmotionEntry, name: &str) -> String {
    match name.trim().to_ascii_lowercase().as_str() {
        "id" => entry.id.to_string(),
        "timestamp" => entry.timestamp.to_rfc3339(),
        "owner_id" => entry.owner_id.to_string(),
        "category" => entry.category.label().to_string(),
        "rating" => entry.rating.to_string(),
        "comment" => entry.comment.clone().unwrap_or_default(),
        "photo_ref" => entry.photo_ref.clone().unwrap_or_default(),
        _ => String::new(),
    }
}

fn parse_record(columns: &Columns, record: &csv::StringRecord) -> Result<EmotionEntry, String> {
    let field = |idx: usize, name: &str| {
        record
            .get(idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("missing {}", name))
    };
    let optional = |idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let timestamp = parse_timestamp(field(columns.timestamp, "timestamp")?).map_err(|e| e.to_string())?;
    let owner_id = UserId::from(field(columns.owner_id, "owner_id")?);
    let category: EmotionCategory = field(columns.category, "category")?
        .parse()
        .map_err(|e: crate::emotion::EmotionError| e.to_string())?;
    let rating: u8 = field(columns.rating, "rating")?
        .parse()
        .map_err(|_| "rating is not a number between 0 and 5".to_string())?;

    let mut entry = EmotionEntry::with_timestamp(owner_id, category, rating, timestamp)
        .map_err(|e| e.to_string())?;

    if let Some(id) = optional(columns.id) {
        entry.id = Uuid::parse_str(&id).map_err(|e| format!("invalid id: {}", e))?;
    }
    entry.comment = optional(columns.comment);
    entry.photo_ref = optional(columns.photo_ref);

    Ok(entry)
}

#[async_trait]
impl EntrySource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    async fn fetch_entries(&self, user_id: &UserId) -> Result<Vec<EmotionEntry>, SourceError> {
        let data = tokio::fs::read_to_string(&self.path).await?;
        let result = Self::import_str(&data)?;

        if result.rows_failed > 0 {
            tracing::warn!(
                path = ?self.path,
                rows_failed = result.rows_failed,
                "Some CSV rows could not be read"
            );
        }

        Ok(result
            .entries
            .into_iter()
            .filter(|e| &e.owner_id == user_id)
            .collect())
    }
}
