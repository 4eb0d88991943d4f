//! In-memory entry source

use super::*;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Entries kept in process memory, keyed by owner
#[derive(Default)]
pub struct MemorySource {
    entries: RwLock<HashMap<UserId, Vec<EmotionEntry>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing entries
    pub fn with_entries(entries: impl IntoIterator<Item = EmotionEntry>) -> Self {
        let mut map: HashMap<UserId, Vec<EmotionEntry>> = HashMap::new();
        for entry in entries {
            map.entry(entry.owner_id.clone()).or_default().push(entry);
        }
        Self {
            entries: RwLock::new(map),
        }
    }

    /// Store a new entry for its owner
    pub async fn record(&self, entry: EmotionEntry) -> Result<(), SourceError> {
        entry
            .validate()
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        tracing::debug!(
            owner = %entry.owner_id,
            category = %entry.category,
            rating = entry.rating,
            "Recorded emotion entry"
        );

        self.entries
            .write()
            .await
            .entry(entry.owner_id.clone())
            .or_default()
            .push(entry);
        Ok(())
    }

    /// Total number of stored entries across all users
    pub async fn len(&self) -> usize {
        self.entries.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl EntrySource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_entries(&self, user_id: &UserId) -> Result<Vec<EmotionEntry>, SourceError> {
        Ok(self
            .entries
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}
