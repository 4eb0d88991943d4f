//! Stats Dashboard
//!
//! State container behind a supervisor's statistics screen. It owns the
//! loaded entries and the current selection window, recomputes the summary
//! whenever either changes, and publishes the result on a tokio broadcast
//! channel so any number of views can follow along.
//!
//! ```text
//! load / set_entries / record_entry / set_selection
//!         │
//!         ▼
//!   compute_summary(entries, selection)
//!         │
//!         ▼
//!   broadcast::Sender<DashboardEvent> ──▶ subscribers
//! ```

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::DashboardConfig;
use crate::emotion::{EmotionEntry, EmotionError, EmotionResult, TimeSelection, UserId};
use crate::source::{EntrySource, SourceError};
use crate::stats::{compute_summary, filter_entries, StatisticsSummary};

/// Notifications published by the dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// The summary was recomputed
    SummaryUpdated {
        user_id: Option<UserId>,
        selection: TimeSelection,
        summary: StatisticsSummary,
    },
    /// Fetching entries failed; the dashboard now shows an empty history
    LoadFailed { user_id: UserId, message: String },
}

/// Explicit state for one user's statistics view
pub struct StatsDashboard {
    user_id: Option<UserId>,
    entries: Vec<EmotionEntry>,
    selection: TimeSelection,
    summary: StatisticsSummary,
    error_message: Option<String>,
    events: broadcast::Sender<DashboardEvent>,
}

impl StatsDashboard {
    /// Create an empty dashboard whose window contains today
    pub fn new(config: &DashboardConfig) -> Self {
        let today = Utc::now().date_naive();
        Self::with_selection(config, config.default_window.selection_for(today))
    }

    /// Create an empty dashboard with an explicit window
    pub fn with_selection(config: &DashboardConfig, selection: TimeSelection) -> Self {
        let (events, _) = broadcast::channel(config.broadcast_capacity.max(1));

        Self {
            user_id: None,
            entries: Vec::new(),
            selection,
            summary: StatisticsSummary::empty(),
            error_message: None,
            events,
        }
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn entries(&self) -> &[EmotionEntry] {
        &self.entries
    }

    pub fn selection(&self) -> TimeSelection {
        self.selection
    }

    pub fn summary(&self) -> &StatisticsSummary {
        &self.summary
    }

    /// Message to show after a failed load, cleared by the next success
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Entries inside the current window, oldest first
    pub fn visible_entries(&self) -> Vec<&EmotionEntry> {
        filter_entries(&self.entries, &self.selection)
    }

    /// Change the window and recompute
    pub fn set_selection(&mut self, selection: TimeSelection) {
        if selection == self.selection {
            return;
        }
        tracing::debug!(%selection, "Selection changed");
        self.selection = selection;
        self.refresh();
    }

    /// Replace the entry list and recompute
    pub fn set_entries(&mut self, user_id: UserId, entries: Vec<EmotionEntry>) {
        self.user_id = Some(user_id);
        self.entries = entries;
        self.refresh();
    }

    /// Add a freshly recorded entry and recompute
    ///
    /// The entry must belong to the dashboard's user; an empty dashboard
    /// adopts the owner of its first entry.
    pub fn record_entry(&mut self, entry: EmotionEntry) -> EmotionResult<()> {
        entry.validate()?;
        let user_id = self.user_id.get_or_insert_with(|| entry.owner_id.clone());
        if entry.owner_id != *user_id {
            return Err(EmotionError::OwnerMismatch {
                expected: user_id.clone(),
                owner: entry.owner_id,
            });
        }
        self.entries.push(entry);
        self.refresh();
        Ok(())
    }

    /// Fetch the user's entries from `source`
    ///
    /// On failure the dashboard falls back to an empty history, keeps a
    /// user-visible message and publishes `LoadFailed` before the (empty)
    /// summary. The error is still returned for the caller's logs.
    pub async fn load(
        &mut self,
        source: &dyn EntrySource,
        user_id: &UserId,
    ) -> Result<usize, SourceError> {
        match source.fetch_entries(user_id).await {
            Ok(entries) => {
                let count = entries.len();
                tracing::info!(
                    source = source.name(),
                    user = %user_id,
                    entries = count,
                    "Loaded emotion history"
                );
                self.error_message = None;
                self.set_entries(user_id.clone(), entries);
                Ok(count)
            }
            Err(e) => {
                tracing::error!(
                    source = source.name(),
                    user = %user_id,
                    error = %e,
                    "Failed to load emotion history"
                );
                let message = e.user_message();
                self.error_message = Some(message.clone());
                self.publish(DashboardEvent::LoadFailed {
                    user_id: user_id.clone(),
                    message,
                });
                self.set_entries(user_id.clone(), Vec::new());
                Err(e)
            }
        }
    }

    /// Recompute the summary from the current state and publish it
    pub fn refresh(&mut self) {
        self.summary = compute_summary(&self.entries, &self.selection);

        tracing::trace!(
            selection = %self.selection,
            summary = %self.summary,
            "Summary recomputed"
        );

        self.publish(DashboardEvent::SummaryUpdated {
            user_id: self.user_id.clone(),
            selection: self.selection,
            summary: self.summary.clone(),
        });
    }

    fn publish(&self, event: DashboardEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{EmotionCategory, Granularity};
    use crate::source::MemorySource;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, TimeZone};

    struct FailingSource;

    #[async_trait]
    impl EntrySource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch_entries(&self, _user_id: &UserId) -> Result<Vec<EmotionEntry>, SourceError> {
            Err(SourceError::Unavailable)
        }
    }

    fn kid() -> UserId {
        UserId::from("kid")
    }

    fn jan(day: u32, rating: u8, category: EmotionCategory) -> EmotionEntry {
        EmotionEntry::with_timestamp(
            kid(),
            category,
            rating,
            Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn january() -> TimeSelection {
        TimeSelection::month(2024, 1).unwrap()
    }

    #[test]
    fn test_new_dashboard_is_empty() {
        let dashboard = StatsDashboard::new(&DashboardConfig::default());
        let today = Utc::now().date_naive();

        assert_eq!(
            dashboard.selection(),
            Granularity::Month.selection_for(today)
        );
        assert!(dashboard.summary().is_empty());
        assert!(dashboard.user_id().is_none());
        assert!(dashboard.error_message().is_none());
    }

    #[test]
    fn test_selection_change_recomputes_and_notifies() {
        let mut dashboard = StatsDashboard::with_selection(&DashboardConfig::default(), january());
        dashboard.set_entries(
            kid(),
            vec![
                jan(3, 5, EmotionCategory::Happy),
                jan(3, 1, EmotionCategory::Sad),
                jan(20, 3, EmotionCategory::Calm),
            ],
        );
        assert_eq!(dashboard.summary().count, 3);

        let mut rx = dashboard.subscribe();
        let day = TimeSelection::Day(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        dashboard.set_selection(day);

        assert_eq!(dashboard.summary().count, 2);
        assert_eq!(dashboard.summary().average_rating, 3.0);
        assert_eq!(dashboard.visible_entries().len(), 2);

        match rx.try_recv().unwrap() {
            DashboardEvent::SummaryUpdated { selection, summary, user_id } => {
                assert_eq!(selection, day);
                assert_eq!(summary.count, 2);
                assert_eq!(user_id, Some(kid()));
            }
            other => panic!("unexpected event: {:?}", other),
        }

        // Same selection again: nothing to publish
        dashboard.set_selection(day);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_record_entry_updates_summary() {
        let now = Utc::now();
        let mut dashboard = StatsDashboard::with_selection(
            &DashboardConfig::default(),
            Granularity::Day.selection_for(now.date_naive()),
        );
        dashboard.set_entries(kid(), Vec::new());

        let mut rx = dashboard.subscribe();
        dashboard
            .record_entry(EmotionEntry::with_timestamp(kid(), EmotionCategory::Surprised, 4, now).unwrap())
            .unwrap();

        assert_eq!(dashboard.summary().count, 1);
        assert_eq!(dashboard.summary().trailing_week_count, 1);
        assert_eq!(dashboard.summary().modal_label(), "SURPRISED");
        assert!(matches!(
            rx.try_recv().unwrap(),
            DashboardEvent::SummaryUpdated { .. }
        ));
    }

    #[test]
    fn test_record_entry_rejects_invalid_rating() {
        let mut dashboard = StatsDashboard::new(&DashboardConfig::default());
        let mut entry = EmotionEntry::new(kid(), EmotionCategory::Happy, 5).unwrap();
        entry.rating = 6;

        assert!(dashboard.record_entry(entry).is_err());
        assert!(dashboard.entries().is_empty());
    }

    #[test]
    fn test_record_entry_rejects_other_owner() {
        let mut dashboard = StatsDashboard::with_selection(&DashboardConfig::default(), january());
        dashboard.set_entries(kid(), vec![jan(3, 4, EmotionCategory::Happy)]);
        let mut rx = dashboard.subscribe();

        let foreign = EmotionEntry::with_timestamp(
            UserId::from("other"),
            EmotionCategory::Angry,
            1,
            Utc.with_ymd_and_hms(2024, 1, 4, 10, 0, 0).unwrap(),
        )
        .unwrap();

        assert_eq!(
            dashboard.record_entry(foreign),
            Err(EmotionError::OwnerMismatch {
                expected: kid(),
                owner: UserId::from("other"),
            })
        );
        assert_eq!(dashboard.entries().len(), 1);
        assert_eq!(dashboard.summary().count, 1);
        assert_eq!(dashboard.summary().modal_category, Some(EmotionCategory::Happy));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_first_recorded_entry_sets_user() {
        let mut dashboard = StatsDashboard::with_selection(&DashboardConfig::default(), january());
        dashboard.record_entry(jan(3, 4, EmotionCategory::Happy)).unwrap();

        assert_eq!(dashboard.user_id(), Some(&kid()));
        let foreign = EmotionEntry::new(UserId::from("other"), EmotionCategory::Sad, 2).unwrap();
        assert!(dashboard.record_entry(foreign).is_err());
    }

    #[tokio::test]
    async fn test_load_from_source() {
        let source = MemorySource::with_entries(vec![
            jan(5, 4, EmotionCategory::Happy),
            jan(6, 2, EmotionCategory::Tired),
        ]);
        let mut dashboard = StatsDashboard::with_selection(&DashboardConfig::default(), january());
        let mut rx = dashboard.subscribe();

        let count = dashboard.load(&source, &kid()).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(dashboard.summary().average_rating, 3.0);
        assert_eq!(dashboard.summary().recent_trend, vec![4, 2]);
        assert!(matches!(
            rx.recv().await.unwrap(),
            DashboardEvent::SummaryUpdated { .. }
        ));
    }

    #[tokio::test]
    async fn test_failed_load_degrades_to_empty() {
        let mut dashboard = StatsDashboard::with_selection(&DashboardConfig::default(), january());
        dashboard.set_entries(kid(), vec![jan(5, 4, EmotionCategory::Happy)]);
        let mut rx = dashboard.subscribe();

        let result = dashboard.load(&FailingSource, &kid()).await;

        assert!(matches!(result, Err(SourceError::Unavailable)));
        assert!(dashboard.entries().is_empty());
        assert_eq!(dashboard.summary(), &StatisticsSummary::empty());
        assert!(dashboard.error_message().unwrap().contains("connection"));

        match rx.recv().await.unwrap() {
            DashboardEvent::LoadFailed { user_id, message } => {
                assert_eq!(user_id, kid());
                assert!(!message.is_empty());
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(
            rx.recv().await.unwrap(),
            DashboardEvent::SummaryUpdated { ref summary, .. } if summary.count == 0
        ));

        // A later success clears the message
        let source = MemorySource::with_entries(vec![jan(5, 4, EmotionCategory::Happy)]);
        dashboard.load(&source, &kid()).await.unwrap();
        assert!(dashboard.error_message().is_none());
    }

    #[test]
    fn test_trailing_week_spans_whole_history() {
        let now = Utc::now();
        let mut dashboard = StatsDashboard::with_selection(&DashboardConfig::default(), TimeSelection::year(1999));
        dashboard.set_entries(
            kid(),
            vec![
                EmotionEntry::with_timestamp(kid(), EmotionCategory::Calm, 3, now - Duration::days(1)).unwrap(),
                EmotionEntry::with_timestamp(kid(), EmotionCategory::Calm, 3, now - Duration::days(30)).unwrap(),
            ],
        );

        assert_eq!(dashboard.summary().count, 0);
        assert_eq!(dashboard.summary().trailing_week_count, 1);
    }
}
