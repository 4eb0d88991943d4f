//! End-to-end flow: a caregiver opens a dashboard for an assigned user whose
//! history lives in a CSV export, then narrows the window.

use chrono::{NaiveDate, TimeZone, Utc};
use emotrack::{
    CsvSource, DashboardConfig, DashboardEvent, EmotionCategory, EmotionEntry, ResourceKind,
    Role, StatsDashboard, SupervisionDirectory, TimeSelection, UserId, UserProfile,
};
use tempfile::tempdir;

fn entry(owner: &UserId, category: EmotionCategory, rating: u8, d: u32, h: u32) -> EmotionEntry {
    EmotionEntry::with_timestamp(
        owner.clone(),
        category,
        rating,
        Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn caregiver_reviews_assigned_user() {
    let prof = UserId::from("prof");
    let kid = UserId::from("kid");
    let sibling = UserId::from("sibling");

    let directory = SupervisionDirectory::new();
    directory.register(UserProfile::new("prof", "Ms. Rivera", Role::Professor)).await;
    directory.register(UserProfile::new("kid", "Leo", Role::User)).await;
    directory.assign_user(&prof, &kid).await.unwrap();

    let assigned = directory.assigned_users(&prof).await;
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].id, kid);

    let dir = tempdir().unwrap();
    let source = CsvSource::new(dir.path().join("emotions.csv"));
    for e in [
        entry(&kid, EmotionCategory::Happy, 5, 4, 9),
        entry(&kid, EmotionCategory::Sad, 1, 4, 15),
        entry(&kid, EmotionCategory::Sad, 2, 5, 9),
        entry(&kid, EmotionCategory::Calm, 4, 20, 9),
        entry(&sibling, EmotionCategory::Angry, 0, 4, 12),
    ] {
        source.append(&e).unwrap();
    }

    let mut dashboard =
        StatsDashboard::with_selection(&DashboardConfig::default(), TimeSelection::month(2024, 3).unwrap());
    let mut events = dashboard.subscribe();

    assert_eq!(dashboard.load(&source, &kid).await.unwrap(), 4);
    let summary = dashboard.summary().clone();
    assert_eq!(summary.count, 4);
    assert_eq!(summary.average_rating, 3.0);
    assert_eq!(summary.modal_category, Some(EmotionCategory::Sad));
    assert_eq!(summary.recent_trend, vec![5, 1, 2, 4]);
    assert_eq!(summary.distribution[&EmotionCategory::Sad], 0.5);

    // 2024-03-04 is the Monday of ISO week 10
    dashboard.set_selection(TimeSelection::week(2024, 10).unwrap());
    assert_eq!(dashboard.summary().count, 3);
    assert_eq!(dashboard.summary().modal_label(), "SAD");

    dashboard.set_selection(TimeSelection::Day(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()));
    assert_eq!(dashboard.summary().count, 2);
    // Tie between HAPPY and SAD: HAPPY was recorded first that day
    assert_eq!(dashboard.summary().modal_label(), "HAPPY");

    let mut updates = 0;
    while let Ok(event) = events.try_recv() {
        assert!(matches!(event, DashboardEvent::SummaryUpdated { .. }));
        updates += 1;
    }
    assert_eq!(updates, 3);

    let resource = directory
        .assign_resource(&prof, &kid, ResourceKind::Audio, "https://cdn.example/breathe.mp3", "Breathing")
        .await
        .unwrap();
    assert_eq!(directory.resources_for(&kid).await, vec![resource]);
}

#[tokio::test]
async fn missing_export_shows_message_and_empty_summary() {
    let dir = tempdir().unwrap();
    let source = CsvSource::new(dir.path().join("never-written.csv"));
    let mut dashboard = StatsDashboard::new(&DashboardConfig::default());

    assert!(dashboard.load(&source, &UserId::from("kid")).await.is_err());
    assert!(dashboard.summary().is_empty());
    assert_eq!(dashboard.summary().modal_label(), "");
    assert_eq!(dashboard.error_message(), Some("Could not load emotions."));
}
