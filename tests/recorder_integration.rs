//! End-to-end tests for the click-recording pipeline: guard, classifier and
//! transactional storage writes, driven through a manually advanced clock.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use linktrail::analytics::{ClickContext, ClickRecorder, Clock, InMemoryClickGuard, RecordError};
use linktrail::models::NewTrackingLink;
use linktrail::storage::{SqliteStorage, Storage};

struct ManualClock(Arc<AtomicI64>);

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

async fn setup(window_ms: i64) -> (Arc<dyn Storage>, ClickRecorder, Arc<AtomicI64>) {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    let storage: Arc<dyn Storage> = Arc::new(storage);

    let now = Arc::new(AtomicI64::new(1_000_000));
    let guard = Arc::new(InMemoryClickGuard::new(
        window_ms,
        3_600_000,
        Box::new(ManualClock(now.clone())),
    ));
    let recorder = ClickRecorder::new(Arc::clone(&storage), guard);

    (storage, recorder, now)
}

async fn seed_link(storage: &dyn Storage, code: &str) -> i64 {
    let link = storage
        .create_link(&NewTrackingLink {
            tracking_code: code.to_string(),
            name: "campaign".to_string(),
            destination_url: "https://example.com/landing".to_string(),
            tracking_url: format!("https://go.example.com/t/{code}"),
            original_tracking_url: None,
            analytics_url: String::new(),
            user_id: "u1".to_string(),
            organization_id: None,
        })
        .await
        .unwrap();
    link.id
}

#[tokio::test]
async fn accepted_click_stores_row_and_increments_visits() {
    let (storage, recorder, _) = setup(3_000).await;
    let link_id = seed_link(storage.as_ref(), "AB12cd").await;

    let destination = recorder
        .record(
            "AB12cd",
            ClickContext {
                referrer: Some("https://www.google.com/search".to_string()),
                user_agent: Some("Mozilla/5.0".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(destination, "https://example.com/landing");

    let link = storage.get_link_by_code("AB12cd").await.unwrap().unwrap();
    assert_eq!(link.visits, 1);
    assert!(link.last_visit.is_some());

    let clicks = storage.clicks_for_links(&[link_id], None).await.unwrap();
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].referrer_source, "Google");
    assert_eq!(clicks[0].referrer_category, "search");
    assert_eq!(clicks[0].user_agent.as_deref(), Some("Mozilla/5.0"));
}

#[tokio::test]
async fn missing_referrer_is_stored_as_direct() {
    let (storage, recorder, _) = setup(3_000).await;
    let link_id = seed_link(storage.as_ref(), "AB12cd").await;

    recorder.record("AB12cd", ClickContext::default()).await.unwrap();

    let clicks = storage.clicks_for_links(&[link_id], None).await.unwrap();
    assert_eq!(clicks[0].referrer, "direct");
    assert_eq!(clicks[0].referrer_source, "Direct");
    assert_eq!(clicks[0].referrer_category, "direct");
    assert!(clicks[0].referrer_url.is_none());
}

#[tokio::test]
async fn unknown_code_is_not_found() {
    let (_, recorder, _) = setup(3_000).await;
    let err = recorder
        .record("nope00", ClickContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RecordError::NotFound));
}

#[tokio::test]
async fn miss_does_not_shadow_a_link_created_right_after() {
    let (storage, recorder, _) = setup(3_000).await;

    let err = recorder
        .record("AB12cd", ClickContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RecordError::NotFound));

    // The link appears inside the dedup window; its first real click counts
    let link_id = seed_link(storage.as_ref(), "AB12cd").await;
    recorder.record("AB12cd", ClickContext::default()).await.unwrap();

    let link = storage.get_link_by_code("AB12cd").await.unwrap().unwrap();
    assert_eq!(link.visits, 1);
    let clicks = storage.clicks_for_links(&[link_id], None).await.unwrap();
    assert_eq!(clicks.len(), 1);
}

#[tokio::test]
async fn duplicate_within_window_records_at_most_once() {
    let (storage, recorder, now) = setup(3_000).await;
    let link_id = seed_link(storage.as_ref(), "AB12cd").await;

    // Double-fire from the same page action: the second hit still resolves
    // the destination but must not write anything
    let first = recorder.record("AB12cd", ClickContext::default()).await.unwrap();
    now.fetch_add(500, Ordering::SeqCst);
    let second = recorder.record("AB12cd", ClickContext::default()).await.unwrap();
    assert_eq!(first, second);

    let link = storage.get_link_by_code("AB12cd").await.unwrap().unwrap();
    assert_eq!(link.visits, 1);
    let clicks = storage.clicks_for_links(&[link_id], None).await.unwrap();
    assert_eq!(clicks.len(), 1);
}

#[tokio::test]
async fn clicks_spaced_past_window_all_count() {
    let (storage, recorder, now) = setup(3_000).await;
    let link_id = seed_link(storage.as_ref(), "AB12cd").await;

    for _ in 0..3 {
        recorder.record("AB12cd", ClickContext::default()).await.unwrap();
        now.fetch_add(3_000, Ordering::SeqCst);
    }

    let link = storage.get_link_by_code("AB12cd").await.unwrap().unwrap();
    assert_eq!(link.visits, 3);
    let clicks = storage.clicks_for_links(&[link_id], None).await.unwrap();
    assert_eq!(clicks.len(), 3);
}

#[tokio::test]
async fn suppression_is_per_tracking_code() {
    let (storage, recorder, _) = setup(3_000).await;
    let a = seed_link(storage.as_ref(), "aaaaa1").await;
    let b = seed_link(storage.as_ref(), "bbbbb2").await;

    recorder.record("aaaaa1", ClickContext::default()).await.unwrap();
    recorder.record("bbbbb2", ClickContext::default()).await.unwrap();

    assert_eq!(storage.clicks_for_links(&[a], None).await.unwrap().len(), 1);
    assert_eq!(storage.clicks_for_links(&[b], None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn visits_only_grow() {
    let (storage, recorder, now) = setup(3_000).await;
    seed_link(storage.as_ref(), "AB12cd").await;

    let mut last = 0;
    for _ in 0..5 {
        recorder.record("AB12cd", ClickContext::default()).await.unwrap();
        now.fetch_add(5_000, Ordering::SeqCst);

        let visits = storage
            .get_link_by_code("AB12cd")
            .await
            .unwrap()
            .unwrap()
            .visits;
        assert!(visits > last);
        last = visits;
    }
}
