//! Aggregator tests: summary, referrer breakdown and visit trends reduced
//! from real rows in an in-memory SQLite store.

use std::sync::Arc;

use chrono::{Days, Utc};
use linktrail::analytics::{
    classify, referrer_breakdown, summarize, visit_trends, ClickContext, ClickRecorder,
    InMemoryClickGuard, SystemClock,
};
use linktrail::models::{LinkScope, NewTrackingClick, NewTrackingLink};
use linktrail::storage::{SqliteStorage, Storage};

async fn setup() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn scope(user_id: &str) -> LinkScope {
    LinkScope {
        user_id: user_id.to_string(),
        organization_id: None,
    }
}

async fn seed_link(storage: &dyn Storage, code: &str, user_id: &str) -> i64 {
    storage
        .create_link(&NewTrackingLink {
            tracking_code: code.to_string(),
            name: format!("link {code}"),
            destination_url: "https://example.com".to_string(),
            tracking_url: format!("https://go.example.com/t/{code}"),
            original_tracking_url: None,
            analytics_url: String::new(),
            user_id: user_id.to_string(),
            organization_id: None,
        })
        .await
        .unwrap()
        .id
}

/// Insert a click with an explicit timestamp, classifying the referrer the
/// same way the recorder does.
async fn seed_click(storage: &dyn Storage, code: &str, link_id: i64, clicked_at: i64, referrer: Option<&str>) {
    let classified = classify(referrer);
    storage
        .record_click(&NewTrackingClick {
            tracking_code: code.to_string(),
            link_id,
            clicked_at,
            user_agent: None,
            referrer: referrer.unwrap_or("direct").to_string(),
            referrer_source: classified.source,
            referrer_category: classified.category.as_str().to_string(),
            referrer_url: referrer.map(|r| r.to_string()),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_scope_reduces_to_zeroes() {
    let storage = setup().await;
    let scope = scope("nobody");

    let summary = summarize(storage.as_ref(), &scope).await.unwrap();
    assert_eq!(summary.total_links, 0);
    assert_eq!(summary.total_visits, 0);
    assert_eq!(summary.active_links, 0);
    assert_eq!(summary.recent_links, 0);
    assert_eq!(summary.conversion_rate, 0.0);

    let breakdown = referrer_breakdown(storage.as_ref(), &scope).await.unwrap();
    assert!(breakdown.sources.is_empty());
    assert!(breakdown.categories.is_empty());
    assert_eq!(breakdown.total, 0);
}

#[tokio::test]
async fn summary_reflects_recorded_visits() {
    let storage = setup().await;
    let a = seed_link(storage.as_ref(), "aaaaa1", "u1").await;
    seed_link(storage.as_ref(), "aaaaa2", "u1").await;

    let now = Utc::now().timestamp();
    seed_click(storage.as_ref(), "aaaaa1", a, now, None).await;
    seed_click(storage.as_ref(), "aaaaa1", a, now, None).await;

    let summary = summarize(storage.as_ref(), &scope("u1")).await.unwrap();
    assert_eq!(summary.total_links, 2);
    assert_eq!(summary.total_visits, 2);
    assert_eq!(summary.active_links, 1);
    assert_eq!(summary.recent_links, 2);
    assert_eq!(summary.conversion_rate, 50.0);
}

#[tokio::test]
async fn breakdown_of_three_distinct_referrers() {
    let storage = setup().await;
    let id = seed_link(storage.as_ref(), "AB12cd", "u1").await;

    let now = Utc::now().timestamp();
    seed_click(storage.as_ref(), "AB12cd", id, now, Some("https://www.google.com/search")).await;
    seed_click(storage.as_ref(), "AB12cd", id, now, None).await;
    seed_click(storage.as_ref(), "AB12cd", id, now, Some("https://m.facebook.com/")).await;

    let breakdown = referrer_breakdown(storage.as_ref(), &scope("u1")).await.unwrap();
    assert_eq!(breakdown.total, 3);
    assert_eq!(breakdown.sources.len(), 3);
    for entry in &breakdown.sources {
        assert_eq!(entry.count, 1);
        assert_eq!(entry.percentage, "33.3");
    }
    let sources: Vec<&str> = breakdown.sources.iter().map(|s| s.source.as_str()).collect();
    assert!(sources.contains(&"Google"));
    assert!(sources.contains(&"Direct"));
    assert!(sources.contains(&"Facebook"));

    assert_eq!(breakdown.categories.get("direct"), Some(&1));
    assert_eq!(breakdown.categories.get("search"), Some(&1));
    assert_eq!(breakdown.categories.get("social"), Some(&1));
}

#[tokio::test]
async fn breakdown_sorts_by_count_and_sums_to_one_hundred() {
    let storage = setup().await;
    let id = seed_link(storage.as_ref(), "AB12cd", "u1").await;

    let now = Utc::now().timestamp();
    for _ in 0..3 {
        seed_click(storage.as_ref(), "AB12cd", id, now, Some("https://www.linkedin.com/feed")).await;
    }
    seed_click(storage.as_ref(), "AB12cd", id, now, None).await;

    let breakdown = referrer_breakdown(storage.as_ref(), &scope("u1")).await.unwrap();
    assert_eq!(breakdown.sources[0].source, "LinkedIn");
    assert_eq!(breakdown.sources[0].count, 3);
    assert_eq!(breakdown.sources[0].percentage, "75.0");
    assert_eq!(breakdown.sources[1].source, "Direct");

    let sum: f64 = breakdown
        .sources
        .iter()
        .map(|s| s.percentage.parse::<f64>().unwrap())
        .sum();
    assert!((sum - 100.0).abs() < 0.2);
}

#[tokio::test]
async fn breakdown_spans_more_links_than_one_query_batch() {
    let storage = setup().await;

    // 12 links forces at least two id-batches on the click lookups
    let now = Utc::now().timestamp();
    for i in 0..12 {
        let code = format!("link{i:02}");
        let id = seed_link(storage.as_ref(), &code, "u1").await;
        seed_click(storage.as_ref(), &code, id, now, None).await;
    }

    let breakdown = referrer_breakdown(storage.as_ref(), &scope("u1")).await.unwrap();
    assert_eq!(breakdown.total, 12);
    assert_eq!(breakdown.sources[0].source, "Direct");
    assert_eq!(breakdown.sources[0].count, 12);
}

#[tokio::test]
async fn trends_series_is_dense_and_sums_to_clicks_in_range() {
    let storage = setup().await;
    let id = seed_link(storage.as_ref(), "AB12cd", "u1").await;

    let now = Utc::now();
    let yesterday = now.checked_sub_days(Days::new(1)).unwrap();
    let last_week = now.checked_sub_days(Days::new(8)).unwrap();

    seed_click(storage.as_ref(), "AB12cd", id, now.timestamp(), None).await;
    seed_click(storage.as_ref(), "AB12cd", id, now.timestamp(), None).await;
    seed_click(storage.as_ref(), "AB12cd", id, yesterday.timestamp(), None).await;
    // Outside the 7-day window, must not appear
    seed_click(storage.as_ref(), "AB12cd", id, last_week.timestamp(), None).await;

    let series = visit_trends(storage.as_ref(), &scope("u1"), 7, None).await.unwrap();
    assert_eq!(series.len(), 7);

    // Ascending dates, last entry is today
    let dates: Vec<&str> = series.iter().map(|d| d.date.as_str()).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
    assert_eq!(series[6].date, now.date_naive().to_string());

    let total: i64 = series.iter().map(|d| d.visits).sum();
    assert_eq!(total, 3);
    assert_eq!(series[6].visits, 2);
    assert_eq!(series[5].visits, 1);
}

#[tokio::test]
async fn trends_with_no_clicks_is_all_zero() {
    let storage = setup().await;
    seed_link(storage.as_ref(), "AB12cd", "u1").await;

    let series = visit_trends(storage.as_ref(), &scope("u1"), 14, None).await.unwrap();
    assert_eq!(series.len(), 14);
    assert!(series.iter().all(|d| d.visits == 0));
}

#[tokio::test]
async fn trends_can_narrow_to_one_link() {
    let storage = setup().await;
    let a = seed_link(storage.as_ref(), "aaaaa1", "u1").await;
    let b = seed_link(storage.as_ref(), "aaaaa2", "u1").await;

    let now = Utc::now().timestamp();
    seed_click(storage.as_ref(), "aaaaa1", a, now, None).await;
    seed_click(storage.as_ref(), "aaaaa2", b, now, None).await;
    seed_click(storage.as_ref(), "aaaaa2", b, now, None).await;

    let series = visit_trends(storage.as_ref(), &scope("u1"), 7, Some(b)).await.unwrap();
    let total: i64 = series.iter().map(|d| d.visits).sum();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn recorder_feeds_aggregator_end_to_end() {
    let storage = setup().await;
    seed_link(storage.as_ref(), "AB12cd", "u1").await;

    // Window of zero: nothing suppressed, every hit counts
    let guard = Arc::new(InMemoryClickGuard::new(0, 3_600_000, Box::new(SystemClock)));
    let recorder = ClickRecorder::new(Arc::clone(&storage), guard);

    for referrer in [
        Some("https://www.google.com/search?q=a"),
        None,
        Some("https://m.facebook.com/"),
    ] {
        recorder
            .record(
                "AB12cd",
                ClickContext {
                    referrer: referrer.map(|r| r.to_string()),
                    user_agent: None,
                },
            )
            .await
            .unwrap();
    }

    let summary = summarize(storage.as_ref(), &scope("u1")).await.unwrap();
    assert_eq!(summary.total_visits, 3);
    assert_eq!(summary.active_links, 1);
    assert_eq!(summary.conversion_rate, 100.0);

    let breakdown = referrer_breakdown(storage.as_ref(), &scope("u1")).await.unwrap();
    assert_eq!(breakdown.total, 3);
}
