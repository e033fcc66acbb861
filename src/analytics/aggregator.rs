//! Read-side analytics reductions
//!
//! Pure reads over the links and clicks tables: dashboard summary, referrer
//! breakdown and a dense daily visit series. Clicks are fetched with batched
//! id-list queries no larger than the storage IN-clause limit. Empty scopes
//! reduce to zeroed structures, never to errors.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Days, Utc};
use serde::Serialize;

use crate::models::{LinkScope, TrackingClick, TrackingLink};
use crate::storage::{Storage, MAX_IN_CLAUSE_IDS};

const RECENT_WINDOW_SECS: i64 = 30 * 24 * 3600;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSummary {
    pub total_links: i64,
    pub total_visits: i64,
    pub active_links: i64,
    pub recent_links: i64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub count: i64,
    /// Share of total clicks, formatted with one decimal (e.g. "33.3")
    pub percentage: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferrerBreakdown {
    pub sources: Vec<SourceCount>,
    pub categories: HashMap<String, i64>,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyVisits {
    pub date: String,
    pub visits: i64,
}

/// Dashboard summary over all links in scope
pub async fn summarize(storage: &dyn Storage, scope: &LinkScope) -> Result<LinkSummary> {
    let links = storage.list_links(scope).await?;
    Ok(summarize_links(&links, Utc::now().timestamp()))
}

fn summarize_links(links: &[TrackingLink], now: i64) -> LinkSummary {
    let total_links = links.len() as i64;
    let total_visits: i64 = links.iter().map(|l| l.visits).sum();
    let active_links = links.iter().filter(|l| l.visits > 0).count() as i64;
    let recent_links = links
        .iter()
        .filter(|l| l.created_at >= now - RECENT_WINDOW_SECS)
        .count() as i64;

    let conversion_rate = if total_links == 0 {
        0.0
    } else {
        round_one_decimal(active_links as f64 / total_links as f64 * 100.0)
    };

    LinkSummary {
        total_links,
        total_visits,
        active_links,
        recent_links,
        conversion_rate,
    }
}

/// Clicks in scope grouped by referrer source and category
pub async fn referrer_breakdown(
    storage: &dyn Storage,
    scope: &LinkScope,
) -> Result<ReferrerBreakdown> {
    let links = storage.list_links(scope).await?;
    let ids: Vec<i64> = links.iter().map(|l| l.id).collect();
    let clicks = fetch_clicks_batched(storage, &ids, None).await?;

    let total = clicks.len() as i64;
    let mut by_source: HashMap<String, i64> = HashMap::new();
    let mut categories: HashMap<String, i64> = HashMap::new();
    for click in &clicks {
        *by_source.entry(click.referrer_source.clone()).or_insert(0) += 1;
        *categories
            .entry(click.referrer_category.clone())
            .or_insert(0) += 1;
    }

    let mut sources: Vec<SourceCount> = by_source
        .into_iter()
        .map(|(source, count)| SourceCount {
            source,
            count,
            percentage: format!("{:.1}", count as f64 / total as f64 * 100.0),
        })
        .collect();
    // Count descending; source name as the consistent tie-breaker
    sources.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.source.cmp(&b.source)));

    Ok(ReferrerBreakdown {
        sources,
        categories,
        total,
    })
}

/// Dense daily visit series covering exactly `days` calendar days ending
/// today (UTC), optionally narrowed to a single link in scope.
pub async fn visit_trends(
    storage: &dyn Storage,
    scope: &LinkScope,
    days: u32,
    link_id: Option<i64>,
) -> Result<Vec<DailyVisits>> {
    let days = days.max(1);
    let links = storage.list_links(scope).await?;
    let ids: Vec<i64> = links
        .iter()
        .map(|l| l.id)
        .filter(|id| link_id.map_or(true, |wanted| *id == wanted))
        .collect();

    let today = Utc::now().date_naive();
    let start_day = today
        .checked_sub_days(Days::new(u64::from(days - 1)))
        .unwrap_or(today);
    let since = start_day
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp());

    let clicks = fetch_clicks_batched(storage, &ids, since).await?;

    let mut per_day: HashMap<String, i64> = HashMap::new();
    for click in &clicks {
        if let Some(date) = DateTime::from_timestamp(click.clicked_at, 0) {
            let day = date.date_naive();
            if day >= start_day && day <= today {
                *per_day.entry(day.to_string()).or_insert(0) += 1;
            }
        }
    }

    let mut series = Vec::with_capacity(days as usize);
    for offset in 0..days {
        let day = start_day
            .checked_add_days(Days::new(u64::from(offset)))
            .unwrap_or(today);
        let date = day.to_string();
        let visits = per_day.get(&date).copied().unwrap_or(0);
        series.push(DailyVisits { date, visits });
    }

    Ok(series)
}

/// Fetch clicks for an arbitrary number of link ids, chunked to the storage
/// backend's IN-clause limit.
async fn fetch_clicks_batched(
    storage: &dyn Storage,
    link_ids: &[i64],
    since: Option<i64>,
) -> Result<Vec<TrackingClick>> {
    let mut clicks = Vec::new();
    for chunk in link_ids.chunks(MAX_IN_CLAUSE_IDS) {
        clicks.extend(storage.clicks_for_links(chunk, since).await?);
    }
    Ok(clicks)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
