use crate::models::{LinkScope, NewTrackingClick, NewTrackingLink, TrackingClick, TrackingLink};
use crate::storage::{Storage, StorageError, StorageResult, MAX_IN_CLAUSE_IDS};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

const LINK_COLUMNS: &str = "id, tracking_code, name, destination_url, tracking_url, \
     original_tracking_url, analytics_url, visits, last_visit, created_at, updated_at, \
     user_id, organization_id";

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

fn now_secs() -> Result<i64> {
    Ok(std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs() as i64)
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tracking_links (
                id BIGSERIAL PRIMARY KEY,
                tracking_code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                destination_url TEXT NOT NULL,
                tracking_url TEXT NOT NULL,
                original_tracking_url TEXT,
                analytics_url TEXT NOT NULL,
                visits BIGINT NOT NULL DEFAULT 0,
                last_visit BIGINT,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL,
                user_id TEXT NOT NULL,
                organization_id TEXT
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_tracking_code ON tracking_links(tracking_code)",
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_link_user ON tracking_links(user_id)")
            .execute(self.pool.as_ref())
            .await?;

        // No FK on purpose: click history outlives its link.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tracking_clicks (
                id BIGSERIAL PRIMARY KEY,
                tracking_code TEXT NOT NULL,
                link_id BIGINT NOT NULL,
                clicked_at BIGINT NOT NULL,
                user_agent TEXT,
                referrer TEXT NOT NULL,
                referrer_source TEXT NOT NULL,
                referrer_category TEXT NOT NULL,
                referrer_url TEXT
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_click_link ON tracking_clicks(link_id, clicked_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn create_link(&self, link: &NewTrackingLink) -> StorageResult<TrackingLink> {
        let now = now_secs().map_err(StorageError::Other)?;

        let created = sqlx::query_as::<_, TrackingLink>(&format!(
            r#"
            INSERT INTO tracking_links
                (tracking_code, name, destination_url, tracking_url, original_tracking_url,
                 analytics_url, visits, last_visit, created_at, updated_at, user_id, organization_id)
            VALUES ($1, $2, $3, $4, $5, $6, 0, NULL, $7, $8, $9, $10)
            ON CONFLICT (tracking_code) DO NOTHING
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(&link.tracking_code)
        .bind(&link.name)
        .bind(&link.destination_url)
        .bind(&link.tracking_url)
        .bind(&link.original_tracking_url)
        .bind(&link.analytics_url)
        .bind(now)
        .bind(now)
        .bind(&link.user_id)
        .bind(&link.organization_id)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        created.ok_or(StorageError::Conflict)
    }

    async fn get_link_by_code(&self, tracking_code: &str) -> Result<Option<TrackingLink>> {
        let link = sqlx::query_as::<_, TrackingLink>(&format!(
            "SELECT {LINK_COLUMNS} FROM tracking_links WHERE tracking_code = $1"
        ))
        .bind(tracking_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn update_link(
        &self,
        tracking_code: &str,
        name: Option<&str>,
        destination_url: Option<&str>,
    ) -> Result<bool> {
        let now = now_secs()?;

        let result = sqlx::query(
            r#"
            UPDATE tracking_links
            SET name = COALESCE($1, name),
                destination_url = COALESCE($2, destination_url),
                updated_at = $3
            WHERE tracking_code = $4
            "#,
        )
        .bind(name)
        .bind(destination_url)
        .bind(now)
        .bind(tracking_code)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_link(&self, tracking_code: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tracking_links WHERE tracking_code = $1")
            .bind(tracking_code)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_links(&self, scope: &LinkScope) -> Result<Vec<TrackingLink>> {
        let links = if let Some(org_id) = scope.organization_id.as_deref() {
            sqlx::query_as::<_, TrackingLink>(&format!(
                "SELECT {LINK_COLUMNS} FROM tracking_links \
                 WHERE organization_id = $1 ORDER BY created_at DESC"
            ))
            .bind(org_id)
            .fetch_all(self.pool.as_ref())
            .await?
        } else {
            sqlx::query_as::<_, TrackingLink>(&format!(
                "SELECT {LINK_COLUMNS} FROM tracking_links \
                 WHERE user_id = $1 AND organization_id IS NULL ORDER BY created_at DESC"
            ))
            .bind(&scope.user_id)
            .fetch_all(self.pool.as_ref())
            .await?
        };

        Ok(links)
    }

    async fn record_click(&self, click: &NewTrackingClick) -> Result<TrackingClick> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tracking_clicks
                (tracking_code, link_id, clicked_at, user_agent, referrer,
                 referrer_source, referrer_category, referrer_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&click.tracking_code)
        .bind(click.link_id)
        .bind(click.clicked_at)
        .bind(&click.user_agent)
        .bind(&click.referrer)
        .bind(&click.referrer_source)
        .bind(&click.referrer_category)
        .bind(&click.referrer_url)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE tracking_links
            SET visits = visits + 1, last_visit = $1, updated_at = $1
            WHERE id = $2
            "#,
        )
        .bind(click.clicked_at)
        .bind(click.link_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(TrackingClick {
            id,
            tracking_code: click.tracking_code.clone(),
            link_id: click.link_id,
            clicked_at: click.clicked_at,
            user_agent: click.user_agent.clone(),
            referrer: click.referrer.clone(),
            referrer_source: click.referrer_source.clone(),
            referrer_category: click.referrer_category.clone(),
            referrer_url: click.referrer_url.clone(),
        })
    }

    async fn clicks_for_links(
        &self,
        link_ids: &[i64],
        since: Option<i64>,
    ) -> Result<Vec<TrackingClick>> {
        if link_ids.is_empty() {
            return Ok(Vec::new());
        }
        anyhow::ensure!(
            link_ids.len() <= MAX_IN_CLAUSE_IDS,
            "clicks_for_links called with {} ids (max {})",
            link_ids.len(),
            MAX_IN_CLAUSE_IDS
        );

        let placeholders: Vec<String> = (1..=link_ids.len()).map(|i| format!("${i}")).collect();
        let mut sql = format!(
            "SELECT id, tracking_code, link_id, clicked_at, user_agent, referrer, \
             referrer_source, referrer_category, referrer_url \
             FROM tracking_clicks WHERE link_id IN ({})",
            placeholders.join(", ")
        );
        if since.is_some() {
            sql.push_str(&format!(" AND clicked_at >= ${}", link_ids.len() + 1));
        }
        sql.push_str(" ORDER BY clicked_at ASC");

        let mut query = sqlx::query_as::<_, TrackingClick>(&sql);
        for id in link_ids {
            query = query.bind(id);
        }
        if let Some(lower) = since {
            query = query.bind(lower);
        }

        Ok(query.fetch_all(self.pool.as_ref()).await?)
    }
}
