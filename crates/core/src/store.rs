//! Record store seam and its SQLite implementation.

use crate::models::{to_millis, MediaKey, MediaRecord, MediaType};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use storage::models::{MediaRow, MEDIA_COLUMNS};

#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Active record for `key`, inserting an unclassified one when absent.
    /// The flag is true when this call inserted the row.
    async fn find_or_create(&self, key: &MediaKey) -> anyhow::Result<(MediaRecord, bool)>;

    /// Persists every field and stamps `updated_at` with the current time.
    async fn save(&self, record: &mut MediaRecord) -> anyhow::Result<()>;

    /// Soft-deletes active records last touched strictly before `before`.
    async fn soft_delete_stale(&self, before: DateTime<Utc>) -> anyhow::Result<u64>;

    /// One-off maintenance statement; returns affected rows.
    async fn exec(&self, statement: &str) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects and migrates; failure here is fatal to a scan.
    pub async fn open(database: &str) -> anyhow::Result<Self> {
        let pool = storage::connect(database)
            .await
            .with_context(|| format!("open database {database}"))?;
        storage::migrate(&pool).await.context("db migrate")?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn get(&self, id: i64) -> anyhow::Result<Option<MediaRecord>> {
        let row = sqlx::query_as::<_, MediaRow>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(MediaRecord::try_from).transpose()
    }

    /// Active records, newest first, optionally restricted to one type.
    pub async fn list(&self, media_type: Option<MediaType>) -> anyhow::Result<Vec<MediaRecord>> {
        let rows = sqlx::query_as::<_, MediaRow>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media
             WHERE deleted_at IS NULL AND media_type IS NOT NULL
               AND (?1 IS NULL OR media_type = ?1)
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(media_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MediaRecord::try_from).collect()
    }
}

#[async_trait::async_trait]
impl RecordStore for SqliteStore {
    async fn find_or_create(&self, key: &MediaKey) -> anyhow::Result<(MediaRecord, bool)> {
        let now = to_millis(Utc::now());
        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO media (path, filename, size, created_at, updated_at)
            VALUES (?1, ?2, 0, ?3, ?3)
            "#,
        )
        .bind(&key.path)
        .bind(&key.filename)
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected()
            > 0;

        let row = sqlx::query_as::<_, MediaRow>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media
             WHERE path = ?1 AND filename = ?2 AND deleted_at IS NULL"
        ))
        .bind(&key.path)
        .bind(&key.filename)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("load record for {}", key.path))?;
        Ok((MediaRecord::try_from(row)?, inserted))
    }

    async fn save(&self, record: &mut MediaRecord) -> anyhow::Result<()> {
        let now = Utc::now();
        let res = sqlx::query(
            r#"
            UPDATE media SET
                media_type = ?2,
                size = ?3,
                title = ?4,
                year = ?5,
                show_title = ?6,
                season = ?7,
                episode = ?8,
                episode_title = ?9,
                episode_description = ?10,
                episode_aired = ?11,
                description = ?12,
                genres = ?13,
                poster = ?14,
                runtime_minutes = ?15,
                updated_at = ?16
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(record.id)
        .bind(record.media_type.map(|t| t.as_str()))
        .bind(record.size)
        .bind(&record.title)
        .bind(record.year)
        .bind(&record.show_title)
        .bind(record.season)
        .bind(record.episode)
        .bind(&record.episode_title)
        .bind(&record.episode_description)
        .bind(record.episode_aired.map(to_millis))
        .bind(&record.description)
        .bind(&record.genres)
        .bind(&record.poster)
        .bind(record.runtime_minutes)
        .bind(to_millis(now))
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            anyhow::bail!("record {} is missing or deleted", record.id);
        }
        record.updated_at = now;
        Ok(())
    }

    async fn soft_delete_stale(&self, before: DateTime<Utc>) -> anyhow::Result<u64> {
        let res = sqlx::query(
            "UPDATE media SET deleted_at = ?1 WHERE deleted_at IS NULL AND updated_at < ?2",
        )
        .bind(to_millis(Utc::now()))
        .bind(to_millis(before))
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    async fn exec(&self, statement: &str) -> anyhow::Result<u64> {
        let res = sqlx::query(statement).execute(&self.pool).await?;
        Ok(res.rows_affected())
    }
}
