use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Occurrence, OccurrenceStatus},
    services::sources::{EventStore, MembershipView},
};

/// Occurrence log reads backed by the `occurrences` table.
pub struct SqlEventStore {
    pool: PgPool,
}

impl SqlEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EventStore for SqlEventStore {
    async fn recent_added(
        &self,
        list_id: Uuid,
        since: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<Occurrence>> {
        let occurrences = sqlx::query_as::<_, Occurrence>(
            r#"
            SELECT id, list_id, item_id, status, description, created_at
            FROM occurrences
            WHERE list_id = $1 AND status = $2 AND created_at > $3
            ORDER BY created_at DESC
            LIMIT $4
            "#,
        )
        .bind(list_id)
        .bind(OccurrenceStatus::Added)
        .bind(since)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(occurrences)
    }
}

/// Membership reads backed by the `list_entries` table.
pub struct SqlMembershipView {
    pool: PgPool,
}

impl SqlMembershipView {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MembershipView for SqlMembershipView {
    async fn excluded_items(&self, list_id: Uuid) -> AppResult<HashSet<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT item_id FROM list_entries WHERE list_id = $1",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }
}
