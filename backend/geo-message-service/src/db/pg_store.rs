//! PostgreSQL-backed message store
//!
//! Translates a [`StoreQuery`] into one parameterized SELECT. Only what
//! `StoreQuery` can express is pushed to PostgreSQL.

use super::message_store::{MessageRepository, MessageStore, SortKey, StoreError, StoreQuery};
use crate::models::{Message, NewMessage};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const MESSAGE_COLUMNS: &str = "id, user_id, text, image_url, latitude, longitude";

#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Builds the SELECT for `query`. Exposed for tests.
pub(crate) fn build_select(query: &StoreQuery) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
    qb.push(MESSAGE_COLUMNS);
    qb.push(" FROM messages WHERE TRUE");

    for eq in &query.equals {
        qb.push(" AND ")
            .push(eq.field.as_str())
            .push(" = ")
            .push_bind(eq.value.as_str());
    }

    if let Some(range) = &query.range {
        qb.push(" AND ")
            .push(range.field.as_str())
            .push(" BETWEEN ")
            .push_bind(range.lower)
            .push(" AND ")
            .push_bind(range.upper);
    }

    if let Some(cursor) = &query.start_after {
        match query.order_by {
            SortKey::Id => {
                qb.push(" AND id > ").push_bind(cursor.id.as_str());
            }
            SortKey::Coordinate(field) => {
                qb.push(" AND (")
                    .push(field.as_str())
                    .push(", id) > (")
                    .push_bind(cursor.value)
                    .push(", ")
                    .push_bind(cursor.id.as_str())
                    .push(")");
            }
        }
    }

    match query.order_by {
        SortKey::Id => {
            qb.push(" ORDER BY id ASC");
        }
        SortKey::Coordinate(field) => {
            qb.push(" ORDER BY ")
                .push(field.as_str())
                .push(" ASC, id ASC");
        }
    }

    if let Some(limit) = query.limit {
        qb.push(" LIMIT ").push_bind(limit as i64);
    }

    qb
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn query(&self, query: &StoreQuery) -> Result<Vec<Message>, StoreError> {
        let mut qb = build_select(query);
        let rows = qb
            .build_query_as::<Message>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl MessageRepository for PgMessageStore {
    async fn insert(&self, message: NewMessage) -> Result<Message, StoreError> {
        let stored = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, user_id, text, image_url, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, text, image_url, latitude, longitude
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&message.user_id)
        .bind(&message.text)
        .bind(&message.image_url)
        .bind(message.latitude)
        .bind(message.longitude)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn update_content(
        &self,
        user_id: &str,
        id: &str,
        text: &str,
        image_url: &str,
    ) -> Result<Option<Message>, StoreError> {
        let updated = sqlx::query_as::<_, Message>(
            r#"
            UPDATE messages
            SET text = $3, image_url = $4, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, text, image_url, latitude, longitude
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(text)
        .bind(image_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
