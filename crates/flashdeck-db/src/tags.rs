//! Tag repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};

use flashdeck_core::{
    normalize_labels, CardId, Error, Result, Tag, TagRepository, TagSyncSummary,
};

use crate::cards::lock_card;
use crate::tag_sync::{load_labels, reconcile_tx, TagLink};
use crate::transaction::finish;

const TAG_SELECT: &str = r#"
SELECT
    t.tag_id,
    t.tag,
    t.created_at_utc,
    COUNT(ct.card_id) AS card_count
FROM tags t
LEFT JOIN card_tags ct ON ct.tag_id = t.tag_id
"#;

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Replace a card's tags within an existing transaction.
    ///
    /// Locks the card row, so this serializes with card updates.
    pub async fn set_for_card_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        card_id: CardId,
        tags: Vec<String>,
    ) -> Result<TagSyncSummary> {
        lock_card(tx, card_id).await?;
        let summary = reconcile_tx(tx, TagLink::Card, card_id, &tags).await?;

        sqlx::query("UPDATE cards SET updated_at_utc = $1 WHERE card_id = $2")
            .bind(Utc::now())
            .bind(card_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        Ok(summary)
    }
}

fn map_row_to_tag(row: PgRow) -> Tag {
    Tag {
        tag_id: row.get("tag_id"),
        tag: row.get("tag"),
        created_at_utc: row.get("created_at_utc"),
        card_count: row.get("card_count"),
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list(&self) -> Result<Vec<Tag>> {
        let sql = format!(
            "{} GROUP BY t.tag_id, t.tag, t.created_at_utc ORDER BY t.tag",
            TAG_SELECT
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_tag).collect())
    }

    async fn get_by_label(&self, label: &str) -> Result<Option<Tag>> {
        let sql = format!(
            "{} WHERE t.tag = $1 GROUP BY t.tag_id, t.tag, t.created_at_utc",
            TAG_SELECT
        );
        let row = sqlx::query(&sql)
            .bind(label)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(map_row_to_tag))
    }

    async fn get_for_card(&self, card_id: CardId) -> Result<Vec<String>> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cards WHERE card_id = $1)")
                .bind(card_id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        if !exists {
            return Err(Error::CardNotFound(card_id));
        }

        load_labels(&self.pool, TagLink::Card, card_id).await
    }

    async fn set_for_card(&self, card_id: CardId, tags: Vec<String>) -> Result<TagSyncSummary> {
        let tags = normalize_labels("tags", &tags)?;
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = self.set_for_card_tx(&mut tx, card_id, tags).await;
        finish(tx, result).await
    }
}
