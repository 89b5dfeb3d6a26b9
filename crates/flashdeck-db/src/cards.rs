//! Card repository implementation.
//!
//! Every write runs in one transaction that also covers the tag
//! reconciliation, so a card and its tags change together or not at all.
//! The `*_tx` variants let callers compose several operations in a
//! transaction they own.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgExecutor;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::{debug, info};

use flashdeck_core::{
    Card, CardContent, CardFilter, CardFindOptions, CardId, CardRepository, CreateCardRequest,
    Error, Result, UpdateCardRequest,
};

use crate::card_query::{map_row_to_card, CardQueryBuilder};
use crate::tag_sync::{reconcile_tx, TagLink};
use crate::transaction::finish;

/// PostgreSQL implementation of CardRepository.
#[derive(Clone)]
pub struct PgCardRepository {
    pool: Pool<Postgres>,
}

impl PgCardRepository {
    /// Create a new PgCardRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a card and reconcile its tags within an existing transaction.
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        req: CreateCardRequest,
    ) -> Result<Card> {
        let start = Instant::now();
        let labels = req.validate()?;
        let content = req.content();

        let card_id: CardId = sqlx::query_scalar(
            "INSERT INTO cards (front, back, hint) VALUES ($1, $2, $3) RETURNING card_id",
        )
        .bind(&content.front)
        .bind(&content.back)
        .bind(&content.hint)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        let summary = reconcile_tx(tx, TagLink::Card, card_id, &labels).await?;
        let card = self.fetch_tx(tx, card_id).await?;

        info!(
            subsystem = "database",
            component = "cards",
            op = "insert",
            card_id,
            tag_count = card.tags.len(),
            tags_created = summary.tags_created,
            duration_ms = start.elapsed().as_millis() as u64,
            "Card inserted"
        );
        Ok(card)
    }

    /// Fetch a card with its tags within an existing transaction.
    pub async fn fetch_tx(&self, tx: &mut Transaction<'_, Postgres>, id: CardId) -> Result<Card> {
        find_one(&mut **tx, id).await
    }

    /// Apply a partial update within an existing transaction.
    ///
    /// The card row is locked first, so concurrent updates to the same card
    /// run one after the other and never interleave their merges.
    pub async fn update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: CardId,
        req: UpdateCardRequest,
    ) -> Result<Card> {
        let start = Instant::now();
        let labels = req.validate()?;
        let current = lock_card(tx, id).await?;
        let next = req.merge(current);

        let updated = sqlx::query(
            "UPDATE cards SET front = $1, back = $2, hint = $3, updated_at_utc = $4
             WHERE card_id = $5",
        )
        .bind(&next.front)
        .bind(&next.back)
        .bind(&next.hint)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        if updated == 0 {
            return Err(Error::Server(format!("update of card {} affected no rows", id)));
        }

        let summary = match labels {
            Some(labels) => Some(reconcile_tx(tx, TagLink::Card, id, &labels).await?),
            None => None,
        };
        let card = self.fetch_tx(tx, id).await?;

        debug!(
            subsystem = "database",
            component = "cards",
            op = "update",
            card_id = id,
            tags_replaced = summary.is_some(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Card updated"
        );
        Ok(card)
    }

    /// Delete a card within an existing transaction. Its tag links go with it.
    pub async fn delete_tx(&self, tx: &mut Transaction<'_, Postgres>, id: CardId) -> Result<u64> {
        lock_card(tx, id).await?;

        let deleted = sqlx::query("DELETE FROM cards WHERE card_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        if deleted == 0 {
            return Err(Error::Server(format!("delete of card {} affected no rows", id)));
        }

        info!(
            subsystem = "database",
            component = "cards",
            op = "delete",
            card_id = id,
            "Card deleted"
        );
        Ok(deleted)
    }
}

#[async_trait]
impl CardRepository for PgCardRepository {
    async fn insert(&self, req: CreateCardRequest) -> Result<Card> {
        req.validate()?;
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = self.insert_tx(&mut tx, req).await;
        finish(tx, result).await
    }

    async fn fetch(&self, id: CardId) -> Result<Card> {
        find_one(&self.pool, id).await
    }

    async fn find(&self, filter: &CardFilter, options: &CardFindOptions) -> Result<Vec<Card>> {
        let options = options.clone().validated()?;
        find_with(&self.pool, filter, &options).await
    }

    async fn update(&self, id: CardId, req: UpdateCardRequest) -> Result<Card> {
        req.validate()?;
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = self.update_tx(&mut tx, id, req).await;
        finish(tx, result).await
    }

    async fn delete(&self, id: CardId) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = self.delete_tx(&mut tx, id).await;
        finish(tx, result).await
    }
}

/// Run a card find on any executor.
///
/// `options` must already be validated.
pub(crate) async fn find_with<'e, E>(
    executor: E,
    filter: &CardFilter,
    options: &CardFindOptions,
) -> Result<Vec<Card>>
where
    E: PgExecutor<'e>,
{
    let (sql, params) = CardQueryBuilder::new(filter, options).build();

    let mut query = sqlx::query(&sql);
    for param in params {
        query = param.bind_to(query);
    }

    let rows = query
        .fetch_all(executor)
        .await
        .map_err(Error::Database)?;
    Ok(rows.into_iter().map(map_row_to_card).collect())
}

async fn find_one<'e, E>(executor: E, id: CardId) -> Result<Card>
where
    E: PgExecutor<'e>,
{
    find_with(
        executor,
        &CardFilter::new().card_id(id),
        &CardFindOptions::default(),
    )
    .await?
    .into_iter()
    .next()
    .ok_or(Error::CardNotFound(id))
}

/// Lock a card row for the rest of the transaction and return its fields.
pub(crate) async fn lock_card(
    tx: &mut Transaction<'_, Postgres>,
    id: CardId,
) -> Result<CardContent> {
    let row = sqlx::query("SELECT front, back, hint FROM cards WHERE card_id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::CardNotFound(id))?;

    Ok(CardContent {
        front: row.get("front"),
        back: row.get("back"),
        hint: row.get("hint"),
    })
}
