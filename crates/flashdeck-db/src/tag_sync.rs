//! Tag set reconciliation.
//!
//! Makes the set of tags linked to one owner (a card or a category) equal to
//! a target label set, inside the caller's transaction:
//!
//! 1. every target label is resolved to a tag id, creating missing tags;
//! 2. every target tag is linked to the owner, skipping existing links;
//! 3. links to tags outside the target set are removed.
//!
//! The steps run in that order. Tags themselves are never deleted, even
//! when nothing references them any more.
//!
//! Labels are resolved one statement at a time in sorted order with
//! `INSERT .. ON CONFLICT (tag) DO UPDATE .. RETURNING`. Two writers adding
//! the same new label both end up with the single row the unique constraint
//! allows, and concurrent reconciliations take row locks in the same order.

use std::time::Instant;

use sqlx::postgres::PgExecutor;
use sqlx::{Postgres, Row, Transaction};
use tracing::debug;

use flashdeck_core::{normalize_labels, Error, Result, TagId, TagSyncSummary};

/// Owner kind whose tag links are being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagLink {
    Card,
    Category,
}

const UPSERT_TAG_SQL: &str = r#"
INSERT INTO tags (tag)
VALUES ($1)
ON CONFLICT (tag) DO UPDATE SET tag = EXCLUDED.tag
RETURNING tag_id, (xmax = 0) AS inserted
"#;

impl TagLink {
    /// Association table name.
    pub fn table(self) -> &'static str {
        match self {
            TagLink::Card => "card_tags",
            TagLink::Category => "category_tags",
        }
    }

    fn insert_links_sql(self) -> &'static str {
        match self {
            TagLink::Card => {
                "INSERT INTO card_tags (card_id, tag_id)
                 SELECT $1, ids.tag_id FROM unnest($2::bigint[]) AS ids(tag_id)
                 ON CONFLICT (card_id, tag_id) DO NOTHING"
            }
            TagLink::Category => {
                "INSERT INTO category_tags (category_id, tag_id)
                 SELECT $1, ids.tag_id FROM unnest($2::bigint[]) AS ids(tag_id)
                 ON CONFLICT (category_id, tag_id) DO NOTHING"
            }
        }
    }

    fn count_links_sql(self) -> &'static str {
        match self {
            TagLink::Card => {
                "SELECT COUNT(*) FROM card_tags
                 WHERE card_id = $1 AND tag_id = ANY($2::bigint[])"
            }
            TagLink::Category => {
                "SELECT COUNT(*) FROM category_tags
                 WHERE category_id = $1 AND tag_id = ANY($2::bigint[])"
            }
        }
    }

    fn delete_stale_sql(self) -> &'static str {
        match self {
            TagLink::Card => {
                "DELETE FROM card_tags
                 WHERE card_id = $1 AND tag_id <> ALL($2::bigint[])"
            }
            TagLink::Category => {
                "DELETE FROM category_tags
                 WHERE category_id = $1 AND tag_id <> ALL($2::bigint[])"
            }
        }
    }

    fn labels_sql(self) -> &'static str {
        match self {
            TagLink::Card => {
                "SELECT t.tag FROM card_tags l
                 JOIN tags t ON t.tag_id = l.tag_id
                 WHERE l.card_id = $1
                 ORDER BY t.tag"
            }
            TagLink::Category => {
                "SELECT t.tag FROM category_tags l
                 JOIN tags t ON t.tag_id = l.tag_id
                 WHERE l.category_id = $1
                 ORDER BY t.tag"
            }
        }
    }
}

/// Reconcile the owner's tag links to exactly `labels`.
///
/// Labels are normalized first, so duplicates collapse and an invalid label
/// fails with a validation error before any statement runs. Any storage
/// failure is returned unchanged; the caller's transaction is then expected
/// to roll back, leaving the prior links in place.
///
/// The caller must already hold a lock on (or have just created) the owner
/// row.
pub(crate) async fn reconcile_tx(
    tx: &mut Transaction<'_, Postgres>,
    link: TagLink,
    owner_id: i64,
    labels: &[String],
) -> Result<TagSyncSummary> {
    let start = Instant::now();
    let labels = normalize_labels("tags", labels)?;
    let mut summary = TagSyncSummary::default();

    let mut tag_ids: Vec<TagId> = Vec::with_capacity(labels.len());
    for label in &labels {
        let row = sqlx::query(UPSERT_TAG_SQL)
            .bind(label)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::Server(format!("tag upsert for '{}' returned no row", label)))?;

        if row.get::<bool, _>("inserted") {
            summary.tags_created += 1;
        }
        tag_ids.push(row.get("tag_id"));
    }

    if !tag_ids.is_empty() {
        summary.links_added = sqlx::query(link.insert_links_sql())
            .bind(owner_id)
            .bind(&tag_ids)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        let linked: i64 = sqlx::query_scalar(link.count_links_sql())
            .bind(owner_id)
            .bind(&tag_ids)
            .fetch_one(&mut **tx)
            .await
            .map_err(Error::Database)?;

        if linked as usize != tag_ids.len() {
            return Err(Error::Server(format!(
                "{} for {} holds {} of {} target tags after insert",
                link.table(),
                owner_id,
                linked,
                tag_ids.len()
            )));
        }
    }

    summary.links_removed = sqlx::query(link.delete_stale_sql())
        .bind(owner_id)
        .bind(&tag_ids)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?
        .rows_affected();

    debug!(
        subsystem = "database",
        component = "tag_sync",
        op = "reconcile",
        table = link.table(),
        owner_id,
        target_count = labels.len(),
        tags_created = summary.tags_created,
        links_added = summary.links_added,
        links_removed = summary.links_removed,
        duration_ms = start.elapsed().as_millis() as u64,
        "Tag links reconciled"
    );

    Ok(summary)
}

/// Labels currently linked to the owner, sorted.
pub(crate) async fn load_labels<'e, E>(
    executor: E,
    link: TagLink,
    owner_id: i64,
) -> Result<Vec<String>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, String>(link.labels_sql())
        .bind(owner_id)
        .fetch_all(executor)
        .await
        .map_err(Error::Database)
}
