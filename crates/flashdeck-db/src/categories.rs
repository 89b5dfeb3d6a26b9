//! Category repository implementation.
//!
//! A category is a name plus a tag set. Its cards are found by requiring
//! every category tag, so category membership follows card tags without
//! any category/card link table.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgExecutor, PgRow};
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::info;

use flashdeck_core::{
    Card, CardFilter, CardFindOptions, Category, CategoryId, CategoryRepository,
    CreateCategoryRequest, Error, Result, TagLabel, UpdateCategoryRequest,
};

use crate::cards::find_with;
use crate::tag_sync::{reconcile_tx, TagLink};
use crate::transaction::finish;

const CATEGORY_SELECT: &str = r#"
SELECT
    c.category_id,
    c.name,
    COALESCE(
        array_agg(t.tag ORDER BY t.tag) FILTER (WHERE t.tag_id IS NOT NULL),
        ARRAY[]::text[]
    ) AS tags
FROM categories c
LEFT JOIN category_tags ct ON ct.category_id = c.category_id
LEFT JOIN tags t ON t.tag_id = ct.tag_id
"#;

/// PostgreSQL implementation of CategoryRepository.
#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: Pool<Postgres>,
}

impl PgCategoryRepository {
    /// Create a new PgCategoryRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Cards carrying every tag of the category.
    ///
    /// `options.tags_all` narrows further; the category's own tags are
    /// added to it. An untagged category matches every card.
    pub async fn cards(&self, id: CategoryId, options: &CardFindOptions) -> Result<Vec<Card>> {
        let category = self.get(id).await?;

        let mut tags_all = options.tags_all.clone();
        tags_all.extend(category.labels());
        let options = CardFindOptions {
            tags_all,
            ..options.clone()
        }
        .validated()?;

        find_with(&self.pool, &CardFilter::new(), &options).await
    }

    pub async fn create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        req: CreateCategoryRequest,
    ) -> Result<Category> {
        let labels = req.validate()?;

        let category_id: CategoryId =
            sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING category_id")
                .bind(req.name.trim())
                .fetch_one(&mut **tx)
                .await
                .map_err(name_conflict)?;

        reconcile_tx(tx, TagLink::Category, category_id, &labels).await?;
        let category = find_one(&mut **tx, category_id).await?;

        info!(
            subsystem = "database",
            component = "categories",
            op = "create",
            category_id,
            tag_count = category.tags.len(),
            "Category created"
        );
        Ok(category)
    }

    pub async fn update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: CategoryId,
        req: UpdateCategoryRequest,
    ) -> Result<Category> {
        let labels = req.validate()?;
        lock_category(tx, id).await?;

        if let Some(name) = &req.name {
            sqlx::query(
                "UPDATE categories SET name = $1, updated_at_utc = $2 WHERE category_id = $3",
            )
            .bind(name.trim())
            .bind(Utc::now())
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(name_conflict)?;
        }

        if let Some(labels) = labels {
            reconcile_tx(tx, TagLink::Category, id, &labels).await?;
        }

        find_one(&mut **tx, id).await
    }

    pub async fn delete_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: CategoryId,
    ) -> Result<u64> {
        lock_category(tx, id).await?;

        let deleted = sqlx::query("DELETE FROM categories WHERE category_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        if deleted == 0 {
            return Err(Error::Server(format!(
                "delete of category {} affected no rows",
                id
            )));
        }
        Ok(deleted)
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn create(&self, req: CreateCategoryRequest) -> Result<Category> {
        req.validate()?;
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = self.create_tx(&mut tx, req).await;
        finish(tx, result).await
    }

    async fn get(&self, id: CategoryId) -> Result<Category> {
        find_one(&self.pool, id).await
    }

    async fn list(&self) -> Result<Vec<Category>> {
        let sql = format!("{} GROUP BY c.category_id ORDER BY c.name", CATEGORY_SELECT);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.into_iter().map(map_row_to_category).collect())
    }

    async fn update(&self, id: CategoryId, req: UpdateCategoryRequest) -> Result<Category> {
        req.validate()?;
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = self.update_tx(&mut tx, id, req).await;
        finish(tx, result).await
    }

    async fn delete(&self, id: CategoryId) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let result = self.delete_tx(&mut tx, id).await;
        finish(tx, result).await
    }
}

fn map_row_to_category(row: PgRow) -> Category {
    let tags: Vec<String> = row.get("tags");
    Category {
        category_id: row.get("category_id"),
        name: row.get("name"),
        tags: tags.into_iter().map(TagLabel::from).collect(),
    }
}

async fn find_one<'e, E>(executor: E, id: CategoryId) -> Result<Category>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "{} WHERE c.category_id = $1 GROUP BY c.category_id",
        CATEGORY_SELECT
    );
    sqlx::query(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(Error::Database)?
        .map(map_row_to_category)
        .ok_or(Error::CategoryNotFound(id))
}

async fn lock_category(tx: &mut Transaction<'_, Postgres>, id: CategoryId) -> Result<()> {
    sqlx::query("SELECT 1 FROM categories WHERE category_id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::CategoryNotFound(id))?;
    Ok(())
}

fn name_conflict(err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Error::Conflict("A category with this name already exists".to_string())
        }
        _ => Error::Database(err),
    }
}
