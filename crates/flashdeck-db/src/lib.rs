//! # flashdeck-db
//!
//! PostgreSQL storage layer for flashdeck.
//!
//! This crate provides:
//! - Connection pool management
//! - Card persistence with transactional tag reconciliation
//! - Card finds by field equality, required/excluded tags, and pagination
//! - Tag listing and flat categories
//!
//! ## Example
//!
//! ```rust,ignore
//! use flashdeck_db::{CardRepository, CreateCardRequest, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/flashdeck").await?;
//!
//!     let card = db.cards.insert(CreateCardRequest {
//!         front: "2 + 2".to_string(),
//!         back: "4".to_string(),
//!         hint: None,
//!         tags: vec!["math".to_string()],
//!     }).await?;
//!
//!     println!("Created card: {}", card.card_id);
//!     Ok(())
//! }
//! ```
pub mod card_query;
pub mod cards;
pub mod categories;
pub mod pool;
pub mod tag_sync;
pub mod tags;
mod transaction;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use flashdeck_core::*;

pub use card_query::{CardQueryBuilder, QueryParam};
pub use cards::PgCardRepository;
pub use categories::PgCategoryRepository;
pub use pool::{
    create_lazy_pool, create_pool, create_pool_with_config, log_pool_metrics, PoolConfig,
};
pub use tag_sync::TagLink;
pub use tags::PgTagRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub cards: PgCardRepository,
    pub tags: PgTagRepository,
    pub categories: PgCategoryRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            cards: PgCardRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            categories: PgCategoryRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Create without connecting; the first query opens a connection.
    pub fn connect_lazy(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_lazy_pool(url, config)?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }
}
