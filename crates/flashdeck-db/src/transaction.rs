//! Commit-or-rollback for repository transactions.

use sqlx::{Postgres, Transaction};
use tracing::warn;

use flashdeck_core::{Error, Result};

/// Commit `tx` if `result` is `Ok`, otherwise roll it back and return the
/// original error.
///
/// A failed rollback is logged and never replaces the original error.
pub(crate) async fn finish<T>(tx: Transaction<'_, Postgres>, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            tx.commit().await.map_err(Error::Database)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(
                    subsystem = "database",
                    component = "transaction",
                    op = "rollback",
                    error = %rollback_err,
                    cause = %err,
                    "Rollback failed"
                );
            }
            Err(err)
        }
    }
}
