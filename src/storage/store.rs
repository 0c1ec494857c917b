//! The seam between request handling and the database.

use crate::domain::statement::InsertStatement;
use async_trait::async_trait;

/// The store rejected or failed a statement. Carries the database-reported text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ExecutionError(pub String);

impl From<sqlx::Error> for ExecutionError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => ExecutionError(db_err.message().to_string()),
            other => ExecutionError(other.to_string()),
        }
    }
}

/// Executes built statements against shared storage.
///
/// Implementations must be safe to call from many requests at once and must
/// not hold a connection beyond a single call.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Runs one INSERT and returns how many rows it produced.
    async fn insert(&self, statement: &InsertStatement) -> Result<u64, ExecutionError>;

    /// Round-trips to the store without touching any table.
    async fn ping(&self) -> Result<(), ExecutionError>;
}
