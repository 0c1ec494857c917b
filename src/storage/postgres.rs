//! Event store implementation using a PostgreSQL connection pool.

use crate::domain::statement::InsertStatement;
use crate::storage::pg_args::{convert, PgArg};
use crate::storage::store::{EventStore, ExecutionError};
use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgTypeInfo};
use sqlx::query::Query;
use sqlx::{Either, Executor, PgPool, Postgres};

/// An event store that uses a PostgreSQL connection pool.
///
/// Column types are never known up front: each insert is described first, and
/// the string arguments are converted to the parameter types the server
/// inferred, so numeric, boolean and timestamp columns accept form values.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn bind_arg<'q>(
    query: Query<'q, Postgres, PgArguments>,
    arg: PgArg<'q>,
) -> Query<'q, Postgres, PgArguments> {
    match arg {
        PgArg::Text(v) => query.bind(v),
        PgArg::Int2(v) => query.bind(v),
        PgArg::Int4(v) => query.bind(v),
        PgArg::Int8(v) => query.bind(v),
        PgArg::Float4(v) => query.bind(v),
        PgArg::Float8(v) => query.bind(v),
        PgArg::Numeric(v) => query.bind(v),
        PgArg::Bool(v) => query.bind(v),
        PgArg::Jsonb(v) => query.bind(v),
        PgArg::Uuid(v) => query.bind(v),
        PgArg::Timestamptz(v) => query.bind(v),
        PgArg::Timestamp(v) => query.bind(v),
        PgArg::Date(v) => query.bind(v),
        PgArg::Time(v) => query.bind(v),
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, statement: &InsertStatement) -> Result<u64, ExecutionError> {
        let mut conn = self.pool.acquire().await?;

        // Unknown tables and columns fail here with the server's own message.
        let described = (&mut *conn).describe(statement.sql()).await?;
        let param_types: Vec<PgTypeInfo> = match described.parameters() {
            Some(Either::Left(types)) => types.to_vec(),
            _ => Vec::new(),
        };

        let mut query = sqlx::query(statement.sql());
        for (idx, value) in statement.args().iter().enumerate() {
            let arg = match param_types.get(idx) {
                Some(type_info) => convert(value, type_info)?,
                None => PgArg::Text(value),
            };
            query = bind_arg(query, arg);
        }

        // RETURNING * yields the inserted row; drain it so the connection goes
        // straight back to the pool.
        let rows = query.fetch_all(&mut *conn).await?;
        Ok(rows.len() as u64)
    }

    async fn ping(&self) -> Result<(), ExecutionError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
