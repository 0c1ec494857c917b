//! The ingestion pipeline: extract -> build -> execute -> classify.
//!
//! Transport independent. The HTTP handler checks the method, resolves the
//! target and reads the body, then hands over to [`ingest`].

use crate::domain::event::Target;
use crate::domain::extract::{extract_event, ExtractionError};
use crate::domain::statement::{build_insert, IdentMode};
use crate::storage::EventStore;

/// Result of one ingestion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    /// Bad input; nothing reached the database.
    ClientError(String),
    /// The database rejected or failed the statement.
    ServerError(String),
}

impl From<ExtractionError> for ExecutionOutcome {
    fn from(err: ExtractionError) -> Self {
        ExecutionOutcome::ClientError(err.to_string())
    }
}

/// Runs one event through the pipeline. Exactly one statement is issued when
/// extraction succeeds, none otherwise. Failures are not retried.
pub async fn ingest(
    store: &dyn EventStore,
    ident_mode: IdentMode,
    target: &Target,
    body: &[u8],
    content_type: Option<&str>,
    client: &str,
) -> ExecutionOutcome {
    let event = match extract_event(body, content_type) {
        Ok(event) => event,
        Err(ExtractionError::Empty) => {
            tracing::info!(ip = %client, target = %target, "Empty request received");
            return ExtractionError::Empty.into();
        }
        Err(err) => {
            tracing::info!(ip = %client, target = %target, error = %err, "Malformed POST request");
            return err.into();
        }
    };

    let statement = build_insert(target, &event, ident_mode);

    match store.insert(&statement).await {
        Ok(rows) => {
            tracing::info!(
                ip = %client,
                query = %statement.sql(),
                values = ?statement.args(),
                rows,
                "Successfully added log entry"
            );
            ExecutionOutcome::Success
        }
        Err(err) => {
            tracing::error!(
                ip = %client,
                query = %statement.sql(),
                error = %err,
                "Query error"
            );
            ExecutionOutcome::ServerError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extract::FORM_CONTENT_TYPE;
    use crate::domain::statement::InsertStatement;
    use crate::storage::ExecutionError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<InsertStatement>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl EventStore for Recorder {
        async fn insert(&self, statement: &InsertStatement) -> Result<u64, ExecutionError> {
            self.seen.lock().unwrap().push(statement.clone());
            match &self.fail_with {
                Some(msg) => Err(ExecutionError(msg.clone())),
                None => Ok(1),
            }
        }

        async fn ping(&self) -> Result<(), ExecutionError> {
            Ok(())
        }
    }

    fn events() -> Target {
        Target::new("events").unwrap()
    }

    #[tokio::test]
    async fn successful_event_issues_one_statement() {
        let store = Recorder::default();
        let outcome = ingest(
            &store,
            IdentMode::Verbatim,
            &events(),
            b"user=alice&action=login",
            Some(FORM_CONTENT_TYPE),
            "127.0.0.1",
        )
        .await;

        assert_eq!(outcome, ExecutionOutcome::Success);
        let seen = store.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].args(), ["alice", "login"]);
    }

    #[tokio::test]
    async fn empty_event_never_reaches_store() {
        let store = Recorder::default();
        let outcome = ingest(
            &store,
            IdentMode::Verbatim,
            &events(),
            b"",
            Some(FORM_CONTENT_TYPE),
            "127.0.0.1",
        )
        .await;

        assert_eq!(outcome, ExecutionOutcome::ClientError("Empty request".to_string()));
        assert!(store.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_never_reaches_store() {
        let store = Recorder::default();
        let outcome = ingest(
            &store,
            IdentMode::Verbatim,
            &events(),
            b"a=%zz",
            Some(FORM_CONTENT_TYPE),
            "127.0.0.1",
        )
        .await;

        assert!(matches!(outcome, ExecutionOutcome::ClientError(_)));
        assert!(store.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_a_server_error_with_reason() {
        let store = Recorder {
            fail_with: Some("relation \"nope\" does not exist".to_string()),
            ..Default::default()
        };
        let outcome = ingest(
            &store,
            IdentMode::Verbatim,
            &Target::new("nope").unwrap(),
            b"a=1",
            Some(FORM_CONTENT_TYPE),
            "127.0.0.1",
        )
        .await;

        assert_eq!(
            outcome,
            ExecutionOutcome::ServerError("relation \"nope\" does not exist".to_string())
        );
        assert_eq!(store.seen.lock().unwrap().len(), 1);
    }
}
