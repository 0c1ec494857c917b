pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::ingest::{ingest, ExecutionOutcome};
pub use domain::event::{Event, Target};
pub use domain::extract::{extract_event, ExtractionError};
pub use domain::statement::{build_insert, render_ident, IdentMode, InsertStatement};
pub use infra::config::Settings;
pub use storage::{EventStore, ExecutionError, PgEventStore};
