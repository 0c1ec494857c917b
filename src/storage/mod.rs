pub mod pg_args;
pub mod postgres;
pub mod store;

pub use postgres::PgEventStore;
pub use store::{EventStore, ExecutionError};
