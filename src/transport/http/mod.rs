pub mod router;
pub mod types;
pub mod handlers {
    pub mod health;
    pub mod ingest;
}

pub use router::{build_app, create_router, ApiDoc};
pub use types::AppState;
