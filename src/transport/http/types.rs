use crate::app::ingest::ExecutionOutcome;
use crate::domain::statement::IdentMode;
use crate::infra::config::{Settings, DEFAULT_MAX_BODY_BYTES};
use crate::storage::EventStore;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub ident_mode: IdentMode,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            ident_mode: IdentMode::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn from_settings(store: Arc<dyn EventStore>, settings: &Settings) -> Self {
        Self {
            store,
            ident_mode: settings.ident_mode,
            max_body_bytes: settings.max_body_bytes,
        }
    }
}

pub const SUCCESS_BODY: &str = "OK";

/// Plain-text `ERROR|<reason>` body.
pub fn error_response(status: StatusCode, reason: &str) -> Response {
    (status, format!("ERROR|{}", reason)).into_response()
}

impl IntoResponse for ExecutionOutcome {
    fn into_response(self) -> Response {
        match self {
            ExecutionOutcome::Success => (StatusCode::OK, SUCCESS_BODY).into_response(),
            ExecutionOutcome::ClientError(reason) => {
                error_response(StatusCode::BAD_REQUEST, &reason)
            }
            ExecutionOutcome::ServerError(reason) => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, &reason)
            }
        }
    }
}
