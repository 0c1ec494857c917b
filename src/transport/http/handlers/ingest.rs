use crate::app::ingest::{ingest, ExecutionOutcome};
use crate::domain::event::Target;
use crate::transport::http::types::AppState;
use axum::extract::rejection::PathRejection;
use axum::extract::{ConnectInfo, Path, Request, State};
use axum::http::header::{CONTENT_TYPE, LOCATION, USER_AGENT};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use std::net::SocketAddr;

pub const WRONG_METHOD_REASON: &str = "Please use POST request";
pub const MISSING_TARGET_REASON: &str = "Missing target table";

#[utoipa::path(
    post,
    path = "/log/{target}",
    params(
        ("target" = String, Path, description = "Destination table; every submitted field becomes a column")
    ),
    request_body(
        content = String,
        content_type = "application/x-www-form-urlencoded",
        description = "One event as field=value pairs"
    ),
    responses(
        (status = 200, description = "Row inserted", body = String),
        (status = 400, description = "Wrong method, malformed body or no fields", body = String),
        (status = 500, description = "Database rejected the insert", body = String)
    )
)]
pub async fn ingest_handler(
    State(state): State<AppState>,
    target: Result<Path<String>, PathRejection>,
    request: Request,
) -> Response {
    // Undecodable segments are reported after the method check, like any other bad input.
    let target = match target {
        Ok(Path(name)) => Target::new(name).ok_or_else(|| MISSING_TARGET_REASON.to_string()),
        Err(rejection) => Err(rejection.body_text()),
    };
    handle(state, target, request).await
}

/// `/log/` with nothing after it.
pub async fn ingest_without_target_handler(
    State(state): State<AppState>,
    request: Request,
) -> Response {
    handle(state, Err(MISSING_TARGET_REASON.to_string()), request).await
}

/// `/log` redirects to `/log/`, as a subtree mount would.
pub async fn ingest_root_redirect_handler() -> Response {
    (StatusCode::MOVED_PERMANENTLY, [(LOCATION, "/log/")]).into_response()
}

/// `target` is the decoded table name, or the reason it could not be resolved.
async fn handle(state: AppState, target: Result<Target, String>, request: Request) -> Response {
    let client = client_addr(&request);
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    tracing::info!(
        time = %Utc::now().to_rfc3339(),
        ip = %client,
        user_agent = %user_agent,
        "Log access"
    );

    if request.method() != Method::POST {
        tracing::info!(ip = %client, method = %request.method(), "Rejected non-POST request");
        return ExecutionOutcome::ClientError(WRONG_METHOD_REASON.to_string()).into_response();
    }

    let target = match target {
        Ok(target) => target,
        Err(reason) => {
            tracing::info!(ip = %client, reason = %reason, "Unusable target table");
            return ExecutionOutcome::ClientError(reason).into_response();
        }
    };

    let content_type = match request.headers().get(CONTENT_TYPE) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(ct) => Some(ct.to_string()),
            Err(_) => {
                return ExecutionOutcome::ClientError("invalid Content-Type header".to_string())
                    .into_response();
            }
        },
    };

    let body = match axum::body::to_bytes(request.into_body(), state.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            tracing::info!(ip = %client, error = %e, "Unreadable POST body");
            return ExecutionOutcome::ClientError(format!(
                "request body too large or unreadable: {}",
                e
            ))
            .into_response();
        }
    };

    ingest(
        state.store.as_ref(),
        state.ident_mode,
        &target,
        &body,
        content_type.as_deref(),
        &client,
    )
    .await
    .into_response()
}

fn client_addr(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
