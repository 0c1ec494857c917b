//! Connection provider: turns [`DatabaseSettings`] into a live `PgPool`.

use crate::infra::config::{DatabaseSettings, SslMode, DEFAULT_SSL_MODE};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::time::Duration;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

fn pg_ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Allow => PgSslMode::Allow,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
        SslMode::VerifyCa => PgSslMode::VerifyCa,
        SslMode::VerifyFull => PgSslMode::VerifyFull,
    }
}

/// Connect options equivalent to
/// `user=… password=… dbname=… host=… port=… sslmode=…`.
///
/// Empty settings are left to libpq-style environment defaults (`PGUSER`, ...).
pub fn connect_options(settings: &DatabaseSettings) -> PgConnectOptions {
    let mut options = PgConnectOptions::new()
        .port(settings.port)
        .ssl_mode(pg_ssl_mode(settings.ssl_mode))
        .application_name("logepi");
    if !settings.host.is_empty() {
        options = options.host(&settings.host);
    }
    if !settings.user.is_empty() {
        options = options.username(&settings.user);
    }
    if !settings.password.is_empty() {
        options = options.password(&settings.password);
    }
    if !settings.database.is_empty() {
        options = options.database(&settings.database);
    }
    options
}

/// Opens the process-wide pool. Establishes a connection before returning, so an
/// unreachable database fails here rather than on the first request.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    if settings.ssl_mode != DEFAULT_SSL_MODE {
        tracing::warn!(
            sslmode = %settings.ssl_mode,
            "Warning - Using non require sslmode for DB connection"
        );
    }
    tracing::debug!(connection = %settings.redacted(), "Database connection string");

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(connect_options(settings))
        .await
}
