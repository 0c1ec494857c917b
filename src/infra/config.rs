//! Centralized configuration (JSON config file + environment overrides + defaults).
//!
//! The file lives next to the executable as `config.json` unless `LOGEPI_CONFIG`
//! points elsewhere:
//!
//! ```json
//! {
//!   "address": "0.0.0.0",
//!   "port": 6080,
//!   "database": {
//!     "user": "logepi", "password": "secret", "database": "logs",
//!     "host": "db.internal", "port": 5432, "sslmode": "require"
//!   }
//! }
//! ```

use crate::domain::statement::IdentMode;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const CONFIG_PATH_ENV: &str = "LOGEPI_CONFIG";
pub const PORT_ENV: &str = "PORT";

pub const DEFAULT_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 6080;
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_SSL_MODE: SslMode = SslMode::Require;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
/// 10 MiB, the usual form-body cap.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 << 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed getting current location. {0}")]
    Locate(#[source] std::io::Error),
    #[error("Failed reading the configuration file {}. {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed parsing the configuration file {}. {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {field}: {value:?} is not a valid port")]
    InvalidPort { field: &'static str, value: String },
    #[error("invalid sslmode {0:?}")]
    InvalidSslMode(String),
}

/// libpq `sslmode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslMode {
    Disable,
    Allow,
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Allow => "allow",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        }
    }
}

impl FromStr for SslMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "allow" => Ok(SslMode::Allow),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            "verify-ca" => Ok(SslMode::VerifyCa),
            "verify-full" => Ok(SslMode::VerifyFull),
            _ => Err(ConfigError::InvalidSslMode(s.to_string())),
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw file shape. Ports and counts may be written as strings or numbers.
#[derive(Deserialize, Debug, Default)]
struct RawConfig {
    #[serde(default, deserialize_with = "string_or_number")]
    address: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    port: Option<String>,
    #[serde(default)]
    database: RawDatabase,
    #[serde(default)]
    quote_identifiers: bool,
    #[serde(default)]
    max_body_bytes: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
struct RawDatabase {
    #[serde(default, deserialize_with = "string_or_number")]
    user: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    password: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    database: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    host: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    port: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    sslmode: Option<String>,
    #[serde(default)]
    max_connections: Option<u32>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(JsonValue::Number(n)) => Ok(Some(n.to_string())),
        Some(JsonValue::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
    pub ssl_mode: SslMode,
    pub max_connections: u32,
}

impl DatabaseSettings {
    /// libpq-style description with the password masked, safe to log.
    pub fn redacted(&self) -> String {
        format!(
            "user={} password=****** dbname={} host={} port={} sslmode={}",
            self.user, self.database, self.host, self.port, self.ssl_mode
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub address: String,
    pub port: u16,
    pub database: DatabaseSettings,
    pub ident_mode: IdentMode,
    pub max_body_bytes: usize,
}

impl Settings {
    /// `address:port` to bind the HTTP listener on.
    pub fn listen_on(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Loads `.env`, locates the config file and applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let path = config_path()?;
        Self::from_file(&path, std::env::var(PORT_ENV).ok())
    }

    pub fn from_file(path: &Path, env_port: Option<String>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, env_port).map_err(|err| match err {
            ConfigParse::Json(source) => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            ConfigParse::Invalid(err) => err,
        })
    }

    fn from_json(text: &str, env_port: Option<String>) -> Result<Self, ConfigParse> {
        let raw: RawConfig = serde_json::from_str(text).map_err(ConfigParse::Json)?;
        Self::from_raw(raw, env_port).map_err(ConfigParse::Invalid)
    }

    fn from_raw(raw: RawConfig, env_port: Option<String>) -> Result<Self, ConfigError> {
        let configured_port = raw.port.unwrap_or_else(|| DEFAULT_PORT.to_string());
        let port = match env_port.filter(|p| !p.is_empty()) {
            Some(env_port) => {
                tracing::debug!(PORT = %env_port, "Using environment's PORT");
                parse_port("PORT", &env_port)?
            }
            None => parse_port("port", &configured_port)?,
        };

        let db = raw.database;
        let ssl_mode = match db.sslmode {
            Some(mode) => mode.parse::<SslMode>()?,
            None => DEFAULT_SSL_MODE,
        };
        let db_port = match db.port {
            Some(p) => parse_port("database.port", &p)?,
            None => DEFAULT_DB_PORT,
        };

        Ok(Self {
            address: raw.address.unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            port,
            database: DatabaseSettings {
                user: db.user.unwrap_or_default(),
                password: db.password.unwrap_or_default(),
                database: db.database.unwrap_or_default(),
                host: db.host.unwrap_or_default(),
                port: db_port,
                ssl_mode,
                max_connections: db.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS).max(1),
            },
            ident_mode: if raw.quote_identifiers {
                IdentMode::Quoted
            } else {
                IdentMode::Verbatim
            },
            max_body_bytes: raw.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES),
        })
    }
}

enum ConfigParse {
    Json(serde_json::Error),
    Invalid(ConfigError),
}

fn parse_port(field: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort {
        field,
        value: value.to_string(),
    })
}

/// `LOGEPI_CONFIG` if set, else `config.json` beside the executable.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let exe = std::env::current_exe().map_err(ConfigError::Locate)?;
    let dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(dir.join(CONFIG_FILE_NAME))
}
