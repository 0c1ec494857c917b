//! Converts submitted strings to the parameter types Postgres inferred for a
//! statement.
//!
//! sqlx sends every parameter in binary format, so a string bound to an
//! `integer` column is rejected. After `describe` reports the inferred types,
//! each value is parsed into the matching Rust type here. Types with no
//! mapping are sent as text, which works for every type whose binary input
//! is its text form (`text`, `varchar`, `bpchar`, `name`, `json`, enums).

use crate::storage::store::ExecutionError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgTypeInfo;
use sqlx::types::{BigDecimal, Uuid};
use sqlx::TypeInfo;
use std::str::FromStr;

/// One argument, typed for binding.
#[derive(Debug, Clone, PartialEq)]
pub enum PgArg<'a> {
    Text(&'a str),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Numeric(BigDecimal),
    Bool(bool),
    Jsonb(JsonValue),
    Uuid(Uuid),
    Timestamptz(DateTime<Utc>),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
}

/// Parses `value` for a parameter of type `type_info`.
///
/// Unparsable input fails with the same wording Postgres uses for a bad literal.
pub fn convert<'a>(value: &'a str, type_info: &PgTypeInfo) -> Result<PgArg<'a>, ExecutionError> {
    convert_named(value, type_info.name())
}

fn convert_named<'a>(value: &'a str, type_name: &str) -> Result<PgArg<'a>, ExecutionError> {
    let type_name = type_name.to_ascii_uppercase();
    let invalid = || {
        ExecutionError(format!(
            "invalid input syntax for type {}: \"{}\"",
            sql_type_name(&type_name),
            value
        ))
    };
    let trimmed = value.trim();

    let arg = match type_name.as_str() {
        "INT2" => PgArg::Int2(trimmed.parse().map_err(|_| invalid())?),
        "INT4" => PgArg::Int4(trimmed.parse().map_err(|_| invalid())?),
        "INT8" => PgArg::Int8(trimmed.parse().map_err(|_| invalid())?),
        "FLOAT4" => PgArg::Float4(trimmed.parse().map_err(|_| invalid())?),
        "FLOAT8" => PgArg::Float8(trimmed.parse().map_err(|_| invalid())?),
        "NUMERIC" => PgArg::Numeric(BigDecimal::from_str(trimmed).map_err(|_| invalid())?),
        "BOOL" => PgArg::Bool(parse_bool(trimmed).ok_or_else(invalid)?),
        "JSONB" => PgArg::Jsonb(serde_json::from_str(value).map_err(|_| invalid())?),
        "UUID" => PgArg::Uuid(Uuid::parse_str(trimmed).map_err(|_| invalid())?),
        "TIMESTAMPTZ" => PgArg::Timestamptz(parse_timestamptz(trimmed).ok_or_else(invalid)?),
        "TIMESTAMP" => PgArg::Timestamp(parse_timestamp(trimmed).ok_or_else(invalid)?),
        "DATE" => PgArg::Date(NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| invalid())?),
        "TIME" => PgArg::Time(parse_time(trimmed).ok_or_else(invalid)?),
        _ => PgArg::Text(value),
    };
    Ok(arg)
}

fn sql_type_name(type_name: &str) -> &str {
    match type_name {
        "INT2" => "smallint",
        "INT4" => "integer",
        "INT8" => "bigint",
        "FLOAT4" => "real",
        "FLOAT8" => "double precision",
        "NUMERIC" => "numeric",
        "BOOL" => "boolean",
        "JSONB" => "json",
        "UUID" => "uuid",
        "TIMESTAMPTZ" => "timestamp with time zone",
        "TIMESTAMP" => "timestamp without time zone",
        "DATE" => "date",
        "TIME" => "time without time zone",
        other => other,
    }
}

/// Postgres boolean literals: `t`/`true`/`y`/`yes`/`on`/`1` and their false
/// counterparts, case-insensitive, any unambiguous prefix.
fn parse_bool(s: &str) -> Option<bool> {
    let lower = s.to_ascii_lowercase();
    match lower.chars().next()? {
        't' if "true".starts_with(&lower) => Some(true),
        'y' if "yes".starts_with(&lower) => Some(true),
        'f' if "false".starts_with(&lower) => Some(false),
        'n' if "no".starts_with(&lower) => Some(false),
        'o' if lower.len() >= 2 && "on".starts_with(&lower) => Some(true),
        'o' if lower.len() >= 2 && "off".starts_with(&lower) => Some(false),
        '1' if lower == "1" => Some(true),
        '0' if lower == "0" => Some(false),
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Zone-less input is taken as UTC.
fn parse_timestamptz(s: &str) -> Option<DateTime<Utc>> {
    if s.eq_ignore_ascii_case("now") {
        return Some(Utc::now());
    }
    const FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];
    DateTime::parse_from_rfc3339(s)
        .ok()
        .or_else(|| {
            FORMATS
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
        })
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| parse_timestamp(s).map(|naive| naive.and_utc()))
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}
