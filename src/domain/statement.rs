//! Statement builder: ([`Target`], [`Event`]) -> parameterized INSERT.
//!
//! Values are always bound parameters. Table and column names come from the
//! caller and are written into the SQL text through [`render_ident`], the only
//! place identifiers are emitted.

use crate::domain::event::{Event, Target};

/// Column holding the row's creation time, always the first column.
pub const CREATED_AT_COLUMN: &str = "created_at";

/// How caller-supplied identifiers are written into SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentMode {
    /// Emitted unchanged. Unquoted Postgres identifiers fold to lower case and
    /// may be schema-qualified (`audit.events`).
    #[default]
    Verbatim,
    /// Wrapped in double quotes, embedded quotes doubled. Names are then
    /// case-sensitive and a dot is part of the name.
    Quoted,
}

/// Writes a caller-supplied identifier into SQL text.
///
/// This is NOT a security boundary against a malicious caller: in
/// `Verbatim` mode arbitrary SQL can be smuggled through a table or column
/// name, and even `Quoted` mode lets callers address any table the database
/// role can write to. Whoever can reach `/log/` is trusted.
pub fn render_ident(ident: &str, mode: IdentMode) -> String {
    match mode {
        IdentMode::Verbatim => ident.to_string(),
        IdentMode::Quoted => format!("\"{}\"", ident.replace('"', "\"\"")),
    }
}

/// A built INSERT: SQL text plus positional arguments (`$1` is `args()[0]`).
///
/// Built once per request, executed once, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    sql: String,
    args: Vec<String>,
}

impl InsertStatement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Builds `INSERT INTO <target> (created_at, <cols>) VALUES (now(), $1, …) RETURNING *`.
///
/// Never fails: bad identifiers only surface when the database runs it.
/// Columns follow the event's iteration order.
pub fn build_insert(target: &Target, event: &Event, mode: IdentMode) -> InsertStatement {
    let mut columns = Vec::with_capacity(event.len() + 1);
    let mut placeholders = Vec::with_capacity(event.len() + 1);
    let mut args = Vec::with_capacity(event.len());

    columns.push(CREATED_AT_COLUMN.to_string());
    placeholders.push("now()".to_string());

    for (idx, (name, value)) in event.iter().enumerate() {
        columns.push(render_ident(name, mode));
        placeholders.push(format!("${}", idx + 1));
        args.push(value.to_string());
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        render_ident(target.as_str(), mode),
        columns.join(", "),
        placeholders.join(", ")
    );

    InsertStatement { sql, args }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(name: &str) -> Target {
        Target::new(name).unwrap()
    }

    #[test]
    fn builds_login_event() {
        let event: Event = [("user", "alice"), ("action", "login")].into_iter().collect();
        let stmt = build_insert(&target("events"), &event, IdentMode::Verbatim);
        assert_eq!(
            stmt.sql(),
            "INSERT INTO events (created_at, user, action) VALUES (now(), $1, $2) RETURNING *"
        );
        assert_eq!(stmt.args(), ["alice", "login"]);
    }

    #[test]
    fn column_and_placeholder_counts_track_field_count() {
        for n in 1..=12 {
            let event: Event = (0..n).map(|i| (format!("f{}", i), format!("v{}", i))).collect();
            let stmt = build_insert(&target("t"), &event, IdentMode::Verbatim);

            let open = stmt.sql().find('(').unwrap();
            let close = stmt.sql().find(')').unwrap();
            let columns: Vec<_> = stmt.sql()[open + 1..close].split(", ").collect();
            assert_eq!(columns.len(), n + 1);
            assert_eq!(columns[0], CREATED_AT_COLUMN);

            let values_start = stmt.sql().find("VALUES (").unwrap() + "VALUES (".len();
            let values_end = stmt.sql().rfind(')').unwrap();
            let slots: Vec<_> = stmt.sql()[values_start..values_end].split(", ").collect();
            assert_eq!(slots.len(), n + 1);
            assert_eq!(slots[0], "now()");

            for i in 1..=n {
                assert_eq!(slots[i], format!("${}", i));
                assert_eq!(columns[i], format!("f{}", i - 1));
                assert_eq!(stmt.args()[i - 1], format!("v{}", i - 1));
            }
        }
    }

    #[test]
    fn values_never_reach_sql_text() {
        let event: Event = [("note", "'); DROP TABLE events; --")].into_iter().collect();
        let stmt = build_insert(&target("events"), &event, IdentMode::Verbatim);
        assert!(!stmt.sql().contains("DROP"));
        assert_eq!(stmt.args(), ["'); DROP TABLE events; --"]);
    }

    #[test]
    fn same_input_gives_same_text() {
        let event: Event = [("b", "1"), ("a", "2")].into_iter().collect();
        let first = build_insert(&target("events"), &event, IdentMode::Verbatim);
        let second = build_insert(&target("events"), &event, IdentMode::Verbatim);
        assert_eq!(first, second);
    }

    #[test]
    fn quoted_mode_quotes_every_identifier() {
        let event: Event = [("User", "alice"), ("we\"ird", "x")].into_iter().collect();
        let stmt = build_insert(&target("Events"), &event, IdentMode::Quoted);
        assert_eq!(
            stmt.sql(),
            "INSERT INTO \"Events\" (created_at, \"User\", \"we\"\"ird\") VALUES (now(), $1, $2) RETURNING *"
        );
    }

    #[test]
    fn verbatim_mode_keeps_schema_qualified_names() {
        assert_eq!(render_ident("audit.events", IdentMode::Verbatim), "audit.events");
        assert_eq!(render_ident("a\"b", IdentMode::Quoted), "\"a\"\"b\"");
    }
}
