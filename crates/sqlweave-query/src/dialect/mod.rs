//! Target dialects.
//!
//! A dialect supplies identifier quoting, literal formatting, LIKE escaping
//! and the builder overrides it needs on top of the default registry.

mod mssql;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sqlweave_core::Value;

use crate::registry::BuilderRegistry;

pub use mysql::MysqlJsonBuilder;
pub use postgres::{PgArrayBuilder, PgJsonBuilder, PgStructuredBuilder};

/// Identifier quoting collaborator.
pub trait Quoter {
    /// Quote a (possibly qualified) column name.
    fn quote_column(&self, name: &str) -> String;

    /// Quote a (possibly qualified) table name.
    fn quote_table(&self, name: &str) -> String;
}

/// Literal formatting collaborator.
pub trait ValueFormatter {
    /// Render a scalar inline instead of binding it.
    ///
    /// Returning `None` binds the value to a placeholder.
    fn inline_literal(&self, value: &Value) -> Option<String> {
        let _ = value;
        None
    }
}

/// A target SQL dialect.
pub trait SqlDialect: Quoter + ValueFormatter + fmt::Debug + Send + Sync {
    /// Human-readable dialect name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Default LIKE escaping for this dialect.
    fn like_escape(&self) -> LikeEscape {
        LikeEscape::backslash()
    }

    /// Positional placeholder for the given parameter index (1-based).
    fn positional_placeholder(&self, index: usize) -> String {
        let _ = index;
        "?".to_string()
    }

    /// Row limiting clause appended to a SELECT, with a leading space.
    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        default_limit_clause(limit, offset)
    }

    /// ORDER BY term to emit when a limited SELECT has no ordering of its
    /// own, for dialects whose row limiting requires one.
    fn unordered_paging_term(&self) -> Option<&'static str> {
        None
    }

    /// Whether `[...]` quotes an identifier, so placeholders inside it are text.
    fn bracket_identifiers(&self) -> bool {
        false
    }

    /// Install dialect-specific builders into the registry.
    fn register_builders(&self, registry: &mut BuilderRegistry) {
        let _ = registry;
    }
}

// ==================== LIKE Escaping ====================

/// Character map applied to LIKE pattern values before wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeEscape {
    /// Replacement for each special character (keys are single characters)
    pub map: BTreeMap<String, String>,
    /// Character named in an `ESCAPE '<c>'` clause, if the dialect needs one
    #[serde(default)]
    pub escape_char: Option<char>,
}

impl LikeEscape {
    /// Build an escape map from `(character, replacement)` pairs.
    pub fn new<'a>(pairs: impl IntoIterator<Item = (char, &'a str)>) -> Self {
        Self {
            map: pairs
                .into_iter()
                .map(|(c, replacement)| (c.to_string(), replacement.to_string()))
                .collect(),
            escape_char: None,
        }
    }

    /// Backslash escaping of `%`, `_` and `\`.
    pub fn backslash() -> Self {
        Self::new([('%', "\\%"), ('_', "\\_"), ('\\', "\\\\")])
    }

    /// No escaping at all.
    pub fn none() -> Self {
        Self {
            map: BTreeMap::new(),
            escape_char: None,
        }
    }

    /// Set the character named in the `ESCAPE` clause.
    #[must_use]
    pub fn with_escape_char(mut self, c: char) -> Self {
        self.escape_char = Some(c);
        self
    }

    /// Apply the map to a value, one character at a time.
    pub fn escape(&self, value: &str) -> String {
        if self.map.is_empty() {
            return value.to_string();
        }
        let mut out = String::with_capacity(value.len() + 4);
        let mut buf = [0u8; 4];
        for c in value.chars() {
            let key: &str = c.encode_utf8(&mut buf);
            match self.map.get(key) {
                Some(replacement) => out.push_str(replacement),
                None => out.push(c),
            }
        }
        out
    }

    /// The ` ESCAPE '<c>'` suffix, or an empty string.
    pub fn clause(&self) -> String {
        match self.escape_char {
            Some(c) if !self.map.is_empty() => format!(" ESCAPE '{c}'"),
            _ => String::new(),
        }
    }

    /// Check that every key is a single character and the escape character
    /// can be written inside a quoted literal.
    pub fn validate(&self) -> Result<(), String> {
        for key in self.map.keys() {
            if key.chars().count() != 1 {
                return Err(format!("escape map key {key:?} must be a single character"));
            }
        }
        if self.escape_char == Some('\'') {
            return Err("escape character cannot be a single quote".to_string());
        }
        Ok(())
    }
}

impl Default for LikeEscape {
    fn default() -> Self {
        Self::backslash()
    }
}

// ==================== Built-in Dialects ====================

/// Built-in SQL dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL (`$1` placeholders, native ILIKE and ARRAY)
    #[default]
    Postgres,
    /// MySQL / MariaDB (`?` placeholders, backtick quoting)
    Mysql,
    /// SQLite (`?1` placeholders)
    Sqlite,
    /// Microsoft SQL Server (`@P1` placeholders, bracket quoting)
    Mssql,
    /// Oracle (`:1` placeholders)
    Oracle,
}

impl Dialect {
    /// All built-in dialects.
    pub const ALL: [Dialect; 5] = [
        Dialect::Postgres,
        Dialect::Mysql,
        Dialect::Sqlite,
        Dialect::Mssql,
        Dialect::Oracle,
    ];

    /// Check if this dialect supports ILIKE.
    pub const fn supports_ilike(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Quote a single identifier segment for this dialect.
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite | Dialect::Oracle => {
                sqlweave_core::quote_ident(name)
            }
            Dialect::Mysql => sqlweave_core::quote_ident_mysql(name),
            Dialect::Mssql => sqlweave_core::quote_ident_mssql(name),
        }
    }

    const fn open_quote(self) -> char {
        match self {
            Dialect::Postgres | Dialect::Sqlite | Dialect::Oracle => '"',
            Dialect::Mysql => '`',
            Dialect::Mssql => '[',
        }
    }
}

impl Quoter for Dialect {
    fn quote_column(&self, name: &str) -> String {
        sqlweave_core::quote_qualified(name, self.open_quote(), |segment| {
            self.quote_identifier(segment)
        })
    }

    fn quote_table(&self, name: &str) -> String {
        self.quote_column(name)
    }
}

impl ValueFormatter for Dialect {
    fn inline_literal(&self, value: &Value) -> Option<String> {
        match (self, value) {
            (Dialect::Mssql | Dialect::Oracle, Value::Bool(b)) => {
                Some(if *b { "1" } else { "0" }.to_string())
            }
            _ => None,
        }
    }
}

impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Mssql => "mssql",
            Dialect::Oracle => "oracle",
        }
    }

    fn like_escape(&self) -> LikeEscape {
        match self {
            Dialect::Postgres | Dialect::Mysql => LikeEscape::backslash(),
            Dialect::Sqlite => sqlite::like_escape(),
            Dialect::Mssql => mssql::like_escape(),
            Dialect::Oracle => oracle::like_escape(),
        }
    }

    fn positional_placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite => format!("?{index}"),
            Dialect::Mysql => "?".to_string(),
            Dialect::Mssql => format!("@P{index}"),
            Dialect::Oracle => format!(":{index}"),
        }
    }

    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match self {
            Dialect::Mssql | Dialect::Oracle => offset_fetch_clause(limit, offset),
            Dialect::Mysql => match (limit, offset) {
                // MySQL has no "no limit" marker; the documented idiom is the max u64.
                (None, Some(offset)) => format!(" LIMIT 18446744073709551615 OFFSET {offset}"),
                _ => default_limit_clause(limit, offset),
            },
            Dialect::Postgres => match (limit, offset) {
                (None, Some(offset)) => format!(" OFFSET {offset}"),
                _ => default_limit_clause(limit, offset),
            },
            Dialect::Sqlite => default_limit_clause(limit, offset),
        }
    }

    fn unordered_paging_term(&self) -> Option<&'static str> {
        match self {
            // OFFSET/FETCH is a clause of ORDER BY on SQL Server.
            Dialect::Mssql => Some("(SELECT NULL)"),
            _ => None,
        }
    }

    fn bracket_identifiers(&self) -> bool {
        matches!(self, Dialect::Mssql)
    }

    fn register_builders(&self, registry: &mut BuilderRegistry) {
        match self {
            Dialect::Postgres => postgres::register(registry),
            Dialect::Mysql => mysql::register(registry),
            Dialect::Sqlite => sqlite::register(registry),
            Dialect::Mssql => mssql::register(registry),
            Dialect::Oracle => oracle::register(registry),
        }
    }
}

fn default_limit_clause(limit: Option<u64>, offset: Option<u64>) -> String {
    match (limit, offset) {
        (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
        (Some(limit), None) => format!(" LIMIT {limit}"),
        (None, Some(offset)) => format!(" LIMIT -1 OFFSET {offset}"),
        (None, None) => String::new(),
    }
}

/// `OFFSET n ROWS FETCH NEXT m ROWS ONLY` (SQL:2008).
fn offset_fetch_clause(limit: Option<u64>, offset: Option<u64>) -> String {
    if limit.is_none() && offset.is_none() {
        return String::new();
    }
    let mut clause = format!(" OFFSET {} ROWS", offset.unwrap_or(0));
    if let Some(limit) = limit {
        clause.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
    }
    clause
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
