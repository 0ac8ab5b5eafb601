//! SQL identifier quoting utilities.
//!
//! This module provides functions for safely quoting SQL identifiers
//! (table names, column names, etc.) to prevent SQL injection and
//! handle special characters.

/// Quote a SQL identifier using ANSI double-quoting.
///
/// Embedded double-quotes are escaped by doubling them (`"` → `""`).
///
/// # Examples
///
/// ```
/// use sqlweave_core::quote_ident;
///
/// assert_eq!(quote_ident("users"), "\"users\"");
/// assert_eq!(quote_ident("user\"name"), "\"user\"\"name\"");
/// ```
#[inline]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a SQL identifier using MySQL backtick quoting.
///
/// # Examples
///
/// ```
/// use sqlweave_core::quote_ident_mysql;
///
/// assert_eq!(quote_ident_mysql("users"), "`users`");
/// assert_eq!(quote_ident_mysql("user`name"), "`user``name`");
/// ```
#[inline]
pub fn quote_ident_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a SQL identifier using SQL Server bracket quoting.
///
/// Embedded closing brackets are doubled (`]` → `]]`).
///
/// # Examples
///
/// ```
/// use sqlweave_core::quote_ident_mssql;
///
/// assert_eq!(quote_ident_mssql("users"), "[users]");
/// assert_eq!(quote_ident_mssql("a]b"), "[a]]b]");
/// ```
#[inline]
pub fn quote_ident_mssql(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Quote a possibly qualified name (`schema.table.column`) one segment at a time.
///
/// The name is returned untouched when it contains `(` (a raw expression).
/// `*` segments and segments that already start with `open` are not quoted
/// again.
///
/// # Examples
///
/// ```
/// use sqlweave_core::{quote_ident, quote_qualified};
///
/// assert_eq!(quote_qualified("t.name", '"', quote_ident), "\"t\".\"name\"");
/// assert_eq!(quote_qualified("t.*", '"', quote_ident), "\"t\".*");
/// assert_eq!(quote_qualified("COUNT(*)", '"', quote_ident), "COUNT(*)");
/// ```
pub fn quote_qualified(name: &str, open: char, quote: impl Fn(&str) -> String) -> String {
    if name.contains('(') {
        return name.to_string();
    }
    name.split('.')
        .map(|segment| {
            if segment == "*" || segment.starts_with(open) {
                segment.to_string()
            } else {
                quote(segment)
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}
