//! Parameter table and value binding.
//!
//! A [`ParamTable`] is created fresh for each top-level compile and owned by
//! the caller afterwards. Placeholder names are unique within one table.

use std::collections::HashMap;
use std::ops::Range;

use sqlweave_core::{Error, Result, SqlType, Value};

use crate::dialect::SqlDialect;

/// A value bound to a placeholder, with the type it should be sent as.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub value: Value,
    pub sql_type: SqlType,
}

impl BoundParam {
    /// Bind a value with its inferred type.
    pub fn new(value: Value) -> Self {
        let sql_type = value.sql_type();
        Self { value, sql_type }
    }

    /// Bind a value with an explicit type.
    pub fn typed(value: Value, sql_type: SqlType) -> Self {
        Self { value, sql_type }
    }
}

/// Ordered mapping from placeholder name (without the leading `:`) to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamTable {
    entries: Vec<(String, BoundParam)>,
    index: HashMap<String, usize>,
    counter: usize,
}

impl ParamTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether a placeholder name is taken.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Get a bound parameter by name.
    pub fn get(&self, name: &str) -> Option<&BoundParam> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    /// Get a bound value by name.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(|param| &param.value)
    }

    /// Iterate over `(name, param)` in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundParam)> {
        self.entries
            .iter()
            .map(|(name, param)| (name.as_str(), param))
    }

    /// Placeholder names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Bound values in binding order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, param)| &param.value)
    }

    /// Consume the table, returning `(name, value)` pairs in binding order.
    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.entries
            .into_iter()
            .map(|(name, param)| (name, param.value))
            .collect()
    }

    /// Bind a value under the next free `<prefix><N>` name.
    ///
    /// Returns the name without the leading `:`.
    pub fn bind(&mut self, prefix: &str, param: BoundParam) -> String {
        let name = loop {
            let candidate = format!("{prefix}{}", self.counter);
            self.counter += 1;
            if !self.contains(&candidate) {
                break candidate;
            }
        };
        self.push(name.clone(), param);
        name
    }

    /// Insert a parameter, renaming it if the name is taken.
    ///
    /// Collisions probe `name_0`, `name_1`, ... and take the first free name.
    /// Returns the name the parameter was stored under.
    pub fn insert_unique(&mut self, name: &str, param: BoundParam) -> String {
        let mut final_name = name.to_string();
        let mut n = 0usize;
        while self.contains(&final_name) {
            final_name = format!("{name}_{n}");
            n += 1;
        }
        self.push(final_name.clone(), param);
        final_name
    }

    fn push(&mut self, name: String, param: BoundParam) {
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, param));
    }

    /// Rewrite named placeholders to the dialect's positional form.
    ///
    /// Values are returned in order of appearance; a name used twice is
    /// bound twice. Placeholders inside quoted strings and comments are
    /// left alone.
    pub fn to_positional(&self, sql: &str, dialect: &dyn SqlDialect) -> Result<(String, Vec<Value>)> {
        let mut out = String::with_capacity(sql.len());
        let mut values = Vec::with_capacity(self.len());
        let mut last = 0;
        for (range, name) in scan_placeholders(sql, dialect) {
            let value = self
                .value(name)
                .ok_or_else(|| Error::ambiguous_placeholder(name))?;
            values.push(value.clone());
            out.push_str(&sql[last..range.start]);
            out.push_str(&dialect.positional_placeholder(values.len()));
            last = range.end;
        }
        out.push_str(&sql[last..]);
        Ok((out, values))
    }
}

/// Find `:name` placeholders in SQL text.
///
/// Skips quoted spans, `--` and `/* */` comments and `::` casts. Square
/// brackets are skipped as well when the dialect quotes identifiers with
/// them; elsewhere they hold array elements. Returns the byte range of
/// each token (including the `:`) with its name.
pub fn scan_placeholders<'a>(
    sql: &'a str,
    dialect: &dyn SqlDialect,
) -> Vec<(Range<usize>, &'a str)> {
    let brackets = dialect.bracket_identifiers();
    let bytes = sql.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => i = skip_past(bytes, i + 1, &[quote]),
            b'[' if brackets => i = skip_past(bytes, i + 1, b"]"),
            b'-' if bytes.get(i + 1) == Some(&b'-') => i = skip_past(bytes, i + 2, b"\n"),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_past(bytes, i + 2, b"*/"),
            b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
            b':' if bytes
                .get(i + 1)
                .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') =>
            {
                let start = i;
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                found.push((start..i, &sql[start + 1..i]));
            }
            _ => i += 1,
        }
    }
    found
}

/// Index just past the next `terminator` at or after `from`, or the end.
fn skip_past(bytes: &[u8], from: usize, terminator: &[u8]) -> usize {
    bytes
        .get(from..)
        .and_then(|rest| rest.windows(terminator.len()).position(|w| w == terminator))
        .map_or(bytes.len(), |pos| from + pos + terminator.len())
}

/// Replace placeholder tokens according to `renames` (old name, new name).
pub(crate) fn rename_placeholders(
    sql: &str,
    renames: &HashMap<String, String>,
    dialect: &dyn SqlDialect,
) -> String {
    if renames.is_empty() {
        return sql.to_string();
    }
    let mut out = String::with_capacity(sql.len() + renames.len() * 2);
    let mut last = 0;
    for (range, name) in scan_placeholders(sql, dialect) {
        if let Some(new_name) = renames.get(name) {
            out.push_str(&sql[last..range.start]);
            out.push(':');
            out.push_str(new_name);
            last = range.end;
        }
    }
    out.push_str(&sql[last..]);
    out
}
