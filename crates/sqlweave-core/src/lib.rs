//! Core types for SQLWeave.
//!
//! This crate provides the leaf types shared by the expression compiler:
//!
//! - `Value` for dynamically typed SQL values
//! - `SqlType` for parameter binding types
//! - `Error` / `Result` for compilation failures
//! - identifier quoting helpers used by dialects

pub mod error;
pub mod identifiers;
pub mod types;
pub mod value;

pub use error::{
    ConfigError, Error, ExpressionError, ExpressionErrorKind, Result, TypeError,
};
pub use identifiers::{quote_ident, quote_ident_mssql, quote_ident_mysql, quote_qualified};
pub use types::SqlType;
pub use value::Value;
