//! SQLWeave - dialect-aware SQL condition and expression compiler.
//!
//! SQLWeave turns condition trees into SQL text plus a table of named bound
//! parameters, for PostgreSQL, MySQL, SQLite, SQL Server and Oracle:
//!
//! - Typed expression model with a fluent builder API
//! - Loosely typed shorthand conditions (nested lists and maps, or JSON)
//! - Per-dialect builder overrides (ILIKE, ARRAY constructors, IN-list chunking)
//! - Globally unique placeholders across nested subqueries
//!
//! # Quick Start
//!
//! ```
//! use sqlweave::prelude::*;
//!
//! let compiler = Compiler::for_dialect(Dialect::Postgres);
//!
//! let expr = Expression::col("status")
//!     .in_list(["active", "pending"])
//!     .and(Expression::col("deleted_at").is_null());
//! let (sql, params) = compiler.build(&expr).unwrap();
//! assert_eq!(sql, "(\"status\" IN (:qp0, :qp1)) AND (\"deleted_at\" IS NULL)");
//! assert_eq!(params.len(), 2);
//!
//! // The same condition written as shorthand.
//! let shorthand = serde_json::json!(["and", ["in", "status", ["active", "pending"]], {"deleted_at": null}]);
//! let (same_sql, _) = sqlweave::compile_json(&compiler, shorthand).unwrap();
//! assert_eq!(same_sql, sql);
//! ```
//!
//! # Crates
//!
//! - `sqlweave-core`: `Value`, `SqlType`, `Error`, identifier quoting
//! - `sqlweave-query`: expression model, compiler, builders, dialects

pub use sqlweave_core::{
    ConfigError, Error, ExpressionError, ExpressionErrorKind, Result, SqlType, TypeError, Value,
    quote_ident, quote_ident_mssql, quote_ident_mysql, quote_qualified,
};

pub use sqlweave_query::{
    BoundParam, BuildContext, BuilderRegistry, CaseBuilder, CompareOp, Compiler,
    CompilerBuilder, CompilerConfig, Condition, Dialect, ExprKind, Expression,
    ExpressionBuilder, InValues, IntoColumn, LikeEscape, LikeJoin, LikeMode, LikeOperator,
    LogicalKind, OrderBy, OrderDirection, ParamTable, Quoter, RawQuery, SelectQuery,
    SqlDialect, Subquery, ValueFormatter, parse_condition, parse_like_operator,
};

pub use sqlweave_query::builders;
pub use sqlweave_query::dialect;

/// Compile a JSON shorthand condition with the given compiler.
///
/// Arrays are operator lists, objects are column/value hashes, strings are
/// raw SQL. Object keys compile in the order they were written. Integers
/// that do not fit in an `i64` fail with `Error::Type`.
pub fn compile_json(
    compiler: &Compiler,
    shorthand: serde_json::Value,
) -> Result<(String, ParamTable)> {
    compiler.build_condition(&Condition::try_from(shorthand)?)
}

/// Compile an expression and rewrite its placeholders to the dialect's
/// positional form, returning the SQL and the values in bind order.
pub fn compile_positional(compiler: &Compiler, expr: &Expression) -> Result<(String, Vec<Value>)> {
    let (sql, params) = compiler.build(expr)?;
    params.to_positional(&sql, compiler.dialect())
}

/// Prelude module for convenient imports.
///
/// ```
/// use sqlweave::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Compiler, CompilerConfig, Condition, Dialect, Error, Expression, OrderBy, ParamTable,
        Result, SelectQuery, SqlType, Subquery, Value, parse_condition,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compile_json_matches_builder() {
        let compiler = Compiler::for_dialect(Dialect::Sqlite);
        let (sql, params) = compile_json(&compiler, json!({"id": 7})).unwrap();
        assert_eq!(sql, "\"id\" = :qp0");
        assert_eq!(params.value("qp0"), Some(&Value::BigInt(7)));
    }

    #[test]
    fn test_compile_positional() {
        let compiler = Compiler::for_dialect(Dialect::Postgres);
        let expr = Expression::col("a").eq(1).or(Expression::col("b").gt(2));
        let (sql, values) = compile_positional(&compiler, &expr).unwrap();
        assert_eq!(sql, "(\"a\" = $1) OR (\"b\" > $2)");
        assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_compile_json_rejects_unknown_operator() {
        let compiler = Compiler::for_dialect(Dialect::Postgres);
        let err = compile_json(&compiler, json!(["~~", "a", 1])).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_compile_json_rejects_oversized_integers() {
        let compiler = Compiler::for_dialect(Dialect::Postgres);
        let err = compile_json(&compiler, json!(["=", "id", u64::MAX])).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }
}
