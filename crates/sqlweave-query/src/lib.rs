//! Expression and condition compiler for SQLWeave.
//!
//! `sqlweave-query` is the **compilation layer**. It turns expression trees
//! (or loosely typed shorthand conditions) into dialect-specific SQL text
//! plus a table of bound parameters.
//!
//! # Role In The Architecture
//!
//! - **Expression model**: [`Expression`] is a closed set of SQL fragment variants.
//! - **Builder registry**: [`BuilderRegistry`] maps each variant to the builder that
//!   compiles it; dialects install overrides.
//! - **Dialects**: [`Dialect`] covers PostgreSQL, MySQL, SQLite, SQL Server and
//!   Oracle; custom dialects implement [`SqlDialect`].
//! - **Shorthand**: [`Condition`] and [`parse_condition`] accept nested lists and
//!   maps (including `serde_json::Value`).
//!
//! # Example
//!
//! ```
//! use sqlweave_query::{Compiler, Dialect, Expression};
//!
//! let compiler = Compiler::for_dialect(Dialect::Postgres);
//! let expr = Expression::col("age").ge(18).and(Expression::col("name").contains("ann"));
//! let (sql, params) = compiler.build(&expr).unwrap();
//! assert_eq!(sql, "(\"age\" >= :qp0) AND (\"name\" LIKE :qp1)");
//! assert_eq!(params.len(), 2);
//! ```

pub mod builders;
pub mod compiler;
pub mod condition;
pub mod config;
pub mod dialect;
pub mod expr;
pub mod params;
pub mod registry;
pub mod subquery;

pub use compiler::{BuildContext, Compiler, CompilerBuilder};
pub use condition::{Condition, LikeOperator, parse_condition, parse_like_operator};
pub use config::CompilerConfig;
pub use dialect::{Dialect, LikeEscape, Quoter, SqlDialect, ValueFormatter};
pub use expr::{
    CaseBuilder, CompareOp, ExprKind, Expression, InValues, IntoColumn, LikeJoin, LikeMode,
    LogicalKind,
};
pub use params::{BoundParam, ParamTable};
pub use registry::{BuilderRegistry, ExpressionBuilder};
pub use subquery::{OrderBy, OrderDirection, RawQuery, SelectQuery, Subquery};
