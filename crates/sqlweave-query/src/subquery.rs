//! Nested statements.
//!
//! The [`Subquery`] trait is the compiler's contract with whatever assembles
//! full statements. Implementations compile through the caller's
//! [`BuildContext`], so their bound values land in the same parameter table
//! and placeholder names stay unique across the whole tree.

use std::fmt;

use sqlweave_core::{Result, Value};

use crate::compiler::BuildContext;
use crate::condition::Condition;

/// A statement that can be nested inside an expression.
pub trait Subquery: fmt::Debug + Send + Sync {
    /// Compile the statement body (without surrounding parentheses).
    fn compile_subquery(&self, ctx: &mut BuildContext<'_>) -> Result<String>;

    /// Compile the statement as the body of an EXISTS test.
    fn compile_exists(&self, ctx: &mut BuildContext<'_>) -> Result<String> {
        self.compile_subquery(ctx)
    }
}

// ==================== ORDER BY ====================

/// ORDER BY direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Create an ascending order term.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Asc,
        }
    }

    /// Create a descending order term.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Desc,
        }
    }
}

// ==================== SELECT ====================

/// Minimal SELECT statement usable as a subquery.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    /// Table name for FROM clause
    pub table: String,
    /// Columns to select (empty = all)
    pub columns: Vec<String>,
    /// WHERE condition
    pub where_clause: Option<Condition>,
    /// ORDER BY terms
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// DISTINCT flag
    pub distinct: bool,
}

impl SelectQuery {
    /// Select from a table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Set the selected columns.
    #[must_use]
    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the WHERE condition.
    #[must_use]
    pub fn filter(mut self, condition: impl Into<Condition>) -> Self {
        self.where_clause = Some(condition.into());
        self
    }

    /// Add an ORDER BY term.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Compile `SELECT 1 FROM ...` with this query's filter, for EXISTS bodies.
    pub fn exists_form(&self, ctx: &mut BuildContext<'_>) -> Result<String> {
        let mut sql = format!("SELECT 1 FROM {}", ctx.quote_table(&self.table));
        self.push_where(&mut sql, ctx)?;
        Ok(sql)
    }

    fn push_where(&self, sql: &mut String, ctx: &mut BuildContext<'_>) -> Result<()> {
        if let Some(condition) = &self.where_clause {
            let where_sql = ctx.compile_condition(condition)?;
            if !where_sql.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&where_sql);
            }
        }
        Ok(())
    }
}

impl Subquery for SelectQuery {
    fn compile_subquery(&self, ctx: &mut BuildContext<'_>) -> Result<String> {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            let columns: Vec<_> = self.columns.iter().map(|c| ctx.quote_column(c)).collect();
            sql.push_str(&columns.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&ctx.quote_table(&self.table));

        self.push_where(&mut sql, ctx)?;

        if !self.order_by.is_empty() {
            let terms: Vec<_> = self
                .order_by
                .iter()
                .map(|order| {
                    let direction = match order.direction {
                        OrderDirection::Asc => "ASC",
                        OrderDirection::Desc => "DESC",
                    };
                    format!("{} {direction}", ctx.quote_column(&order.column))
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        } else if self.limit.is_some() || self.offset.is_some() {
            if let Some(term) = ctx.dialect().unordered_paging_term() {
                sql.push_str(" ORDER BY ");
                sql.push_str(term);
            }
        }

        sql.push_str(&ctx.dialect().limit_clause(self.limit, self.offset));
        Ok(sql)
    }

    fn compile_exists(&self, ctx: &mut BuildContext<'_>) -> Result<String> {
        self.exists_form(ctx)
    }
}

// ==================== Raw Statements ====================

/// Caller-written statement text with named parameters.
///
/// Parameters are merged into the shared table, renaming collisions.
#[derive(Debug, Clone)]
pub struct RawQuery {
    pub sql: String,
    pub params: Vec<(String, Value)>,
}

impl RawQuery {
    /// A raw statement without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Attach a named parameter (with or without the leading `:`).
    #[must_use]
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        let name = name.strip_prefix(':').unwrap_or(name);
        self.params.push((name.to_string(), value.into()));
        self
    }
}

impl Subquery for RawQuery {
    fn compile_subquery(&self, ctx: &mut BuildContext<'_>) -> Result<String> {
        ctx.merge_params(&self.sql, &self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::dialect::Dialect;
    use crate::expr::Expression;
    use crate::params::ParamTable;

    #[test]
    fn test_select_query_full() {
        let query = SelectQuery::new("orders")
            .columns(["id", "o.total"])
            .filter(Expression::col("status").eq("paid"))
            .order_by(OrderBy::desc("created_at"))
            .limit(10)
            .distinct();
        let compiler = Compiler::for_dialect(Dialect::Postgres);
        let mut params = ParamTable::new();
        let sql = query
            .compile_subquery(&mut compiler.context(&mut params))
            .unwrap();
        assert_eq!(
            sql,
            "SELECT DISTINCT \"id\", \"o\".\"total\" FROM \"orders\" WHERE \"status\" = :qp0 \
             ORDER BY \"created_at\" DESC LIMIT 10"
        );
        assert_eq!(params.value("qp0"), Some(&Value::Text("paid".into())));
    }

    #[test]
    fn test_select_query_mssql_paging() {
        let query = SelectQuery::new("t").limit(5).offset(10);
        let compiler = Compiler::for_dialect(Dialect::Mssql);
        let mut params = ParamTable::new();
        let sql = query
            .compile_subquery(&mut compiler.context(&mut params))
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM [t] ORDER BY (SELECT NULL) OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"
        );

        let ordered = SelectQuery::new("t").order_by(OrderBy::asc("id")).limit(5);
        let sql = ordered
            .compile_subquery(&mut compiler.context(&mut params))
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM [t] ORDER BY [id] ASC OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY"
        );

        let unlimited = SelectQuery::new("t");
        let sql = unlimited
            .compile_subquery(&mut compiler.context(&mut params))
            .unwrap();
        assert_eq!(sql, "SELECT * FROM [t]");
    }

    #[test]
    fn test_select_query_oracle_paging_needs_no_order() {
        let query = SelectQuery::new("t").limit(5);
        let compiler = Compiler::for_dialect(Dialect::Oracle);
        let mut params = ParamTable::new();
        let sql = query
            .compile_subquery(&mut compiler.context(&mut params))
            .unwrap();
        assert_eq!(sql, "SELECT * FROM \"t\" OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY");
    }

    #[test]
    fn test_exists_form() {
        let query = SelectQuery::new("orders")
            .columns(["id"])
            .filter(Expression::raw("orders.user_id = users.id"));
        let compiler = Compiler::for_dialect(Dialect::Sqlite);
        let mut params = ParamTable::new();
        let sql = query.exists_form(&mut compiler.context(&mut params)).unwrap();
        assert_eq!(
            sql,
            "SELECT 1 FROM \"orders\" WHERE orders.user_id = users.id"
        );
    }

    #[test]
    fn test_empty_filter_is_omitted() {
        let query = SelectQuery::new("t").filter(Expression::and_all(Vec::<Condition>::new()));
        let compiler = Compiler::for_dialect(Dialect::Postgres);
        let mut params = ParamTable::new();
        let sql = query
            .compile_subquery(&mut compiler.context(&mut params))
            .unwrap();
        assert_eq!(sql, "SELECT * FROM \"t\"");
    }

    #[test]
    fn test_raw_query_strips_colon() {
        let query = RawQuery::new("SELECT id FROM t WHERE x = :x").param(":x", 1);
        assert_eq!(query.params[0].0, "x");
    }
}
