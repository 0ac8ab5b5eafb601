//! IN builder.

use std::sync::Arc;

use sqlweave_core::{Error, Result};

use crate::compiler::BuildContext;
use crate::expr::{Expression, InValues};
use crate::registry::{ExpressionBuilder, mismatched};
use crate::subquery::Subquery;

/// How composite-key IN lists are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompositeInStyle {
    /// `(c1, c2) IN ((p1, p2), (p3, p4))`
    #[default]
    RowValues,
    /// `(c1 = p1 AND c2 = p2) OR (c1 = p3 AND c2 = p4)`
    Expanded,
}

/// Renders `[NOT] IN` for value lists, composite keys and subqueries.
#[derive(Debug, Clone, Copy)]
pub struct InBuilder {
    /// Rendering of composite-key value lists
    pub composite_style: CompositeInStyle,
    /// Split single-column lists longer than this into OR-ed chunks
    pub max_list_size: Option<usize>,
    /// Whether `(c1, c2) IN (subquery)` is valid SQL for the dialect
    pub composite_subquery: bool,
}

impl Default for InBuilder {
    fn default() -> Self {
        Self {
            composite_style: CompositeInStyle::RowValues,
            max_list_size: None,
            composite_subquery: true,
        }
    }
}

impl ExpressionBuilder for InBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::In {
            columns,
            values,
            negated,
        } = expr
        else {
            return Err(mismatched("InBuilder", expr));
        };

        match (columns.as_slice(), values) {
            ([], _) => Err(Error::invalid_argument("IN requires at least one column")),
            (_, InValues::Subquery(query)) => self.build_subquery(columns, query, *negated, ctx),
            ([column], InValues::List(items)) => self.build_single(column, items, *negated, ctx),
            ([column], InValues::Rows(rows)) => {
                let items = rows
                    .iter()
                    .map(|row| match row.as_slice() {
                        [cell] => Ok(cell.clone()),
                        _ => Err(Error::invalid_argument(
                            "IN row width does not match the single column",
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.build_single(column, &items, *negated, ctx)
            }
            (_, InValues::List(items)) => {
                let rows = items
                    .iter()
                    .map(|item| match item {
                        Expression::List(cells) => Ok(cells.clone()),
                        _ => Err(Error::invalid_argument(
                            "composite IN values must be rows of values",
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.build_composite(columns, &rows, *negated, ctx)
            }
            (_, InValues::Rows(rows)) => self.build_composite(columns, rows, *negated, ctx),
        }
    }
}

impl InBuilder {
    /// Expand composite IN lists into OR-ed row conjunctions.
    pub fn expanded() -> Self {
        Self {
            composite_style: CompositeInStyle::Expanded,
            ..Self::default()
        }
    }

    fn build_single(
        &self,
        column: &Expression,
        items: &[Expression],
        negated: bool,
        ctx: &mut BuildContext<'_>,
    ) -> Result<String> {
        if items.is_empty() {
            return Ok(vacuous(negated));
        }

        let column_sql = ctx.column(column)?;
        let has_null = items.iter().any(Expression::is_null_literal);
        let placeholders = items
            .iter()
            .filter(|item| !item.is_null_literal())
            .map(|item| ctx.bind(item))
            .collect::<Result<Vec<_>>>()?;

        let sql = match placeholders.as_slice() {
            [] => String::new(),
            [single] => {
                let op = if negated { "<>" } else { "=" };
                format!("{column_sql} {op} {single}")
            }
            _ => self.in_list_sql(&column_sql, &placeholders, negated),
        };

        if !has_null {
            return Ok(sql);
        }
        let null_sql = if negated {
            format!("{column_sql} IS NOT NULL")
        } else {
            format!("{column_sql} IS NULL")
        };
        if sql.is_empty() {
            return Ok(null_sql);
        }
        let connective = if negated { "AND" } else { "OR" };
        Ok(format!("({sql} {connective} {null_sql})"))
    }

    fn in_list_sql(&self, column_sql: &str, placeholders: &[String], negated: bool) -> String {
        let operator = if negated { "NOT IN" } else { "IN" };
        match self.max_list_size {
            Some(max) if max > 0 && placeholders.len() > max => {
                tracing::debug!(
                    items = placeholders.len(),
                    chunk_size = max,
                    "splitting IN list into chunks"
                );
                let connective = if negated { " AND " } else { " OR " };
                placeholders
                    .chunks(max)
                    .map(|chunk| format!("({column_sql} {operator} ({}))", chunk.join(", ")))
                    .collect::<Vec<_>>()
                    .join(connective)
            }
            _ => format!("{column_sql} {operator} ({})", placeholders.join(", ")),
        }
    }

    fn build_composite(
        &self,
        columns: &[Expression],
        rows: &[Vec<Expression>],
        negated: bool,
        ctx: &mut BuildContext<'_>,
    ) -> Result<String> {
        if rows.is_empty() {
            return Ok(vacuous(negated));
        }
        if let Some(row) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(Error::invalid_argument(format!(
                "IN row has {} values for {} columns",
                row.len(),
                columns.len()
            )));
        }

        let column_sqls = columns
            .iter()
            .map(|column| ctx.column(column))
            .collect::<Result<Vec<_>>>()?;

        match self.composite_style {
            CompositeInStyle::RowValues => {
                let mut row_sqls = Vec::with_capacity(rows.len());
                for row in rows {
                    let cells = row
                        .iter()
                        .map(|cell| ctx.bind(cell))
                        .collect::<Result<Vec<_>>>()?;
                    row_sqls.push(format!("({})", cells.join(", ")));
                }
                let not = if negated { "NOT " } else { "" };
                Ok(format!(
                    "({}) {not}IN ({})",
                    column_sqls.join(", "),
                    row_sqls.join(", ")
                ))
            }
            CompositeInStyle::Expanded => {
                let mut row_sqls = Vec::with_capacity(rows.len());
                for row in rows {
                    let mut parts = Vec::with_capacity(row.len());
                    for (column_sql, cell) in column_sqls.iter().zip(row) {
                        if cell.is_null_literal() {
                            parts.push(format!("{column_sql} IS NULL"));
                        } else {
                            parts.push(format!("{column_sql} = {}", ctx.bind(cell)?));
                        }
                    }
                    row_sqls.push(format!("({})", parts.join(" AND ")));
                }
                let joined = row_sqls.join(" OR ");
                Ok(if negated {
                    format!("NOT ({joined})")
                } else {
                    joined
                })
            }
        }
    }

    fn build_subquery(
        &self,
        columns: &[Expression],
        query: &Arc<dyn Subquery>,
        negated: bool,
        ctx: &mut BuildContext<'_>,
    ) -> Result<String> {
        if columns.len() > 1 && !self.composite_subquery {
            return Err(Error::unsupported(
                "In",
                format!(
                    "composite IN with a subquery is not supported by the {} dialect",
                    ctx.dialect().name()
                ),
            ));
        }

        let column_sqls = columns
            .iter()
            .map(|column| ctx.column(column))
            .collect::<Result<Vec<_>>>()?;
        let columns_sql = match column_sqls.as_slice() {
            [single] => single.clone(),
            many => format!("({})", many.join(", ")),
        };
        let query_sql = query.compile_subquery(ctx)?;
        let not = if negated { "NOT " } else { "" };
        Ok(format!("{columns_sql} {not}IN ({query_sql})"))
    }
}

/// An empty IN is never true; an empty NOT IN is no condition.
fn vacuous(negated: bool) -> String {
    if negated {
        String::new()
    } else {
        "0=1".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::dialect::Dialect;
    use crate::subquery::SelectQuery;
    use sqlweave_core::Value;

    fn pg() -> Compiler {
        Compiler::for_dialect(Dialect::Postgres)
    }

    #[test]
    fn test_in_list() {
        let (sql, params) = pg()
            .build(&Expression::col("id").in_list([1, 2, 3]))
            .unwrap();
        assert_eq!(sql, "\"id\" IN (:qp0, :qp1, :qp2)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_in_single_value_becomes_equality() {
        let (sql, _) = pg().build(&Expression::col("id").in_list([7])).unwrap();
        assert_eq!(sql, "\"id\" = :qp0");
        let (sql, _) = pg().build(&Expression::col("id").not_in_list([7])).unwrap();
        assert_eq!(sql, "\"id\" <> :qp0");
    }

    #[test]
    fn test_in_with_null() {
        let (sql, params) = pg()
            .build(&Expression::col("id").in_list([Value::Int(1), Value::Int(2), Value::Null]))
            .unwrap();
        assert_eq!(sql, "(\"id\" IN (:qp0, :qp1) OR \"id\" IS NULL)");
        assert_eq!(params.len(), 2);

        let (sql, _) = pg()
            .build(&Expression::col("id").not_in_list([Value::Int(1), Value::Null]))
            .unwrap();
        assert_eq!(sql, "(\"id\" <> :qp0 AND \"id\" IS NOT NULL)");

        let (sql, params) = pg()
            .build(&Expression::col("id").in_list([Value::Null]))
            .unwrap();
        assert_eq!(sql, "\"id\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_in_empty() {
        let empty: Vec<i32> = Vec::new();
        assert_eq!(pg().build(&Expression::col("id").in_list(empty.clone())).unwrap().0, "0=1");
        assert_eq!(pg().build(&Expression::col("id").not_in_list(empty)).unwrap().0, "");
    }

    #[test]
    fn test_in_lazy_values() {
        let (sql, params) = pg()
            .build(&Expression::col("n").in_list((1..=3).map(|i| i * 10)))
            .unwrap();
        assert_eq!(sql, "\"n\" IN (:qp0, :qp1, :qp2)");
        assert_eq!(params.value("qp2"), Some(&Value::Int(30)));
    }

    #[test]
    fn test_composite_row_values() {
        let expr = Expression::in_rows(
            ["c1", "c2"],
            vec![
                vec![Expression::lit(1), Expression::lit("a")],
                vec![Expression::lit(2), Expression::lit("b")],
            ],
        );
        let (sql, params) = pg().build(&expr).unwrap();
        assert_eq!(sql, "(\"c1\", \"c2\") IN ((:qp0, :qp1), (:qp2, :qp3))");
        assert_eq!(params.value("qp3"), Some(&Value::Text("b".into())));
    }

    #[test]
    fn test_composite_expanded() {
        let compiler = Compiler::builder(Dialect::Postgres)
            .override_builder(crate::expr::ExprKind::In, InBuilder::expanded())
            .build()
            .unwrap();
        let expr = Expression::not_in_rows(
            ["a", "b"],
            vec![vec![Expression::lit(1), Expression::null()]],
        );
        let (sql, params) = compiler.build(&expr).unwrap();
        assert_eq!(sql, "NOT ((\"a\" = :qp0 AND \"b\" IS NULL))");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_composite_row_width_mismatch() {
        let expr = Expression::in_rows(["a", "b"], vec![vec![1]]);
        assert!(pg().build(&expr).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_in_subquery() {
        let query = SelectQuery::new("orders")
            .columns(["user_id"])
            .filter(Expression::col("total").gt(100));
        let expr = Expression::col("id").in_subquery(query);
        let (sql, params) = pg().build(&expr).unwrap();
        assert_eq!(
            sql,
            "\"id\" IN (SELECT \"user_id\" FROM \"orders\" WHERE \"total\" > :qp0)"
        );
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_chunked_list() {
        let builder = InBuilder {
            max_list_size: Some(2),
            ..InBuilder::default()
        };
        let compiler = Compiler::builder(Dialect::Postgres)
            .override_builder(crate::expr::ExprKind::In, builder)
            .build()
            .unwrap();
        let (sql, _) = compiler
            .build(&Expression::col("x").in_list([1, 2, 3]))
            .unwrap();
        assert_eq!(sql, "(\"x\" IN (:qp0, :qp1)) OR (\"x\" IN (:qp2))");
        let (sql, _) = compiler
            .build(&Expression::col("x").not_in_list([1, 2, 3]))
            .unwrap();
        assert_eq!(sql, "(\"x\" NOT IN (:qp0, :qp1)) AND (\"x\" NOT IN (:qp2))");
    }
}
