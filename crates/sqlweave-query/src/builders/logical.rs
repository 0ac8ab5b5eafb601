//! Logical, hash and EXISTS builders.

use std::borrow::Cow;
use std::sync::Arc;

use sqlweave_core::{Error, Result};

use crate::builders::join_conditions;
use crate::compiler::BuildContext;
use crate::condition::{Condition, parse_condition};
use crate::expr::{CompareOp, Expression, InValues, LogicalKind};
use crate::registry::{ExpressionBuilder, mismatched};

/// Renders AND / OR conjunctions and NOT.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogicalBuilder;

impl ExpressionBuilder for LogicalBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::Logical { kind, operands } = expr else {
            return Err(mismatched("LogicalBuilder", expr));
        };

        match kind {
            LogicalKind::And | LogicalKind::Or => {
                let parts = operands
                    .iter()
                    .map(|operand| ctx.compile_condition(operand))
                    .collect::<Result<Vec<_>>>()?;
                Ok(join_conditions(parts, kind.as_str()))
            }
            LogicalKind::Not => {
                let [operand] = operands.as_slice() else {
                    return Err(Error::invalid_argument(format!(
                        "NOT requires exactly one operand, got {}",
                        operands.len()
                    )));
                };
                let inner: Cow<'_, Expression> = match operand {
                    Condition::Expr(expr) => Cow::Borrowed(expr),
                    other => Cow::Owned(parse_condition(other)?),
                };

                if let Some(negated) = inner.negate() {
                    tracing::debug!(kind = inner.kind().name(), "negating algebraically");
                    return ctx.compile(&negated);
                }

                let sql = ctx.compile(&inner)?;
                if sql.is_empty() {
                    return Ok(sql);
                }
                Ok(format!("NOT ({sql})"))
            }
        }
    }
}

/// Renders one equality (or IN) per column, joined with AND.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashBuilder;

impl ExpressionBuilder for HashBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::Hash(pairs) = expr else {
            return Err(mismatched("HashBuilder", expr));
        };

        let mut parts = Vec::with_capacity(pairs.len());
        for (column, value) in pairs {
            let column = Expression::Column(column.clone());
            let part = match value {
                Expression::List(items) => Expression::In {
                    columns: vec![column],
                    values: InValues::List(items.clone()),
                    negated: false,
                },
                Expression::Subquery(query) => Expression::In {
                    columns: vec![column],
                    values: InValues::Subquery(Arc::clone(query)),
                    negated: false,
                },
                other => Expression::Compare {
                    column: Box::new(column),
                    op: CompareOp::Eq,
                    value: Box::new(other.clone()),
                },
            };
            parts.push(ctx.compile(&part)?);
        }
        Ok(join_conditions(parts, "AND"))
    }
}

/// Renders `[NOT] EXISTS (subquery)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExistsBuilder;

impl ExpressionBuilder for ExistsBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::Exists { query, negated } = expr else {
            return Err(mismatched("ExistsBuilder", expr));
        };
        let query_sql = query.compile_exists(ctx)?;
        let not = if *negated { "NOT " } else { "" };
        Ok(format!("{not}EXISTS ({query_sql})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::dialect::Dialect;
    use crate::subquery::SelectQuery;
    use serde_json::json;
    use sqlweave_core::Value;

    fn pg() -> Compiler {
        Compiler::for_dialect(Dialect::Postgres)
    }

    #[test]
    fn test_and_or() {
        let expr = Expression::col("a").eq(1).and(Expression::col("b").eq(2));
        assert_eq!(pg().build(&expr).unwrap().0, "(\"a\" = :qp0) AND (\"b\" = :qp1)");
        let expr = Expression::or_any([Expression::col("a").eq(1), Expression::col("b").eq(2)]);
        assert_eq!(pg().build(&expr).unwrap().0, "(\"a\" = :qp0) OR (\"b\" = :qp1)");
    }

    #[test]
    fn test_empty_operands_dropped() {
        let expr = Expression::and_all([
            Condition::empty(),
            Condition::from(Expression::col("a").eq(1)),
            Condition::from(""),
        ]);
        assert_eq!(pg().build(&expr).unwrap().0, "\"a\" = :qp0");
        assert_eq!(pg().build(&Expression::and_all(Vec::<Condition>::new())).unwrap().0, "");
    }

    #[test]
    fn test_shorthand_operands() {
        let expr = Expression::and_all([
            Condition::try_from(json!(["=", "a", 1])).unwrap(),
            Condition::try_from(json!({"b": null})).unwrap(),
        ]);
        let (sql, params) = pg().build(&expr).unwrap();
        assert_eq!(sql, "(\"a\" = :qp0) AND (\"b\" IS NULL)");
        assert_eq!(params.value("qp0"), Some(&Value::BigInt(1)));
    }

    #[test]
    fn test_not_algebraic() {
        let expr = Expression::col("a").lt(5).not();
        assert_eq!(pg().build(&expr).unwrap().0, "\"a\" >= :qp0");
        let expr = Expression::col("a").in_list([1, 2]).not();
        assert_eq!(pg().build(&expr).unwrap().0, "\"a\" NOT IN (:qp0, :qp1)");
    }

    #[test]
    fn test_not_textual_fallback() {
        let expr = Expression::raw("a > b").not();
        assert_eq!(pg().build(&expr).unwrap().0, "NOT (a > b)");
        let expr = Expression::hash([("a", 1), ("b", 2)]).not();
        assert_eq!(
            pg().build(&expr).unwrap().0,
            "NOT ((\"a\" = :qp0) AND (\"b\" = :qp1))"
        );
    }

    #[test]
    fn test_not_of_empty() {
        let expr = Expression::not_of(Condition::empty());
        assert_eq!(pg().build(&expr).unwrap().0, "");
    }

    #[test]
    fn test_not_arity() {
        let expr = Expression::Logical {
            kind: LogicalKind::Not,
            operands: vec![],
        };
        assert!(pg().build(&expr).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_hash() {
        let expr = Expression::hash([
            ("status", Expression::lit("active")),
            ("id", Expression::list([1, 2])),
            ("deleted_at", Expression::null()),
        ]);
        let (sql, params) = pg().build(&expr).unwrap();
        assert_eq!(
            sql,
            "(\"status\" = :qp0) AND (\"id\" IN (:qp1, :qp2)) AND (\"deleted_at\" IS NULL)"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_hash_single_pair_is_bare() {
        let (sql, _) = pg().build(&Expression::hash([("a", 1)])).unwrap();
        assert_eq!(sql, "\"a\" = :qp0");
    }

    #[test]
    fn test_exists() {
        let query = SelectQuery::new("orders")
            .columns(["id"])
            .filter(Expression::raw("orders.user_id = users.id"));
        let (sql, _) = pg().build(&Expression::not_exists(query)).unwrap();
        assert_eq!(
            sql,
            "NOT EXISTS (SELECT 1 FROM \"orders\" WHERE orders.user_id = users.id)"
        );
    }
}
