//! CASE builder.

use sqlweave_core::{Error, Result, Value};

use crate::compiler::BuildContext;
use crate::condition::Condition;
use crate::expr::Expression;
use crate::registry::{ExpressionBuilder, mismatched};

/// Renders `CASE [subject] WHEN ... THEN ... [ELSE ...] END`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseExpressionBuilder;

impl ExpressionBuilder for CaseExpressionBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::Case {
            subject,
            when_clauses,
            else_result,
        } = expr
        else {
            return Err(mismatched("CaseExpressionBuilder", expr));
        };

        if when_clauses.is_empty() {
            return Err(Error::invalid_argument(
                "CASE requires at least one WHEN clause",
            ));
        }

        let mut sql = String::from("CASE");
        if let Some(subject) = subject {
            sql.push(' ');
            sql.push_str(&ctx.bind(subject)?);
        }

        for (condition, result) in when_clauses {
            let condition_sql = match condition {
                Condition::Scalar(Value::Text(raw)) => raw.clone(),
                Condition::Scalar(value) => ctx.bind_value(value, None)?,
                Condition::Expr(expr @ Expression::Literal { .. }) => ctx.bind(expr)?,
                other => ctx.compile_condition(other)?,
            };
            if condition_sql.trim().is_empty() {
                return Err(Error::invalid_argument("CASE WHEN condition is empty"));
            }
            let result_sql = ctx.bind(result)?;
            sql.push_str(&format!(" WHEN {condition_sql} THEN {result_sql}"));
        }

        if let Some(else_result) = else_result {
            sql.push_str(" ELSE ");
            sql.push_str(&ctx.bind(else_result)?);
        }

        sql.push_str(" END");
        Ok(sql)
    }
}
