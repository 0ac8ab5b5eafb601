//! Comparison and BETWEEN builders.

use sqlweave_core::Result;

use crate::compiler::BuildContext;
use crate::expr::{CompareOp, Expression};
use crate::registry::{ExpressionBuilder, mismatched};

/// Renders `column OP value`, rewriting NULL comparisons.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompareBuilder;

impl ExpressionBuilder for CompareBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::Compare { column, op, value } = expr else {
            return Err(mismatched("CompareBuilder", expr));
        };

        if value.is_null_literal() {
            // Ordering against NULL is never true.
            if op.is_ordering() {
                return Ok("0=1".to_string());
            }
            let column_sql = ctx.column(column)?;
            return Ok(match op {
                CompareOp::Ne => format!("{column_sql} IS NOT NULL"),
                _ => format!("{column_sql} IS NULL"),
            });
        }

        let column_sql = ctx.column(column)?;
        let value_sql = ctx.bind(value)?;
        Ok(format!("{column_sql} {} {value_sql}", op.as_str()))
    }
}

/// Renders `column [NOT] BETWEEN start AND end`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BetweenBuilder;

impl ExpressionBuilder for BetweenBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::Between {
            column,
            start,
            end,
            negated,
        } = expr
        else {
            return Err(mismatched("BetweenBuilder", expr));
        };
        let column_sql = ctx.column(column)?;
        let start_sql = ctx.bind(start)?;
        let end_sql = ctx.bind(end)?;
        let not = if *negated { "NOT " } else { "" };
        Ok(format!("{column_sql} {not}BETWEEN {start_sql} AND {end_sql}"))
    }
}

/// Renders `value [NOT] BETWEEN start_column AND end_column`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BetweenColumnsBuilder;

impl ExpressionBuilder for BetweenColumnsBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::BetweenColumns {
            value,
            start_column,
            end_column,
            negated,
        } = expr
        else {
            return Err(mismatched("BetweenColumnsBuilder", expr));
        };
        let value_sql = ctx.bind(value)?;
        let start_sql = ctx.column(start_column)?;
        let end_sql = ctx.column(end_column)?;
        let not = if *negated { "NOT " } else { "" };
        Ok(format!("{value_sql} {not}BETWEEN {start_sql} AND {end_sql}"))
    }
}
