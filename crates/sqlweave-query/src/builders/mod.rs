//! Default expression builders.
//!
//! One builder per expression variant. Builders never concatenate scalar
//! values into SQL text: every literal goes through
//! [`BuildContext::bind`](crate::compiler::BuildContext::bind).

mod case;
mod compare;
mod in_list;
mod like;
mod logical;
mod payload;

use std::sync::OnceLock;

use regex::Regex;
use sqlweave_core::{Error, Result};

use crate::compiler::BuildContext;
use crate::expr::{ExprKind, Expression};
use crate::registry::{BuilderRegistry, ExpressionBuilder, mismatched};

pub use case::CaseExpressionBuilder;
pub use compare::{BetweenBuilder, BetweenColumnsBuilder, CompareBuilder};
pub use in_list::{CompositeInStyle, InBuilder};
pub use like::LikeBuilder;
pub use logical::{ExistsBuilder, HashBuilder, LogicalBuilder};
pub use payload::{JsonPayloadBuilder, encode_payload};

/// Install the default builder for every variant except `Structured`,
/// which only dialects with a composite row type provide.
pub fn register_defaults(registry: &mut BuilderRegistry) {
    registry
        .register_default(ExprKind::Column, ColumnBuilder)
        .register_default(ExprKind::Literal, LiteralBuilder)
        .register_default(ExprKind::Raw, RawBuilder)
        .register_default(ExprKind::List, ListBuilder)
        .register_default(ExprKind::Subquery, SubqueryBuilder)
        .register_default(ExprKind::Array, JsonPayloadBuilder)
        .register_default(ExprKind::Json, JsonPayloadBuilder)
        .register_default(ExprKind::Case, CaseExpressionBuilder)
        .register_default(ExprKind::Compare, CompareBuilder)
        .register_default(ExprKind::Between, BetweenBuilder)
        .register_default(ExprKind::BetweenColumns, BetweenColumnsBuilder)
        .register_default(ExprKind::In, InBuilder::default())
        .register_default(ExprKind::Like, LikeBuilder::default())
        .register_default(ExprKind::Exists, ExistsBuilder)
        .register_default(ExprKind::Logical, LogicalBuilder)
        .register_default(ExprKind::Hash, HashBuilder);
}

// ==================== Simple Builders ====================

/// Quotes a column reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnBuilder;

impl ExpressionBuilder for ColumnBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::Column(name) = expr else {
            return Err(mismatched("ColumnBuilder", expr));
        };
        Ok(ctx.quote_column(name))
    }
}

/// Binds a literal value.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralBuilder;

impl ExpressionBuilder for LiteralBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::Literal { value, sql_type } = expr else {
            return Err(mismatched("LiteralBuilder", expr));
        };
        ctx.bind_value(value, sql_type.as_ref())
    }
}

/// Passes raw SQL through, merging its parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBuilder;

impl ExpressionBuilder for RawBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::Raw { sql, params } = expr else {
            return Err(mismatched("RawBuilder", expr));
        };
        ctx.merge_params(sql, params)
    }
}

/// Renders `(a, b, c)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListBuilder;

impl ExpressionBuilder for ListBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::List(items) = expr else {
            return Err(mismatched("ListBuilder", expr));
        };
        let parts = items
            .iter()
            .map(|item| ctx.bind(item))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("({})", parts.join(", ")))
    }
}

/// Renders a nested statement in parentheses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubqueryBuilder;

impl ExpressionBuilder for SubqueryBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::Subquery(query) = expr else {
            return Err(mismatched("SubqueryBuilder", expr));
        };
        Ok(format!("({})", query.compile_subquery(ctx)?))
    }
}

// ==================== Shared Helpers ====================

/// Join non-empty condition fragments with a connective.
///
/// One fragment renders bare; several are each parenthesized.
pub(crate) fn join_conditions(mut parts: Vec<String>, connective: &str) -> String {
    parts.retain(|part| !part.is_empty());
    match parts.len() {
        0 => String::new(),
        1 => parts.swap_remove(0),
        _ => parts
            .iter()
            .map(|part| format!("({part})"))
            .collect::<Vec<_>>()
            .join(&format!(" {connective} ")),
    }
}

fn type_hint_regex() -> Result<&'static Regex> {
    static TYPE_HINT: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    TYPE_HINT
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_ .,()\[\]]*$"))
        .as_ref()
        .map_err(|e| Error::Custom(format!("invalid type hint pattern: {e}")))
}

/// Render `::hint` for a validated type hint, or nothing.
pub(crate) fn cast_suffix(hint: Option<&str>) -> Result<String> {
    match hint {
        None => Ok(String::new()),
        Some(hint) => {
            if !type_hint_regex()?.is_match(hint) {
                return Err(Error::invalid_argument(format!(
                    "type hint {hint:?} is not a valid type name"
                )));
            }
            Ok(format!("::{hint}"))
        }
    }
}
