//! PostgreSQL dialect overrides.
//!
//! PostgreSQL has native array, JSON and composite row types, so payloads
//! are rendered as typed constructors instead of encoded strings.

use sqlweave_core::{Result, SqlType, Value};

use crate::builders::{LikeBuilder, cast_suffix, encode_payload};
use crate::compiler::BuildContext;
use crate::expr::{ExprKind, Expression};
use crate::registry::{BuilderRegistry, ExpressionBuilder, mismatched};

/// Renders `ARRAY[:p0, :p1]::type`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgArrayBuilder;

impl ExpressionBuilder for PgArrayBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::Array { items, type_hint } = expr else {
            return Err(mismatched("PgArrayBuilder", expr));
        };
        let cast = cast_suffix(type_hint.as_deref())?;
        if items.is_empty() && cast.is_empty() {
            return Ok("'{}'".to_string());
        }
        let parts = items
            .iter()
            .map(|item| ctx.bind(item))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("ARRAY[{}]{cast}", parts.join(", ")))
    }
}

/// Binds a JSON payload as text and casts it: `:p::jsonb`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgJsonBuilder;

impl ExpressionBuilder for PgJsonBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::Json { type_hint, .. } = expr else {
            return Err(mismatched("PgJsonBuilder", expr));
        };
        let cast = cast_suffix(Some(type_hint.as_deref().unwrap_or("jsonb")))?;
        let encoded = encode_payload(expr, ctx.config().max_depth)?;
        let placeholder = ctx.bind_value(&Value::Text(encoded), Some(&SqlType::JsonB))?;
        Ok(format!("{placeholder}{cast}"))
    }
}

/// Renders a composite value: `ROW(:p0, :p1)::type`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgStructuredBuilder;

impl ExpressionBuilder for PgStructuredBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::Structured { fields, type_hint } = expr else {
            return Err(mismatched("PgStructuredBuilder", expr));
        };
        let cast = cast_suffix(type_hint.as_deref())?;
        let parts = fields
            .iter()
            .map(|(_, value)| ctx.bind(value))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("ROW({}){cast}", parts.join(", ")))
    }
}

pub(super) fn register(registry: &mut BuilderRegistry) {
    registry
        .register_override(ExprKind::Like, LikeBuilder::native_ilike())
        .register_override(ExprKind::Array, PgArrayBuilder)
        .register_override(ExprKind::Json, PgJsonBuilder)
        .register_override(ExprKind::Structured, PgStructuredBuilder);
}

#[cfg(test)]
mod tests {
    use crate::compiler::Compiler;
    use crate::dialect::Dialect;
    use crate::expr::Expression;
    use serde_json::json;
    use sqlweave_core::Value;

    fn pg() -> Compiler {
        Compiler::for_dialect(Dialect::Postgres)
    }

    #[test]
    fn test_array_constructor() {
        let expr = Expression::col("tags").eq(Expression::array(["a", "b"]).with_type_hint("text[]"));
        let (sql, params) = pg().build(&expr).unwrap();
        assert_eq!(sql, "\"tags\" = ARRAY[:qp0, :qp1]::text[]");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_empty_array() {
        let empty: Vec<i32> = Vec::new();
        let (sql, _) = pg().build(&Expression::array(empty.clone())).unwrap();
        assert_eq!(sql, "'{}'");
        let (sql, _) = pg()
            .build(&Expression::array(empty).with_type_hint("int[]"))
            .unwrap();
        assert_eq!(sql, "ARRAY[]::int[]");
    }

    #[test]
    fn test_json_cast() {
        let (sql, params) = pg().build(&Expression::json(json!([1, 2]))).unwrap();
        assert_eq!(sql, ":qp0::jsonb");
        assert_eq!(params.value("qp0"), Some(&Value::Text("[1,2]".into())));
        let (sql, _) = pg()
            .build(&Expression::json(json!({})).with_type_hint("json"))
            .unwrap();
        assert_eq!(sql, ":qp0::json");
    }

    #[test]
    fn test_structured_row() {
        let expr = Expression::structured([("street", Expression::lit("Main")), ("zip", Expression::lit(12345))])
            .with_type_hint("address");
        let (sql, params) = pg().build(&expr).unwrap();
        assert_eq!(sql, "ROW(:qp0, :qp1)::address");
        assert_eq!(params.value("qp1"), Some(&Value::Int(12345)));
    }

    #[test]
    fn test_bad_type_hint() {
        let expr = Expression::array([1]).with_type_hint("int[]; DROP TABLE x");
        assert!(pg().build(&expr).unwrap_err().is_invalid_argument());
    }
}
