//! MySQL dialect overrides.

use sqlweave_core::{Result, SqlType, Value};

use crate::builders::encode_payload;
use crate::compiler::BuildContext;
use crate::expr::{ExprKind, Expression};
use crate::registry::{BuilderRegistry, ExpressionBuilder, mismatched};

/// Binds a JSON payload as text and casts it: `CAST(:p AS JSON)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlJsonBuilder;

impl ExpressionBuilder for MysqlJsonBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        if !matches!(expr, Expression::Json { .. }) {
            return Err(mismatched("MysqlJsonBuilder", expr));
        }
        let encoded = encode_payload(expr, ctx.config().max_depth)?;
        let placeholder = ctx.bind_value(&Value::Text(encoded), Some(&SqlType::Json))?;
        Ok(format!("CAST({placeholder} AS JSON)"))
    }
}

pub(super) fn register(registry: &mut BuilderRegistry) {
    registry.register_override(ExprKind::Json, MysqlJsonBuilder);
}

#[cfg(test)]
mod tests {
    use crate::compiler::Compiler;
    use crate::dialect::Dialect;
    use crate::expr::Expression;
    use serde_json::json;
    use sqlweave_core::Value;

    #[test]
    fn test_json_cast() {
        let compiler = Compiler::for_dialect(Dialect::Mysql);
        let (sql, params) = compiler
            .build(&Expression::col("meta").eq(Expression::json(json!({"a": 1}))))
            .unwrap();
        assert_eq!(sql, "`meta` = CAST(:qp0 AS JSON)");
        assert_eq!(params.value("qp0"), Some(&Value::Text("{\"a\":1}".into())));
    }

    #[test]
    fn test_structured_unsupported() {
        let compiler = Compiler::for_dialect(Dialect::Mysql);
        let err = compiler
            .build(&Expression::structured([("x", 1)]))
            .unwrap_err();
        assert!(err.is_unsupported());
        assert_eq!(err.subject(), Some("Structured"));
    }
}
