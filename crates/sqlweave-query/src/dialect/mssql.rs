//! SQL Server dialect overrides.

use crate::builders::InBuilder;
use crate::dialect::LikeEscape;
use crate::expr::ExprKind;
use crate::registry::BuilderRegistry;

/// Wildcards are escaped by wrapping them in brackets.
pub(super) fn like_escape() -> LikeEscape {
    LikeEscape::new([
        ('%', "[%]"),
        ('_', "[_]"),
        ('[', "[[]"),
        (']', "[]]"),
        ('\\', "[\\]"),
    ])
}

pub(super) fn register(registry: &mut BuilderRegistry) {
    registry.register_override(
        ExprKind::In,
        InBuilder {
            composite_subquery: false,
            ..InBuilder::expanded()
        },
    );
}

#[cfg(test)]
mod tests {
    use crate::compiler::Compiler;
    use crate::dialect::Dialect;
    use crate::expr::Expression;
    use crate::subquery::SelectQuery;
    use sqlweave_core::{ExpressionErrorKind, Value};

    #[test]
    fn test_like_bracket_escaping() {
        let compiler = Compiler::for_dialect(Dialect::Mssql);
        let (sql, params) = compiler
            .build(&Expression::col("code").starts_with("A_1%"))
            .unwrap();
        assert_eq!(sql, "[code] LIKE :qp0");
        assert_eq!(params.value("qp0"), Some(&Value::Text("A[_]1[%]%".into())));
    }

    #[test]
    fn test_booleans_inlined() {
        let compiler = Compiler::for_dialect(Dialect::Mssql);
        let (sql, params) = compiler.build(&Expression::col("active").eq(false)).unwrap();
        assert_eq!(sql, "[active] = 0");
        assert!(params.is_empty());
    }

    #[test]
    fn test_composite_subquery_unsupported() {
        let compiler = Compiler::for_dialect(Dialect::Mssql);
        let expr = crate::expr::Expression::In {
            columns: vec![Expression::col("a"), Expression::col("b")],
            values: crate::expr::InValues::Subquery(std::sync::Arc::new(
                SelectQuery::new("t").columns(["a", "b"]),
            )),
            negated: false,
        };
        let err = compiler.build(&expr).unwrap_err();
        assert_eq!(
            err.expression_kind(),
            Some(ExpressionErrorKind::UnsupportedExpression)
        );
        assert_eq!(err.subject(), Some("In"));
    }
}
