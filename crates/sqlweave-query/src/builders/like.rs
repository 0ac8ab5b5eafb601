//! LIKE builder.

use sqlweave_core::{Error, Result, SqlType, Value};

use crate::compiler::BuildContext;
use crate::dialect::LikeEscape;
use crate::expr::{Expression, LikeMode};
use crate::registry::{ExpressionBuilder, mismatched};

/// Renders one `column [NOT] LIKE pattern` per pattern, joined by AND/OR.
#[derive(Debug, Clone, Copy, Default)]
pub struct LikeBuilder {
    /// Use `ILIKE` for case-insensitive matches instead of `LOWER(...)`
    pub native_ilike: bool,
}

impl LikeBuilder {
    /// A builder for dialects with a native `ILIKE` operator.
    pub const fn native_ilike() -> Self {
        Self { native_ilike: true }
    }
}

impl ExpressionBuilder for LikeBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        let Expression::Like {
            column,
            patterns,
            negated,
            join,
            case_sensitive,
            escape,
            mode,
        } = expr
        else {
            return Err(mismatched("LikeBuilder", expr));
        };

        if patterns.is_empty() {
            return Ok(if *negated {
                String::new()
            } else {
                "0=1".to_string()
            });
        }

        let escape = resolve_escape(escape.as_ref(), ctx.like_escape());
        let column_sql = ctx.column(column)?;
        let lowered = !*case_sensitive && !self.native_ilike;
        let column_sql = if lowered {
            format!("LOWER({column_sql})")
        } else {
            column_sql
        };
        let base = if !*case_sensitive && self.native_ilike {
            "ILIKE"
        } else {
            "LIKE"
        };
        let operator = if *negated {
            format!("NOT {base}")
        } else {
            base.to_string()
        };

        let mut parts = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let (pattern_sql, clause) = match pattern {
                Expression::Literal { value, .. } => {
                    let text = pattern_text(value)?;
                    let bound = match mode {
                        LikeMode::Pattern => text,
                        _ => mode.wrap(&escape.escape(&text)),
                    };
                    let placeholder = ctx.bind_value(&Value::Text(bound), Some(&SqlType::Text))?;
                    (placeholder, escape.clause())
                }
                other => (ctx.compile(other)?, String::new()),
            };
            let pattern_sql = if lowered {
                format!("LOWER({pattern_sql})")
            } else {
                pattern_sql
            };
            parts.push(format!("{column_sql} {operator} {pattern_sql}{clause}"));
        }

        Ok(parts.join(&format!(" {} ", join.as_str())))
    }
}

/// An expression-level escape map inherits the dialect's ESCAPE character.
fn resolve_escape(custom: Option<&LikeEscape>, dialect_default: &LikeEscape) -> LikeEscape {
    match custom {
        Some(custom) => {
            let mut escape = custom.clone();
            if escape.escape_char.is_none() {
                escape.escape_char = dialect_default.escape_char;
            }
            escape
        }
        None => dialect_default.clone(),
    }
}

fn pattern_text(value: &Value) -> Result<String> {
    match value {
        Value::Text(s) | Value::Decimal(s) => Ok(s.clone()),
        Value::TinyInt(v) => Ok(v.to_string()),
        Value::SmallInt(v) => Ok(v.to_string()),
        Value::Int(v) => Ok(v.to_string()),
        Value::BigInt(v) => Ok(v.to_string()),
        other => Err(Error::invalid_argument(format!(
            "a {} value cannot be used as a LIKE pattern",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::dialect::Dialect;

    #[test]
    fn test_contains_escapes_wildcards() {
        let compiler = Compiler::for_dialect(Dialect::Postgres);
        let (sql, params) = compiler
            .build(&Expression::col("name").contains("foo%"))
            .unwrap();
        assert_eq!(sql, "\"name\" LIKE :qp0");
        assert_eq!(params.value("qp0"), Some(&Value::Text("%foo\\%%".into())));
    }

    #[test]
    fn test_modes() {
        let compiler = Compiler::for_dialect(Dialect::Mysql);
        let (_, params) = compiler
            .build(&Expression::col("a").starts_with("x_"))
            .unwrap();
        assert_eq!(params.value("qp0"), Some(&Value::Text("x\\_%".into())));
        let (_, params) = compiler.build(&Expression::col("a").ends_with("x")).unwrap();
        assert_eq!(params.value("qp0"), Some(&Value::Text("%x".into())));
        let (_, params) = compiler.build(&Expression::col("a").like("x%y")).unwrap();
        assert_eq!(params.value("qp0"), Some(&Value::Text("x%y".into())));
    }

    #[test]
    fn test_multiple_patterns_join() {
        let compiler = Compiler::for_dialect(Dialect::Postgres);
        let (sql, params) = compiler
            .build(&Expression::col("t").contains_any(["a", "b"]))
            .unwrap();
        assert_eq!(sql, "\"t\" LIKE :qp0 OR \"t\" LIKE :qp1");
        assert_eq!(params.len(), 2);
        let (sql, _) = compiler
            .build(&Expression::col("t").contains_all(["a", "b"]))
            .unwrap();
        assert_eq!(sql, "\"t\" LIKE :qp0 AND \"t\" LIKE :qp1");
    }

    #[test]
    fn test_empty_patterns() {
        let compiler = Compiler::for_dialect(Dialect::Postgres);
        let none: Vec<&str> = Vec::new();
        let (sql, _) = compiler
            .build(&Expression::col("t").contains_any(none.clone()))
            .unwrap();
        assert_eq!(sql, "0=1");
        let negated = Expression::col("t").contains_any(none).negate().unwrap();
        assert_eq!(compiler.build(&negated).unwrap().0, "");
    }

    #[test]
    fn test_raw_pattern_not_escaped() {
        let compiler = Compiler::for_dialect(Dialect::Sqlite);
        let (sql, params) = compiler
            .build(&Expression::col("name").contains(Expression::raw("'%' || other || '%'")))
            .unwrap();
        assert_eq!(sql, "\"name\" LIKE '%' || other || '%'");
        assert!(params.is_empty());
    }

    #[test]
    fn test_case_insensitive_lowering() {
        let compiler = Compiler::for_dialect(Dialect::Mysql);
        let (sql, _) = compiler
            .build(&Expression::col("name").contains("Bob").case_insensitive())
            .unwrap();
        assert_eq!(sql, "LOWER(`name`) LIKE LOWER(:qp0)");
    }

    #[test]
    fn test_native_ilike() {
        let compiler = Compiler::for_dialect(Dialect::Postgres);
        let (sql, _) = compiler
            .build(&Expression::col("name").not_contains("Bob").case_insensitive())
            .unwrap();
        assert_eq!(sql, "\"name\" NOT ILIKE :qp0");
    }

    #[test]
    fn test_integer_pattern_and_invalid_pattern() {
        let compiler = Compiler::for_dialect(Dialect::Postgres);
        let (_, params) = compiler.build(&Expression::col("code").contains(42)).unwrap();
        assert_eq!(params.value("qp0"), Some(&Value::Text("%42%".into())));
        let err = compiler
            .build(&Expression::col("code").contains(true))
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_custom_escape_inherits_clause() {
        let compiler = Compiler::for_dialect(Dialect::Sqlite);
        let expr = Expression::col("a")
            .contains("50%")
            .escape_with(LikeEscape::new([('%', "\\%")]));
        let (sql, params) = compiler.build(&expr).unwrap();
        assert_eq!(sql, "\"a\" LIKE :qp0 ESCAPE '\\'");
        assert_eq!(params.value("qp0"), Some(&Value::Text("%50\\%%".into())));
    }
}
