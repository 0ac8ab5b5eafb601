use serde_json::json;
use sqlweave::builders::{InBuilder, LikeBuilder};
use sqlweave::prelude::*;
use sqlweave::{
    BuildContext, ExprKind, ExpressionBuilder, ExpressionErrorKind, LikeEscape, Quoter,
    SqlDialect, ValueFormatter, quote_ident,
};

fn build(dialect: Dialect, expr: &Expression) -> (String, ParamTable) {
    Compiler::for_dialect(dialect).build(expr).unwrap()
}

#[test]
fn identifiers_are_quoted_per_dialect() {
    let expr = Expression::col("u.name").eq("ann");
    let expected = [
        (Dialect::Postgres, "\"u\".\"name\" = :qp0"),
        (Dialect::Mysql, "`u`.`name` = :qp0"),
        (Dialect::Sqlite, "\"u\".\"name\" = :qp0"),
        (Dialect::Mssql, "[u].[name] = :qp0"),
        (Dialect::Oracle, "\"u\".\"name\" = :qp0"),
    ];
    for (dialect, sql) in expected {
        assert_eq!(build(dialect, &expr).0, sql, "dialect {dialect}");
    }
}

#[test]
fn case_insensitive_like_uses_ilike_only_on_postgres() {
    let expr = Expression::col("name").contains("Ann").case_insensitive();

    let (sql, _) = build(Dialect::Postgres, &expr);
    assert_eq!(sql, "\"name\" ILIKE :qp0");

    let (sql, params) = build(Dialect::Mysql, &expr);
    assert_eq!(sql, "LOWER(`name`) LIKE LOWER(:qp0)");
    assert_eq!(params.value("qp0"), Some(&Value::Text("%Ann%".into())));

    let (sql, _) = build(Dialect::Sqlite, &expr);
    assert_eq!(sql, "LOWER(\"name\") LIKE LOWER(:qp0) ESCAPE '\\'");
}

#[test]
fn like_escaping_follows_the_dialect() {
    let expr = Expression::col("code").contains("5%_off");

    let (_, params) = build(Dialect::Postgres, &expr);
    assert_eq!(params.value("qp0"), Some(&Value::Text("%5\\%\\_off%".into())));

    let (sql, params) = build(Dialect::Mssql, &expr);
    assert_eq!(sql, "[code] LIKE :qp0");
    assert_eq!(params.value("qp0"), Some(&Value::Text("%5[%][_]off%".into())));

    let (sql, params) = build(Dialect::Oracle, &expr);
    assert_eq!(sql, "\"code\" LIKE :qp0 ESCAPE '!'");
    assert_eq!(params.value("qp0"), Some(&Value::Text("%5!%!_off%".into())));
}

#[test]
fn composite_in_is_expanded_where_row_values_are_missing() {
    let expr = Expression::in_rows(["a", "b"], vec![vec![1, 2], vec![3, 4]]);

    let (sql, _) = build(Dialect::Mysql, &expr);
    assert_eq!(sql, "(`a`, `b`) IN ((:qp0, :qp1), (:qp2, :qp3))");

    let expanded = "(\"a\" = :qp0 AND \"b\" = :qp1) OR (\"a\" = :qp2 AND \"b\" = :qp3)";
    assert_eq!(build(Dialect::Sqlite, &expr).0, expanded);

    let (sql, params) = build(Dialect::Mssql, &expr);
    assert_eq!(
        sql,
        "([a] = :qp0 AND [b] = :qp1) OR ([a] = :qp2 AND [b] = :qp3)"
    );
    assert_eq!(params.len(), 4);

    let negated = Expression::not_in_rows(["a", "b"], vec![vec![1, 2]]);
    assert_eq!(
        build(Dialect::Sqlite, &negated).0,
        "NOT ((\"a\" = :qp0 AND \"b\" = :qp1))"
    );
}

#[test]
fn composite_subquery_in_fails_on_mssql() {
    let query = SelectQuery::new("pairs").columns(["a", "b"]);
    let expr = Expression::In {
        columns: vec![Expression::col("a"), Expression::col("b")],
        values: sqlweave::InValues::Subquery(std::sync::Arc::new(query.clone())),
        negated: false,
    };

    let err = Compiler::for_dialect(Dialect::Mssql).build(&expr).unwrap_err();
    assert_eq!(
        err.expression_kind(),
        Some(ExpressionErrorKind::UnsupportedExpression)
    );

    let (sql, _) = build(Dialect::Postgres, &expr);
    assert_eq!(sql, "(\"a\", \"b\") IN (SELECT \"a\", \"b\" FROM \"pairs\")");
}

#[test]
fn oracle_splits_long_in_lists() {
    let ids: Vec<i64> = (0..2500).collect();
    let (sql, params) = build(Dialect::Oracle, &Expression::col("id").in_list(ids.clone()));
    assert_eq!(params.len(), 2500);
    assert_eq!(sql.matches("\"id\" IN (").count(), 3);
    assert!(sql.starts_with("(\"id\" IN (:qp0, "));

    let (sql, _) = build(Dialect::Oracle, &Expression::col("id").not_in_list(ids));
    assert_eq!(sql.matches("\"id\" NOT IN (").count(), 3);
    assert_eq!(sql.matches(") AND (").count(), 2);

    let (sql, _) = build(Dialect::Postgres, &Expression::col("id").in_list(0..2500_i64));
    assert_eq!(sql.matches(" IN (").count(), 1);
}

#[test]
fn payload_expressions_per_dialect() {
    let json_expr = Expression::col("meta").eq(Expression::json(json!({"a": 1})));

    assert_eq!(build(Dialect::Postgres, &json_expr).0, "\"meta\" = :qp0::jsonb");
    assert_eq!(build(Dialect::Mysql, &json_expr).0, "`meta` = CAST(:qp0 AS JSON)");

    let (sql, params) = build(Dialect::Sqlite, &json_expr);
    assert_eq!(sql, "\"meta\" = :qp0");
    assert_eq!(params.value("qp0"), Some(&Value::Text("{\"a\":1}".into())));

    let array = Expression::col("tags").eq(Expression::array(["x", "y"]));
    assert_eq!(build(Dialect::Postgres, &array).0, "\"tags\" = ARRAY[:qp0, :qp1]");
    let (sql, params) = build(Dialect::Sqlite, &array);
    assert_eq!(sql, "\"tags\" = :qp0");
    assert_eq!(params.value("qp0"), Some(&Value::Text("[\"x\",\"y\"]".into())));

    let row = Expression::structured([("x", 1), ("y", 2)]);
    assert_eq!(build(Dialect::Postgres, &row).0, "ROW(:qp0, :qp1)");
    for dialect in [Dialect::Mysql, Dialect::Sqlite, Dialect::Mssql, Dialect::Oracle] {
        let err = Compiler::for_dialect(dialect).build(&row).unwrap_err();
        assert!(err.is_unsupported(), "dialect {dialect}");
        assert_eq!(err.subject(), Some("Structured"));
    }
}

#[test]
fn booleans_are_inlined_on_mssql_and_oracle() {
    let expr = Expression::col("active").eq(true);
    assert_eq!(build(Dialect::Mssql, &expr).0, "[active] = 1");
    assert_eq!(build(Dialect::Oracle, &expr).0, "\"active\" = 1");

    let (sql, params) = build(Dialect::Postgres, &expr);
    assert_eq!(sql, "\"active\" = :qp0");
    assert_eq!(params.value("qp0"), Some(&Value::Bool(true)));

    let forced = Compiler::builder(Dialect::Postgres)
        .inline_booleans(true)
        .build()
        .unwrap();
    assert_eq!(forced.build(&expr).unwrap().0, "\"active\" = 1");
}

#[test]
fn select_subquery_limits_per_dialect() {
    let query = SelectQuery::new("events").columns(["user_id"]).limit(5).offset(10);
    let expr = Expression::col("id").in_subquery(query);

    assert_eq!(
        build(Dialect::Postgres, &expr).0,
        "\"id\" IN (SELECT \"user_id\" FROM \"events\" LIMIT 5 OFFSET 10)"
    );
    assert_eq!(
        build(Dialect::Mssql, &expr).0,
        "[id] IN (SELECT [user_id] FROM [events] ORDER BY (SELECT NULL) \
         OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY)"
    );
    assert_eq!(
        build(Dialect::Oracle, &expr).0,
        "\"id\" IN (SELECT \"user_id\" FROM \"events\" OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY)"
    );
}

#[test]
fn positional_placeholders_per_dialect() {
    let expr = Expression::col("a").eq(1).and(Expression::col("b").eq(2));
    let expected = [
        (Dialect::Postgres, "$1", "$2"),
        (Dialect::Mysql, "?", "?"),
        (Dialect::Sqlite, "?1", "?2"),
        (Dialect::Mssql, "@P1", "@P2"),
        (Dialect::Oracle, ":1", ":2"),
    ];
    for (dialect, first, second) in expected {
        let (sql, values) = sqlweave::compile_positional(&Compiler::for_dialect(dialect), &expr).unwrap();
        assert!(sql.contains(&format!("= {first})")), "{sql}");
        assert!(sql.ends_with(&format!("= {second})")), "{sql}");
        assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
    }
}

// ==================== Custom dialects ====================

#[derive(Debug)]
struct Snowflake;

impl Quoter for Snowflake {
    fn quote_column(&self, name: &str) -> String {
        quote_ident(&name.to_uppercase())
    }

    fn quote_table(&self, name: &str) -> String {
        quote_ident(&name.to_uppercase())
    }
}

impl ValueFormatter for Snowflake {}

impl SqlDialect for Snowflake {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn like_escape(&self) -> LikeEscape {
        LikeEscape::backslash().with_escape_char('\\')
    }

    fn register_builders(&self, registry: &mut sqlweave::BuilderRegistry) {
        registry
            .register_override(ExprKind::Like, LikeBuilder::native_ilike())
            .register_override(
                ExprKind::In,
                InBuilder {
                    max_list_size: Some(2),
                    ..InBuilder::default()
                },
            );
    }
}

#[test]
fn custom_dialect_installs_its_own_builders() {
    let compiler = Compiler::new(Snowflake);
    assert!(compiler.registry().has_override(ExprKind::Like));

    let expr = Expression::col("name")
        .contains("x")
        .case_insensitive()
        .and(Expression::col("id").in_list([1, 2, 3]));
    let (sql, _) = compiler.build(&expr).unwrap();
    assert_eq!(
        sql,
        "(\"NAME\" ILIKE :qp0 ESCAPE '\\') AND \
         ((\"ID\" IN (:qp1, :qp2)) OR (\"ID\" IN (:qp3)))"
    );
}

#[derive(Debug)]
struct UppercaseRaw;

impl ExpressionBuilder for UppercaseRaw {
    fn build(&self, expr: &Expression, _ctx: &mut BuildContext<'_>) -> Result<String> {
        match expr {
            Expression::Raw { sql, .. } => Ok(sql.to_uppercase()),
            other => Err(Error::unsupported(other.kind().name(), "not a raw fragment")),
        }
    }
}

#[test]
fn compiler_builder_overrides_take_precedence() {
    let compiler = Compiler::builder(Dialect::Sqlite)
        .override_builder(ExprKind::Raw, UppercaseRaw)
        .build()
        .unwrap();
    let expr = Expression::raw("a > b").and(Expression::col("c").eq(1));
    assert_eq!(compiler.build(&expr).unwrap().0, "(A > B) AND (\"c\" = :qp0)");

    let plain = Compiler::for_dialect(Dialect::Sqlite);
    assert_eq!(plain.build(&expr).unwrap().0, "(a > b) AND (\"c\" = :qp0)");
}
