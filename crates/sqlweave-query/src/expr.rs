//! SQL expression model.
//!
//! [`Expression`] is a closed set of fragment variants. It is pure data: the
//! SQL text is produced by the builders registered in a
//! [`BuilderRegistry`](crate::registry::BuilderRegistry).

use std::fmt;
use std::sync::Arc;

use sqlweave_core::{SqlType, Value};

use crate::condition::Condition;
use crate::dialect::LikeEscape;
use crate::subquery::Subquery;

/// A SQL fragment: condition, value, or composite.
#[derive(Clone)]
pub enum Expression {
    /// Unquoted logical column (or `table.column`) identifier
    Column(String),

    /// Value bound through the value model
    Literal {
        value: Value,
        /// Binding type; inferred from the value when absent
        sql_type: Option<SqlType>,
    },

    /// Caller-trusted SQL with its own named parameters
    Raw {
        sql: String,
        /// Parameter names without the leading `:`
        params: Vec<(String, Value)>,
    },

    /// Parenthesized list: `(a, b, c)`
    List(Vec<Expression>),

    /// Nested statement rendered in parentheses
    Subquery(Arc<dyn Subquery>),

    /// Array payload
    Array {
        items: Vec<Expression>,
        type_hint: Option<String>,
    },

    /// JSON payload
    Json {
        value: serde_json::Value,
        type_hint: Option<String>,
    },

    /// Composite (row) payload with named fields
    Structured {
        fields: Vec<(String, Expression)>,
        type_hint: Option<String>,
    },

    /// CASE [subject] WHEN ... THEN ... [ELSE ...] END
    Case {
        subject: Option<Box<Expression>>,
        when_clauses: Vec<(Condition, Expression)>,
        else_result: Option<Box<Expression>>,
    },

    /// column OP value
    Compare {
        column: Box<Expression>,
        op: CompareOp,
        value: Box<Expression>,
    },

    /// column [NOT] BETWEEN start AND end
    Between {
        column: Box<Expression>,
        start: Box<Expression>,
        end: Box<Expression>,
        negated: bool,
    },

    /// value [NOT] BETWEEN start_column AND end_column
    BetweenColumns {
        value: Box<Expression>,
        start_column: Box<Expression>,
        end_column: Box<Expression>,
        negated: bool,
    },

    /// column(s) [NOT] IN values
    In {
        /// One column, or several for a composite key
        columns: Vec<Expression>,
        values: InValues,
        negated: bool,
    },

    /// column [NOT] LIKE pattern(s)
    Like {
        column: Box<Expression>,
        patterns: Vec<Expression>,
        negated: bool,
        /// Word joining one comparison per pattern
        join: LikeJoin,
        case_sensitive: bool,
        /// Escape map; the dialect default when absent
        escape: Option<LikeEscape>,
        mode: LikeMode,
    },

    /// [NOT] EXISTS (subquery)
    Exists {
        query: Arc<dyn Subquery>,
        negated: bool,
    },

    /// AND / OR / NOT over nested conditions
    Logical {
        kind: LogicalKind,
        operands: Vec<Condition>,
    },

    /// Conjunction of one equality (or IN) per column
    Hash(Vec<(String, Expression)>),
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
}

impl CompareOp {
    /// Get the SQL representation of this operator.
    pub const fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    /// The operator whose result is the logical inverse of this one.
    pub const fn negate(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Ne,
            CompareOp::Ne => CompareOp::Eq,
            CompareOp::Lt => CompareOp::Ge,
            CompareOp::Le => CompareOp::Gt,
            CompareOp::Gt => CompareOp::Le,
            CompareOp::Ge => CompareOp::Lt,
        }
    }

    /// Is this an ordering operator (`<`, `<=`, `>`, `>=`)?
    pub const fn is_ordering(self) -> bool {
        matches!(
            self,
            CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge
        )
    }

    /// Parse an operator token. `!=` is accepted as `<>`.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "=" => Some(CompareOp::Eq),
            "<>" | "!=" => Some(CompareOp::Ne),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            _ => None,
        }
    }
}

/// Logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalKind {
    And,
    Or,
    Not,
}

impl LogicalKind {
    /// Get the SQL keyword.
    pub const fn as_str(self) -> &'static str {
        match self {
            LogicalKind::And => "AND",
            LogicalKind::Or => "OR",
            LogicalKind::Not => "NOT",
        }
    }
}

/// How a LIKE pattern value is wrapped in wildcards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LikeMode {
    /// `%value%`
    #[default]
    Contains,
    /// `value%`
    StartsWith,
    /// `%value`
    EndsWith,
    /// Caller-supplied pattern, neither escaped nor wrapped
    Pattern,
}

impl LikeMode {
    /// Wrap an already escaped value.
    pub fn wrap(self, escaped: &str) -> String {
        match self {
            LikeMode::Contains => format!("%{escaped}%"),
            LikeMode::StartsWith => format!("{escaped}%"),
            LikeMode::EndsWith => format!("%{escaped}"),
            LikeMode::Pattern => escaped.to_string(),
        }
    }
}

/// Word joining the per-pattern comparisons of a LIKE fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LikeJoin {
    #[default]
    And,
    Or,
}

impl LikeJoin {
    /// Get the SQL keyword.
    pub const fn as_str(self) -> &'static str {
        match self {
            LikeJoin::And => "AND",
            LikeJoin::Or => "OR",
        }
    }

    const fn flip(self) -> Self {
        match self {
            LikeJoin::And => LikeJoin::Or,
            LikeJoin::Or => LikeJoin::And,
        }
    }
}

/// Right-hand side of an IN fragment.
#[derive(Clone, Debug)]
pub enum InValues {
    /// Values for a single column
    List(Vec<Expression>),
    /// One tuple per row for a composite key
    Rows(Vec<Vec<Expression>>),
    /// Nested statement
    Subquery(Arc<dyn Subquery>),
}

/// Variant tag used by the builder registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    Column,
    Literal,
    Raw,
    List,
    Subquery,
    Array,
    Json,
    Structured,
    Case,
    Compare,
    Between,
    BetweenColumns,
    In,
    Like,
    Exists,
    Logical,
    Hash,
}

impl ExprKind {
    /// Every variant tag.
    pub const ALL: [ExprKind; 17] = [
        ExprKind::Column,
        ExprKind::Literal,
        ExprKind::Raw,
        ExprKind::List,
        ExprKind::Subquery,
        ExprKind::Array,
        ExprKind::Json,
        ExprKind::Structured,
        ExprKind::Case,
        ExprKind::Compare,
        ExprKind::Between,
        ExprKind::BetweenColumns,
        ExprKind::In,
        ExprKind::Like,
        ExprKind::Exists,
        ExprKind::Logical,
        ExprKind::Hash,
    ];

    /// Get the variant name.
    pub const fn name(self) -> &'static str {
        match self {
            ExprKind::Column => "Column",
            ExprKind::Literal => "Literal",
            ExprKind::Raw => "Raw",
            ExprKind::List => "List",
            ExprKind::Subquery => "Subquery",
            ExprKind::Array => "Array",
            ExprKind::Json => "Json",
            ExprKind::Structured => "Structured",
            ExprKind::Case => "Case",
            ExprKind::Compare => "Compare",
            ExprKind::Between => "Between",
            ExprKind::BetweenColumns => "BetweenColumns",
            ExprKind::In => "In",
            ExprKind::Like => "Like",
            ExprKind::Exists => "Exists",
            ExprKind::Logical => "Logical",
            ExprKind::Hash => "Hash",
        }
    }
}

impl fmt::Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Column(name) => f.debug_tuple("Column").field(name).finish(),
            Expression::Literal { value, sql_type } => f
                .debug_struct("Literal")
                .field("value", value)
                .field("sql_type", sql_type)
                .finish(),
            Expression::Raw { sql, params } => f
                .debug_struct("Raw")
                .field("sql", sql)
                .field("params", params)
                .finish(),
            Expression::List(items) => f.debug_tuple("List").field(items).finish(),
            Expression::Subquery(query) => f.debug_tuple("Subquery").field(query).finish(),
            Expression::Array { items, type_hint } => f
                .debug_struct("Array")
                .field("items", items)
                .field("type_hint", type_hint)
                .finish(),
            Expression::Json { value, type_hint } => f
                .debug_struct("Json")
                .field("value", value)
                .field("type_hint", type_hint)
                .finish(),
            Expression::Structured { fields, type_hint } => f
                .debug_struct("Structured")
                .field("fields", fields)
                .field("type_hint", type_hint)
                .finish(),
            Expression::Case {
                subject,
                when_clauses,
                else_result,
            } => f
                .debug_struct("Case")
                .field("subject", subject)
                .field("when_clauses", when_clauses)
                .field("else_result", else_result)
                .finish(),
            Expression::Compare { column, op, value } => f
                .debug_struct("Compare")
                .field("column", column)
                .field("op", op)
                .field("value", value)
                .finish(),
            Expression::Between {
                column,
                start,
                end,
                negated,
            } => f
                .debug_struct("Between")
                .field("column", column)
                .field("start", start)
                .field("end", end)
                .field("negated", negated)
                .finish(),
            Expression::BetweenColumns {
                value,
                start_column,
                end_column,
                negated,
            } => f
                .debug_struct("BetweenColumns")
                .field("value", value)
                .field("start_column", start_column)
                .field("end_column", end_column)
                .field("negated", negated)
                .finish(),
            Expression::In {
                columns,
                values,
                negated,
            } => f
                .debug_struct("In")
                .field("columns", columns)
                .field("values", values)
                .field("negated", negated)
                .finish(),
            Expression::Like {
                column,
                patterns,
                negated,
                join,
                case_sensitive,
                escape,
                mode,
            } => f
                .debug_struct("Like")
                .field("column", column)
                .field("patterns", patterns)
                .field("negated", negated)
                .field("join", join)
                .field("case_sensitive", case_sensitive)
                .field("escape", escape)
                .field("mode", mode)
                .finish(),
            Expression::Exists { query, negated } => f
                .debug_struct("Exists")
                .field("query", query)
                .field("negated", negated)
                .finish(),
            Expression::Logical { kind, operands } => f
                .debug_struct("Logical")
                .field("kind", kind)
                .field("operands", operands)
                .finish(),
            Expression::Hash(pairs) => f.debug_tuple("Hash").field(pairs).finish(),
        }
    }
}

impl Expression {
    /// The variant tag used for builder dispatch.
    pub const fn kind(&self) -> ExprKind {
        match self {
            Expression::Column(_) => ExprKind::Column,
            Expression::Literal { .. } => ExprKind::Literal,
            Expression::Raw { .. } => ExprKind::Raw,
            Expression::List(_) => ExprKind::List,
            Expression::Subquery(_) => ExprKind::Subquery,
            Expression::Array { .. } => ExprKind::Array,
            Expression::Json { .. } => ExprKind::Json,
            Expression::Structured { .. } => ExprKind::Structured,
            Expression::Case { .. } => ExprKind::Case,
            Expression::Compare { .. } => ExprKind::Compare,
            Expression::Between { .. } => ExprKind::Between,
            Expression::BetweenColumns { .. } => ExprKind::BetweenColumns,
            Expression::In { .. } => ExprKind::In,
            Expression::Like { .. } => ExprKind::Like,
            Expression::Exists { .. } => ExprKind::Exists,
            Expression::Logical { .. } => ExprKind::Logical,
            Expression::Hash(_) => ExprKind::Hash,
        }
    }

    /// Is this a literal NULL?
    pub fn is_null_literal(&self) -> bool {
        matches!(
            self,
            Expression::Literal {
                value: Value::Null,
                ..
            }
        )
    }

    // ==================== Constructors ====================

    /// Create a column reference expression.
    pub fn col(name: impl Into<String>) -> Self {
        Expression::Column(name.into())
    }

    /// Create a literal value expression with an inferred binding type.
    pub fn lit(value: impl Into<Value>) -> Self {
        Expression::Literal {
            value: value.into(),
            sql_type: None,
        }
    }

    /// Create a literal value expression with an explicit binding type.
    pub fn typed(value: impl Into<Value>, sql_type: SqlType) -> Self {
        Expression::Literal {
            value: value.into(),
            sql_type: Some(sql_type),
        }
    }

    /// Create a NULL literal.
    pub fn null() -> Self {
        Expression::lit(Value::Null)
    }

    /// Create a raw SQL expression (escape hatch).
    pub fn raw(sql: impl Into<String>) -> Self {
        Expression::Raw {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Create a raw SQL expression carrying named parameters.
    ///
    /// Names may be given with or without the leading `:`.
    pub fn raw_with_params<N: Into<String>, V: Into<Value>>(
        sql: impl Into<String>,
        params: impl IntoIterator<Item = (N, V)>,
    ) -> Self {
        Expression::Raw {
            sql: sql.into(),
            params: params
                .into_iter()
                .map(|(name, value)| {
                    let name = name.into();
                    let name = name.strip_prefix(':').map(str::to_string).unwrap_or(name);
                    (name, value.into())
                })
                .collect(),
        }
    }

    /// Create a parenthesized list of values.
    pub fn list<T: Into<Expression>>(items: impl IntoIterator<Item = T>) -> Self {
        Expression::List(items.into_iter().map(Into::into).collect())
    }

    /// Wrap a nested statement.
    pub fn subquery(query: impl Subquery + 'static) -> Self {
        Expression::Subquery(Arc::new(query))
    }

    /// Create an array payload.
    pub fn array<T: Into<Expression>>(items: impl IntoIterator<Item = T>) -> Self {
        Expression::Array {
            items: items.into_iter().map(Into::into).collect(),
            type_hint: None,
        }
    }

    /// Create a JSON payload.
    pub fn json(value: serde_json::Value) -> Self {
        Expression::Json {
            value,
            type_hint: None,
        }
    }

    /// Create a composite (row) payload.
    pub fn structured<N: Into<String>, T: Into<Expression>>(
        fields: impl IntoIterator<Item = (N, T)>,
    ) -> Self {
        Expression::Structured {
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
            type_hint: None,
        }
    }

    /// Attach a type hint to an array, JSON or structured payload.
    ///
    /// Other variants are returned unchanged.
    pub fn with_type_hint(self, hint: impl Into<String>) -> Self {
        let hint = Some(hint.into());
        match self {
            Expression::Array { items, .. } => Expression::Array {
                items,
                type_hint: hint,
            },
            Expression::Json { value, .. } => Expression::Json {
                value,
                type_hint: hint,
            },
            Expression::Structured { fields, .. } => Expression::Structured {
                fields,
                type_hint: hint,
            },
            other => other,
        }
    }

    /// Conjunction of one equality (or IN) per `(column, value)` pair.
    pub fn hash<N: Into<String>, T: Into<Expression>>(
        pairs: impl IntoIterator<Item = (N, T)>,
    ) -> Self {
        Expression::Hash(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    /// `[NOT] EXISTS (query)`
    pub fn exists(query: impl Subquery + 'static) -> Self {
        Expression::Exists {
            query: Arc::new(query),
            negated: false,
        }
    }

    /// `NOT EXISTS (query)`
    pub fn not_exists(query: impl Subquery + 'static) -> Self {
        Expression::Exists {
            query: Arc::new(query),
            negated: true,
        }
    }

    /// `value BETWEEN start_column AND end_column`
    pub fn between_columns(
        value: impl Into<Expression>,
        start_column: impl IntoColumn,
        end_column: impl IntoColumn,
    ) -> Self {
        Expression::BetweenColumns {
            value: Box::new(value.into()),
            start_column: Box::new(start_column.into_column()),
            end_column: Box::new(end_column.into_column()),
            negated: false,
        }
    }

    /// `value NOT BETWEEN start_column AND end_column`
    pub fn not_between_columns(
        value: impl Into<Expression>,
        start_column: impl IntoColumn,
        end_column: impl IntoColumn,
    ) -> Self {
        Expression::BetweenColumns {
            value: Box::new(value.into()),
            start_column: Box::new(start_column.into_column()),
            end_column: Box::new(end_column.into_column()),
            negated: true,
        }
    }

    /// Composite-key IN: `(c1, c2) IN ((v1, v2), ...)`
    pub fn in_rows<C, R, T>(columns: impl IntoIterator<Item = C>, rows: R) -> Self
    where
        C: IntoColumn,
        R: IntoIterator,
        R::Item: IntoIterator<Item = T>,
        T: Into<Expression>,
    {
        Expression::In {
            columns: columns.into_iter().map(IntoColumn::into_column).collect(),
            values: InValues::Rows(
                rows.into_iter()
                    .map(|row| row.into_iter().map(Into::into).collect())
                    .collect(),
            ),
            negated: false,
        }
    }

    /// Composite-key NOT IN.
    pub fn not_in_rows<C, R, T>(columns: impl IntoIterator<Item = C>, rows: R) -> Self
    where
        C: IntoColumn,
        R: IntoIterator,
        R::Item: IntoIterator<Item = T>,
        T: Into<Expression>,
    {
        match Expression::in_rows(columns, rows) {
            Expression::In {
                columns, values, ..
            } => Expression::In {
                columns,
                values,
                negated: true,
            },
            other => other,
        }
    }

    /// `AND` over the given conditions.
    pub fn and_all<C: Into<Condition>>(operands: impl IntoIterator<Item = C>) -> Self {
        Expression::Logical {
            kind: LogicalKind::And,
            operands: operands.into_iter().map(Into::into).collect(),
        }
    }

    /// `OR` over the given conditions.
    pub fn or_any<C: Into<Condition>>(operands: impl IntoIterator<Item = C>) -> Self {
        Expression::Logical {
            kind: LogicalKind::Or,
            operands: operands.into_iter().map(Into::into).collect(),
        }
    }

    /// `NOT` of a condition.
    pub fn not_of(operand: impl Into<Condition>) -> Self {
        Expression::Logical {
            kind: LogicalKind::Not,
            operands: vec![operand.into()],
        }
    }

    // ==================== Comparison Operators ====================

    /// Compare this expression with a value.
    pub fn compare(self, op: CompareOp, value: impl Into<Expression>) -> Self {
        Expression::Compare {
            column: Box::new(self),
            op,
            value: Box::new(value.into()),
        }
    }

    /// Equal to (=)
    pub fn eq(self, value: impl Into<Expression>) -> Self {
        self.compare(CompareOp::Eq, value)
    }

    /// Not equal to (<>)
    pub fn ne(self, value: impl Into<Expression>) -> Self {
        self.compare(CompareOp::Ne, value)
    }

    /// Less than (<)
    pub fn lt(self, value: impl Into<Expression>) -> Self {
        self.compare(CompareOp::Lt, value)
    }

    /// Less than or equal to (<=)
    pub fn le(self, value: impl Into<Expression>) -> Self {
        self.compare(CompareOp::Le, value)
    }

    /// Greater than (>)
    pub fn gt(self, value: impl Into<Expression>) -> Self {
        self.compare(CompareOp::Gt, value)
    }

    /// Greater than or equal to (>=)
    pub fn ge(self, value: impl Into<Expression>) -> Self {
        self.compare(CompareOp::Ge, value)
    }

    /// IS NULL
    pub fn is_null(self) -> Self {
        self.eq(Expression::null())
    }

    /// IS NOT NULL
    pub fn is_not_null(self) -> Self {
        self.ne(Expression::null())
    }

    // ==================== Logical Operators ====================

    /// Logical AND
    pub fn and(self, other: impl Into<Condition>) -> Self {
        Expression::Logical {
            kind: LogicalKind::And,
            operands: vec![Condition::Expr(self), other.into()],
        }
    }

    /// Logical OR
    pub fn or(self, other: impl Into<Condition>) -> Self {
        Expression::Logical {
            kind: LogicalKind::Or,
            operands: vec![Condition::Expr(self), other.into()],
        }
    }

    /// Logical NOT
    pub fn not(self) -> Self {
        Expression::not_of(self)
    }

    // ==================== BETWEEN ====================

    /// BETWEEN start AND end
    pub fn between(self, start: impl Into<Expression>, end: impl Into<Expression>) -> Self {
        Expression::Between {
            column: Box::new(self),
            start: Box::new(start.into()),
            end: Box::new(end.into()),
            negated: false,
        }
    }

    /// NOT BETWEEN start AND end
    pub fn not_between(self, start: impl Into<Expression>, end: impl Into<Expression>) -> Self {
        Expression::Between {
            column: Box::new(self),
            start: Box::new(start.into()),
            end: Box::new(end.into()),
            negated: true,
        }
    }

    // ==================== IN Expressions ====================

    /// IN list of values.
    ///
    /// Accepts any iterator, so lazily produced values are collected here.
    pub fn in_list<T: Into<Expression>>(self, values: impl IntoIterator<Item = T>) -> Self {
        Expression::In {
            columns: vec![self],
            values: InValues::List(values.into_iter().map(Into::into).collect()),
            negated: false,
        }
    }

    /// NOT IN list of values
    pub fn not_in_list<T: Into<Expression>>(self, values: impl IntoIterator<Item = T>) -> Self {
        Expression::In {
            columns: vec![self],
            values: InValues::List(values.into_iter().map(Into::into).collect()),
            negated: true,
        }
    }

    /// IN (subquery)
    pub fn in_subquery(self, query: impl Subquery + 'static) -> Self {
        Expression::In {
            columns: vec![self],
            values: InValues::Subquery(Arc::new(query)),
            negated: false,
        }
    }

    /// NOT IN (subquery)
    pub fn not_in_subquery(self, query: impl Subquery + 'static) -> Self {
        Expression::In {
            columns: vec![self],
            values: InValues::Subquery(Arc::new(query)),
            negated: true,
        }
    }

    // ==================== Pattern Matching ====================

    fn like_with(self, pattern: impl Into<Expression>, mode: LikeMode, negated: bool) -> Self {
        Expression::Like {
            column: Box::new(self),
            patterns: vec![pattern.into()],
            negated,
            join: LikeJoin::And,
            case_sensitive: true,
            escape: None,
            mode,
        }
    }

    /// LIKE with a caller-supplied pattern (no escaping, no wrapping).
    pub fn like(self, pattern: impl Into<Expression>) -> Self {
        self.like_with(pattern, LikeMode::Pattern, false)
    }

    /// NOT LIKE with a caller-supplied pattern.
    pub fn not_like(self, pattern: impl Into<Expression>) -> Self {
        self.like_with(pattern, LikeMode::Pattern, true)
    }

    /// Column contains the given substring (`LIKE '%value%'`, escaped).
    pub fn contains(self, value: impl Into<Expression>) -> Self {
        self.like_with(value, LikeMode::Contains, false)
    }

    /// Column does not contain the given substring.
    pub fn not_contains(self, value: impl Into<Expression>) -> Self {
        self.like_with(value, LikeMode::Contains, true)
    }

    /// Column starts with the given prefix (`LIKE 'value%'`, escaped).
    pub fn starts_with(self, value: impl Into<Expression>) -> Self {
        self.like_with(value, LikeMode::StartsWith, false)
    }

    /// Column ends with the given suffix (`LIKE '%value'`, escaped).
    pub fn ends_with(self, value: impl Into<Expression>) -> Self {
        self.like_with(value, LikeMode::EndsWith, false)
    }

    /// Column matches any of the given substrings (`OR LIKE`).
    pub fn contains_any<T: Into<Expression>>(self, values: impl IntoIterator<Item = T>) -> Self {
        Expression::Like {
            column: Box::new(self),
            patterns: values.into_iter().map(Into::into).collect(),
            negated: false,
            join: LikeJoin::Or,
            case_sensitive: true,
            escape: None,
            mode: LikeMode::Contains,
        }
    }

    /// Column matches all of the given substrings (`AND LIKE`).
    pub fn contains_all<T: Into<Expression>>(self, values: impl IntoIterator<Item = T>) -> Self {
        Expression::Like {
            column: Box::new(self),
            patterns: values.into_iter().map(Into::into).collect(),
            negated: false,
            join: LikeJoin::And,
            case_sensitive: true,
            escape: None,
            mode: LikeMode::Contains,
        }
    }

    /// Make a LIKE fragment case-insensitive. Other variants are returned unchanged.
    pub fn case_insensitive(mut self) -> Self {
        if let Expression::Like { case_sensitive, .. } = &mut self {
            *case_sensitive = false;
        }
        self
    }

    /// Override the escape map of a LIKE fragment. Other variants are returned unchanged.
    pub fn escape_with(mut self, map: LikeEscape) -> Self {
        if let Expression::Like { escape, .. } = &mut self {
            *escape = Some(map);
        }
        self
    }

    // ==================== CASE Expression ====================

    /// Start building a searched CASE expression.
    ///
    /// # Example
    /// ```
    /// use sqlweave_query::Expression;
    ///
    /// let expr = Expression::case()
    ///     .when(Expression::col("status").eq("active"), Expression::lit("Yes"))
    ///     .otherwise(Expression::lit("No"));
    /// assert!(matches!(expr, Expression::Case { .. }));
    /// ```
    pub fn case() -> CaseBuilder {
        CaseBuilder {
            subject: None,
            when_clauses: Vec::new(),
        }
    }

    /// Start building a simple CASE expression over a subject.
    pub fn case_of(subject: impl Into<Expression>) -> CaseBuilder {
        CaseBuilder {
            subject: Some(Box::new(subject.into())),
            when_clauses: Vec::new(),
        }
    }

    // ==================== Negation ====================

    /// Rewrite this fragment into its logical inverse, when one exists.
    ///
    /// Returns `None` for fragments that can only be negated textually.
    pub fn negate(&self) -> Option<Expression> {
        match self {
            Expression::Compare { column, op, value } => Some(Expression::Compare {
                column: column.clone(),
                op: op.negate(),
                value: value.clone(),
            }),
            Expression::Between {
                column,
                start,
                end,
                negated,
            } => Some(Expression::Between {
                column: column.clone(),
                start: start.clone(),
                end: end.clone(),
                negated: !negated,
            }),
            Expression::BetweenColumns {
                value,
                start_column,
                end_column,
                negated,
            } => Some(Expression::BetweenColumns {
                value: value.clone(),
                start_column: start_column.clone(),
                end_column: end_column.clone(),
                negated: !negated,
            }),
            Expression::In {
                columns,
                values,
                negated,
            } => Some(Expression::In {
                columns: columns.clone(),
                values: values.clone(),
                negated: !negated,
            }),
            Expression::Like {
                column,
                patterns,
                negated,
                join,
                case_sensitive,
                escape,
                mode,
            } => Some(Expression::Like {
                column: column.clone(),
                patterns: patterns.clone(),
                negated: !negated,
                join: join.flip(),
                case_sensitive: *case_sensitive,
                escape: escape.clone(),
                mode: *mode,
            }),
            Expression::Exists { query, negated } => Some(Expression::Exists {
                query: Arc::clone(query),
                negated: !negated,
            }),
            Expression::Logical {
                kind: LogicalKind::Not,
                operands,
            } => match operands.as_slice() {
                [Condition::Expr(inner)] => Some(inner.clone()),
                _ => None,
            },
            _ => None,
        }
    }
}

// ==================== CASE Builder ====================

/// Builder for CASE WHEN expressions.
#[derive(Debug, Clone)]
pub struct CaseBuilder {
    subject: Option<Box<Expression>>,
    when_clauses: Vec<(Condition, Expression)>,
}

impl CaseBuilder {
    /// Add a WHEN condition with its THEN result.
    pub fn when(mut self, condition: impl Into<Condition>, result: impl Into<Expression>) -> Self {
        self.when_clauses.push((condition.into(), result.into()));
        self
    }

    /// Finalize with an ELSE clause.
    pub fn otherwise(self, else_result: impl Into<Expression>) -> Expression {
        Expression::Case {
            subject: self.subject,
            when_clauses: self.when_clauses,
            else_result: Some(Box::new(else_result.into())),
        }
    }

    /// Finalize without an ELSE clause.
    pub fn end(self) -> Expression {
        Expression::Case {
            subject: self.subject,
            when_clauses: self.when_clauses,
            else_result: None,
        }
    }
}

// ==================== Conversions ====================

/// Types usable where a column operand is expected.
///
/// Strings become column references; expressions are used as given, so a
/// raw expression or subquery can stand in for a column.
pub trait IntoColumn {
    fn into_column(self) -> Expression;
}

impl IntoColumn for &str {
    fn into_column(self) -> Expression {
        Expression::Column(self.to_string())
    }
}

impl IntoColumn for String {
    fn into_column(self) -> Expression {
        Expression::Column(self)
    }
}

impl IntoColumn for Expression {
    fn into_column(self) -> Expression {
        self
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::lit(value)
    }
}

macro_rules! literal_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expression {
                fn from(v: $ty) -> Self {
                    Expression::lit(v)
                }
            }
        )*
    };
}

literal_from!(bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, String, &str, Vec<u8>);

impl<T: Into<Value>> From<Option<T>> for Expression {
    fn from(v: Option<T>) -> Self {
        Expression::lit(v)
    }
}
