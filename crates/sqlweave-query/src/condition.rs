//! Shorthand conditions.
//!
//! A [`Condition`] is the loosely typed notation callers use to describe
//! filters without building an [`Expression`] by hand:
//!
//! - `["=", "status", "active"]`: operator first, then operands
//! - `{"status": "active", "id": [1, 2]}`: a hash of column equalities
//! - `"a = b"`: raw SQL
//! - `[]`: no condition
//!
//! [`parse_condition`] normalizes one level of this notation into the
//! expression tree. Nested conditions under `AND`/`OR`/`NOT` stay as
//! conditions and are parsed when they are compiled.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use sqlweave_core::{Error, Result, Value};

use crate::dialect::LikeEscape;
use crate::expr::{CompareOp, Expression, InValues, LikeJoin, LikeMode, LogicalKind};

/// Loosely typed condition input.
#[derive(Debug, Clone)]
pub enum Condition {
    /// A scalar; as a whole condition, text is raw SQL
    Scalar(Value),
    /// `[operator, operand, ...]`, or a plain value list in operand position
    List(Vec<Condition>),
    /// `{column: value, ...}` in insertion order
    Map(Vec<(String, Condition)>),
    /// An already built expression
    Expr(Expression),
}

impl Condition {
    /// The empty condition (compiles to an empty string).
    pub fn empty() -> Self {
        Condition::List(Vec::new())
    }

    /// Build a `[operator, operands...]` list.
    pub fn op<C: Into<Condition>>(operator: &str, operands: impl IntoIterator<Item = C>) -> Self {
        let mut items = vec![Condition::Scalar(Value::Text(operator.to_string()))];
        items.extend(operands.into_iter().map(Into::into));
        Condition::List(items)
    }

    /// Build a hash condition.
    pub fn map<K: Into<String>, C: Into<Condition>>(pairs: impl IntoIterator<Item = (K, C)>) -> Self {
        Condition::Map(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Check whether this condition is trivially empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Condition::Scalar(Value::Null) => true,
            Condition::Scalar(Value::Text(s)) => s.trim().is_empty(),
            Condition::List(items) => items.is_empty(),
            Condition::Map(pairs) => pairs.is_empty(),
            _ => false,
        }
    }
}

impl From<Expression> for Condition {
    fn from(expr: Expression) -> Self {
        Condition::Expr(expr)
    }
}

impl From<Value> for Condition {
    fn from(value: Value) -> Self {
        Condition::Scalar(value)
    }
}

impl From<&str> for Condition {
    fn from(s: &str) -> Self {
        Condition::Scalar(Value::Text(s.to_string()))
    }
}

impl From<String> for Condition {
    fn from(s: String) -> Self {
        Condition::Scalar(Value::Text(s))
    }
}

impl From<Vec<Condition>> for Condition {
    fn from(items: Vec<Condition>) -> Self {
        Condition::List(items)
    }
}

macro_rules! scalar_condition_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Condition {
                fn from(v: $ty) -> Self {
                    Condition::Scalar(Value::from(v))
                }
            }
        )*
    };
}

scalar_condition_from!(bool, i32, i64, f64);

/// Converts parsed JSON into a condition.
///
/// Integers above `i64::MAX` fail with `Error::Type` rather than being
/// narrowed.
impl TryFrom<serde_json::Value> for Condition {
    type Error = Error;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        use serde_json::Value as Json;

        Ok(match json {
            Json::Null => Condition::Scalar(Value::Null),
            Json::Bool(b) => Condition::Scalar(Value::Bool(b)),
            Json::Number(n) => Condition::Scalar(json_number(&n)?),
            Json::String(s) => Condition::Scalar(Value::Text(s)),
            Json::Array(items) => Condition::List(
                items
                    .into_iter()
                    .map(Condition::try_from)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Json::Object(map) => Condition::Map(
                map.into_iter()
                    .map(|(key, value)| Ok((key, Condition::try_from(value)?)))
                    .collect::<Result<Vec<_>>>()?,
            ),
        })
    }
}

fn json_number(n: &serde_json::Number) -> Result<Value> {
    if let Some(i) = n.as_i64() {
        Ok(Value::BigInt(i))
    } else if let Some(u) = n.as_u64() {
        Value::try_from(u)
    } else {
        Ok(Value::Double(n.as_f64().unwrap_or(f64::NAN)))
    }
}

// ==================== Parsing ====================

/// Normalize a shorthand condition into an expression.
///
/// Operators are matched case-insensitively. Unknown operators fail with
/// `UnsupportedExpression`; wrong operand counts with `InvalidArgument`.
///
/// # Example
/// ```
/// use sqlweave_query::{Condition, parse_condition};
/// use serde_json::json;
///
/// let condition = Condition::try_from(json!(["in", "id", [1, 2, 3]])).unwrap();
/// let expr = parse_condition(&condition).unwrap();
/// assert_eq!(expr.kind().name(), "In");
/// ```
pub fn parse_condition(condition: &Condition) -> Result<Expression> {
    match condition {
        Condition::Expr(expr) => Ok(expr.clone()),
        Condition::Scalar(Value::Null) => Ok(empty_condition()),
        Condition::Scalar(Value::Text(sql)) => {
            if sql.trim().is_empty() {
                Ok(empty_condition())
            } else {
                Ok(Expression::raw(sql.clone()))
            }
        }
        Condition::Scalar(other) => Err(Error::invalid_argument(format!(
            "a {} scalar is not a condition",
            other.type_name()
        ))),
        Condition::Map(pairs) => parse_hash(pairs),
        Condition::List(items) => parse_operator_list(items),
    }
}

fn empty_condition() -> Expression {
    Expression::Logical {
        kind: LogicalKind::And,
        operands: Vec::new(),
    }
}

fn parse_hash(pairs: &[(String, Condition)]) -> Result<Expression> {
    let pairs = pairs
        .iter()
        .map(|(column, value)| Ok((column.clone(), value_operand(value)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Expression::Hash(pairs))
}

fn parse_operator_list(items: &[Condition]) -> Result<Expression> {
    let Some((head, operands)) = items.split_first() else {
        return Ok(empty_condition());
    };
    let token = match head {
        Condition::Scalar(Value::Text(token)) => token,
        Condition::Scalar(value) => {
            return Err(Error::unsupported(
                value.type_name(),
                "a condition list must start with an operator token",
            ));
        }
        _ => {
            return Err(Error::unsupported(
                "nested condition",
                "a condition list must start with an operator token",
            ));
        }
    };
    let operator = normalize_operator(token);

    if operator.ends_with("LIKE") {
        return parse_like(&operator, operands);
    }

    match operator.as_str() {
        "AND" | "OR" => Ok(Expression::Logical {
            kind: if operator == "AND" {
                LogicalKind::And
            } else {
                LogicalKind::Or
            },
            operands: operands.to_vec(),
        }),
        "NOT" => {
            let [operand] = expect_operands::<1>(&operator, operands)?;
            Ok(Expression::Logical {
                kind: LogicalKind::Not,
                operands: vec![operand.clone()],
            })
        }
        "BETWEEN" | "NOT BETWEEN" => {
            let [column, start, end] = expect_operands::<3>(&operator, operands)?;
            Ok(Expression::Between {
                column: Box::new(column_operand(column)?),
                start: Box::new(value_operand(start)?),
                end: Box::new(value_operand(end)?),
                negated: operator.starts_with("NOT"),
            })
        }
        "IN" | "NOT IN" => {
            let [columns, values] = expect_operands::<2>(&operator, operands)?;
            let columns = in_columns(columns)?;
            let values = in_values(&columns, values)?;
            Ok(Expression::In {
                columns,
                values,
                negated: operator.starts_with("NOT"),
            })
        }
        "EXISTS" | "NOT EXISTS" => {
            let [query] = expect_operands::<1>(&operator, operands)?;
            match query {
                Condition::Expr(Expression::Subquery(query)) => Ok(Expression::Exists {
                    query: Arc::clone(query),
                    negated: operator.starts_with("NOT"),
                }),
                _ => Err(Error::invalid_argument(format!(
                    "{operator} requires a subquery operand"
                ))),
            }
        }
        _ => match CompareOp::parse(&operator) {
            Some(op) => {
                let [column, value] = expect_operands::<2>(&operator, operands)?;
                Ok(Expression::Compare {
                    column: Box::new(column_operand(column)?),
                    op,
                    value: Box::new(value_operand(value)?),
                })
            }
            None => Err(Error::unsupported(
                token.clone(),
                "unknown condition operator",
            )),
        },
    }
}

fn normalize_operator(token: &str) -> String {
    token
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

fn expect_operands<'a, const N: usize>(
    operator: &str,
    operands: &'a [Condition],
) -> Result<&'a [Condition; N]> {
    operands.try_into().map_err(|_| {
        Error::invalid_argument(format!(
            "operator {operator} requires exactly {N} operand(s), got {}",
            operands.len()
        ))
    })
}

// ==================== LIKE ====================

/// Parsed compound LIKE operator token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOperator {
    pub join: LikeJoin,
    pub negated: bool,
    pub case_sensitive: bool,
}

fn like_operator_regex() -> Result<&'static Regex> {
    static LIKE_OPERATOR: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    LIKE_OPERATOR
        .get_or_init(|| Regex::new(r"^(AND |OR |)(NOT |)(I?LIKE)$"))
        .as_ref()
        .map_err(|e| Error::Custom(format!("invalid LIKE operator pattern: {e}")))
}

/// Parse `LIKE`, `NOT LIKE`, `OR LIKE`, `OR NOT LIKE` and their `ILIKE` forms.
///
/// # Example
/// ```
/// use sqlweave_query::condition::parse_like_operator;
/// use sqlweave_query::LikeJoin;
///
/// let op = parse_like_operator("or not like").unwrap();
/// assert_eq!(op.join, LikeJoin::Or);
/// assert!(op.negated);
/// ```
pub fn parse_like_operator(token: &str) -> Result<LikeOperator> {
    let normalized = normalize_operator(token);
    let captures = like_operator_regex()?
        .captures(&normalized)
        .ok_or_else(|| Error::invalid_argument(format!("unparseable LIKE operator {token:?}")))?;
    let join = match captures.get(1).map(|m| m.as_str()) {
        Some("OR ") => LikeJoin::Or,
        _ => LikeJoin::And,
    };
    let negated = captures.get(2).is_some_and(|m| !m.as_str().is_empty());
    let case_sensitive = captures.get(3).is_some_and(|m| m.as_str() == "LIKE");
    Ok(LikeOperator {
        join,
        negated,
        case_sensitive,
    })
}

fn parse_like(operator: &str, operands: &[Condition]) -> Result<Expression> {
    let parsed = parse_like_operator(operator)?;
    let (column, patterns, escape) = match operands {
        [column, patterns] => (column, patterns, None),
        [column, patterns, escape] => (column, patterns, Some(like_escape_operand(escape)?)),
        _ => {
            return Err(Error::invalid_argument(format!(
                "operator {operator} requires 2 or 3 operands, got {}",
                operands.len()
            )));
        }
    };
    let patterns = match patterns {
        Condition::List(items) => items
            .iter()
            .map(value_operand)
            .collect::<Result<Vec<_>>>()?,
        single => vec![value_operand(single)?],
    };
    Ok(Expression::Like {
        column: Box::new(column_operand(column)?),
        patterns,
        negated: parsed.negated,
        join: parsed.join,
        case_sensitive: parsed.case_sensitive,
        escape,
        mode: LikeMode::Contains,
    })
}

fn like_escape_operand(operand: &Condition) -> Result<LikeEscape> {
    match operand {
        Condition::Scalar(Value::Bool(false)) => Ok(LikeEscape::none()),
        Condition::Map(pairs) => {
            let mut escape = LikeEscape::none();
            for (from, to) in pairs {
                let Condition::Scalar(Value::Text(to)) = to else {
                    return Err(Error::invalid_argument(format!(
                        "escape replacement for {from:?} must be a string"
                    )));
                };
                escape.map.insert(from.clone(), to.clone());
            }
            escape.validate().map_err(Error::invalid_argument)?;
            Ok(escape)
        }
        _ => Err(Error::invalid_argument(
            "LIKE escape operand must be a character map or false",
        )),
    }
}

// ==================== Operands ====================

fn column_operand(operand: &Condition) -> Result<Expression> {
    match operand {
        Condition::Scalar(Value::Text(name)) => Ok(Expression::Column(name.clone())),
        Condition::Expr(expr) => Ok(expr.clone()),
        _ => Err(Error::invalid_argument(
            "column operand must be a column name or an expression",
        )),
    }
}

fn value_operand(operand: &Condition) -> Result<Expression> {
    match operand {
        Condition::Scalar(value) => Ok(Expression::lit(value.clone())),
        Condition::Expr(expr) => Ok(expr.clone()),
        Condition::List(items) => Ok(Expression::List(
            items.iter().map(scalar_operand).collect::<Result<Vec<_>>>()?,
        )),
        Condition::Map(_) => Err(Error::invalid_argument(
            "a map cannot be used as a value operand",
        )),
    }
}

fn scalar_operand(operand: &Condition) -> Result<Expression> {
    match operand {
        Condition::Scalar(value) => Ok(Expression::lit(value.clone())),
        Condition::Expr(expr) => Ok(expr.clone()),
        _ => Err(Error::invalid_argument("nested lists are not valid values")),
    }
}

fn in_columns(operand: &Condition) -> Result<Vec<Expression>> {
    match operand {
        Condition::List(items) => items.iter().map(column_operand).collect(),
        single => Ok(vec![column_operand(single)?]),
    }
}

fn in_values(columns: &[Expression], operand: &Condition) -> Result<InValues> {
    match operand {
        Condition::Expr(Expression::Subquery(query)) => Ok(InValues::Subquery(Arc::clone(query))),
        Condition::Expr(Expression::List(items)) if columns.len() == 1 => {
            Ok(InValues::List(items.clone()))
        }
        Condition::List(items) if columns.len() == 1 => Ok(InValues::List(
            items.iter().map(value_operand).collect::<Result<Vec<_>>>()?,
        )),
        Condition::List(rows) => Ok(InValues::Rows(
            rows.iter()
                .map(|row| in_row(columns, row))
                .collect::<Result<Vec<_>>>()?,
        )),
        Condition::Scalar(_) | Condition::Expr(_) if columns.len() == 1 => {
            Ok(InValues::List(vec![value_operand(operand)?]))
        }
        _ => Err(Error::invalid_argument(
            "composite IN values must be a list of rows",
        )),
    }
}

fn in_row(columns: &[Expression], row: &Condition) -> Result<Vec<Expression>> {
    match row {
        Condition::List(cells) => cells.iter().map(scalar_operand).collect(),
        Condition::Map(pairs) => columns
            .iter()
            .map(|column| {
                let Expression::Column(name) = column else {
                    return Err(Error::invalid_argument(
                        "keyed IN rows require named columns",
                    ));
                };
                match pairs.iter().find(|(key, _)| key == name) {
                    Some((_, cell)) => scalar_operand(cell),
                    None => Ok(Expression::null()),
                }
            })
            .collect(),
        _ => Err(Error::invalid_argument(
            "each composite IN row must be a list or a map",
        )),
    }
}
