//! Array and JSON payloads bound as one encoded parameter.

use sqlweave_core::{Error, Result, SqlType, Value};

use crate::compiler::BuildContext;
use crate::expr::Expression;
use crate::registry::{ExpressionBuilder, mismatched};

/// Encodes an array or JSON payload as a JSON string parameter.
///
/// Used by dialects without a native array type.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPayloadBuilder;

impl ExpressionBuilder for JsonPayloadBuilder {
    fn build(&self, expr: &Expression, ctx: &mut BuildContext<'_>) -> Result<String> {
        if !matches!(expr, Expression::Array { .. } | Expression::Json { .. }) {
            return Err(mismatched("JsonPayloadBuilder", expr));
        }
        let encoded = encode_payload(expr, ctx.config().max_depth)?;
        ctx.bind_value(&Value::Text(encoded), Some(&SqlType::Json))
    }
}

/// Encode a payload expression as JSON text.
///
/// Only literals and nested payloads can be encoded.
pub fn encode_payload(expr: &Expression, max_depth: usize) -> Result<String> {
    let json = payload_json(expr, max_depth)?;
    serde_json::to_string(&json)
        .map_err(|e| Error::Custom(format!("failed to encode payload: {e}")))
}

fn payload_json(expr: &Expression, depth_left: usize) -> Result<serde_json::Value> {
    if depth_left == 0 {
        return Err(Error::invalid_argument(
            "payload nesting exceeds the maximum depth",
        ));
    }
    match expr {
        Expression::Literal { value, .. } => value.to_json(),
        Expression::Json { value, .. } => Ok(value.clone()),
        Expression::Array { items, .. } | Expression::List(items) => Ok(serde_json::Value::Array(
            items
                .iter()
                .map(|item| payload_json(item, depth_left - 1))
                .collect::<Result<Vec<_>>>()?,
        )),
        Expression::Structured { fields, .. } => {
            let mut object = serde_json::Map::with_capacity(fields.len());
            for (name, field) in fields {
                object.insert(name.clone(), payload_json(field, depth_left - 1)?);
            }
            Ok(serde_json::Value::Object(object))
        }
        other => Err(Error::invalid_argument(format!(
            "{} expressions cannot be encoded in a payload",
            other.kind()
        ))),
    }
}
