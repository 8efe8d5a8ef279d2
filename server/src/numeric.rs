//! Integer-list parsing for numeric tools
//!
//! Accepts only an optionally bracketed, comma-separated list of integers,
//! e.g. `[1, 2, 3]` or `1,2,3`. Anything else is rejected.

use serde_json::Value;

use crate::error::{ServerError, ServerResult};

/// Parse `"[1, -2, 3]"` into integers
pub fn parse_int_list(input: &str) -> ServerResult<Vec<i64>> {
    let trimmed = input.trim();
    let inner = match (trimmed.strip_prefix('['), trimmed.ends_with(']')) {
        (Some(rest), true) => &rest[..rest.len() - 1],
        (None, false) => trimmed,
        _ => {
            return Err(ServerError::invalid_params(format!(
                "unbalanced brackets in integer list: {input:?}"
            )))
        }
    };

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|item| {
            let item = item.trim();
            item.parse::<i64>().map_err(|_| {
                ServerError::invalid_params(format!("not an integer: {item:?} in {input:?}"))
            })
        })
        .collect()
}

/// Integers from a JSON array or from a string accepted by [`parse_int_list`]
pub fn int_list_from_value(value: &Value) -> ServerResult<Vec<i64>> {
    match value {
        Value::String(s) => parse_int_list(s),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_i64()
                    .ok_or_else(|| ServerError::invalid_params(format!("not an integer: {item}")))
            })
            .collect(),
        other => Err(ServerError::invalid_params(format!(
            "expected an integer list, got {other}"
        ))),
    }
}

/// Sum of `e^i` over the list
pub fn exponential_sum(values: &[i64]) -> ServerResult<f64> {
    let sum: f64 = values.iter().map(|&i| (i as f64).exp()).sum();
    if !sum.is_finite() {
        return Err(ServerError::invalid_params("exponential sum overflows f64"));
    }
    Ok(sum)
}
