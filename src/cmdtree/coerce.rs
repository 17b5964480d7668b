//! Value coercion and validation.
//!
//! Converts raw command-line tokens into [`TypedValue`]s according to an
//! [`ArgumentSpec`], enforcing numeric bounds and enum choices.

use crate::error::{CliError, Result};
use crate::schema::{ArgumentSpec, ValueType};
use crate::value::TypedValue;

const TRUE_TOKENS: &[&str] = &["true", "yes", "y", "1", "on"];
const FALSE_TOKENS: &[&str] = &["false", "no", "n", "0", "off"];

/// Converts one raw token into a typed value.
///
/// Repeated-string arguments yield a list holding this occurrence only (split
/// on the delimiter if one is declared); use [`append`] to accumulate.
pub fn coerce(raw: &str, spec: &ArgumentSpec) -> Result<TypedValue> {
    match spec.value_type {
        ValueType::String => Ok(TypedValue::Str(raw.to_string())),
        ValueType::Integer => {
            let value: i64 = raw.trim().parse().map_err(|_| mismatch(raw, spec))?;
            check_range(value as f64, raw, spec)?;
            Ok(TypedValue::Int(value))
        }
        ValueType::Float => {
            let value: f64 = raw.trim().parse().map_err(|_| mismatch(raw, spec))?;
            if !value.is_finite() {
                return Err(mismatch(raw, spec));
            }
            check_range(value, raw, spec)?;
            Ok(TypedValue::Float(value))
        }
        ValueType::Boolean => parse_bool(raw)
            .map(TypedValue::Bool)
            .ok_or_else(|| mismatch(raw, spec)),
        ValueType::Enum => {
            if spec.choices.iter().any(|c| c == raw) {
                Ok(TypedValue::Str(raw.to_string()))
            } else {
                Err(CliError::InvalidChoice {
                    name: spec.name.clone(),
                    value: raw.to_string(),
                    choices: spec.choices.clone(),
                })
            }
        }
        ValueType::RepeatedString => Ok(TypedValue::List(split(raw, spec))),
    }
}

/// Adds one occurrence of a repeated option to the values bound so far.
pub fn append(existing: Option<TypedValue>, raw: &str, spec: &ArgumentSpec) -> TypedValue {
    let mut items = match existing {
        Some(TypedValue::List(items)) => items,
        _ => Vec::new(),
    };
    items.extend(split(raw, spec));
    TypedValue::List(items)
}

fn split(raw: &str, spec: &ArgumentSpec) -> Vec<String> {
    match spec.delimiter {
        Some(d) => raw
            .split(d)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        None => vec![raw.to_string()],
    }
}

/// Fails with `OutOfRange` when `value` lies outside `[min, max]`.
pub fn check_range(value: f64, raw: &str, spec: &ArgumentSpec) -> Result<()> {
    let integral = spec.value_type == ValueType::Integer;
    let violated = match (spec.min, spec.max) {
        (Some(min), _) if value < min => {
            // The smallest integer that passes; `+ 0.0` folds -0 into 0.
            let shown = if integral { min.ceil() + 0.0 } else { min };
            Some(format!("must be >= {}", shown))
        }
        (_, Some(max)) if value > max => {
            let shown = if integral { max.floor() + 0.0 } else { max };
            Some(format!("must be <= {}", shown))
        }
        _ => None,
    };
    match violated {
        Some(bound) => Err(CliError::OutOfRange {
            name: spec.name.clone(),
            value: raw.trim().to_string(),
            bound,
        }),
        None => Ok(()),
    }
}

/// Accepts the usual affirmative/negative spellings, case-insensitively.
pub fn parse_bool(raw: &str) -> Option<bool> {
    let token = raw.trim().to_ascii_lowercase();
    if TRUE_TOKENS.contains(&token.as_str()) {
        Some(true)
    } else if FALSE_TOKENS.contains(&token.as_str()) {
        Some(false)
    } else {
        None
    }
}

fn mismatch(raw: &str, spec: &ArgumentSpec) -> CliError {
    CliError::TypeMismatch {
        name: spec.name.clone(),
        value: raw.to_string(),
        expected: spec.value_type.label(),
    }
}
