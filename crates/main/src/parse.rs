//! Tolerant parsing of JSON request fields.
//!
//! Clients send booleans as `true`, `1`, `"yes"`, `"Y"`, ... and ids as
//! numbers or numeric strings. Every mutating operation funnels its input
//! through these helpers so that the accepted spellings and the resulting
//! errors are the same everywhere.

use std::str::FromStr;

use db::codes::{Gender, UnknownCode};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// A JSON object as received from a client. Keys an operation does not know
/// about are ignored.
pub type Fields = Map<String, Value>;

const TRUE_WORDS: [&str; 5] = ["true", "1", "yes", "y", "on"];
const FALSE_WORDS: [&str; 6] = ["false", "0", "no", "n", "off", ""];

/// A missing (or `null`) value yields `default`.
pub fn parse_bool(
    field: &str,
    value: Option<&Value>,
    default: bool,
) -> Result<bool, ApiError> {
    let invalid = || ApiError::InvalidBoolean {
        field: field.to_string(),
    };

    match value {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(i != 0),
            (None, Some(f)) => Ok(f != 0.0),
            (None, None) => Err(invalid()),
        },
        Some(Value::String(s)) => {
            let word = s.trim().to_ascii_lowercase();
            if TRUE_WORDS.contains(&word.as_str()) {
                Ok(true)
            } else if FALSE_WORDS.contains(&word.as_str()) {
                Ok(false)
            } else {
                Err(invalid())
            }
        }
        Some(_) => Err(invalid()),
    }
}

/// Trimmed text; empty strings and `null` become `None`.
pub fn optional_text(
    field: &str,
    value: Option<&Value>,
) -> Result<Option<String>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => {
            Err(ApiError::validation(format!("{field} must be a string")))
        }
    }
}

pub fn required_text(
    field: &str,
    value: Option<&Value>,
) -> Result<String, ApiError> {
    optional_text(field, value)?
        .ok_or_else(|| ApiError::validation(format!("{field} is required")))
}

/// An integer given either as a JSON number or as a numeric string. Empty
/// strings and `null` become `None`.
pub fn optional_int(
    field: &str,
    value: Option<&Value>,
) -> Result<Option<i64>, ApiError> {
    let not_an_int =
        || ApiError::validation(format!("{field} must be an integer"));

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(not_an_int),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse::<i64>().map(Some).map_err(|_| not_an_int())
            }
        }
        Some(_) => Err(not_an_int()),
    }
}

pub fn required_int(
    field: &str,
    value: Option<&Value>,
) -> Result<i64, ApiError> {
    optional_int(field, value)?
        .ok_or_else(|| ApiError::validation(format!("{field} is required")))
}

/// Parses one of the lower-case text codes (venue, entry status, ...).
pub fn optional_code<T>(
    field: &str,
    value: Option<&Value>,
) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = UnknownCode>,
{
    optional_text(field, value)?
        .map(|text| {
            text.to_ascii_lowercase()
                .parse::<T>()
                .map_err(|e| ApiError::validation(format!("{field}: {e}")))
        })
        .transpose()
}

/// Gender codes are upper case; `"f"` is accepted as `F`.
pub fn optional_gender(
    field: &str,
    value: Option<&Value>,
) -> Result<Option<Gender>, ApiError> {
    optional_text(field, value)?
        .map(|text| {
            text.to_ascii_uppercase().parse::<Gender>().map_err(|_| {
                ApiError::validation(format!("{field} must be M, F or X"))
            })
        })
        .transpose()
}

/// Runs `parse` on `fields[key]` only when the key is present, so that a
/// patch distinguishes "leave alone" (absent) from "clear" (`null`).
pub fn if_present<T>(
    fields: &Fields,
    key: &str,
    parse: impl FnOnce(&str, Option<&Value>) -> Result<T, ApiError>,
) -> Result<Option<T>, ApiError> {
    fields.get(key).map(|value| parse(key, Some(value))).transpose()
}
