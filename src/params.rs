//! Parameter metadata, typed values, and string-to-value coercion.

use crate::error::EndpointError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::fmt;

/// Coercion target for a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Int,
    Float,
    Boolean,
    Date,
}

impl ParamType {
    /// Get the type name as used in directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Boolean => "boolean",
            ParamType::Date => "date",
        }
    }

    /// Parse a `-- @param` type token. Unknown tokens yield `None`; untyped
    /// parameters pass request values through unchanged, so an unrecognized
    /// type degrades to string behavior rather than failing the parse.
    pub fn from_directive(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "string" => Some(ParamType::String),
            "int" => Some(ParamType::Int),
            "float" => Some(ParamType::Float),
            "boolean" => Some(ParamType::Boolean),
            "date" => Some(ParamType::Date),
            _ => None,
        }
    }

    /// Infer a type from a SQL type name by substring containment.
    ///
    /// The test order is fixed: int, then char/text/string, then
    /// float/real/decimal/numeric, then bit/bool, then date/time.
    pub fn from_sql_type(sql_type: &str) -> Option<Self> {
        let t = sql_type.to_ascii_lowercase();
        if t.contains("int") {
            Some(ParamType::Int)
        } else if t.contains("char") || t.contains("text") || t.contains("string") {
            Some(ParamType::String)
        } else if t.contains("float")
            || t.contains("real")
            || t.contains("decimal")
            || t.contains("numeric")
        {
            Some(ParamType::Float)
        } else if t.contains("bit") || t.contains("bool") {
            Some(ParamType::Boolean)
        } else if t.contains("date") || t.contains("time") {
            Some(ParamType::Date)
        } else {
            None
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata for one named parameter of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamMeta {
    /// Parameter name, unique within a catalog.
    pub name: String,

    /// Declared or inferred type; `None` means pass-through.
    pub ty: Option<ParamType>,

    /// Raw default literal, coerced at request time like any input.
    pub default: Option<String>,
}

impl ParamMeta {
    /// Create an untyped parameter with no default.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            default: None,
        }
    }
}

/// A coerced request value, ready for named-parameter binding.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl ParamValue {
    /// Whether this is an int or float value.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ParamValue::Int(_) | ParamValue::Float(_))
    }

    /// Convert to a JSON value, for response metadata and logging.
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::String(v) => Value::String(v.clone()),
            ParamValue::Int(v) => Value::from(*v),
            ParamValue::Float(v) => Value::from(*v),
            ParamValue::Bool(v) => Value::Bool(*v),
            ParamValue::Date(v) => Value::String(v.to_string()),
            ParamValue::DateTime(v) => Value::String(v.to_string()),
        }
    }
}

/// Coerce a raw string into the declared type.
///
/// Untyped and `string` parameters are identity conversions and never fail.
/// `boolean` is total as well: true iff the input is exactly `"true"` or
/// `"1"`, anything else is false.
pub fn coerce(name: &str, ty: Option<ParamType>, raw: &str) -> Result<ParamValue, EndpointError> {
    let Some(ty) = ty else {
        return Ok(ParamValue::String(raw.to_string()));
    };

    match ty {
        ParamType::String => Ok(ParamValue::String(raw.to_string())),
        ParamType::Int => raw
            .parse::<i64>()
            .map(ParamValue::Int)
            .map_err(|_| EndpointError::invalid_value(name, ty, raw)),
        ParamType::Float => raw
            .parse::<f64>()
            .map(ParamValue::Float)
            .map_err(|_| EndpointError::invalid_value(name, ty, raw)),
        ParamType::Boolean => Ok(ParamValue::Bool(raw == "true" || raw == "1")),
        ParamType::Date => parse_date(raw).ok_or_else(|| EndpointError::invalid_value(name, ty, raw)),
    }
}

/// Accepted date-time layouts, tried ahead of the bare-date fallback.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

fn parse_date(raw: &str) -> Option<ParamValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(ParamValue::DateTime(dt.naive_utc()));
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ParamValue::DateTime(dt));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(ParamValue::Date)
}

/// Per-request coerced parameter values, in catalog order.
///
/// Built by the pipeline for a single request and discarded with it; never
/// shared across requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedParams {
    entries: Vec<(String, ParamValue)>,
}

impl ResolvedParams {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resolved value.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.entries.push((name.into(), value));
    }

    /// Get a value by parameter name.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Iterate entries in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of resolved parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no parameters resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
