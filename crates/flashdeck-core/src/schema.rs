//! Declarative field schemas for untrusted key/value input.
//!
//! A [`Schema`] lists the only field names a caller may send and the kind of
//! value each accepts. Validation happens before anything reaches SQL: an
//! unknown key or a value of the wrong kind is rejected with a per-field
//! error, and every failure in the input is reported in one pass.
//!
//! Values arrive either as JSON or as query-string text, so integers accept
//! numeric strings and lists accept a comma-separated string as well as an
//! array.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{Error, FieldError, Result};

/// Kind of value a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    PositiveInteger,
    NonNegativeInteger,
    TextList,
}

/// One allowed field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// A validated, typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    TextList(Vec<String>),
}

/// Validated input keyed by the schema's own (static) field names.
pub type Validated = BTreeMap<&'static str, FieldValue>;

/// A named set of allowed fields.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Schema {
    pub const fn new(name: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self { name, fields }
    }

    /// Look up a field spec by the caller-facing name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `name` is one of this schema's fields.
    pub fn accepts(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Validate every entry of `input`. All fields are optional.
    pub fn validate(&self, input: &Map<String, Value>) -> Result<Validated> {
        let mut validated = BTreeMap::new();
        let mut errors = Vec::new();

        for (key, value) in input {
            let Some(spec) = self.field(key) else {
                errors.push(FieldError::new(key.as_str(), "is not an allowed field"));
                continue;
            };
            match coerce(spec.kind, value) {
                Ok(v) => {
                    validated.insert(spec.name, v);
                }
                Err(msg) => errors.push(FieldError::new(key.as_str(), msg)),
            }
        }

        if !errors.is_empty() {
            return Err(Error::Validation {
                message: format!("Unable to validate {}", self.name),
                errors,
            });
        }
        Ok(validated)
    }
}

fn coerce(kind: FieldKind, value: &Value) -> std::result::Result<FieldValue, String> {
    match kind {
        FieldKind::Text => match value {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            _ => Err("must be a string".to_string()),
        },
        FieldKind::Integer => parse_integer(value).map(FieldValue::Integer),
        FieldKind::PositiveInteger => {
            let n = parse_integer(value)?;
            if n < 1 {
                return Err("must be a positive integer".to_string());
            }
            Ok(FieldValue::Integer(n))
        }
        FieldKind::NonNegativeInteger => {
            let n = parse_integer(value)?;
            if n < 0 {
                return Err("must be a non-negative integer".to_string());
            }
            Ok(FieldValue::Integer(n))
        }
        FieldKind::TextList => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    _ => Err("must be a list of strings".to_string()),
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(FieldValue::TextList),
            Value::String(s) => Ok(FieldValue::TextList(
                s.split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect(),
            )),
            _ => Err("must be a list of strings".to_string()),
        },
    }
}

fn parse_integer(value: &Value) -> std::result::Result<i64, String> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| "must be an integer".to_string()),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| "must be an integer".to_string()),
        _ => Err("must be an integer".to_string()),
    }
}
