//! Implementor entries.
//!
//! Generators have emitted three shapes over time: a bare string, a
//! `{text, synthetic, types}` record, and a `[text, synthetic, types]` array
//! (or just `[text]`). The entry keeps the value exactly as received and reads
//! its parts on demand.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One implementor entry in its received wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Implementor {
    raw: Value,
}

impl Implementor {
    /// Creates an entry in the current `[text]` shape.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            raw: Value::Array(vec![Value::String(text.into())]),
        }
    }

    /// Creates an entry in the `[text, synthetic, types]` shape.
    pub fn with_types(text: impl Into<String>, synthetic: bool, types: Vec<String>) -> Self {
        Self {
            raw: Value::Array(vec![
                Value::String(text.into()),
                Value::from(u8::from(synthetic)),
                Value::from(types),
            ]),
        }
    }

    /// Rendered `impl ... for ...` descriptor.
    pub fn text(&self) -> &str {
        descriptor(&self.raw).unwrap_or_default()
    }

    /// Whether the impl is auto or blanket; `None` when the entry omits it.
    pub fn synthetic(&self) -> Option<bool> {
        let value = match &self.raw {
            Value::Array(parts) => parts.get(1),
            Value::Object(fields) => fields.get("synthetic"),
            _ => None,
        }?;
        match value {
            Value::Bool(flag) => Some(*flag),
            Value::Number(number) => number.as_u64().map(|n| n != 0),
            _ => None,
        }
    }

    /// Paths of the implementing types, when the entry lists them.
    pub fn types(&self) -> Vec<&str> {
        let value = match &self.raw {
            Value::Array(parts) => parts.get(2),
            Value::Object(fields) => fields.get("types"),
            _ => None,
        };
        match value {
            Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// The entry as received.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

fn descriptor(raw: &Value) -> Option<&str> {
    match raw {
        Value::String(text) => Some(text),
        Value::Array(parts) => parts.first().and_then(Value::as_str),
        Value::Object(fields) => fields.get("text").and_then(Value::as_str),
        _ => None,
    }
}

/// Value that carries no descriptor string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementorShapeError(pub String);

impl Display for ImplementorShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "implementor entry must be a string, `[text, ...]` or `{{text, ...}}`, got {}",
            self.0
        )
    }
}

impl Error for ImplementorShapeError {}

impl TryFrom<Value> for Implementor {
    type Error = ImplementorShapeError;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        if descriptor(&raw).is_none() {
            return Err(ImplementorShapeError(raw.to_string()));
        }
        Ok(Self { raw })
    }
}

impl From<Implementor> for Value {
    fn from(value: Implementor) -> Self {
        value.raw
    }
}
