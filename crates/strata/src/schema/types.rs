//! Primitive type tags observed for field values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primitive classification of an observed value.
///
/// Variants are declared in lexical order so the derived ordering sorts tags
/// the same way their names sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    Array,
    Boolean,
    Null,
    Number,
    Object,
    String,
}

impl TypeTag {
    /// Classify a value.
    ///
    /// Booleans are never reported as numbers, and integral and fractional
    /// numbers share the `number` tag.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Boolean,
            Value::Number(_) => TypeTag::Number,
            Value::Object(_) => TypeTag::Object,
            Value::Array(_) => TypeTag::Array,
            Value::String(_) => TypeTag::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Array => "array",
            TypeTag::Boolean => "boolean",
            TypeTag::Null => "null",
            TypeTag::Number => "number",
            TypeTag::Object => "object",
            TypeTag::String => "string",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "array" => Ok(TypeTag::Array),
            "boolean" => Ok(TypeTag::Boolean),
            "null" => Ok(TypeTag::Null),
            "number" => Ok(TypeTag::Number),
            "object" => Ok(TypeTag::Object),
            "string" => Ok(TypeTag::String),
            _ => Err(format!("Unknown type tag: {}", s)),
        }
    }
}
