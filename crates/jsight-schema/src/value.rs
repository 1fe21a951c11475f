//! JSON types and literal values.

use std::fmt;

use crate::number::{Number, NumberError};

/// JSON type of a value, as written in a schema example or a document.
///
/// Numbers written with a fraction or an exponent are floats, all others are
/// integers. `Mixed` is the type of references and unions, whose JSON type is
/// only known once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    String,
    Integer,
    Float,
    Boolean,
    Null,
    Object,
    Array,
    Mixed,
}

impl JsonType {
    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Integer => "integer",
            JsonType::Float => "float",
            JsonType::Boolean => "boolean",
            JsonType::Null => "null",
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::Mixed => "mixed",
        }
    }

    pub fn is_literal(self) -> bool {
        !matches!(self, JsonType::Object | JsonType::Array | JsonType::Mixed)
    }

    pub fn is_number(self) -> bool {
        matches!(self, JsonType::Integer | JsonType::Float)
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralValue {
    String(String),
    Number(Number),
    Boolean(bool),
    Null,
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::String(s) => write!(f, "{s:?}"),
            LiteralValue::Number(n) => write!(f, "{n}"),
            LiteralValue::Boolean(b) => write!(f, "{b}"),
            LiteralValue::Null => f.write_str("null"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error(transparent)]
    Number(#[from] NumberError),
    #[error("invalid string literal: {0}")]
    String(String),
    #[error("invalid literal {0:?}")]
    Unknown(String),
}

/// A scanned literal: its decoded value, its JSON type and its source spelling.
#[derive(Debug, Clone)]
pub struct Literal {
    pub value: LiteralValue,
    pub json_type: JsonType,
    pub raw: String,
}

impl Literal {
    /// Decodes the raw bytes of a `LiteralEnd` lexeme.
    pub fn parse(raw: &[u8]) -> Result<Self, LiteralError> {
        let text = String::from_utf8_lossy(raw).into_owned();
        let (value, json_type) = match raw.first() {
            Some(b'"') => {
                let decoded: String = serde_json::from_slice(raw)
                    .map_err(|e| LiteralError::String(e.to_string()))?;
                (LiteralValue::String(decoded), JsonType::String)
            }
            Some(b't') if raw == b"true" => (LiteralValue::Boolean(true), JsonType::Boolean),
            Some(b'f') if raw == b"false" => (LiteralValue::Boolean(false), JsonType::Boolean),
            Some(b'n') if raw == b"null" => (LiteralValue::Null, JsonType::Null),
            Some(b'-' | b'0'..=b'9') => {
                let number: Number = text.parse()?;
                let json_type = if raw.iter().any(|b| matches!(b, b'.' | b'e' | b'E')) {
                    JsonType::Float
                } else {
                    JsonType::Integer
                };
                (LiteralValue::Number(number), json_type)
            }
            _ => return Err(LiteralError::Unknown(text)),
        };
        Ok(Self {
            value,
            json_type,
            raw: text,
        })
    }

    pub fn string(value: impl Into<String>) -> Self {
        let value = value.into();
        let raw = serde_json::Value::String(value.clone()).to_string();
        Self {
            value: LiteralValue::String(value),
            json_type: JsonType::String,
            raw,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match &self.value {
            LiteralValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            LiteralValue::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.value == LiteralValue::Null
    }
}

/// Literals compare by value: `1.0` equals `1`.
impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Literal {}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literals() {
        let literal = Literal::parse(br#""aA\n""#).unwrap();
        assert_eq!(literal.as_str(), Some("aA\n"));
        assert_eq!(literal.json_type, JsonType::String);

        assert_eq!(Literal::parse(b"12").unwrap().json_type, JsonType::Integer);
        assert_eq!(Literal::parse(b"1.0").unwrap().json_type, JsonType::Float);
        assert_eq!(Literal::parse(b"1e3").unwrap().json_type, JsonType::Float);
        assert_eq!(Literal::parse(b"null").unwrap().json_type, JsonType::Null);
        assert_eq!(Literal::parse(b"false").unwrap().as_bool(), Some(false));
    }

    #[test]
    fn test_literals_compare_by_value() {
        assert_eq!(Literal::parse(b"1.0").unwrap(), Literal::parse(b"1").unwrap());
        assert_ne!(Literal::parse(b"\"1\"").unwrap(), Literal::parse(b"1").unwrap());
    }

    #[test]
    fn test_string_constructor_escapes() {
        assert_eq!(Literal::string("a\"b").raw, r#""a\"b""#);
    }
}
