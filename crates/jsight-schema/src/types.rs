//! Type names and schema types.

use std::fmt;

use jsight_lexer::is_name_byte;

use crate::value::JsonType;

/// Prefix of names synthesized for rule-only union alternatives.
pub const ANONYMOUS_PREFIX: &str = "@__anonymous_";

/// A user type name, including its `@` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(String);

impl TypeName {
    /// Validates `@name`. Returns `None` for anything else, including `@@rule` names.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let rest = name.strip_prefix('@')?;
        if rest.is_empty() || !rest.bytes().all(is_name_byte) {
            return None;
        }
        Some(Self(name))
    }

    pub(crate) fn anonymous(index: usize) -> Self {
        Self(format!("{ANONYMOUS_PREFIX}{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.starts_with(ANONYMOUS_PREFIX)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validates a named rule reference `@@name`.
pub fn is_rule_name(name: &str) -> bool {
    name.strip_prefix("@@")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(is_name_byte))
}

/// The "real" type of a schema node.
///
/// It may be narrower than the JSON type (`email` is a string) or not tied to
/// one at all (`any`, `mixed`, references).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Object,
    Array,
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Null,
    Email,
    Uri,
    Uuid,
    Date,
    DateTime,
    Enum,
    Mixed,
    Any,
    Reference(TypeName),
}

impl SchemaType {
    /// Parses a type name as written in a `type` rule.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "object" => SchemaType::Object,
            "array" => SchemaType::Array,
            "string" => SchemaType::String,
            "integer" => SchemaType::Integer,
            "float" => SchemaType::Float,
            "decimal" => SchemaType::Decimal,
            "boolean" => SchemaType::Boolean,
            "null" => SchemaType::Null,
            "email" => SchemaType::Email,
            "uri" => SchemaType::Uri,
            "uuid" => SchemaType::Uuid,
            "date" => SchemaType::Date,
            "datetime" => SchemaType::DateTime,
            "enum" => SchemaType::Enum,
            "mixed" => SchemaType::Mixed,
            "any" => SchemaType::Any,
            _ => return TypeName::new(name).map(SchemaType::Reference),
        })
    }

    pub fn from_json_type(json_type: JsonType) -> Self {
        match json_type {
            JsonType::String => SchemaType::String,
            JsonType::Integer => SchemaType::Integer,
            JsonType::Float => SchemaType::Float,
            JsonType::Boolean => SchemaType::Boolean,
            JsonType::Null => SchemaType::Null,
            JsonType::Object => SchemaType::Object,
            JsonType::Array => SchemaType::Array,
            JsonType::Mixed => SchemaType::Mixed,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Float => "float",
            SchemaType::Decimal => "decimal",
            SchemaType::Boolean => "boolean",
            SchemaType::Null => "null",
            SchemaType::Email => "email",
            SchemaType::Uri => "uri",
            SchemaType::Uuid => "uuid",
            SchemaType::Date => "date",
            SchemaType::DateTime => "datetime",
            SchemaType::Enum => "enum",
            SchemaType::Mixed => "mixed",
            SchemaType::Any => "any",
            SchemaType::Reference(name) => name.as_str(),
        }
    }

    /// JSON type a value of this type has, when it is fixed.
    pub fn json_type(&self) -> Option<JsonType> {
        Some(match self {
            SchemaType::Object => JsonType::Object,
            SchemaType::Array => JsonType::Array,
            SchemaType::String
            | SchemaType::Email
            | SchemaType::Uri
            | SchemaType::Uuid
            | SchemaType::Date
            | SchemaType::DateTime => JsonType::String,
            SchemaType::Integer => JsonType::Integer,
            SchemaType::Float | SchemaType::Decimal => JsonType::Float,
            SchemaType::Boolean => JsonType::Boolean,
            SchemaType::Null => JsonType::Null,
            SchemaType::Enum | SchemaType::Mixed | SchemaType::Any | SchemaType::Reference(_) => {
                return None;
            }
        })
    }

    /// Whether a value of `json_type` is a value of this type, ignoring formats.
    pub fn accepts(&self, json_type: JsonType) -> bool {
        match self {
            SchemaType::Float | SchemaType::Decimal => json_type.is_number(),
            SchemaType::Enum => json_type.is_literal(),
            SchemaType::Mixed | SchemaType::Any | SchemaType::Reference(_) => true,
            other => other.json_type() == Some(json_type),
        }
    }

    /// Types whose values are strings with an extra syntactic format.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            SchemaType::Email
                | SchemaType::Uri
                | SchemaType::Uuid
                | SchemaType::Date
                | SchemaType::DateTime
        )
    }

    pub fn is_literal(&self) -> bool {
        self.json_type().is_some_and(JsonType::is_literal)
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert!(TypeName::new("@cat").is_some());
        assert!(TypeName::new("@big-cat_2").is_some());
        assert!(TypeName::new("cat").is_none());
        assert!(TypeName::new("@").is_none());
        assert!(TypeName::new("@@colors").is_none());
        assert!(is_rule_name("@@colors"));
        assert!(!is_rule_name("@colors"));
    }

    #[test]
    fn test_parse_schema_type() {
        assert_eq!(SchemaType::parse("datetime"), Some(SchemaType::DateTime));
        assert_eq!(
            SchemaType::parse("@cat"),
            Some(SchemaType::Reference(TypeName::new("@cat").unwrap()))
        );
        assert_eq!(SchemaType::parse("number"), None);
    }

    #[test]
    fn test_accepts() {
        assert!(SchemaType::Float.accepts(JsonType::Integer));
        assert!(!SchemaType::Integer.accepts(JsonType::Float));
        assert!(SchemaType::Email.accepts(JsonType::String));
        assert!(!SchemaType::Enum.accepts(JsonType::Object));
    }
}
