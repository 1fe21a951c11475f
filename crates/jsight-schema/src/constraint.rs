//! Constraints (rules) attached to schema nodes.
//!
//! Every rule written in an annotation, and every rule the compiler derives
//! from the schema's shape, is one [`Constraint`]. A constraint knows which
//! JSON types it may be attached to, how to check a literal, and how to
//! re-express itself for documentation output.

mod format;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use crate::ast::RuleAst;
use crate::error::{CompileError, ValidationFailure};
use crate::number::Number;
use crate::rule::RuleValue;
use crate::types::{SchemaType, TypeName};
use crate::value::{JsonType, Literal};

pub use format::{is_date, is_datetime, is_email, is_uri, is_uuid};

/// Whether a rule was written by the user or derived by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSource {
    Manual,
    Generated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Type,
    Optional,
    Nullable,
    MinLength,
    MaxLength,
    Min,
    Max,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MinItems,
    MaxItems,
    Regex,
    Precision,
    Enum,
    Const,
    AdditionalProperties,
    Or,
    TypesList,
    AllOf,
    Email,
    Uri,
    Uuid,
    Date,
    DateTime,
}

impl ConstraintKind {
    /// Rule name as written in annotations and AST output.
    pub fn name(self) -> &'static str {
        match self {
            ConstraintKind::Type => "type",
            ConstraintKind::Optional => "optional",
            ConstraintKind::Nullable => "nullable",
            ConstraintKind::MinLength => "minLength",
            ConstraintKind::MaxLength => "maxLength",
            ConstraintKind::Min => "min",
            ConstraintKind::Max => "max",
            ConstraintKind::ExclusiveMinimum => "exclusiveMinimum",
            ConstraintKind::ExclusiveMaximum => "exclusiveMaximum",
            ConstraintKind::MinItems => "minItems",
            ConstraintKind::MaxItems => "maxItems",
            ConstraintKind::Regex => "regex",
            ConstraintKind::Precision => "precision",
            ConstraintKind::Enum => "enum",
            ConstraintKind::Const => "const",
            ConstraintKind::AdditionalProperties => "additionalProperties",
            ConstraintKind::Or => "or",
            ConstraintKind::TypesList => "typesList",
            ConstraintKind::AllOf => "allOf",
            ConstraintKind::Email => "email",
            ConstraintKind::Uri => "uri",
            ConstraintKind::Uuid => "uuid",
            ConstraintKind::Date => "date",
            ConstraintKind::DateTime => "datetime",
        }
    }
}

/// Policy for object keys the schema does not list.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    Forbidden,
    AllowAny,
    Primitive(SchemaType),
    Named(TypeName),
    /// The unknown key's value must match one of the types.
    AnyOf(Vec<TypeName>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub value: Number,
    pub exclusive: bool,
}

#[derive(Debug, Clone)]
pub struct RegexRule {
    pub pattern: String,
    pub regex: Regex,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValues {
    pub values: Vec<Literal>,
    /// The named rule the values were copied from, if any.
    pub rule: Option<String>,
}

/// One alternative of an `or` rule, always backed by a type.
#[derive(Debug, Clone)]
pub struct OrAlternative {
    pub type_name: TypeName,
    /// The rule object the alternative was written as, for anonymous types.
    pub rules: Option<RuleValue>,
}

#[derive(Debug, Clone)]
pub enum Constraint {
    Type(SchemaType),
    Optional(bool),
    Nullable(bool),
    MinLength(u64),
    MaxLength(u64),
    Min(Bound),
    Max(Bound),
    ExclusiveMinimum(bool),
    ExclusiveMaximum(bool),
    MinItems(u64),
    MaxItems(u64),
    Regex(RegexRule),
    Precision(u64),
    Enum(EnumValues),
    Const {
        enabled: bool,
        expected: Option<Literal>,
    },
    AdditionalProperties(AdditionalProperties),
    Or(Vec<OrAlternative>),
    /// Every type a union may resolve to, in declaration order.
    TypesList(Vec<TypeName>),
    AllOf(Vec<TypeName>),
    Email,
    Uri,
    Uuid,
    Date,
    DateTime,
}

impl Constraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Type(_) => ConstraintKind::Type,
            Constraint::Optional(_) => ConstraintKind::Optional,
            Constraint::Nullable(_) => ConstraintKind::Nullable,
            Constraint::MinLength(_) => ConstraintKind::MinLength,
            Constraint::MaxLength(_) => ConstraintKind::MaxLength,
            Constraint::Min(_) => ConstraintKind::Min,
            Constraint::Max(_) => ConstraintKind::Max,
            Constraint::ExclusiveMinimum(_) => ConstraintKind::ExclusiveMinimum,
            Constraint::ExclusiveMaximum(_) => ConstraintKind::ExclusiveMaximum,
            Constraint::MinItems(_) => ConstraintKind::MinItems,
            Constraint::MaxItems(_) => ConstraintKind::MaxItems,
            Constraint::Regex(_) => ConstraintKind::Regex,
            Constraint::Precision(_) => ConstraintKind::Precision,
            Constraint::Enum(_) => ConstraintKind::Enum,
            Constraint::Const { .. } => ConstraintKind::Const,
            Constraint::AdditionalProperties(_) => ConstraintKind::AdditionalProperties,
            Constraint::Or(_) => ConstraintKind::Or,
            Constraint::TypesList(_) => ConstraintKind::TypesList,
            Constraint::AllOf(_) => ConstraintKind::AllOf,
            Constraint::Email => ConstraintKind::Email,
            Constraint::Uri => ConstraintKind::Uri,
            Constraint::Uuid => ConstraintKind::Uuid,
            Constraint::Date => ConstraintKind::Date,
            Constraint::DateTime => ConstraintKind::DateTime,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// The format constraint a string type implies.
    pub fn format_of(schema_type: &SchemaType) -> Option<Constraint> {
        Some(match schema_type {
            SchemaType::Email => Constraint::Email,
            SchemaType::Uri => Constraint::Uri,
            SchemaType::Uuid => Constraint::Uuid,
            SchemaType::Date => Constraint::Date,
            SchemaType::DateTime => Constraint::DateTime,
            _ => return None,
        })
    }

    pub fn is_compatible(&self, json_type: JsonType) -> bool {
        match self {
            Constraint::Type(_)
            | Constraint::Optional(_)
            | Constraint::Nullable(_)
            | Constraint::Or(_)
            | Constraint::TypesList(_) => true,
            Constraint::MinLength(_)
            | Constraint::MaxLength(_)
            | Constraint::Regex(_)
            | Constraint::Email
            | Constraint::Uri
            | Constraint::Uuid
            | Constraint::Date
            | Constraint::DateTime => json_type == JsonType::String,
            Constraint::Min(_)
            | Constraint::Max(_)
            | Constraint::ExclusiveMinimum(_)
            | Constraint::ExclusiveMaximum(_) => json_type.is_number(),
            Constraint::Precision(_) => json_type == JsonType::Float,
            Constraint::MinItems(_) | Constraint::MaxItems(_) => json_type == JsonType::Array,
            Constraint::Enum(_) | Constraint::Const { .. } => json_type.is_literal(),
            Constraint::AdditionalProperties(_) | Constraint::AllOf(_) => {
                json_type == JsonType::Object
            }
        }
    }

    /// Checks a literal against this constraint alone.
    ///
    /// Constraints that do not restrict literal values accept everything, and
    /// value-specific checks accept values of other JSON types; the type
    /// itself is checked by [`Constraint::Type`].
    pub fn validate_literal(&self, literal: &Literal) -> Result<(), ValidationFailure> {
        match self {
            Constraint::Type(schema_type) => {
                if schema_type.accepts(literal.json_type) {
                    Ok(())
                } else {
                    Err(ValidationFailure::TypeMismatch {
                        expected: schema_type.to_string(),
                        found: literal.json_type,
                    })
                }
            }
            Constraint::MinLength(min) => match literal.as_str() {
                Some(s) if (s.chars().count() as u64) < *min => {
                    Err(ValidationFailure::TooShort { min: *min })
                }
                _ => Ok(()),
            },
            Constraint::MaxLength(max) => match literal.as_str() {
                Some(s) if (s.chars().count() as u64) > *max => {
                    Err(ValidationFailure::TooLong { max: *max })
                }
                _ => Ok(()),
            },
            Constraint::Regex(rule) => match literal.as_str() {
                Some(s) if !rule.regex.is_match(s) => Err(ValidationFailure::RegexMismatch {
                    pattern: rule.pattern.clone(),
                }),
                _ => Ok(()),
            },
            Constraint::Min(bound) => match literal.as_number() {
                Some(n) if n < &bound.value || (bound.exclusive && n == &bound.value) => {
                    Err(ValidationFailure::BelowMinimum {
                        min: bound.value.clone(),
                        exclusive: bound.exclusive,
                    })
                }
                _ => Ok(()),
            },
            Constraint::Max(bound) => match literal.as_number() {
                Some(n) if n > &bound.value || (bound.exclusive && n == &bound.value) => {
                    Err(ValidationFailure::AboveMaximum {
                        max: bound.value.clone(),
                        exclusive: bound.exclusive,
                    })
                }
                _ => Ok(()),
            },
            Constraint::Precision(precision) => match literal.as_number() {
                Some(n) if n.fraction_digits() > *precision => {
                    Err(ValidationFailure::PrecisionExceeded {
                        precision: *precision,
                    })
                }
                _ => Ok(()),
            },
            Constraint::Enum(values) => {
                if values.values.contains(literal) {
                    Ok(())
                } else {
                    Err(ValidationFailure::EnumMismatch)
                }
            }
            Constraint::Const {
                enabled: true,
                expected: Some(expected),
            } if expected != literal => Err(ValidationFailure::ConstMismatch {
                expected: expected.raw.clone(),
            }),
            Constraint::Email => check_format(literal, "email", is_email),
            Constraint::Uri => check_format(literal, "uri", is_uri),
            Constraint::Uuid => check_format(literal, "uuid", is_uuid),
            Constraint::Date => check_format(literal, "date", is_date),
            Constraint::DateTime => check_format(literal, "datetime", is_datetime),
            _ => Ok(()),
        }
    }

    pub fn to_rule_ast(&self, source: RuleSource) -> RuleAst {
        match self {
            Constraint::Type(schema_type) => match schema_type {
                SchemaType::Reference(name) => RuleAst::reference(name.as_str(), source),
                other => RuleAst::string(other.name(), source),
            },
            Constraint::Optional(b)
            | Constraint::Nullable(b)
            | Constraint::ExclusiveMinimum(b)
            | Constraint::ExclusiveMaximum(b)
            | Constraint::Const { enabled: b, .. } => RuleAst::boolean(*b, source),
            Constraint::MinLength(n)
            | Constraint::MaxLength(n)
            | Constraint::MinItems(n)
            | Constraint::MaxItems(n)
            | Constraint::Precision(n) => RuleAst::number(n.to_string(), source),
            Constraint::Min(bound) | Constraint::Max(bound) => {
                RuleAst::number(bound.value.to_string(), source)
            }
            Constraint::Regex(rule) => RuleAst::string(&rule.pattern, source),
            Constraint::Enum(values) => match &values.rule {
                Some(rule) => RuleAst::reference(rule, source),
                None => RuleAst::array(
                    values
                        .values
                        .iter()
                        .map(|v| RuleAst::literal(v, source))
                        .collect(),
                    source,
                ),
            },
            Constraint::AdditionalProperties(policy) => match policy {
                AdditionalProperties::Forbidden => RuleAst::boolean(false, source),
                AdditionalProperties::AllowAny => RuleAst::boolean(true, source),
                AdditionalProperties::Primitive(t) => RuleAst::string(t.name(), source),
                AdditionalProperties::Named(name) => RuleAst::reference(name.as_str(), source),
                AdditionalProperties::AnyOf(names) => RuleAst::reference(
                    &names
                        .iter()
                        .map(TypeName::as_str)
                        .collect::<Vec<_>>()
                        .join(" | "),
                    source,
                ),
            },
            Constraint::Or(alternatives) => RuleAst::array(
                alternatives
                    .iter()
                    .map(|alt| match &alt.rules {
                        Some(rules) => rules.to_rule_ast(source),
                        None => {
                            let mut properties = IndexMap::new();
                            properties.insert(
                                "type".to_string(),
                                RuleAst::reference(alt.type_name.as_str(), source),
                            );
                            RuleAst::object(properties, source)
                        }
                    })
                    .collect(),
                source,
            ),
            Constraint::TypesList(names) | Constraint::AllOf(names) => RuleAst::array(
                names
                    .iter()
                    .map(|n| RuleAst::reference(n.as_str(), source))
                    .collect(),
                source,
            ),
            Constraint::Email
            | Constraint::Uri
            | Constraint::Uuid
            | Constraint::Date
            | Constraint::DateTime => RuleAst::boolean(true, source),
        }
    }
}

fn check_format(
    literal: &Literal,
    format: &'static str,
    check: fn(&str) -> bool,
) -> Result<(), ValidationFailure> {
    match literal.as_str() {
        Some(s) if !check(s) => Err(ValidationFailure::InvalidFormat { format }),
        _ => Ok(()),
    }
}

// =============================================================================
// Constraints
// =============================================================================

/// The rules of one node, keyed by kind, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    entries: IndexMap<ConstraintKind, (Constraint, RuleSource)>,
}

impl Constraints {
    pub fn insert(&mut self, constraint: Constraint, source: RuleSource) -> Result<(), CompileError> {
        let kind = constraint.kind();
        if self.entries.contains_key(&kind) {
            return Err(CompileError::DuplicateRule(kind.name().to_string()));
        }
        self.entries.insert(kind, (constraint, source));
        Ok(())
    }

    pub fn get(&self, kind: ConstraintKind) -> Option<&Constraint> {
        self.entries.get(&kind).map(|(c, _)| c)
    }

    pub fn get_mut(&mut self, kind: ConstraintKind) -> Option<&mut Constraint> {
        self.entries.get_mut(&kind).map(|(c, _)| c)
    }

    pub fn contains(&self, kind: ConstraintKind) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Constraint, RuleSource)> {
        self.entries.values().map(|(c, s)| (c, *s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.get(ConstraintKind::Optional), Some(Constraint::Optional(true)))
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self.get(ConstraintKind::Nullable), Some(Constraint::Nullable(true)))
    }

    pub fn declared_type(&self) -> Option<&SchemaType> {
        match self.get(ConstraintKind::Type) {
            Some(Constraint::Type(t)) => Some(t),
            _ => None,
        }
    }

    pub fn reference(&self) -> Option<&TypeName> {
        match self.declared_type() {
            Some(SchemaType::Reference(name)) => Some(name),
            _ => None,
        }
    }

    pub fn types_list(&self) -> Option<&[TypeName]> {
        match self.get(ConstraintKind::TypesList) {
            Some(Constraint::TypesList(names)) => Some(names),
            _ => None,
        }
    }

    pub fn additional_properties(&self) -> &AdditionalProperties {
        match self.get(ConstraintKind::AdditionalProperties) {
            Some(Constraint::AdditionalProperties(policy)) => policy,
            _ => &AdditionalProperties::Forbidden,
        }
    }

    pub fn enum_values(&self) -> Option<&[Literal]> {
        match self.get(ConstraintKind::Enum) {
            Some(Constraint::Enum(values)) => Some(&values.values),
            _ => None,
        }
    }

    pub fn min_items(&self) -> Option<u64> {
        match self.get(ConstraintKind::MinItems) {
            Some(Constraint::MinItems(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn max_items(&self) -> Option<u64> {
        match self.get(ConstraintKind::MaxItems) {
            Some(Constraint::MaxItems(n)) => Some(*n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(raw: &str) -> Literal {
        Literal::parse(raw.as_bytes()).unwrap()
    }

    #[test]
    fn test_duplicate_kind_rejected() {
        let mut constraints = Constraints::default();
        constraints
            .insert(Constraint::MinLength(1), RuleSource::Manual)
            .unwrap();
        let error = constraints
            .insert(Constraint::MinLength(2), RuleSource::Manual)
            .unwrap_err();
        assert_eq!(error, CompileError::DuplicateRule("minLength".into()));
    }

    #[test]
    fn test_exclusive_bounds() {
        let min = Constraint::Min(Bound {
            value: "1.5".parse().unwrap(),
            exclusive: true,
        });
        assert!(min.validate_literal(&literal("1.50")).is_err());
        assert!(min.validate_literal(&literal("1.51")).is_ok());
        let max = Constraint::Max(Bound {
            value: "10".parse().unwrap(),
            exclusive: false,
        });
        assert!(max.validate_literal(&literal("10.0")).is_ok());
        assert!(max.validate_literal(&literal("1e2")).is_err());
    }

    #[test]
    fn test_enum_compares_values() {
        let constraint = Constraint::Enum(EnumValues {
            values: vec![literal("1"), literal("2"), literal("\"x\"")],
            rule: None,
        });
        assert!(constraint.validate_literal(&literal("2.0")).is_ok());
        assert_eq!(
            constraint.validate_literal(&literal("4")),
            Err(ValidationFailure::EnumMismatch)
        );
    }

    #[test]
    fn test_compatibility() {
        assert!(Constraint::MinLength(1).is_compatible(JsonType::String));
        assert!(!Constraint::MinLength(1).is_compatible(JsonType::Integer));
        assert!(Constraint::Precision(2).is_compatible(JsonType::Float));
        assert!(!Constraint::MinItems(1).is_compatible(JsonType::Object));
        assert!(Constraint::Nullable(true).is_compatible(JsonType::Array));
    }

    #[test]
    fn test_length_counts_characters() {
        let constraint = Constraint::MaxLength(2);
        assert!(constraint.validate_literal(&literal("\"éé\"")).is_ok());
        assert!(constraint.validate_literal(&literal("\"abc\"")).is_err());
    }
}
