//! Error types for the jsight-schema crate
//!
//! Every failure surfaces as one [`SchemaError`]:
//! - `Scan`: malformed schema or document bytes
//! - `Compile`: the schema is well-formed text but not a valid schema
//! - `Validation`: a document does not satisfy a compiled schema

use std::fmt;

use jsight_lexer::{Location, ScanError, ScanErrorKind};

use crate::number::Number;
use crate::types::TypeName;
use crate::value::JsonType;

// =============================================================================
// CompileError
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("schema already compiled")]
    AlreadyCompiled,

    #[error("invalid type name {0:?}")]
    InvalidTypeName(String),

    #[error("invalid rule name {0:?}")]
    InvalidRuleName(String),

    #[error("duplicate type {0}")]
    DuplicateType(TypeName),

    #[error("duplicate rule {0}")]
    DuplicateNamedRule(String),

    #[error("duplicate key {0:?}")]
    DuplicateKey(String),

    #[error("duplicate rule {0:?} in annotation")]
    DuplicateRule(String),

    #[error("duplicate annotation for the same value")]
    DuplicateAnnotation,

    #[error("unknown rule {0:?}")]
    UnknownRule(String),

    #[error("unknown type {0:?}")]
    UnknownType(String),

    #[error("type {0} is not defined")]
    UndefinedType(TypeName),

    #[error("rule {0} is not defined")]
    UndefinedRule(String),

    #[error("invalid value for rule {rule:?}, expected {expected}")]
    InvalidRuleValue { rule: String, expected: &'static str },

    #[error("invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error("rule {rule:?} is not compatible with {json_type}")]
    IncompatibleRule { rule: String, json_type: JsonType },

    #[error("the example value does not match type {declared}")]
    ExampleTypeMismatch { declared: String },

    #[error("the example value violates rule {rule:?}: {failure}")]
    ExampleViolatesRule {
        rule: String,
        failure: Box<ValidationFailure>,
    },

    #[error("the example value does not match any of the alternatives of rule \"or\"")]
    ExampleMatchesNoAlternative,

    #[error("rule {first:?} conflicts with rule {second:?}")]
    ConflictingRules { first: String, second: String },

    #[error("rule {rule:?} requires rule {requires:?}")]
    MissingRule { rule: String, requires: String },

    #[error("rule \"optional\" is only allowed on object properties")]
    OptionalOutsideObject,

    #[error("rule \"precision\" requires type \"decimal\"")]
    PrecisionRequiresDecimal,

    #[error("type {declared} is not allowed here")]
    TypeNotAllowed { declared: String },

    #[error("invalid alternative in rule \"or\": {0}")]
    InvalidAlternative(String),

    #[error("type {0} used as a key must describe a string")]
    KeyShortcutNotString(TypeName),

    #[error("rule \"allOf\" requires {0} to be an object")]
    AllOfNotObject(TypeName),

    #[error("property {key:?} inherited from {from} is already defined")]
    PropertyOverride { key: String, from: TypeName },

    #[error("cyclic \"allOf\": {0}")]
    AllOfCycle(String),

    #[error("infinite recursion detected: {0}")]
    InfiniteRecursion(String),

    #[error("named rule {0} must be an array of literals")]
    InvalidNamedRule(String),

    #[error("{0}")]
    InvalidLiteral(String),
}

// =============================================================================
// ValidationFailure
// =============================================================================

/// Why a document value was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: JsonType },

    #[error("string is shorter than {min} characters")]
    TooShort { min: u64 },

    #[error("string is longer than {max} characters")]
    TooLong { max: u64 },

    #[error("value is less than {}{min}", or_equal(.exclusive))]
    BelowMinimum { min: Number, exclusive: bool },

    #[error("value is greater than {}{max}", or_equal(.exclusive))]
    AboveMaximum { max: Number, exclusive: bool },

    #[error("value has more than {precision} fractional digits")]
    PrecisionExceeded { precision: u64 },

    #[error("string does not match regular expression {pattern:?}")]
    RegexMismatch { pattern: String },

    #[error("value does not match any of the enumeration values")]
    EnumMismatch,

    #[error("value does not match the constant {expected}")]
    ConstMismatch { expected: String },

    #[error("invalid {format}")]
    InvalidFormat { format: &'static str },

    #[error("array has fewer than {min} items")]
    TooFewItems { min: u64 },

    #[error("array has more than {max} items")]
    TooManyItems { max: u64 },

    #[error("array must be empty")]
    ArrayNotEmpty,

    #[error("required key(s) not found: {}", quoted(.0))]
    RequiredKeysNotFound(Vec<String>),

    #[error("property {0:?} is not allowed")]
    UnknownKey(String),

    #[error("duplicate key {0:?}")]
    DuplicateKey(String),

    #[error("none of the alternatives validated")]
    NoAlternativeMatched,

    #[error("{0}")]
    InvalidLiteral(String),
}

fn or_equal(exclusive: &bool) -> &'static str {
    if *exclusive { "or equal to " } else { "" }
}

fn quoted(keys: &[String]) -> String {
    keys.iter()
        .map(|k| format!("{k:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// SchemaError
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    #[error(transparent)]
    Scan(ScanErrorKind),
    #[error(transparent)]
    Compile(CompileError),
    #[error(transparent)]
    Validation(ValidationFailure),
}

/// One step of the path through which an error was reached, such as the
/// reference to the type that failed.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceFrame {
    pub location: Location,
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.location.file.name(), self.location.line())
    }
}

/// A positioned error from scanning, compiling or validating.
///
/// Validation errors are positioned in the document, all others in the schema
/// source that failed.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    pub kind: ErrorKind,
    pub location: Option<Location>,
    /// The user type whose source contains the error.
    pub type_name: Option<TypeName>,
    pub trace: Vec<TraceFrame>,
}

/// Errors reported against a document share the schema error shape.
pub type ValidationError = SchemaError;

impl SchemaError {
    pub fn new(kind: ErrorKind, location: Option<Location>) -> Self {
        Self {
            kind,
            location,
            type_name: None,
            trace: Vec::new(),
        }
    }

    pub fn compile(error: CompileError, location: Location) -> Self {
        Self::new(ErrorKind::Compile(error), Some(location))
    }

    pub fn unpositioned(error: CompileError) -> Self {
        Self::new(ErrorKind::Compile(error), None)
    }

    pub fn validation(failure: ValidationFailure, location: Location) -> Self {
        Self::new(ErrorKind::Validation(failure), Some(location))
    }

    /// Attributes the error to a user type, unless it already is.
    pub fn in_type(mut self, name: &TypeName) -> Self {
        if self.type_name.is_none() {
            self.type_name = Some(name.clone());
        }
        self
    }

    pub fn with_frame(mut self, location: Location) -> Self {
        self.trace.push(TraceFrame { location });
        self
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn index(&self) -> Option<usize> {
        self.location.as_ref().map(|l| l.index)
    }

    pub fn line(&self) -> Option<usize> {
        self.location.as_ref().map(Location::line)
    }

    pub fn column(&self) -> Option<usize> {
        self.location.as_ref().map(Location::column)
    }

    /// The source line the error points at.
    pub fn quote(&self) -> Option<String> {
        self.location.as_ref().map(Location::quote)
    }

    pub fn as_compile(&self) -> Option<&CompileError> {
        match &self.kind {
            ErrorKind::Compile(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_validation(&self) -> Option<&ValidationFailure> {
        match &self.kind {
            ErrorKind::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{location}: ")?;
        }
        write!(f, "{}", self.kind)?;
        if let Some(name) = &self.type_name {
            write!(f, " (in type {name})")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

impl From<ScanError> for SchemaError {
    fn from(error: ScanError) -> Self {
        let location = error.location();
        Self::new(ErrorKind::Scan(error.kind), Some(location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_keys_message() {
        let failure = ValidationFailure::RequiredKeysNotFound(vec!["b".into(), "c".into()]);
        assert_eq!(failure.to_string(), r#"required key(s) not found: "b", "c""#);
    }

    #[test]
    fn test_bound_messages() {
        let failure = ValidationFailure::BelowMinimum {
            min: Number::from(3u64),
            exclusive: true,
        };
        assert_eq!(failure.to_string(), "value is less than or equal to 3");
    }
}
