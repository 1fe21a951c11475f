//! JSight Schema: compile schemas written as annotated JSON examples, and
//! validate JSON documents against them.
//!
//! The pipeline is scan → build → compose → check, after which a
//! [`CompiledSchema`] validates documents, describes itself as an
//! [`AstNode`] tree and produces an example document. [`Schema`] wraps the
//! pipeline and compiles at most once.

mod ast;
mod builder;
mod checker;
mod compose;
mod constraint;
mod error;
mod example;
mod node;
mod number;
mod rule;
mod schema;
mod types;
mod validator;
mod value;

pub use ast::{AstNode, RuleAst, RuleTokenType, TokenType};
pub use constraint::{
    AdditionalProperties, Bound, Constraint, ConstraintKind, Constraints, EnumValues,
    OrAlternative, RegexRule, RuleSource, is_date, is_datetime, is_email, is_uri, is_uuid,
};
pub use error::{CompileError, ErrorKind, SchemaError, TraceFrame, ValidationError, ValidationFailure};
pub use jsight_lexer::{Location, ScanError, ScanErrorKind, ScanMode, SourceFile};
pub use node::{Node, NodeContent, NodeId, Property, PropertyKey, SchemaTree, TypeEntry, TypeTable};
pub use number::{Number, NumberError};
pub use rule::{RuleValue, RuleValueKind};
pub use schema::{CompiledSchema, Schema};
pub use types::{ANONYMOUS_PREFIX, SchemaType, TypeName, is_rule_name};
pub use value::{JsonType, Literal, LiteralError, LiteralValue};
