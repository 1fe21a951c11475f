//! Literal checks shared by the validator and the static checker.

use jsight_lexer::{Lexeme, LexemeKind};

use super::candidate::Candidate;
use super::{Ctx, Step, mismatch};
use crate::constraint::{Constraint, ConstraintKind};
use crate::error::{SchemaError, ValidationFailure};
use crate::node::{Node, NodeContent};
use crate::types::SchemaType;
use crate::value::{JsonType, Literal};

/// Checks a literal against a literal node: its type, unless an enumeration
/// lists the accepted values, and then every rule.
pub(crate) fn check_literal(node: &Node, literal: &Literal) -> Result<(), ValidationFailure> {
    if literal.is_null() && node.is_nullable() {
        return Ok(());
    }
    if !node.constraints.contains(ConstraintKind::Enum) {
        let expected = node
            .constraints
            .declared_type()
            .unwrap_or(&node.schema_type);
        if !expected.accepts(literal.json_type) {
            return Err(ValidationFailure::TypeMismatch {
                expected: expected.to_string(),
                found: literal.json_type,
            });
        }
    }
    for (constraint, _) in node.constraints.iter() {
        if constraint.kind() != ConstraintKind::Type {
            constraint.validate_literal(literal)?;
        }
    }
    Ok(())
}

/// Checks a literal against a built-in type and its format.
pub(crate) fn check_primitive(
    schema_type: &SchemaType,
    literal: &Literal,
) -> Result<(), ValidationFailure> {
    if !schema_type.accepts(literal.json_type) {
        return Err(ValidationFailure::TypeMismatch {
            expected: schema_type.to_string(),
            found: literal.json_type,
        });
    }
    match Constraint::format_of(schema_type) {
        Some(format) => format.validate_literal(literal),
        None => Ok(()),
    }
}

/// Whether a literal matches at least one candidate. Container candidates
/// never match.
pub(crate) fn matches_any(ctx: Ctx<'_>, candidates: &[Candidate], literal: &Literal) -> bool {
    candidates.iter().any(|candidate| match candidate {
        Candidate::Any => true,
        Candidate::Primitive(t) => check_primitive(t, literal).is_ok(),
        Candidate::Node(id) => {
            let node = ctx.tree.node(*id);
            matches!(node.content, NodeContent::Literal { .. })
                && check_literal(node, literal).is_ok()
        }
    })
}

pub(super) fn parse(lexeme: &Lexeme) -> Result<Literal, SchemaError> {
    Literal::parse(lexeme.value()).map_err(|e| {
        SchemaError::validation(
            ValidationFailure::InvalidLiteral(e.to_string()),
            lexeme.location(),
        )
    })
}

/// Validates one literal value against a literal schema node or a built-in type.
pub(super) enum LiteralValidator {
    Node(crate::node::NodeId),
    Primitive(SchemaType),
}

impl LiteralValidator {
    pub fn feed(&self, ctx: Ctx<'_>, lexeme: &Lexeme) -> Step {
        let expected = match self {
            LiteralValidator::Node(id) => ctx.tree.node(*id).schema_type.to_string(),
            LiteralValidator::Primitive(t) => t.to_string(),
        };
        match lexeme.kind {
            LexemeKind::ObjectBegin => mismatch(expected, JsonType::Object, lexeme),
            LexemeKind::ArrayBegin => mismatch(expected, JsonType::Array, lexeme),
            LexemeKind::LiteralEnd => {
                let literal = match parse(lexeme) {
                    Ok(literal) => literal,
                    Err(e) => return Step::Failed(e),
                };
                let result = match self {
                    LiteralValidator::Node(id) => check_literal(ctx.tree.node(*id), &literal),
                    LiteralValidator::Primitive(t) => check_primitive(t, &literal),
                };
                match result {
                    Ok(()) => Step::Complete,
                    Err(failure) => Step::Failed(SchemaError::validation(failure, lexeme.location())),
                }
            }
            _ => Step::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use jsight_lexer::SourceFile;

    use super::*;
    use crate::constraint::{Bound, EnumValues, RuleSource};

    fn literal(raw: &str) -> Literal {
        Literal::parse(raw.as_bytes()).unwrap()
    }

    fn node(example: &str) -> Node {
        let example = literal(example);
        let json_type = example.json_type;
        Node::new(
            NodeContent::Literal {
                example: Some(example),
            },
            json_type,
            jsight_lexer::Location::new(SourceFile::new("t", "x"), 0),
        )
    }

    #[test]
    fn test_type_checked_from_example() {
        let node = node("1");
        assert!(check_literal(&node, &literal("2")).is_ok());
        assert_eq!(
            check_literal(&node, &literal("\"2\"")),
            Err(ValidationFailure::TypeMismatch {
                expected: "integer".into(),
                found: JsonType::String,
            })
        );
    }

    #[test]
    fn test_nullable_enum_accepts_null() {
        let mut node = node("1");
        node.constraints
            .insert(
                Constraint::Enum(EnumValues {
                    values: vec![literal("1"), literal("2"), literal("3")],
                    rule: None,
                }),
                RuleSource::Manual,
            )
            .unwrap();
        assert!(check_literal(&node, &literal("2")).is_ok());
        assert_eq!(
            check_literal(&node, &literal("4")),
            Err(ValidationFailure::EnumMismatch)
        );
        assert!(check_literal(&node, &literal("null")).is_err());
        node.constraints
            .insert(Constraint::Nullable(true), RuleSource::Manual)
            .unwrap();
        assert!(check_literal(&node, &literal("null")).is_ok());
    }

    #[test]
    fn test_rules_apply_after_type() {
        let mut node = node("5");
        node.constraints
            .insert(
                Constraint::Max(Bound {
                    value: "10".parse().unwrap(),
                    exclusive: false,
                }),
                RuleSource::Manual,
            )
            .unwrap();
        assert!(check_literal(&node, &literal("10")).is_ok());
        assert!(matches!(
            check_literal(&node, &literal("11")),
            Err(ValidationFailure::AboveMaximum { .. })
        ));
    }

    #[test]
    fn test_primitive_formats() {
        assert!(check_primitive(&SchemaType::Email, &literal("\"a@b.io\"")).is_ok());
        assert_eq!(
            check_primitive(&SchemaType::Email, &literal("\"nope\"")),
            Err(ValidationFailure::InvalidFormat { format: "email" })
        );
        assert!(check_primitive(&SchemaType::Float, &literal("3")).is_ok());
    }
}
