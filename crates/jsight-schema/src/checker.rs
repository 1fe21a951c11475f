//! Static checks run on the built tree, before anything is validated.
//!
//! 1. Compatibility: every rule is legal for its node's JSON type, every
//!    referenced type exists, key shortcuts name string types, and examples
//!    of references match the referenced types.
//! 2. Recursion: no type can only be satisfied by an infinite value
//!    (see [`recursion`]).

mod recursion;

use ahash::AHashMap;
use tracing::debug;

use crate::constraint::{AdditionalProperties, Constraint, ConstraintKind};
use crate::error::{CompileError, SchemaError};
use crate::node::{NodeContent, NodeId, SchemaTree, TypeTable};
use crate::types::{SchemaType, TypeName};
use crate::validator::{Candidate, example_matches, type_candidates};
use crate::value::JsonType;

pub(crate) fn check(tree: &SchemaTree, types: &TypeTable, root: NodeId) -> Result<(), SchemaError> {
    let owners: AHashMap<NodeId, &TypeName> =
        types.iter().map(|(name, entry)| (entry.root, name)).collect();
    let in_owner = |id: NodeId, e: SchemaError| match owners.get(&tree.root_of(id)) {
        Some(name) => e.in_type(name),
        None => e,
    };

    debug!(nodes = tree.len(), "checking rule compatibility");
    for id in tree.ids() {
        check_node(tree, types, id).map_err(|e| in_owner(id, e))?;
    }

    debug!(types = types.len(), "checking recursion");
    recursion::check(tree, types, root)
}

fn check_node(tree: &SchemaTree, types: &TypeTable, id: NodeId) -> Result<(), SchemaError> {
    let node = tree.node(id);
    let error = |e: CompileError| SchemaError::compile(e, node.location.clone());

    if !node.is_mixed() {
        for (constraint, _) in node.constraints.iter() {
            if !constraint.is_compatible(node.json_type) {
                return Err(error(CompileError::IncompatibleRule {
                    rule: constraint.name().to_string(),
                    json_type: node.json_type,
                }));
            }
        }
    }

    let mut referenced = node.referenced_types();
    match node.constraints.additional_properties() {
        AdditionalProperties::Named(name) => referenced.push(name.clone()),
        AdditionalProperties::AnyOf(names) => referenced.extend(names.iter().cloned()),
        _ => {}
    }
    if let Some(Constraint::AllOf(names)) = node.constraints.get(ConstraintKind::AllOf) {
        referenced.extend(names.iter().cloned());
    }
    if let Some(name) = referenced.iter().find(|name| !types.contains_key(*name)) {
        return Err(error(CompileError::UndefinedType(name.clone())));
    }

    if let NodeContent::Object { properties } = &node.content {
        for (key, property) in properties.iter().filter(|(key, _)| key.is_shortcut) {
            let located = |e: CompileError| SchemaError::compile(e, property.location.clone());
            let Some(name) = TypeName::new(key.name.as_str()) else {
                return Err(located(CompileError::InvalidTypeName(key.name.clone())));
            };
            if !types.contains_key(&name) {
                return Err(located(CompileError::UndefinedType(name)));
            }
            if !describes_string(tree, types, &name) {
                return Err(located(CompileError::KeyShortcutNotString(name)));
            }
        }
    }

    if let Some(example) = node.example()
        && !node.referenced_types().is_empty()
        && node.schema_type != SchemaType::Any
        && !example_matches(tree, types, id, example)
    {
        return Err(error(if node.constraints.contains(ConstraintKind::Or) {
            CompileError::ExampleMatchesNoAlternative
        } else {
            CompileError::ExampleTypeMismatch {
                declared: node.schema_type.to_string(),
            }
        }));
    }
    Ok(())
}

/// Whether every value of the type is a string.
fn describes_string(tree: &SchemaTree, types: &TypeTable, name: &TypeName) -> bool {
    let candidates = type_candidates(tree, types, name);
    !candidates.is_empty()
        && candidates.iter().all(|candidate| match candidate {
            Candidate::Node(id) => tree.node(*id).json_type == JsonType::String,
            Candidate::Primitive(t) => t.json_type() == Some(JsonType::String),
            Candidate::Any => false,
        })
}

#[cfg(test)]
mod tests {
    use jsight_lexer::{ScanMode, Scanner, SourceFile};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builder::BuildContext;
    use crate::node::TypeEntry;

    pub(super) fn context(types: &[(&str, &str)], root: &str) -> (BuildContext, NodeId) {
        let mut ctx = BuildContext::default();
        for (name, source) in types {
            let file = SourceFile::new(*name, *source);
            let root = ctx
                .build(Scanner::new(file.clone(), ScanMode::Schema))
                .unwrap();
            ctx.types.insert(
                TypeName::new(*name).unwrap(),
                TypeEntry {
                    root,
                    file,
                    offset: 0,
                },
            );
        }
        let root = ctx
            .build(Scanner::new(SourceFile::new("root", root), ScanMode::Schema))
            .unwrap();
        (ctx, root)
    }

    fn check_error(types: &[(&str, &str)], root: &str) -> SchemaError {
        let (ctx, root_id) = context(types, root);
        check(&ctx.tree, &ctx.types, root_id).unwrap_err()
    }

    #[test]
    fn test_valid_references() {
        let (ctx, root) = context(
            &[("@id", r#""a1" // {minLength: 2}"#), ("@cat", r#"{"name": "Tom"}"#)],
            r#"{
              @id: @cat,
              "friend": @cat | @id // {optional: true}
            }"#,
        );
        assert!(check(&ctx.tree, &ctx.types, root).is_ok());
    }

    #[test]
    fn test_compatibility_errors() {
        let cases: &[(&[(&str, &str)], &str, CompileError)] = &[
            (
                &[],
                r#"{"a": @missing}"#,
                CompileError::UndefinedType(TypeName::new("@missing").unwrap()),
            ),
            (
                &[],
                r#"{} // {additionalProperties: @gone}"#,
                CompileError::UndefinedType(TypeName::new("@gone").unwrap()),
            ),
            (
                &[("@num", "1")],
                r#"{@num: "x"}"#,
                CompileError::KeyShortcutNotString(TypeName::new("@num").unwrap()),
            ),
            (
                &[("@str", r#""abc""#)],
                r#"12 // {type: "@str"}"#,
                CompileError::ExampleTypeMismatch {
                    declared: "@str".into(),
                },
            ),
            (
                &[("@a", r#""abc""#), ("@b", "true")],
                r#"12 // {or: [@a, @b]}"#,
                CompileError::ExampleMatchesNoAlternative,
            ),
        ];
        for (types, root, expected) in cases {
            let error = check_error(types, root);
            assert_eq!(error.as_compile(), Some(expected), "{root}");
        }
    }

    #[test]
    fn test_error_names_owning_type() {
        let error = check_error(&[("@pet", r#"{"owner": @person}"#)], "@pet");
        assert_eq!(
            error.type_name.as_ref().map(TypeName::as_str),
            Some("@pet")
        );
    }
}
