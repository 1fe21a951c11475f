//! Resolving schema nodes to the validators a document value is checked by.

use ahash::AHashSet;

use crate::constraint::AdditionalProperties;
use crate::node::{NodeId, SchemaTree, TypeTable};
use crate::types::{SchemaType, TypeName};

/// One alternative a document value may match.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Candidate {
    /// A concrete (non-reference) schema node.
    Node(NodeId),
    /// Any value of a built-in type, with its format.
    Primitive(SchemaType),
    Any,
}

/// Flattens references, unions and `or` rules into concrete candidates.
///
/// A nullable reference contributes a `null` candidate of its own, since the
/// referenced type need not accept `null`.
pub(crate) fn candidates(tree: &SchemaTree, types: &TypeTable, id: NodeId) -> Vec<Candidate> {
    let mut out = Vec::new();
    let mut visited = AHashSet::new();
    collect(tree, types, id, &mut visited, &mut out);
    out
}

pub(crate) fn type_candidates(
    tree: &SchemaTree,
    types: &TypeTable,
    name: &TypeName,
) -> Vec<Candidate> {
    types
        .get(name)
        .map(|entry| candidates(tree, types, entry.root))
        .unwrap_or_default()
}

pub(crate) fn policy_candidates(
    tree: &SchemaTree,
    types: &TypeTable,
    policy: &AdditionalProperties,
) -> Vec<Candidate> {
    match policy {
        AdditionalProperties::Forbidden => Vec::new(),
        AdditionalProperties::AllowAny => vec![Candidate::Any],
        AdditionalProperties::Primitive(t) => vec![Candidate::Primitive(t.clone())],
        AdditionalProperties::Named(name) => type_candidates(tree, types, name),
        AdditionalProperties::AnyOf(names) => {
            let mut out = Vec::new();
            let mut visited = AHashSet::new();
            for name in names {
                if visited.insert(name.clone())
                    && let Some(entry) = types.get(name)
                {
                    collect(tree, types, entry.root, &mut visited, &mut out);
                }
            }
            out
        }
    }
}

fn collect(
    tree: &SchemaTree,
    types: &TypeTable,
    id: NodeId,
    visited: &mut AHashSet<TypeName>,
    out: &mut Vec<Candidate>,
) {
    let node = tree.node(id);
    if node.schema_type == SchemaType::Any {
        push(out, Candidate::Any);
        return;
    }
    let references = node.referenced_types();
    if references.is_empty() {
        push(out, Candidate::Node(id));
        return;
    }
    if node.is_nullable() {
        push(out, Candidate::Primitive(SchemaType::Null));
    }
    for name in references {
        if !visited.insert(name.clone()) {
            continue;
        }
        if let Some(entry) = types.get(&name) {
            collect(tree, types, entry.root, visited, out);
        }
    }
}

fn push(out: &mut Vec<Candidate>, candidate: Candidate) {
    if !out.contains(&candidate) {
        out.push(candidate);
    }
}
