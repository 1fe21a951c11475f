//! Infinite recursion detection.
//!
//! Types form a graph whose edges are the references a value of the type must
//! contain. Optional properties, nullable values and array items can always be
//! left out, so only required references are edges. A union is satisfiable
//! when any one of its alternatives is.

use ahash::AHashSet;
use jsight_lexer::Location;

use crate::error::{CompileError, SchemaError};
use crate::node::{NodeContent, NodeId, SchemaTree, TypeTable};
use crate::types::{SchemaType, TypeName};

pub(super) fn check(tree: &SchemaTree, types: &TypeTable, root: NodeId) -> Result<(), SchemaError> {
    let mut walker = Walker {
        tree,
        types,
        path: Vec::new(),
        done: AHashSet::new(),
    };
    walker.node(root)?;
    for name in types.keys() {
        let at = tree.node(types[name].root).location.clone();
        walker.named(name, &at)?;
    }
    Ok(())
}

struct Walker<'a> {
    tree: &'a SchemaTree,
    types: &'a TypeTable,
    /// Types on the current chain of required references.
    path: Vec<TypeName>,
    /// Types known to have a finite value.
    done: AHashSet<TypeName>,
}

impl Walker<'_> {
    fn node(&mut self, id: NodeId) -> Result<(), SchemaError> {
        let tree = self.tree;
        let node = tree.node(id);
        if node.is_nullable() || node.schema_type == SchemaType::Any {
            return Ok(());
        }
        let references = node.referenced_types();
        if !references.is_empty() {
            let mut first_error = None;
            for name in &references {
                match self.named(name, &node.location) {
                    Ok(()) => return Ok(()),
                    Err(e) => {
                        first_error.get_or_insert(e);
                    }
                }
            }
            return first_error.map_or(Ok(()), Err);
        }
        match &node.content {
            NodeContent::Object { properties } => {
                for property in properties.values() {
                    if !tree.node(property.child).is_optional() {
                        self.node(property.child)?;
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn named(&mut self, name: &TypeName, at: &Location) -> Result<(), SchemaError> {
        if self.done.contains(name) {
            return Ok(());
        }
        if let Some(start) = self.path.iter().position(|n| n == name) {
            return Err(self.cycle(start, name, at));
        }
        let Some(entry) = self.types.get(name) else {
            return Ok(());
        };
        self.path.push(name.clone());
        let result = self.node(entry.root);
        self.path.pop();
        if result.is_ok() {
            self.done.insert(name.clone());
        }
        result
    }

    fn cycle(&self, start: usize, name: &TypeName, at: &Location) -> SchemaError {
        let chain = &self.path[start..];
        let mut names: Vec<&str> = chain.iter().map(TypeName::as_str).collect();
        names.push(name.as_str());
        let mut error = SchemaError::compile(
            CompileError::InfiniteRecursion(names.join(" -> ")),
            at.clone(),
        )
        .in_type(&chain[chain.len() - 1]);
        for member in chain {
            if let Some(entry) = self.types.get(member) {
                error = error.with_frame(self.tree.node(entry.root).location.clone());
            }
        }
        error
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::tests::context;
    use super::*;

    fn run(types: &[(&str, &str)], root: &str) -> Result<(), SchemaError> {
        let (ctx, root) = context(types, root);
        check(&ctx.tree, &ctx.types, root)
    }

    #[test]
    fn test_terminating_references() {
        let cases: &[&[(&str, &str)]] = &[
            &[("@node", r#"{"next": @node // {optional: true}
            }"#)],
            &[("@node", r#"{"next": @node // {nullable: true}
            }"#)],
            &[("@node", r#"{"children": [@node]}"#)],
            &[
                ("@tree", r#"{"left": @tree | @leaf}"#),
                ("@leaf", r#""x""#),
            ],
        ];
        for types in cases {
            assert!(run(types, "{}").is_ok(), "{types:?}");
        }
    }

    #[test]
    fn test_required_cycle_reports_path() {
        let error = run(
            &[
                ("@foo", r#"{"bar": @bar}"#),
                ("@bar", r#"{"fizz": @fizz}"#),
                ("@fizz", r#"{"foo": @foo}"#),
            ],
            "@foo",
        )
        .unwrap_err();
        assert_eq!(
            error.as_compile(),
            Some(&CompileError::InfiniteRecursion(
                "@foo -> @bar -> @fizz -> @foo".into()
            ))
        );
        assert_eq!(error.trace.len(), 3);
        assert_eq!(
            error.type_name.as_ref().map(TypeName::as_str),
            Some("@fizz")
        );
    }

    #[test]
    fn test_union_fails_only_when_every_alternative_cycles() {
        let error = run(
            &[("@a", r#"{"x": @a | @b}"#), ("@b", r#"{"y": @a}"#)],
            "{}",
        )
        .unwrap_err();
        assert!(matches!(
            error.as_compile(),
            Some(CompileError::InfiniteRecursion(path)) if path.starts_with("@a")
        ));
    }
}
