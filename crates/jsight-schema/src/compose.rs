//! `allOf` composition.
//!
//! A node with `allOf: [@a, @b]` receives copies of the top-level properties
//! of `@a` and `@b`. Source types are resolved first, so properties a source
//! inherits itself are passed on; a type that (transitively) composes itself
//! is an error.

use ahash::{AHashMap, AHashSet};
use jsight_lexer::Location;
use tracing::{debug, trace};

use crate::constraint::{Constraint, ConstraintKind};
use crate::error::{CompileError, SchemaError};
use crate::node::{NodeContent, NodeId, Property, SchemaTree, TypeTable};
use crate::types::TypeName;
use crate::value::JsonType;

/// Resolves every `allOf` rule in the tree.
pub(crate) fn resolve(tree: &mut SchemaTree, types: &TypeTable) -> Result<(), SchemaError> {
    let pending: Vec<NodeId> = tree
        .ids()
        .filter(|id| tree.node(*id).constraints.contains(ConstraintKind::AllOf))
        .collect();
    if pending.is_empty() {
        return Ok(());
    }
    debug!(nodes = pending.len(), "resolving allOf");
    let owners = types
        .iter()
        .map(|(name, entry)| (entry.root, name.clone()))
        .collect();
    let mut composer = Composer {
        tree,
        types,
        owners,
        resolved: AHashSet::new(),
        path: Vec::new(),
    };
    for id in pending {
        composer.resolve_node(id)?;
    }
    Ok(())
}

struct Composer<'a> {
    tree: &'a mut SchemaTree,
    types: &'a TypeTable,
    /// Type roots and their names.
    owners: AHashMap<NodeId, TypeName>,
    resolved: AHashSet<NodeId>,
    /// Types whose composition is in progress.
    path: Vec<TypeName>,
}

impl Composer<'_> {
    fn owner(&self, id: NodeId) -> Option<&TypeName> {
        self.owners.get(&self.tree.root_of(id))
    }

    fn resolve_node(&mut self, id: NodeId) -> Result<(), SchemaError> {
        if !self.resolved.insert(id) {
            return Ok(());
        }
        let names = match self.tree.node(id).constraints.get(ConstraintKind::AllOf) {
            Some(Constraint::AllOf(names)) => names.clone(),
            _ => return Ok(()),
        };
        let owner = self.owner(id).cloned();
        let in_owner = |e: SchemaError| match &owner {
            Some(name) => e.in_type(name),
            None => e,
        };
        let location = self.tree.node(id).location.clone();
        if !matches!(self.tree.node(id).content, NodeContent::Object { .. }) {
            return Err(in_owner(SchemaError::compile(
                CompileError::IncompatibleRule {
                    rule: "allOf".to_string(),
                    json_type: self.tree.node(id).json_type,
                },
                location,
            )));
        }
        let root_of_type = owner.as_ref().filter(|_| self.owners.contains_key(&id));
        if let Some(name) = root_of_type {
            self.path.push(name.clone());
        }
        let result = self.compose(id, &names, &location);
        if root_of_type.is_some() {
            self.path.pop();
        }
        result.map_err(in_owner)
    }

    fn compose(
        &mut self,
        id: NodeId,
        names: &[TypeName],
        location: &Location,
    ) -> Result<(), SchemaError> {
        for name in names {
            let source = self.resolve_type(name).map_err(|e| {
                if e.location.is_some() {
                    e
                } else {
                    SchemaError {
                        location: Some(location.clone()),
                        ..e
                    }
                }
            })?;
            self.copy_properties(id, source, name)?;
        }
        Ok(())
    }

    /// Makes sure the type's own compositions are done, returning its root.
    ///
    /// A type whose root is being composed is on `path`; reaching it again is
    /// a cycle.
    fn resolve_type(&mut self, name: &TypeName) -> Result<NodeId, SchemaError> {
        if self.path.contains(name) {
            let mut cycle: Vec<&str> = self
                .path
                .iter()
                .skip_while(|n| *n != name)
                .map(TypeName::as_str)
                .collect();
            cycle.push(name.as_str());
            return Err(SchemaError::unpositioned(CompileError::AllOfCycle(
                cycle.join(" -> "),
            )));
        }
        let Some(entry) = self.types.get(name) else {
            return Err(SchemaError::unpositioned(CompileError::UndefinedType(
                name.clone(),
            )));
        };
        let root = entry.root;
        if !matches!(self.tree.node(root).content, NodeContent::Object { .. }) {
            return Err(SchemaError::unpositioned(CompileError::AllOfNotObject(
                name.clone(),
            )));
        }
        self.resolve_subtree(root)?;
        Ok(root)
    }

    fn resolve_subtree(&mut self, root: NodeId) -> Result<(), SchemaError> {
        for id in self.tree.descendants(root) {
            if self.tree.node(id).constraints.contains(ConstraintKind::AllOf) {
                self.resolve_node(id)?;
            }
        }
        Ok(())
    }

    fn copy_properties(
        &mut self,
        target: NodeId,
        source: NodeId,
        from: &TypeName,
    ) -> Result<(), SchemaError> {
        let properties: Vec<_> = match &self.tree.node(source).content {
            NodeContent::Object { properties } => properties
                .iter()
                .map(|(key, property)| (key.clone(), property.clone()))
                .collect(),
            _ => Vec::new(),
        };
        for (key, property) in properties {
            let exists = self
                .tree
                .node(target)
                .properties()
                .is_some_and(|existing| existing.contains_key(&key));
            if exists {
                return Err(SchemaError::compile(
                    CompileError::PropertyOverride {
                        key: key.name,
                        from: from.clone(),
                    },
                    self.tree.node(target).location.clone(),
                ));
            }
            let child = self.tree.deep_copy(property.child, Some(target));
            for id in self.tree.descendants(child) {
                self.resolved.insert(id);
            }
            let node = self.tree.node_mut(child);
            if node.inherited_from.is_none() {
                node.inherited_from = Some(from.clone());
            }
            trace!(key = %key.name, from = %from, "inherited property");
            if let NodeContent::Object { properties } = &mut self.tree.node_mut(target).content {
                properties.insert(key, Property { child, ..property });
            }
        }
        self.tree.node_mut(target).json_type = JsonType::Object;
        Ok(())
    }
}
