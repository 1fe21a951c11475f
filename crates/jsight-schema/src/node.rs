//! Schema nodes and the arena that owns them.
//!
//! Every schema-level JSON value becomes one [`Node`]. Nodes live in a
//! [`SchemaTree`] arena and refer to each other by [`NodeId`]; a node's
//! `parent` is a plain back-index and never owns anything.

use std::sync::Arc;

use indexmap::IndexMap;
use jsight_lexer::{Location, SourceFile};

use crate::constraint::Constraints;
use crate::types::{SchemaType, TypeName};
use crate::value::{JsonType, Literal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Key of an object property. A key shortcut `@id` and a literal key `"@id"`
/// are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    pub name: String,
    pub is_shortcut: bool,
}

impl PropertyKey {
    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_shortcut: false,
        }
    }

    pub fn shortcut(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_shortcut: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Property {
    pub child: NodeId,
    /// Where the key is written.
    pub location: Location,
}

#[derive(Debug, Clone)]
pub enum NodeContent {
    /// `example` is `None` for nodes made from rules alone.
    Literal { example: Option<Literal> },
    Object {
        properties: IndexMap<PropertyKey, Property>,
    },
    Array { items: Vec<NodeId> },
    /// A single type reference, `@cat`.
    Mixed { type_name: TypeName },
    /// A union of type references, `@cat | @dog`.
    MixedValue { types: Vec<TypeName> },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub content: NodeContent,
    pub json_type: JsonType,
    /// The type used in diagnostics and documentation, e.g. `email` for a
    /// node whose JSON type is string.
    pub schema_type: SchemaType,
    pub constraints: Constraints,
    pub parent: Option<NodeId>,
    pub comment: Option<String>,
    /// The type whose `allOf` composition contributed this node.
    pub inherited_from: Option<TypeName>,
    pub location: Location,
}

impl Node {
    pub fn new(content: NodeContent, json_type: JsonType, location: Location) -> Self {
        let schema_type = match &content {
            NodeContent::Mixed { type_name } => SchemaType::Reference(type_name.clone()),
            _ => SchemaType::from_json_type(json_type),
        };
        Self {
            content,
            json_type,
            schema_type,
            constraints: Constraints::default(),
            parent: None,
            comment: None,
            inherited_from: None,
            location,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.constraints.is_optional()
    }

    pub fn is_nullable(&self) -> bool {
        self.constraints.is_nullable()
    }

    pub fn example(&self) -> Option<&Literal> {
        match &self.content {
            NodeContent::Literal { example } => example.as_ref(),
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&IndexMap<PropertyKey, Property>> {
        match &self.content {
            NodeContent::Object { properties } => Some(properties),
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&[NodeId]> {
        match &self.content {
            NodeContent::Array { items } => Some(items),
            _ => None,
        }
    }

    /// Whether the JSON type of this node is only known after resolving types.
    pub fn is_mixed(&self) -> bool {
        matches!(
            self.content,
            NodeContent::Mixed { .. } | NodeContent::MixedValue { .. }
        ) || self.json_type == JsonType::Mixed
    }

    /// Types this node resolves to, if it is a reference or a union.
    pub fn referenced_types(&self) -> Vec<TypeName> {
        if let Some(names) = self.constraints.types_list() {
            return names.to_vec();
        }
        if let Some(name) = self.constraints.reference() {
            return vec![name.clone()];
        }
        match &self.content {
            NodeContent::Mixed { type_name } => vec![type_name.clone()],
            NodeContent::MixedValue { types } => types.clone(),
            _ => Vec::new(),
        }
    }
}

// =============================================================================
// SchemaTree
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct SchemaTree {
    nodes: Vec<Node>,
}

impl SchemaTree {
    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.node(id).content {
            NodeContent::Object { properties } => properties.values().map(|p| p.child).collect(),
            NodeContent::Array { items } => items.clone(),
            _ => Vec::new(),
        }
    }

    /// The root of the tree `id` belongs to.
    pub fn root_of(&self, mut id: NodeId) -> NodeId {
        while let Some(parent) = self.node(id).parent {
            id = parent;
        }
        id
    }

    /// All nodes of the subtree at `id`, the root first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![id];
        let mut next = 0;
        while next < out.len() {
            out.extend(self.children(out[next]));
            next += 1;
        }
        out
    }

    /// Copies the subtree at `id`, giving the copy's root a new parent.
    ///
    /// The copy owns fresh children; nothing is shared with the original.
    pub fn deep_copy(&mut self, id: NodeId, parent: Option<NodeId>) -> NodeId {
        let mut node = self.node(id).clone();
        node.parent = parent;
        let copy = self.push(node);
        let content = match &self.node(id).content {
            NodeContent::Object { properties } => {
                let properties = properties.clone();
                let mut copied = IndexMap::with_capacity(properties.len());
                for (key, property) in properties {
                    let child = self.deep_copy(property.child, Some(copy));
                    copied.insert(key, Property { child, ..property });
                }
                Some(NodeContent::Object { properties: copied })
            }
            NodeContent::Array { items } => {
                let items = items.clone();
                let copied = items
                    .into_iter()
                    .map(|item| self.deep_copy(item, Some(copy)))
                    .collect();
                Some(NodeContent::Array { items: copied })
            }
            _ => None,
        };
        if let Some(content) = content {
            self.node_mut(copy).content = content;
        }
        copy
    }
}

// =============================================================================
// TypeTable
// =============================================================================

/// A named type: the root node of its definition and where it was defined.
#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub root: NodeId,
    pub file: Arc<SourceFile>,
    pub offset: usize,
}

pub type TypeTable = IndexMap<TypeName, TypeEntry>;
