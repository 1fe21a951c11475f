//! Example document synthesis.
//!
//! Literal nodes contribute their worked example. Nodes written as rules
//! alone (anonymous `or` alternatives) get a value synthesized from their
//! rules. References are expanded in place; a type already expanded twice on
//! the current path is truncated instead, which makes optional
//! self-references finite.

use ahash::AHashMap;
use serde_json::{Map, Value};

use crate::ast::EXPANSION_LIMIT;
use crate::constraint::{Constraint, ConstraintKind};
use crate::node::{Node, NodeContent, NodeId, SchemaTree, TypeTable};
use crate::number::Number;
use crate::types::{SchemaType, TypeName};
use crate::value::{Literal, LiteralValue};

pub(crate) struct ExampleBuilder<'a> {
    tree: &'a SchemaTree,
    types: &'a TypeTable,
    expanding: AHashMap<TypeName, usize>,
}

impl<'a> ExampleBuilder<'a> {
    pub fn new(tree: &'a SchemaTree, types: &'a TypeTable) -> Self {
        Self {
            tree,
            types,
            expanding: AHashMap::new(),
        }
    }

    /// Compact JSON text of the example for `id`.
    pub fn build(&mut self, id: NodeId) -> String {
        self.value(id).unwrap_or(Value::Null).to_string()
    }

    /// `None` when the value was truncated.
    fn value(&mut self, id: NodeId) -> Option<Value> {
        let tree = self.tree;
        let node = tree.node(id);
        if let Some(example) = node.example() {
            return Some(literal_value(example));
        }
        let references = node.referenced_types();
        if !references.is_empty() {
            return match self.first_expandable(&references) {
                Some(name) => self.expand(&name),
                None if node.is_nullable() => Some(Value::Null),
                None => None,
            };
        }
        match &node.content {
            NodeContent::Object { properties } => {
                let mut map = Map::new();
                for (key, property) in properties {
                    let child = tree.node(property.child);
                    let value = match self.value(property.child) {
                        Some(value) => value,
                        None if child.is_optional() => continue,
                        None => Value::Null,
                    };
                    let name = if key.is_shortcut {
                        self.shortcut_key(&key.name)
                    } else {
                        key.name.clone()
                    };
                    map.insert(name, value);
                }
                Some(Value::Object(map))
            }
            NodeContent::Array { items } => {
                let mut values: Vec<Value> =
                    items.iter().filter_map(|item| self.value(*item)).collect();
                if let Some(min) = node.constraints.min_items()
                    && !values.is_empty()
                {
                    let mut next = 0;
                    while (values.len() as u64) < min {
                        values.push(values[next].clone());
                        next += 1;
                    }
                }
                if let Some(max) = node.constraints.max_items() {
                    values.truncate(usize::try_from(max).unwrap_or(usize::MAX));
                }
                Some(Value::Array(values))
            }
            _ => Some(synthesize(node)),
        }
    }

    fn first_expandable(&self, names: &[TypeName]) -> Option<TypeName> {
        names
            .iter()
            .find(|name| {
                self.types.contains_key(*name)
                    && self.expanding.get(*name).copied().unwrap_or(0) < EXPANSION_LIMIT
            })
            .cloned()
    }

    fn expand(&mut self, name: &TypeName) -> Option<Value> {
        let root = self.types.get(name)?.root;
        *self.expanding.entry(name.clone()).or_insert(0) += 1;
        let value = self.value(root);
        if let Some(depth) = self.expanding.get_mut(name) {
            *depth -= 1;
        }
        value
    }

    /// A key accepted by the key shortcut `@k`: the example of `@k`.
    fn shortcut_key(&mut self, name: &str) -> String {
        let value = TypeName::new(name).and_then(|type_name| self.expand(&type_name));
        match value {
            Some(Value::String(key)) => key,
            _ => name.trim_start_matches('@').to_string(),
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match &literal.value {
        LiteralValue::String(s) => Value::String(s.clone()),
        LiteralValue::Boolean(b) => Value::Bool(*b),
        LiteralValue::Null => Value::Null,
        LiteralValue::Number(n) => literal
            .raw
            .parse::<serde_json::Number>()
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(n.to_string())),
    }
}

/// A value satisfying the rules of a literal node that has no example.
fn synthesize(node: &Node) -> Value {
    if let Some(first) = node.constraints.enum_values().and_then(|values| values.first()) {
        return literal_value(first);
    }
    let schema_type = node
        .constraints
        .declared_type()
        .unwrap_or(&node.schema_type);
    match schema_type {
        SchemaType::Email => Value::String("user@example.com".to_string()),
        SchemaType::Uri => Value::String("https://example.com".to_string()),
        SchemaType::Uuid => Value::String("550e8400-e29b-41d4-a716-446655440000".to_string()),
        SchemaType::Date => Value::String("2006-01-02".to_string()),
        SchemaType::DateTime => Value::String("2006-01-02T15:04:05+07:00".to_string()),
        SchemaType::String => {
            let length = match node.constraints.get(ConstraintKind::MinLength) {
                Some(Constraint::MinLength(n)) => *n,
                _ => 0,
            };
            Value::String("a".repeat(usize::try_from(length).unwrap_or(0)))
        }
        SchemaType::Integer | SchemaType::Float | SchemaType::Decimal => {
            number_value(&in_range(node))
        }
        SchemaType::Boolean => Value::Bool(true),
        SchemaType::Object => Value::Object(Map::new()),
        SchemaType::Array => Value::Array(Vec::new()),
        _ => Value::Null,
    }
}

/// An integer between the node's bounds, or zero.
fn in_range(node: &Node) -> Number {
    let bound = |kind| match node.constraints.get(kind) {
        Some(Constraint::Min(b) | Constraint::Max(b)) => Some(b.clone()),
        _ => None,
    };
    let min = bound(ConstraintKind::Min);
    let max = bound(ConstraintKind::Max);
    if let Some(min) = min {
        let mut value = min.value.ceil();
        if min.exclusive && value == min.value {
            value = value.add_integer(1);
        }
        return value;
    }
    match max {
        Some(max) if max.value < Number::zero() || (max.exclusive && max.value.is_zero()) => {
            let mut value = max.value.floor();
            if max.exclusive && value == max.value {
                value = value.add_integer(-1);
            }
            value
        }
        _ => Number::zero(),
    }
}

fn number_value(number: &Number) -> Value {
    number
        .to_string()
        .parse::<serde_json::Number>()
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
