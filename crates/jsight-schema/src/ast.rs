//! Generic, serializable view of a compiled schema.
//!
//! Documentation generators consume this tree as plain data. References are
//! kept as `shortcut` nodes unless an inlined view is requested.

use ahash::AHashMap;
use indexmap::IndexMap;
use serde::Serialize;

use crate::constraint::RuleSource;
use crate::node::{NodeContent, NodeId, SchemaTree, TypeTable};
use crate::types::TypeName;
use crate::value::{JsonType, Literal, LiteralValue};

/// How often a type may be expanded on one path of an inlined view.
pub(crate) const EXPANSION_LIMIT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
    Shortcut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AstNode {
    pub token_type: TokenType,
    pub schema_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub rules: IndexMap<String, RuleAst>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AstNode>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_key_shortcut: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherited_from: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleTokenType {
    String,
    Number,
    Boolean,
    Null,
    Object,
    Array,
    Reference,
}

/// A rule value, re-expressed for documentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAst {
    pub token_type: RuleTokenType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, RuleAst>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<RuleAst>,
    pub source: RuleSource,
}

impl RuleAst {
    fn scalar(token_type: RuleTokenType, value: Option<String>, source: RuleSource) -> Self {
        Self {
            token_type,
            value,
            properties: IndexMap::new(),
            items: Vec::new(),
            source,
        }
    }

    pub fn reference(name: impl Into<String>, source: RuleSource) -> Self {
        Self::scalar(RuleTokenType::Reference, Some(name.into()), source)
    }

    pub fn string(value: impl Into<String>, source: RuleSource) -> Self {
        Self::scalar(RuleTokenType::String, Some(value.into()), source)
    }

    pub fn number(value: impl Into<String>, source: RuleSource) -> Self {
        Self::scalar(RuleTokenType::Number, Some(value.into()), source)
    }

    pub fn boolean(value: bool, source: RuleSource) -> Self {
        Self::scalar(RuleTokenType::Boolean, Some(value.to_string()), source)
    }

    pub fn null(source: RuleSource) -> Self {
        Self::scalar(RuleTokenType::Null, Some("null".to_string()), source)
    }

    pub fn literal(literal: &Literal, source: RuleSource) -> Self {
        match &literal.value {
            LiteralValue::String(s) => Self::string(s.as_str(), source),
            LiteralValue::Number(_) => Self::number(literal.raw.as_str(), source),
            LiteralValue::Boolean(b) => Self::boolean(*b, source),
            LiteralValue::Null => Self::null(source),
        }
    }

    pub fn array(items: Vec<RuleAst>, source: RuleSource) -> Self {
        Self {
            items,
            ..Self::scalar(RuleTokenType::Array, None, source)
        }
    }

    pub fn object(properties: IndexMap<String, RuleAst>, source: RuleSource) -> Self {
        Self {
            properties,
            ..Self::scalar(RuleTokenType::Object, None, source)
        }
    }
}

// =============================================================================
// Building
// =============================================================================

pub(crate) struct AstBuilder<'a> {
    tree: &'a SchemaTree,
    types: &'a TypeTable,
    inline: bool,
    expanding: AHashMap<TypeName, usize>,
}

impl<'a> AstBuilder<'a> {
    pub fn new(tree: &'a SchemaTree, types: &'a TypeTable, inline: bool) -> Self {
        Self {
            tree,
            types,
            inline,
            expanding: AHashMap::new(),
        }
    }

    pub fn build(&mut self, id: NodeId) -> AstNode {
        if self.inline
            && let Some(name) = self.single_reference(id)
            && let Some(root) = self.types.get(&name).map(|entry| entry.root)
        {
            let depth = self.expanding.get(&name).copied().unwrap_or(0);
            if depth < EXPANSION_LIMIT {
                *self.expanding.entry(name.clone()).or_default() += 1;
                let mut expanded = self.build(root);
                if let Some(count) = self.expanding.get_mut(&name) {
                    *count -= 1;
                }
                let tree = self.tree;
                let node = tree.node(id);
                if node.comment.is_some() {
                    expanded.comment = node.comment.clone();
                }
                if node.is_optional() {
                    expanded.rules.insert(
                        "optional".to_string(),
                        RuleAst::boolean(true, RuleSource::Manual),
                    );
                }
                return expanded;
            }
        }
        self.plain(id)
    }

    fn plain(&mut self, id: NodeId) -> AstNode {
        let tree = self.tree;
        let node = tree.node(id);
        let rules = node
            .constraints
            .iter()
            .map(|(c, source)| (c.name().to_string(), c.to_rule_ast(source)))
            .collect();
        let (token_type, value, children) = match &node.content {
            NodeContent::Literal { example } => (
                literal_token(node.json_type),
                example.as_ref().map(|e| match &e.value {
                    LiteralValue::String(s) => s.clone(),
                    _ => e.raw.clone(),
                }),
                Vec::new(),
            ),
            NodeContent::Object { properties } => {
                let children = properties
                    .iter()
                    .map(|(key, property)| {
                        let mut child = self.build(property.child);
                        child.key = Some(key.name.clone());
                        child.is_key_shortcut = key.is_shortcut;
                        child
                    })
                    .collect();
                (TokenType::Object, None, children)
            }
            NodeContent::Array { items } => {
                let children = items.iter().map(|item| self.build(*item)).collect();
                (TokenType::Array, None, children)
            }
            NodeContent::Mixed { type_name } => (
                TokenType::Shortcut,
                Some(type_name.to_string()),
                Vec::new(),
            ),
            NodeContent::MixedValue { types } => (
                TokenType::Shortcut,
                Some(
                    types
                        .iter()
                        .map(TypeName::as_str)
                        .collect::<Vec<_>>()
                        .join(" | "),
                ),
                Vec::new(),
            ),
        };
        AstNode {
            token_type,
            schema_type: node.schema_type.name().to_string(),
            key: None,
            value,
            comment: node.comment.clone(),
            rules,
            children,
            is_key_shortcut: false,
            inherited_from: node.inherited_from.as_ref().map(TypeName::to_string),
        }
    }

    /// The type a node stands for, when it is a plain reference rather than a union.
    fn single_reference(&self, id: NodeId) -> Option<TypeName> {
        let node = self.tree.node(id);
        match &node.content {
            NodeContent::Mixed { type_name } => Some(type_name.clone()),
            NodeContent::Literal { .. } if node.constraints.types_list().is_none() => {
                node.constraints.reference().cloned()
            }
            _ => None,
        }
    }
}

fn literal_token(json_type: JsonType) -> TokenType {
    match json_type {
        JsonType::String => TokenType::String,
        JsonType::Integer | JsonType::Float => TokenType::Number,
        JsonType::Boolean => TokenType::Boolean,
        JsonType::Null => TokenType::Null,
        JsonType::Object => TokenType::Object,
        JsonType::Array => TokenType::Array,
        JsonType::Mixed => TokenType::Shortcut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_ast_serialization() {
        let mut properties = IndexMap::new();
        properties.insert(
            "type".to_string(),
            RuleAst::reference("@cat", RuleSource::Manual),
        );
        let rule = RuleAst::array(
            vec![
                RuleAst::object(properties, RuleSource::Manual),
                RuleAst::literal(&Literal::parse(b"1.50").unwrap(), RuleSource::Generated),
            ],
            RuleSource::Manual,
        );
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(
            json,
            r#"{"tokenType":"array","items":[{"tokenType":"object","properties":{"type":{"tokenType":"reference","value":"@cat","source":"manual"}},"source":"manual"},{"tokenType":"number","value":"1.50","source":"generated"}],"source":"manual"}"#
        );
    }
}
