//! Tree builder: grows a [`SchemaTree`] from the scanner's lexeme stream.
//!
//! The builder mirrors the scanner one level up. [`TreeBuilder::grow`] takes
//! the node being grown and one lexeme and returns the node to grow next: a
//! container Begin creates a child and descends into it, the matching End
//! returns to the parent.
//!
//! Annotations are collected while scanning and applied to their target node
//! when they close. Cross-rule checks need the whole annotation and, for
//! literals, the example, so they run in [`finalize`] once the tree is built.

use std::sync::Arc;

use ahash::AHashSet;
use indexmap::IndexMap;
use jsight_lexer::{Lexeme, LexemeKind, Location, ScanMode, Scanner, SourceFile};
use regex::Regex;

use crate::constraint::{
    AdditionalProperties, Bound, Constraint, ConstraintKind, EnumValues, OrAlternative,
    RegexRule, RuleSource,
};
use crate::error::{CompileError, SchemaError};
use crate::node::{
    Node, NodeContent, NodeId, Property, PropertyKey, SchemaTree, TypeEntry, TypeTable,
};
use crate::rule::{RuleBlockBuilder, RuleValue, RuleValueKind};
use crate::types::{SchemaType, TypeName, is_rule_name};
use crate::value::{JsonType, Literal};

/// Everything that compilation accumulates before checking.
#[derive(Debug, Default)]
pub(crate) struct BuildContext {
    pub tree: SchemaTree,
    pub types: TypeTable,
    /// Named rules (`@@name`) and the literals they list.
    pub rules: IndexMap<String, Vec<Literal>>,
    anonymous: usize,
}

impl BuildContext {
    /// Builds the schema scanned by `scanner`, returning its root node.
    pub fn build(&mut self, scanner: Scanner) -> Result<NodeId, SchemaError> {
        TreeBuilder::new(self).run(scanner)
    }

    /// Reads a named rule: a JSON array of literals, comments allowed.
    pub fn add_rule(&mut self, name: &str, file: Arc<SourceFile>) -> Result<(), SchemaError> {
        let values = read_named_rule(name, file)?;
        self.rules.insert(name.to_string(), values);
        Ok(())
    }

    fn next_anonymous(&mut self) -> TypeName {
        let name = TypeName::anonymous(self.anonymous);
        self.anonymous += 1;
        name
    }
}

struct Annotation {
    rules: RuleBlockBuilder,
    value: Option<RuleValue>,
    comment: Option<String>,
}

struct TreeBuilder<'c> {
    ctx: &'c mut BuildContext,
    root: Option<NodeId>,
    key: Option<(PropertyKey, Location)>,
    key_shortcut: bool,
    mixed: Vec<TypeName>,
    /// The node an annotation on the current line would describe.
    target: Option<NodeId>,
    annotated: AHashSet<NodeId>,
    annotation: Option<Annotation>,
    created: Vec<NodeId>,
}

impl<'c> TreeBuilder<'c> {
    fn new(ctx: &'c mut BuildContext) -> Self {
        Self {
            ctx,
            root: None,
            key: None,
            key_shortcut: false,
            mixed: Vec::new(),
            target: None,
            annotated: AHashSet::new(),
            annotation: None,
            created: Vec::new(),
        }
    }

    fn run(mut self, mut scanner: Scanner) -> Result<NodeId, SchemaError> {
        let mut current = None;
        while let Some(lexeme) = scanner.next_lexeme()? {
            if lexeme.kind == LexemeKind::EndTop {
                break;
            }
            current = self.grow(current, &lexeme)?;
        }
        let Some(root) = self.root else {
            panic!("scanner finished without a top-level value");
        };
        for id in std::mem::take(&mut self.created) {
            finalize(&mut self.ctx.tree, id)?;
        }
        Ok(root)
    }

    /// Feeds one lexeme to `node`, returning the node to feed next.
    fn grow(
        &mut self,
        node: Option<NodeId>,
        lexeme: &Lexeme,
    ) -> Result<Option<NodeId>, SchemaError> {
        if self.annotation.is_some() {
            self.grow_annotation(lexeme)?;
            return Ok(node);
        }
        let location = lexeme.location();
        match lexeme.kind {
            LexemeKind::LiteralBegin => {
                let child = self.open(
                    node,
                    NodeContent::Literal { example: None },
                    JsonType::Null,
                    location,
                );
                Ok(Some(child))
            }
            LexemeKind::LiteralEnd => {
                let id = expect_node(node, lexeme);
                let literal = Literal::parse(lexeme.value()).map_err(|e| {
                    SchemaError::compile(CompileError::InvalidLiteral(e.to_string()), location)
                })?;
                let target = self.ctx.tree.node_mut(id);
                target.json_type = literal.json_type;
                target.schema_type = SchemaType::from_json_type(literal.json_type);
                target.content = NodeContent::Literal {
                    example: Some(literal),
                };
                Ok(self.close(id))
            }
            LexemeKind::ObjectBegin => {
                let child = self.open(
                    node,
                    NodeContent::Object {
                        properties: IndexMap::new(),
                    },
                    JsonType::Object,
                    location,
                );
                Ok(Some(child))
            }
            LexemeKind::ArrayBegin => {
                let child = self.open(
                    node,
                    NodeContent::Array { items: Vec::new() },
                    JsonType::Array,
                    location,
                );
                Ok(Some(child))
            }
            LexemeKind::ObjectEnd | LexemeKind::ArrayEnd => {
                let id = expect_node(node, lexeme);
                Ok(self.close(id))
            }
            LexemeKind::ObjectKeyBegin => {
                self.key_shortcut = false;
                Ok(node)
            }
            LexemeKind::KeyShortcutBegin => {
                self.key_shortcut = true;
                Ok(node)
            }
            LexemeKind::ObjectKeyEnd => {
                let id = expect_node(node, lexeme);
                let key = if self.key_shortcut {
                    PropertyKey::shortcut(lexeme.text())
                } else {
                    let name = Literal::parse(lexeme.value())
                        .ok()
                        .and_then(|l| l.as_str().map(str::to_string))
                        .unwrap_or_else(|| lexeme.text());
                    PropertyKey::literal(name)
                };
                if let Some(properties) = self.ctx.tree.node(id).properties()
                    && properties.contains_key(&key)
                {
                    return Err(SchemaError::compile(
                        CompileError::DuplicateKey(key.name),
                        location,
                    ));
                }
                self.key = Some((key, location));
                Ok(node)
            }
            LexemeKind::MixedValueBegin => {
                self.mixed.clear();
                Ok(node)
            }
            LexemeKind::TypesShortcutEnd => {
                let text = lexeme.text();
                let name = TypeName::new(text.as_str()).ok_or_else(|| {
                    SchemaError::compile(CompileError::InvalidTypeName(text), location)
                })?;
                self.mixed.push(name);
                Ok(node)
            }
            LexemeKind::MixedValueEnd => {
                let types = std::mem::take(&mut self.mixed);
                let (content, generated) = match types.as_slice() {
                    [single] => (
                        NodeContent::Mixed {
                            type_name: single.clone(),
                        },
                        Vec::new(),
                    ),
                    _ => (
                        NodeContent::MixedValue {
                            types: types.clone(),
                        },
                        vec![
                            Constraint::Or(
                                types
                                    .iter()
                                    .map(|name| OrAlternative {
                                        type_name: name.clone(),
                                        rules: None,
                                    })
                                    .collect(),
                            ),
                            Constraint::TypesList(types),
                        ],
                    ),
                };
                let id = self.open(node, content, JsonType::Mixed, location.clone());
                for constraint in generated {
                    self.ctx
                        .tree
                        .node_mut(id)
                        .constraints
                        .insert(constraint, RuleSource::Generated)
                        .map_err(|e| SchemaError::compile(e, location.clone()))?;
                }
                Ok(self.close(id))
            }
            LexemeKind::NewLine => {
                self.target = None;
                Ok(node)
            }
            LexemeKind::InlineAnnotationBegin | LexemeKind::MultiLineAnnotationBegin => {
                self.annotation = Some(Annotation {
                    rules: RuleBlockBuilder::default(),
                    value: None,
                    comment: None,
                });
                Ok(node)
            }
            _ => Ok(node),
        }
    }

    fn grow_annotation(&mut self, lexeme: &Lexeme) -> Result<(), SchemaError> {
        let Some(annotation) = self.annotation.as_mut() else {
            return Ok(());
        };
        match lexeme.kind {
            LexemeKind::InlineAnnotationTextEnd | LexemeKind::MultiLineAnnotationTextEnd => {
                let text = lexeme.text();
                let text = text.trim();
                if !text.is_empty() {
                    annotation.comment = Some(text.to_string());
                }
            }
            LexemeKind::InlineAnnotationTextBegin | LexemeKind::MultiLineAnnotationTextBegin => {}
            LexemeKind::InlineAnnotationEnd | LexemeKind::MultiLineAnnotationEnd => {
                if let Some(annotation) = self.annotation.take() {
                    self.apply_annotation(annotation, lexeme.location())?;
                }
            }
            _ => {
                if let Some(value) = annotation.rules.feed(lexeme)? {
                    annotation.value = Some(value);
                }
            }
        }
        Ok(())
    }

    fn apply_annotation(
        &mut self,
        annotation: Annotation,
        location: Location,
    ) -> Result<(), SchemaError> {
        let Some(target) = self.target else {
            panic!("annotation without a value to describe at {location}");
        };
        if !self.annotated.insert(target) {
            return Err(SchemaError::compile(
                CompileError::DuplicateAnnotation,
                location,
            ));
        }
        self.ctx.tree.node_mut(target).comment = annotation.comment;
        if let Some(rules) = &annotation.value {
            apply_rules(self.ctx, target, rules)?;
        }
        Ok(())
    }

    /// Creates a child of `parent` and attaches it under the pending key or
    /// as the next array item.
    fn open(
        &mut self,
        parent: Option<NodeId>,
        content: NodeContent,
        json_type: JsonType,
        location: Location,
    ) -> NodeId {
        let is_container = matches!(
            content,
            NodeContent::Object { .. } | NodeContent::Array { .. }
        );
        let mut node = Node::new(content, json_type, location);
        node.parent = parent;
        let id = self.ctx.tree.push(node);
        self.created.push(id);
        match parent {
            None => self.root = Some(id),
            Some(parent) => {
                let key = self.key.take();
                match &mut self.ctx.tree.node_mut(parent).content {
                    NodeContent::Object { properties } => {
                        let Some((key, location)) = key else {
                            panic!("object value without a key");
                        };
                        properties.insert(
                            key,
                            Property {
                                child: id,
                                location,
                            },
                        );
                    }
                    NodeContent::Array { items } => items.push(id),
                    _ => panic!("value nested in a non-container node"),
                }
            }
        }
        if is_container {
            self.target = Some(id);
        }
        id
    }

    fn close(&mut self, id: NodeId) -> Option<NodeId> {
        self.target = Some(id);
        self.ctx.tree.node(id).parent
    }
}

fn expect_node(node: Option<NodeId>, lexeme: &Lexeme) -> NodeId {
    match node {
        Some(id) => id,
        None => panic!("{lexeme:?} outside of any value"),
    }
}

// =============================================================================
// Rules
// =============================================================================

fn apply_rules(ctx: &mut BuildContext, id: NodeId, rules: &RuleValue) -> Result<(), SchemaError> {
    let Some(entries) = rules.as_object() else {
        return Err(SchemaError::compile(
            CompileError::InvalidRuleValue {
                rule: "annotation".to_string(),
                expected: "a rule object",
            },
            rules.location.clone(),
        ));
    };
    for (name, value) in entries {
        let constraint = rule_constraint(ctx, name, value)?;
        let types = match &constraint {
            Constraint::Or(alternatives) => Some(
                alternatives
                    .iter()
                    .map(|alt| alt.type_name.clone())
                    .collect::<Vec<_>>(),
            ),
            _ => None,
        };
        let constraints = &mut ctx.tree.node_mut(id).constraints;
        constraints
            .insert(constraint, RuleSource::Manual)
            .map_err(|e| SchemaError::compile(e, value.location.clone()))?;
        if let Some(types) = types {
            constraints
                .insert(Constraint::TypesList(types), RuleSource::Generated)
                .map_err(|e| SchemaError::compile(e, value.location.clone()))?;
        }
    }
    Ok(())
}

fn rule_constraint(
    ctx: &mut BuildContext,
    name: &str,
    value: &RuleValue,
) -> Result<Constraint, SchemaError> {
    let error = |e: CompileError| SchemaError::compile(e, value.location.clone());
    let invalid = |expected: &'static str| {
        error(CompileError::InvalidRuleValue {
            rule: name.to_string(),
            expected,
        })
    };
    Ok(match name {
        "type" => Constraint::Type(type_value(value)?),
        "optional" => Constraint::Optional(value.as_bool().ok_or_else(|| invalid("a boolean"))?),
        "nullable" => Constraint::Nullable(value.as_bool().ok_or_else(|| invalid("a boolean"))?),
        "exclusiveMinimum" => {
            Constraint::ExclusiveMinimum(value.as_bool().ok_or_else(|| invalid("a boolean"))?)
        }
        "exclusiveMaximum" => {
            Constraint::ExclusiveMaximum(value.as_bool().ok_or_else(|| invalid("a boolean"))?)
        }
        "const" => Constraint::Const {
            enabled: value.as_bool().ok_or_else(|| invalid("a boolean"))?,
            expected: None,
        },
        "minLength" | "maxLength" | "minItems" | "maxItems" => {
            let n = count(value).ok_or_else(|| invalid("a non-negative integer"))?;
            match name {
                "minLength" => Constraint::MinLength(n),
                "maxLength" => Constraint::MaxLength(n),
                "minItems" => Constraint::MinItems(n),
                _ => Constraint::MaxItems(n),
            }
        }
        "precision" => Constraint::Precision(
            count(value)
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid("a positive integer"))?,
        ),
        "min" | "max" => {
            let number = value
                .as_literal()
                .and_then(Literal::as_number)
                .ok_or_else(|| invalid("a number"))?;
            let bound = Bound {
                value: number.clone(),
                exclusive: false,
            };
            if name == "min" {
                Constraint::Min(bound)
            } else {
                Constraint::Max(bound)
            }
        }
        "regex" => {
            let pattern = value.as_str().ok_or_else(|| invalid("a string"))?;
            let regex = Regex::new(pattern)
                .map_err(|e| error(CompileError::InvalidRegex(e.to_string())))?;
            Constraint::Regex(RegexRule {
                pattern: pattern.to_string(),
                regex,
            })
        }
        "enum" => Constraint::Enum(enum_values(ctx, value)?),
        "additionalProperties" => Constraint::AdditionalProperties(additional_properties(value)?),
        "allOf" => {
            let names = match &value.kind {
                RuleValueKind::Array(items) => items
                    .iter()
                    .map(reference_value)
                    .collect::<Result<Vec<_>, _>>()?,
                _ => vec![reference_value(value)?],
            };
            Constraint::AllOf(names)
        }
        "or" => Constraint::Or(or_alternatives(ctx, value)?),
        other => return Err(error(CompileError::UnknownRule(other.to_string()))),
    })
}

fn count(value: &RuleValue) -> Option<u64> {
    let literal = value.as_literal()?;
    if literal.json_type != JsonType::Integer {
        return None;
    }
    literal.as_number()?.to_u64()
}

fn parse_type_name(name: &str, location: &Location) -> Result<TypeName, SchemaError> {
    TypeName::new(name).ok_or_else(|| {
        SchemaError::compile(
            CompileError::InvalidTypeName(name.to_string()),
            location.clone(),
        )
    })
}

/// `"string"`, `"@cat"` or `@cat`.
fn type_value(value: &RuleValue) -> Result<SchemaType, SchemaError> {
    match &value.kind {
        RuleValueKind::Shortcut(names) if names.len() == 1 => Ok(SchemaType::Reference(
            parse_type_name(&names[0], &value.location)?,
        )),
        RuleValueKind::Literal(_) if value.as_str().is_some() => {
            let name = value.as_str().unwrap_or_default();
            if name.starts_with('@') {
                return Ok(SchemaType::Reference(parse_type_name(name, &value.location)?));
            }
            SchemaType::parse(name).ok_or_else(|| {
                SchemaError::compile(
                    CompileError::UnknownType(name.to_string()),
                    value.location.clone(),
                )
            })
        }
        _ => Err(SchemaError::compile(
            CompileError::InvalidRuleValue {
                rule: "type".to_string(),
                expected: "a type name",
            },
            value.location.clone(),
        )),
    }
}

/// `"@cat"` or `@cat`.
fn reference_value(value: &RuleValue) -> Result<TypeName, SchemaError> {
    match type_value(value)? {
        SchemaType::Reference(name) => Ok(name),
        other => Err(SchemaError::compile(
            CompileError::InvalidRuleValue {
                rule: other.name().to_string(),
                expected: "a type reference",
            },
            value.location.clone(),
        )),
    }
}

fn enum_values(ctx: &BuildContext, value: &RuleValue) -> Result<EnumValues, SchemaError> {
    match &value.kind {
        RuleValueKind::Array(items) => {
            let values = items
                .iter()
                .map(|item| {
                    item.as_literal().cloned().ok_or_else(|| {
                        SchemaError::compile(
                            CompileError::InvalidRuleValue {
                                rule: "enum".to_string(),
                                expected: "an array of literals",
                            },
                            item.location.clone(),
                        )
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(EnumValues { values, rule: None })
        }
        RuleValueKind::Shortcut(names) if names.len() == 1 && is_rule_name(&names[0]) => {
            let name = &names[0];
            let values = ctx.rules.get(name).ok_or_else(|| {
                SchemaError::compile(
                    CompileError::UndefinedRule(name.clone()),
                    value.location.clone(),
                )
            })?;
            Ok(EnumValues {
                values: values.clone(),
                rule: Some(name.clone()),
            })
        }
        _ => Err(SchemaError::compile(
            CompileError::InvalidRuleValue {
                rule: "enum".to_string(),
                expected: "an array of literals or a named rule",
            },
            value.location.clone(),
        )),
    }
}

fn additional_properties(value: &RuleValue) -> Result<AdditionalProperties, SchemaError> {
    if let Some(allowed) = value.as_bool() {
        return Ok(if allowed {
            AdditionalProperties::AllowAny
        } else {
            AdditionalProperties::Forbidden
        });
    }
    if let Some(names) = value.as_shortcut()
        && names.len() > 1
    {
        return Ok(AdditionalProperties::AnyOf(
            names
                .iter()
                .map(|name| parse_type_name(name, &value.location))
                .collect::<Result<_, _>>()?,
        ));
    }
    Ok(match type_value(value)? {
        SchemaType::Reference(name) => AdditionalProperties::Named(name),
        SchemaType::Any => AdditionalProperties::AllowAny,
        other => AdditionalProperties::Primitive(other),
    })
}

fn or_alternatives(
    ctx: &mut BuildContext,
    value: &RuleValue,
) -> Result<Vec<OrAlternative>, SchemaError> {
    let items: Vec<&RuleValue> = match &value.kind {
        RuleValueKind::Array(items) => items.iter().collect(),
        RuleValueKind::Shortcut(names) => {
            return names
                .iter()
                .map(|name| {
                    Ok(OrAlternative {
                        type_name: parse_type_name(name, &value.location)?,
                        rules: None,
                    })
                })
                .collect();
        }
        _ => {
            return Err(SchemaError::compile(
                CompileError::InvalidRuleValue {
                    rule: "or".to_string(),
                    expected: "an array of alternatives",
                },
                value.location.clone(),
            ));
        }
    };
    if items.is_empty() {
        return Err(SchemaError::compile(
            CompileError::InvalidRuleValue {
                rule: "or".to_string(),
                expected: "at least one alternative",
            },
            value.location.clone(),
        ));
    }
    items
        .into_iter()
        .map(|item| or_alternative(ctx, item))
        .collect()
}

fn or_alternative(ctx: &mut BuildContext, item: &RuleValue) -> Result<OrAlternative, SchemaError> {
    let invalid = |reason: &str| {
        SchemaError::compile(
            CompileError::InvalidAlternative(reason.to_string()),
            item.location.clone(),
        )
    };
    let rules = match &item.kind {
        RuleValueKind::Shortcut(_) | RuleValueKind::Literal(_) => {
            match type_value(item)? {
                SchemaType::Reference(type_name) => {
                    return Ok(OrAlternative {
                        type_name,
                        rules: None,
                    });
                }
                _ => {
                    let mut rules = IndexMap::new();
                    rules.insert("type".to_string(), item.clone());
                    rules
                }
            }
        }
        RuleValueKind::Object(rules) => rules.clone(),
        RuleValueKind::Array(_) => return Err(invalid("an array is not an alternative")),
    };
    let Some(declared) = rules.get("type") else {
        return Err(invalid("a rule object needs a \"type\""));
    };
    let schema_type = type_value(declared)?;
    match &schema_type {
        SchemaType::Reference(type_name) if rules.len() == 1 => {
            return Ok(OrAlternative {
                type_name: type_name.clone(),
                rules: Some(item.clone()),
            });
        }
        SchemaType::Reference(_) => {
            return Err(invalid("a type reference cannot carry other rules"));
        }
        SchemaType::Object | SchemaType::Array | SchemaType::Mixed => {
            return Err(invalid(&format!(
                "type {schema_type} must be declared as a named type"
            )));
        }
        _ => {}
    }

    let json_type = schema_type.json_type().unwrap_or(JsonType::Mixed);
    let type_name = ctx.next_anonymous();
    let node = Node::new(
        NodeContent::Literal { example: None },
        json_type,
        item.location.clone(),
    );
    let root = ctx.tree.push(node);
    let rule_object = RuleValue {
        kind: RuleValueKind::Object(rules),
        location: item.location.clone(),
    };
    apply_rules(ctx, root, &rule_object)?;
    finalize(&mut ctx.tree, root)?;
    ctx.types.insert(
        type_name.clone(),
        TypeEntry {
            root,
            file: item.location.file.clone(),
            offset: item.location.index,
        },
    );
    Ok(OrAlternative {
        type_name,
        rules: Some(item.clone()),
    })
}

// =============================================================================
// Finalization
// =============================================================================

/// Checks a node's rules against each other and against its example, and
/// settles its JSON and schema types.
pub(crate) fn finalize(tree: &mut SchemaTree, id: NodeId) -> Result<(), SchemaError> {
    let parent_is_object = tree
        .node(id)
        .parent
        .is_some_and(|p| matches!(tree.node(p).content, NodeContent::Object { .. }));
    let node = tree.node_mut(id);
    let location = node.location.clone();
    let fail = |e: CompileError| SchemaError::compile(e, location.clone());
    let declared = node.constraints.declared_type().cloned();
    let has_or = node.constraints.contains(ConstraintKind::Or);

    let check_examples = match &node.content {
        NodeContent::Mixed { type_name } => {
            match &declared {
                None | Some(SchemaType::Mixed) => {}
                Some(SchemaType::Reference(name)) if name == type_name => {}
                Some(other) => {
                    return Err(fail(CompileError::TypeNotAllowed {
                        declared: other.to_string(),
                    }));
                }
            }
            node.json_type = JsonType::Mixed;
            node.schema_type = SchemaType::Reference(type_name.clone());
            false
        }
        NodeContent::MixedValue { .. } => {
            if let Some(other) = declared.as_ref().filter(|t| **t != SchemaType::Mixed) {
                return Err(fail(CompileError::TypeNotAllowed {
                    declared: other.to_string(),
                }));
            }
            node.json_type = JsonType::Mixed;
            node.schema_type = SchemaType::Mixed;
            false
        }
        NodeContent::Object { .. } | NodeContent::Array { .. } => {
            let own = SchemaType::from_json_type(node.json_type);
            match &declared {
                None => {}
                Some(SchemaType::Any) => node.schema_type = SchemaType::Any,
                Some(t) if *t == own => {}
                Some(other) => {
                    return Err(fail(CompileError::TypeNotAllowed {
                        declared: other.to_string(),
                    }));
                }
            }
            if has_or {
                return Err(fail(CompileError::IncompatibleRule {
                    rule: "or".to_string(),
                    json_type: node.json_type,
                }));
            }
            false
        }
        NodeContent::Literal { example } => {
            if has_or {
                if let Some(other) = declared.as_ref().filter(|t| **t != SchemaType::Mixed) {
                    return Err(fail(CompileError::ConflictingRules {
                        first: format!("type: {other}"),
                        second: "or".to_string(),
                    }));
                }
                node.json_type = JsonType::Mixed;
                node.schema_type = SchemaType::Mixed;
                false
            } else {
                match &declared {
                    Some(SchemaType::Mixed) => {
                        return Err(fail(CompileError::MissingRule {
                            rule: "type: mixed".to_string(),
                            requires: "or".to_string(),
                        }));
                    }
                    Some(SchemaType::Reference(name)) => {
                        node.json_type = JsonType::Mixed;
                        node.schema_type = SchemaType::Reference(name.clone());
                        false
                    }
                    Some(SchemaType::Any) => {
                        node.schema_type = SchemaType::Any;
                        false
                    }
                    _ => {
                        if declared == Some(SchemaType::Enum)
                            && !node.constraints.contains(ConstraintKind::Enum)
                        {
                            return Err(fail(CompileError::MissingRule {
                                rule: "type: enum".to_string(),
                                requires: "enum".to_string(),
                            }));
                        }
                        if let (Some(example), Some(declared)) = (example, &declared) {
                            let accepted = if example.is_null() {
                                *declared == SchemaType::Null || node.constraints.is_nullable()
                            } else {
                                declared.accepts(example.json_type)
                            };
                            if !accepted {
                                return Err(fail(CompileError::ExampleTypeMismatch {
                                    declared: declared.to_string(),
                                }));
                            }
                        }
                        if let Some(json_type) = declared.as_ref().and_then(SchemaType::json_type)
                        {
                            node.json_type = json_type;
                        }
                        if let Some(format) = declared.as_ref().and_then(Constraint::format_of)
                            && !node.constraints.contains(format.kind())
                        {
                            node.constraints
                                .insert(format, RuleSource::Generated)
                                .map_err(&fail)?;
                        }
                        node.schema_type = match &declared {
                            Some(t) => t.clone(),
                            None if node.constraints.contains(ConstraintKind::Enum) => {
                                SchemaType::Enum
                            }
                            None => SchemaType::from_json_type(node.json_type),
                        };
                        true
                    }
                }
            }
        }
    };

    if node.constraints.contains(ConstraintKind::Precision)
        && node.schema_type != SchemaType::Decimal
    {
        return Err(fail(CompileError::PrecisionRequiresDecimal));
    }
    if node.constraints.contains(ConstraintKind::Optional) && !parent_is_object {
        return Err(fail(CompileError::OptionalOutsideObject));
    }
    settle_exclusive(node, ConstraintKind::ExclusiveMinimum, ConstraintKind::Min).map_err(&fail)?;
    settle_exclusive(node, ConstraintKind::ExclusiveMaximum, ConstraintKind::Max).map_err(&fail)?;
    check_ranges(node).map_err(&fail)?;

    if let NodeContent::Array { items } = &node.content
        && items.is_empty()
        && let Some(min) = node.constraints.min_items().filter(|n| *n > 0)
    {
        return Err(fail(CompileError::ExampleViolatesRule {
            rule: "minItems".to_string(),
            failure: Box::new(crate::error::ValidationFailure::TooFewItems { min }),
        }));
    }

    let example = node.example().cloned();
    if let Some(Constraint::Const { enabled: true, expected }) =
        node.constraints.get_mut(ConstraintKind::Const)
    {
        *expected = example.clone();
    }
    if check_examples
        && let Some(example) = example
        && !(example.is_null() && node.constraints.is_nullable())
    {
        for (constraint, _) in node.constraints.iter() {
            if constraint.kind() == ConstraintKind::Type {
                continue;
            }
            constraint.validate_literal(&example).map_err(|failure| {
                fail(CompileError::ExampleViolatesRule {
                    rule: constraint.name().to_string(),
                    failure: Box::new(failure),
                })
            })?;
        }
    }
    Ok(())
}

/// Moves an `exclusiveMinimum`/`exclusiveMaximum` flag onto its bound.
fn settle_exclusive(
    node: &mut Node,
    flag: ConstraintKind,
    bound: ConstraintKind,
) -> Result<(), CompileError> {
    let Some(Constraint::ExclusiveMinimum(exclusive) | Constraint::ExclusiveMaximum(exclusive)) =
        node.constraints.get(flag).cloned()
    else {
        return Ok(());
    };
    match node.constraints.get_mut(bound) {
        Some(Constraint::Min(b) | Constraint::Max(b)) => {
            b.exclusive = exclusive;
            Ok(())
        }
        _ => Err(CompileError::MissingRule {
            rule: flag.name().to_string(),
            requires: bound.name().to_string(),
        }),
    }
}

fn check_ranges(node: &Node) -> Result<(), CompileError> {
    let conflict = |first: ConstraintKind, second: ConstraintKind| CompileError::ConflictingRules {
        first: first.name().to_string(),
        second: second.name().to_string(),
    };
    if let (Some(Constraint::Min(min)), Some(Constraint::Max(max))) = (
        node.constraints.get(ConstraintKind::Min),
        node.constraints.get(ConstraintKind::Max),
    ) && (min.value > max.value
        || (min.value == max.value && (min.exclusive || max.exclusive)))
    {
        return Err(conflict(ConstraintKind::Min, ConstraintKind::Max));
    }
    if let (Some(Constraint::MinLength(min)), Some(Constraint::MaxLength(max))) = (
        node.constraints.get(ConstraintKind::MinLength),
        node.constraints.get(ConstraintKind::MaxLength),
    ) && min > max
    {
        return Err(conflict(ConstraintKind::MinLength, ConstraintKind::MaxLength));
    }
    if let (Some(min), Some(max)) = (node.constraints.min_items(), node.constraints.max_items())
        && min > max
    {
        return Err(conflict(ConstraintKind::MinItems, ConstraintKind::MaxItems));
    }
    Ok(())
}

// =============================================================================
// Named rules
// =============================================================================

fn read_named_rule(name: &str, file: Arc<SourceFile>) -> Result<Vec<Literal>, SchemaError> {
    let invalid = |location: Location| {
        SchemaError::compile(CompileError::InvalidNamedRule(name.to_string()), location)
    };
    let mut values = Vec::new();
    let mut depth = 0usize;
    let mut in_annotation = false;
    let mut scanner = Scanner::new(file, ScanMode::Schema);
    while let Some(lexeme) = scanner.next_lexeme()? {
        let location = lexeme.location();
        match lexeme.kind {
            LexemeKind::InlineAnnotationBegin | LexemeKind::MultiLineAnnotationBegin => {
                in_annotation = true;
            }
            LexemeKind::InlineAnnotationEnd | LexemeKind::MultiLineAnnotationEnd => {
                in_annotation = false;
            }
            _ if in_annotation => {}
            LexemeKind::ArrayBegin if depth == 0 => depth = 1,
            LexemeKind::ArrayEnd => depth = 0,
            LexemeKind::LiteralBegin | LexemeKind::ArrayItemBegin | LexemeKind::ArrayItemEnd
                if depth == 1 => {}
            LexemeKind::LiteralEnd if depth == 1 => {
                let literal = Literal::parse(lexeme.value()).map_err(|e| {
                    SchemaError::compile(CompileError::InvalidLiteral(e.to_string()), location)
                })?;
                values.push(literal);
            }
            LexemeKind::NewLine | LexemeKind::EndTop => {}
            _ => return Err(invalid(location)),
        }
    }
    Ok(values)
}
