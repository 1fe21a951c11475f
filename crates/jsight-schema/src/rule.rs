//! Rule blocks: the `{ ... }` object at the start of an annotation.
//!
//! A rule block is read into a small [`RuleValue`] tree first. The builder
//! then turns each top-level entry into a constraint.

use indexmap::IndexMap;
use jsight_lexer::{Lexeme, LexemeKind, Location};

use crate::ast::RuleAst;
use crate::constraint::RuleSource;
use crate::error::{CompileError, SchemaError};
use crate::value::{Literal, LiteralValue};

#[derive(Debug, Clone)]
pub enum RuleValueKind {
    Literal(Literal),
    Object(IndexMap<String, RuleValue>),
    Array(Vec<RuleValue>),
    /// `@name`, `@@name`, or `@a | @b`.
    Shortcut(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct RuleValue {
    pub kind: RuleValueKind,
    pub location: Location,
}

impl RuleValue {
    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            RuleValueKind::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_literal().and_then(Literal::as_str)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_literal().and_then(Literal::as_bool)
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, RuleValue>> {
        match &self.kind {
            RuleValueKind::Object(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_shortcut(&self) -> Option<&[String]> {
        match &self.kind {
            RuleValueKind::Shortcut(names) => Some(names),
            _ => None,
        }
    }

    pub fn to_rule_ast(&self, source: RuleSource) -> RuleAst {
        match &self.kind {
            RuleValueKind::Literal(literal) => RuleAst::literal(literal, source),
            RuleValueKind::Object(entries) => RuleAst::object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_rule_ast(source)))
                    .collect(),
                source,
            ),
            RuleValueKind::Array(items) => {
                RuleAst::array(items.iter().map(|i| i.to_rule_ast(source)).collect(), source)
            }
            RuleValueKind::Shortcut(names) => RuleAst::reference(names.join(" | "), source),
        }
    }
}

// =============================================================================
// RuleBlockBuilder
// =============================================================================

enum Frame {
    Object {
        entries: IndexMap<String, RuleValue>,
        key: Option<(String, Location)>,
        location: Location,
    },
    Array {
        items: Vec<RuleValue>,
        location: Location,
    },
    Shortcut {
        names: Vec<String>,
        location: Location,
    },
}

/// Collects the lexemes of one rule block into a [`RuleValue`].
#[derive(Default)]
pub(crate) struct RuleBlockBuilder {
    stack: Vec<Frame>,
}

impl RuleBlockBuilder {
    /// Feeds one lexeme, returning the block once its closing brace is seen.
    pub fn feed(&mut self, lexeme: &Lexeme) -> Result<Option<RuleValue>, SchemaError> {
        let location = lexeme.location();
        match lexeme.kind {
            LexemeKind::ObjectBegin => {
                self.stack.push(Frame::Object {
                    entries: IndexMap::new(),
                    key: None,
                    location,
                });
                Ok(None)
            }
            LexemeKind::ArrayBegin => {
                self.stack.push(Frame::Array {
                    items: Vec::new(),
                    location,
                });
                Ok(None)
            }
            LexemeKind::MixedValueBegin => {
                self.stack.push(Frame::Shortcut {
                    names: Vec::new(),
                    location,
                });
                Ok(None)
            }
            LexemeKind::TypesShortcutEnd => {
                if let Some(Frame::Shortcut { names, .. }) = self.stack.last_mut() {
                    names.push(lexeme.text());
                }
                Ok(None)
            }
            LexemeKind::ObjectKeyEnd => {
                let raw = lexeme.value();
                let key = if raw.first() == Some(&b'"') {
                    match Literal::parse(raw) {
                        Ok(Literal {
                            value: LiteralValue::String(s),
                            ..
                        }) => s,
                        _ => lexeme.text(),
                    }
                } else {
                    lexeme.text()
                };
                if let Some(Frame::Object { key: pending, .. }) = self.stack.last_mut() {
                    *pending = Some((key, location));
                }
                Ok(None)
            }
            LexemeKind::LiteralEnd => {
                let literal = Literal::parse(lexeme.value()).map_err(|e| {
                    SchemaError::compile(CompileError::InvalidLiteral(e.to_string()), location.clone())
                })?;
                self.complete(RuleValue {
                    kind: RuleValueKind::Literal(literal),
                    location,
                })
            }
            LexemeKind::ObjectEnd | LexemeKind::ArrayEnd | LexemeKind::MixedValueEnd => {
                let value = match self.stack.pop() {
                    Some(Frame::Object {
                        entries, location, ..
                    }) => RuleValue {
                        kind: RuleValueKind::Object(entries),
                        location,
                    },
                    Some(Frame::Array { items, location }) => RuleValue {
                        kind: RuleValueKind::Array(items),
                        location,
                    },
                    Some(Frame::Shortcut { names, location }) => RuleValue {
                        kind: RuleValueKind::Shortcut(names),
                        location,
                    },
                    None => panic!("rule block closed without being opened: {lexeme:?}"),
                };
                self.complete(value)
            }
            _ => Ok(None),
        }
    }

    fn complete(&mut self, value: RuleValue) -> Result<Option<RuleValue>, SchemaError> {
        match self.stack.last_mut() {
            None => Ok(Some(value)),
            Some(Frame::Array { items, .. }) => {
                items.push(value);
                Ok(None)
            }
            Some(Frame::Object { entries, key, .. }) => {
                let Some((key, key_location)) = key.take() else {
                    panic!("rule value without a key at {}", value.location);
                };
                if entries.contains_key(&key) {
                    return Err(SchemaError::compile(
                        CompileError::DuplicateRule(key),
                        key_location,
                    ));
                }
                entries.insert(key, value);
                Ok(None)
            }
            Some(Frame::Shortcut { .. }) => {
                panic!("value nested in a shortcut at {}", value.location)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use jsight_lexer::{ScanMode, Scanner, SourceFile};

    use super::*;

    fn block(input: &str) -> Result<RuleValue, SchemaError> {
        let file = SourceFile::new("t", input);
        let mut builder = RuleBlockBuilder::default();
        let mut inside = false;
        for lexeme in Scanner::new(file, ScanMode::Schema) {
            let lexeme = lexeme.unwrap();
            if lexeme.kind == LexemeKind::InlineAnnotationBegin {
                inside = true;
                continue;
            }
            if inside && let Some(value) = builder.feed(&lexeme)? {
                return Ok(value);
            }
        }
        panic!("no rule block in {input}");
    }

    #[test]
    fn test_rule_block_values() {
        let value = block(r#"1 // {min: 0, "enum": [0, 1], or: [@a, {type: "string"}], x: @a | @b}"#)
            .unwrap();
        let entries = value.as_object().unwrap();
        assert_eq!(
            entries.keys().collect::<Vec<_>>(),
            vec!["min", "enum", "or", "x"]
        );
        assert!(matches!(&entries["enum"].kind, RuleValueKind::Array(items) if items.len() == 2));
        assert_eq!(
            entries["x"].as_shortcut().unwrap(),
            &["@a".to_string(), "@b".to_string()]
        );
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let error = block("1 // {min: 0, min: 1}").unwrap_err();
        assert_eq!(
            error.as_compile(),
            Some(&CompileError::DuplicateRule("min".into()))
        );
    }
}
