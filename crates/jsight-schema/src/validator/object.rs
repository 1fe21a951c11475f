//! Object validation: key resolution, required keys, additional properties.

use ahash::AHashSet;
use jsight_lexer::{Lexeme, LexemeKind, Location};

use super::candidate::{Candidate, candidates, policy_candidates, type_candidates};
use super::literal::{matches_any, parse};
use super::{Ctx, Phase, Step, mismatch, null_or_mismatch};
use crate::constraint::AdditionalProperties;
use crate::error::{SchemaError, ValidationFailure};
use crate::node::{NodeId, PropertyKey};
use crate::types::TypeName;
use crate::value::{JsonType, Literal};

pub(super) struct ObjectValidator {
    node: NodeId,
    phase: Phase,
    start: Option<Location>,
    seen: AHashSet<String>,
    /// Schema properties matched by at least one document key.
    matched: AHashSet<PropertyKey>,
    /// Candidates for the value of the key just read.
    pending: Option<Vec<Candidate>>,
}

impl ObjectValidator {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            phase: Phase::Waiting,
            start: None,
            seen: AHashSet::new(),
            matched: AHashSet::new(),
            pending: None,
        }
    }

    pub fn feed(&mut self, ctx: Ctx<'_>, lexeme: &Lexeme) -> Step {
        match self.phase {
            Phase::Waiting => match lexeme.kind {
                LexemeKind::ObjectBegin => {
                    self.phase = Phase::Open;
                    self.start = Some(lexeme.location());
                    Step::Pending
                }
                LexemeKind::ArrayBegin => mismatch("object".to_string(), JsonType::Array, lexeme),
                LexemeKind::LiteralBegin => {
                    self.phase = Phase::Literal;
                    Step::Pending
                }
                _ => Step::Pending,
            },
            Phase::Literal => match lexeme.kind {
                LexemeKind::LiteralEnd => null_or_mismatch(ctx.tree.node(self.node), lexeme),
                _ => Step::Pending,
            },
            Phase::Open => match lexeme.kind {
                LexemeKind::ObjectKeyEnd => self.key(ctx, lexeme),
                LexemeKind::ObjectValueBegin => Step::Child(self.pending.take().unwrap_or_default()),
                LexemeKind::ObjectEnd => self.finish(ctx, lexeme),
                _ => Step::Pending,
            },
        }
    }

    fn key(&mut self, ctx: Ctx<'_>, lexeme: &Lexeme) -> Step {
        let location = lexeme.location();
        let name = match parse(lexeme) {
            Ok(literal) => literal.as_str().map(str::to_string).unwrap_or_default(),
            Err(e) => return Step::Failed(e),
        };
        if !self.seen.insert(name.clone()) {
            return Step::Failed(SchemaError::validation(
                ValidationFailure::DuplicateKey(name),
                location,
            ));
        }
        let node = ctx.tree.node(self.node);
        let Some(properties) = node.properties() else {
            return Step::Pending;
        };

        let literal_key = PropertyKey::literal(name.as_str());
        if let Some(property) = properties.get(&literal_key) {
            self.matched.insert(literal_key);
            self.pending = Some(candidates(ctx.tree, ctx.types, property.child));
            return Step::Pending;
        }

        // A key shortcut stands for every key its type accepts.
        let key_literal = Literal::string(name.as_str());
        for (key, property) in properties.iter().filter(|(k, _)| k.is_shortcut) {
            let Some(type_name) = TypeName::new(key.name.as_str()) else {
                continue;
            };
            if matches_any(
                ctx,
                &type_candidates(ctx.tree, ctx.types, &type_name),
                &key_literal,
            ) {
                self.matched.insert(key.clone());
                self.pending = Some(candidates(ctx.tree, ctx.types, property.child));
                return Step::Pending;
            }
        }

        match node.constraints.additional_properties() {
            AdditionalProperties::Forbidden => Step::Failed(SchemaError::validation(
                ValidationFailure::UnknownKey(name),
                location,
            )),
            policy => {
                self.pending = Some(policy_candidates(ctx.tree, ctx.types, policy));
                Step::Pending
            }
        }
    }

    fn finish(&self, ctx: Ctx<'_>, lexeme: &Lexeme) -> Step {
        let node = ctx.tree.node(self.node);
        let missing: Vec<String> = node
            .properties()
            .into_iter()
            .flatten()
            .filter(|(key, property)| {
                !self.matched.contains(*key) && !ctx.tree.node(property.child).is_optional()
            })
            .map(|(key, _)| key.name.clone())
            .collect();
        if missing.is_empty() {
            Step::Complete
        } else {
            Step::Failed(SchemaError::validation(
                ValidationFailure::RequiredKeysNotFound(missing),
                self.start.clone().unwrap_or_else(|| lexeme.location()),
            ))
        }
    }
}
