//! Array validation. Every listed item is an alternative for every document item.

use jsight_lexer::{Lexeme, LexemeKind, Location};

use super::candidate::{Candidate, candidates};
use super::{Ctx, Phase, Step, mismatch, null_or_mismatch};
use crate::error::{SchemaError, ValidationFailure};
use crate::node::NodeId;
use crate::value::JsonType;

pub(super) struct ArrayValidator {
    node: NodeId,
    phase: Phase,
    start: Option<Location>,
    count: u64,
    items: Option<Vec<Candidate>>,
}

impl ArrayValidator {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            phase: Phase::Waiting,
            start: None,
            count: 0,
            items: None,
        }
    }

    pub fn feed(&mut self, ctx: Ctx<'_>, lexeme: &Lexeme) -> Step {
        match self.phase {
            Phase::Waiting => match lexeme.kind {
                LexemeKind::ArrayBegin => {
                    self.phase = Phase::Open;
                    self.start = Some(lexeme.location());
                    Step::Pending
                }
                LexemeKind::ObjectBegin => mismatch("array".to_string(), JsonType::Object, lexeme),
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
                LexemeKind::ArrayItemBegin => self.item(ctx, lexeme),
                LexemeKind::ArrayEnd => self.finish(ctx, lexeme),
                _ => Step::Pending,
            },
        }
    }

    fn item(&mut self, ctx: Ctx<'_>, lexeme: &Lexeme) -> Step {
        let node = ctx.tree.node(self.node);
        let items = node.items().unwrap_or_default();
        if items.is_empty() {
            return Step::Failed(SchemaError::validation(
                ValidationFailure::ArrayNotEmpty,
                lexeme.location(),
            ));
        }
        self.count += 1;
        let item_candidates = self.items.get_or_insert_with(|| {
            let mut all: Vec<Candidate> = Vec::new();
            for item in items {
                for candidate in candidates(ctx.tree, ctx.types, *item) {
                    if !all.contains(&candidate) {
                        all.push(candidate);
                    }
                }
            }
            all
        });
        Step::Child(item_candidates.clone())
    }

    fn finish(&self, ctx: Ctx<'_>, lexeme: &Lexeme) -> Step {
        let constraints = &ctx.tree.node(self.node).constraints;
        let failure = match (constraints.min_items(), constraints.max_items()) {
            (Some(min), _) if self.count < min => Some(ValidationFailure::TooFewItems { min }),
            (_, Some(max)) if self.count > max => Some(ValidationFailure::TooManyItems { max }),
            _ => None,
        };
        match failure {
            None => Step::Complete,
            Some(failure) => Step::Failed(SchemaError::validation(
                failure,
                self.start.clone().unwrap_or_else(|| lexeme.location()),
            )),
        }
    }
}
