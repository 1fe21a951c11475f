//! Incremental document validator.
//!
//! A document is fed one lexeme at a time into a tree of validators. Every
//! document value is matched in a [`Slot`] holding one validator per
//! candidate the schema allows there; a union yields several validators
//! running side by side on the same lexemes. Container validators open child
//! slots for their members.
//!
//! A slot succeeds as soon as one of its validators completes. Validators
//! whose value has the wrong shape are dropped without counting as live; when
//! no validator is left the slot reports the single live error, or "none of
//! the alternatives validated" when several alternatives were live.

mod array;
mod candidate;
mod literal;
mod object;

use std::sync::Arc;

use jsight_lexer::{Lexeme, LexemeKind, Location, ScanMode, Scanner, SourceFile};
use tracing::debug;

use crate::error::{SchemaError, ValidationFailure};
use crate::node::{Node, NodeContent, NodeId, SchemaTree, TypeTable};
use crate::types::SchemaType;
use crate::value::JsonType;

use self::array::ArrayValidator;
use self::literal::{LiteralValidator, matches_any, parse};
use self::object::ObjectValidator;

pub(crate) use self::candidate::{Candidate, candidates, type_candidates};

/// Read-only schema data every validator consults.
#[derive(Clone, Copy)]
pub(crate) struct Ctx<'s> {
    pub tree: &'s SchemaTree,
    pub types: &'s TypeTable,
}

/// Result of feeding one lexeme to one validator.
pub(super) enum Step {
    Pending,
    /// Open a slot with these candidates for the next value.
    Child(Vec<Candidate>),
    Complete,
    Failed(SchemaError),
    /// The value has a shape this validator can never accept.
    Mismatch(SchemaError),
}

/// Where a container validator is in its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Phase {
    Waiting,
    /// A literal arrived where a container was expected; only `null` may pass.
    Literal,
    Open,
}

pub(super) fn mismatch(expected: String, found: JsonType, lexeme: &Lexeme) -> Step {
    Step::Mismatch(SchemaError::validation(
        ValidationFailure::TypeMismatch { expected, found },
        lexeme.location(),
    ))
}

/// Finishes a literal fed to a container validator.
pub(super) fn null_or_mismatch(node: &Node, lexeme: &Lexeme) -> Step {
    match parse(lexeme) {
        Ok(literal) if literal.is_null() && node.is_nullable() => Step::Complete,
        Ok(literal) => mismatch(node.schema_type.to_string(), literal.json_type, lexeme),
        Err(e) => Step::Failed(e),
    }
}

enum Validator {
    Literal(LiteralValidator),
    Object(ObjectValidator),
    Array(ArrayValidator),
    /// Accepts any value of the given shape, or any value at all.
    Any {
        shape: Option<JsonType>,
        depth: usize,
    },
}

impl Validator {
    fn new(ctx: Ctx<'_>, candidate: Candidate) -> Self {
        match candidate {
            Candidate::Any => Validator::Any {
                shape: None,
                depth: 0,
            },
            Candidate::Primitive(t) => match t.json_type() {
                Some(shape @ (JsonType::Object | JsonType::Array)) => Validator::Any {
                    shape: Some(shape),
                    depth: 0,
                },
                _ => Validator::Literal(LiteralValidator::Primitive(t)),
            },
            Candidate::Node(id) => match &ctx.tree.node(id).content {
                NodeContent::Object { .. } => Validator::Object(ObjectValidator::new(id)),
                NodeContent::Array { .. } => Validator::Array(ArrayValidator::new(id)),
                NodeContent::Literal { .. } => Validator::Literal(LiteralValidator::Node(id)),
                NodeContent::Mixed { .. } | NodeContent::MixedValue { .. } => Validator::Any {
                    shape: None,
                    depth: 0,
                },
            },
        }
    }

    fn feed(&mut self, ctx: Ctx<'_>, lexeme: &Lexeme) -> Step {
        match self {
            Validator::Literal(v) => v.feed(ctx, lexeme),
            Validator::Object(v) => v.feed(ctx, lexeme),
            Validator::Array(v) => v.feed(ctx, lexeme),
            Validator::Any { shape, depth } => {
                match lexeme.kind {
                    LexemeKind::ObjectBegin | LexemeKind::ArrayBegin => {
                        let found = if lexeme.kind == LexemeKind::ObjectBegin {
                            JsonType::Object
                        } else {
                            JsonType::Array
                        };
                        if *depth == 0
                            && let Some(expected) = shape
                            && *expected != found
                        {
                            return mismatch(expected.to_string(), found, lexeme);
                        }
                        *depth += 1;
                        Step::Pending
                    }
                    LexemeKind::ObjectEnd | LexemeKind::ArrayEnd => {
                        *depth = depth.saturating_sub(1);
                        if *depth == 0 {
                            Step::Complete
                        } else {
                            Step::Pending
                        }
                    }
                    LexemeKind::LiteralEnd if *depth == 0 => match shape {
                        None => Step::Complete,
                        Some(expected) => match parse(lexeme) {
                            Ok(literal) => mismatch(expected.to_string(), literal.json_type, lexeme),
                            Err(e) => Step::Failed(e),
                        },
                    },
                    _ => Step::Pending,
                }
            }
        }
    }
}

// =============================================================================
// Slots
// =============================================================================

struct Alternative {
    validator: Validator,
    child: Option<usize>,
}

struct Slot {
    alternatives: Vec<Alternative>,
    candidates: usize,
    /// Errors of alternatives that matched the value's shape.
    errors: Vec<SchemaError>,
    mismatches: Vec<SchemaError>,
    location: Option<Location>,
}

enum SlotOutcome {
    Pending,
    Complete,
    Failed(SchemaError),
}

/// A slot being fed one lexeme, with the alternatives not visited yet.
struct Frame {
    slot: usize,
    /// The alternative whose child this slot is; `None` for the root slot.
    owner: Option<Alternative>,
    remaining: std::vec::IntoIter<Alternative>,
    kept: Vec<Alternative>,
    complete: bool,
}

/// Validates one document against a compiled schema.
pub(crate) struct DocumentValidator<'s> {
    ctx: Ctx<'s>,
    slots: Vec<Slot>,
    /// Released slots ready for reuse.
    free: Vec<usize>,
    root: usize,
    done: bool,
}

impl<'s> DocumentValidator<'s> {
    pub fn new(tree: &'s SchemaTree, types: &'s TypeTable, root: NodeId) -> Self {
        let ctx = Ctx { tree, types };
        let mut validator = Self {
            ctx,
            slots: Vec::new(),
            free: Vec::new(),
            root: 0,
            done: false,
        };
        validator.root = validator.open(candidates(tree, types, root));
        validator
    }

    /// Feeds one document lexeme. `NewLine` and `EndTop` are ignored.
    pub fn feed(&mut self, lexeme: &Lexeme) -> Result<(), SchemaError> {
        if self.done || matches!(lexeme.kind, LexemeKind::NewLine | LexemeKind::EndTop) {
            return Ok(());
        }
        match self.feed_tree(lexeme) {
            SlotOutcome::Pending => Ok(()),
            SlotOutcome::Complete => {
                self.done = true;
                Ok(())
            }
            SlotOutcome::Failed(e) => Err(e),
        }
    }

    /// Whether the top-level value has been accepted.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Slots currently holding a value under validation.
    #[cfg(test)]
    fn live_slots(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    fn open(&mut self, candidates: Vec<Candidate>) -> usize {
        let ctx = self.ctx;
        let count = candidates.len();
        let slot = Slot {
            alternatives: candidates
                .into_iter()
                .map(|candidate| Alternative {
                    validator: Validator::new(ctx, candidate),
                    child: None,
                })
                .collect(),
            candidates: count,
            errors: Vec::new(),
            mismatches: Vec::new(),
            location: None,
        };
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = slot;
                index
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        }
    }

    /// Frees `slot` and every slot opened below it.
    fn release(&mut self, slot: usize) {
        let mut pending = vec![slot];
        while let Some(slot) = pending.pop() {
            let released = &mut self.slots[slot];
            pending.extend(released.alternatives.drain(..).filter_map(|a| a.child));
            released.errors.clear();
            released.mismatches.clear();
            released.location = None;
            self.free.push(slot);
        }
    }

    fn enter(&mut self, slot: usize, owner: Option<Alternative>, lexeme: &Lexeme) -> Frame {
        let entered = &mut self.slots[slot];
        if entered.location.is_none() {
            entered.location = Some(lexeme.location());
        }
        let alternatives = std::mem::take(&mut entered.alternatives);
        Frame {
            slot,
            owner,
            kept: Vec::with_capacity(alternatives.len()),
            remaining: alternatives.into_iter(),
            complete: false,
        }
    }

    /// Feeds `lexeme` to every live validator, walking the slot tree
    /// depth-first with an explicit stack of frames.
    fn feed_tree(&mut self, lexeme: &Lexeme) -> SlotOutcome {
        let ctx = self.ctx;
        let mut frames = vec![self.enter(self.root, None, lexeme)];
        while let Some(frame) = frames.last_mut() {
            if !frame.complete
                && let Some(mut alternative) = frame.remaining.next()
            {
                if let Some(child) = alternative.child {
                    let below = self.enter(child, Some(alternative), lexeme);
                    frames.push(below);
                    continue;
                }
                let step = match alternative.validator.feed(ctx, lexeme) {
                    Step::Child(candidates) => {
                        alternative.child = Some(self.open(candidates));
                        Step::Pending
                    }
                    other => other,
                };
                self.settle(frame, alternative, step);
                continue;
            }

            let Some(mut finished) = frames.pop() else {
                break;
            };
            let slot = finished.slot;
            let owner = finished.owner.take();
            let outcome = self.finish(finished, lexeme);
            let (Some(mut alternative), Some(parent)) = (owner, frames.last_mut()) else {
                return outcome;
            };
            let step = match outcome {
                SlotOutcome::Pending => Step::Pending,
                SlotOutcome::Complete => {
                    alternative.child = None;
                    self.release(slot);
                    Step::Pending
                }
                SlotOutcome::Failed(e) => {
                    alternative.child = None;
                    self.release(slot);
                    Step::Failed(e)
                }
            };
            self.settle(parent, alternative, step);
        }
        SlotOutcome::Pending
    }

    fn settle(&mut self, frame: &mut Frame, alternative: Alternative, step: Step) {
        match step {
            Step::Pending | Step::Child(_) => frame.kept.push(alternative),
            Step::Complete => frame.complete = true,
            Step::Failed(e) => self.slots[frame.slot].errors.push(e),
            Step::Mismatch(e) => self.slots[frame.slot].mismatches.push(e),
        }
    }

    fn finish(&mut self, frame: Frame, lexeme: &Lexeme) -> SlotOutcome {
        let Frame {
            slot,
            remaining,
            mut kept,
            complete,
            ..
        } = frame;
        if complete {
            // Unvisited alternatives stay so `release` frees their children.
            kept.extend(remaining);
            self.slots[slot].alternatives = kept;
            return SlotOutcome::Complete;
        }
        if !kept.is_empty() {
            self.slots[slot].alternatives = kept;
            return SlotOutcome::Pending;
        }
        SlotOutcome::Failed(self.slot_error(slot, lexeme))
    }

    fn slot_error(&mut self, slot: usize, lexeme: &Lexeme) -> SchemaError {
        let slot = &mut self.slots[slot];
        if slot.errors.len() == 1 {
            return slot.errors.remove(0);
        }
        if slot.errors.is_empty() && slot.candidates == 1 && slot.mismatches.len() == 1 {
            return slot.mismatches.remove(0);
        }
        SchemaError::validation(
            ValidationFailure::NoAlternativeMatched,
            slot.location.clone().unwrap_or_else(|| lexeme.location()),
        )
    }
}

/// Scans `document` as JSON and validates it against the schema rooted at `root`.
pub(crate) fn validate(
    tree: &SchemaTree,
    types: &TypeTable,
    root: NodeId,
    document: Arc<SourceFile>,
) -> Result<(), SchemaError> {
    debug!(document = document.name(), "validating document");
    let mut scanner = Scanner::new(document, ScanMode::Json);
    let mut validator = DocumentValidator::new(tree, types, root);
    while let Some(lexeme) = scanner.next_lexeme()? {
        if lexeme.kind == LexemeKind::EndTop {
            break;
        }
        validator.feed(&lexeme)?;
    }
    debug!(accepted = validator.is_done(), "document validated");
    Ok(())
}

/// Whether a literal example satisfies the node it is written on, following
/// references and unions.
pub(crate) fn example_matches(
    tree: &SchemaTree,
    types: &TypeTable,
    id: NodeId,
    literal: &crate::value::Literal,
) -> bool {
    let node = tree.node(id);
    if literal.is_null() && node.is_nullable() {
        return true;
    }
    if node.schema_type == SchemaType::Any {
        return true;
    }
    matches_any(Ctx { tree, types }, &candidates(tree, types, id), literal)
}

#[cfg(test)]
mod tests {
    use crate::schema::Schema;

    use super::*;

    fn schema(source: &str, types: &[(&str, &str)]) -> Schema {
        let mut schema = Schema::new(SourceFile::new("schema.jst", source));
        for (name, source) in types {
            schema
                .add_type(name, SourceFile::new(format!("{name}.jst"), *source))
                .unwrap();
        }
        schema
    }

    /// Feeds the whole document, returning the largest number of slots held
    /// at once.
    fn peak_slots(validator: &mut DocumentValidator<'_>, document: &str) -> usize {
        let scanner = Scanner::new(SourceFile::new("document.json", document), ScanMode::Json);
        let mut peak = validator.live_slots();
        for lexeme in scanner {
            validator.feed(&lexeme.unwrap()).unwrap();
            peak = peak.max(validator.live_slots());
        }
        peak
    }

    #[test]
    fn test_item_slots_are_reused() {
        let schema = schema("[1]", &[]);
        let compiled = schema.compile().unwrap();
        let mut validator = DocumentValidator::new(&compiled.tree, &compiled.types, compiled.root);
        let items: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        let peak = peak_slots(&mut validator, &format!("[{}]", items.join(",")));
        assert!(validator.is_done());
        assert_eq!(peak, 2);
        assert_eq!(validator.slots.len(), 2);
    }

    #[test]
    fn test_nested_slots_are_released() {
        let schema = schema("@a", &[("@a", "[@a]")]);
        let compiled = schema.compile().unwrap();
        let mut validator = DocumentValidator::new(&compiled.tree, &compiled.types, compiled.root);
        let peak = peak_slots(&mut validator, "[[[]], [[]], [[], []]]");
        assert!(validator.is_done());
        assert_eq!(peak, 3);
        assert_eq!(validator.live_slots(), 1);
        assert_eq!(validator.slots.len(), 3);
    }

    #[test]
    fn test_failed_alternatives_release_their_slots() {
        let schema = schema("[@a | @b]", &[("@a", "[1]"), ("@b", "[\"x\"]")]);
        let compiled = schema.compile().unwrap();
        let mut validator = DocumentValidator::new(&compiled.tree, &compiled.types, compiled.root);
        let peak = peak_slots(&mut validator, "[[1], [\"y\"], []]");
        assert!(validator.is_done());
        assert_eq!(peak, 4);
        assert_eq!(validator.live_slots(), 1);
    }
}
