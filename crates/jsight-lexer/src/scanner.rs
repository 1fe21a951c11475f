//! Pull-based scanner.
//!
//! The scanner is an explicit finite-state machine: [`Step`] names the current
//! state and each state has one transition function taking the next input byte.
//! Transitions push and pop an explicit stack of open events, which both checks
//! nesting and supplies the begin offset of every End event.
//!
//! One call to [`Scanner::next_lexeme`] returns one event. A single byte may
//! produce several events (`1]` closes a literal, an array item and an array),
//! so produced events are queued and drained first.

mod annotation;
mod literal;

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{ScanError, ScanErrorKind};
use crate::lexeme::{Lexeme, LexemeKind};
use crate::source::SourceFile;

/// Which grammar the scanner accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Schema notation: annotations, rule blocks, type and key shortcuts.
    Schema,
    /// Plain JSON documents.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    BeginValue,
    BeginKeyOrEmpty { annotation: bool },
    BeginKey { annotation: bool },
    BareKey,
    AfterKey,
    BeginItemOrEmpty { annotation: bool },
    BeginItem { annotation: bool },
    EndValue { annotation: bool },
    EndTop { annotation: bool },

    InString,
    InStringEscape,
    InStringUnicode(u8),
    Neg,
    Zero,
    Int,
    Dot,
    DotDigits,
    Exp,
    ExpSign,
    ExpDigits,
    Keyword(&'static [u8]),

    ShortcutStart { key: bool, rule: bool },
    ShortcutName { key: bool },
    AfterShortcut,
    AfterPipe,

    AnnotationSlash,
    InlineStart,
    InlineAfterRules,
    InlineDash,
    InlineText,
    MultiStart,
    MultiAfterRules,
    MultiDash,
    MultiText,
    MultiStar { text: bool },
}

/// Whether a transition consumed the current byte.
enum Flow {
    Next,
    Again,
}

#[derive(Debug, Clone, Copy)]
struct Open {
    kind: LexemeKind,
    begin: usize,
}

pub struct Scanner {
    file: Arc<SourceFile>,
    mode: ScanMode,
    embedded: bool,
    start: usize,
    index: usize,
    step: Step,
    stack: Vec<Open>,
    found: VecDeque<Lexeme>,
    resume: Option<Step>,
    in_annotation: bool,
    top_end: usize,
    shortcut_end: usize,
    finished: bool,
}

impl Scanner {
    /// Scan a whole file. Anything but whitespace after the top-level value is an error.
    pub fn new(file: Arc<SourceFile>, mode: ScanMode) -> Self {
        Self::with_start(file, mode, 0, false)
    }

    /// Scan a value embedded in a larger file, starting at `start`.
    ///
    /// Scanning stops with [`LexemeKind::EndTop`] at the first non-space byte
    /// following the top-level value, leaving the rest of the file untouched.
    pub fn embedded(file: Arc<SourceFile>, mode: ScanMode, start: usize) -> Self {
        Self::with_start(file, mode, start, true)
    }

    fn with_start(file: Arc<SourceFile>, mode: ScanMode, start: usize, embedded: bool) -> Self {
        Self {
            file,
            mode,
            embedded,
            start,
            index: start,
            step: Step::BeginValue,
            stack: Vec::with_capacity(16),
            found: VecDeque::with_capacity(4),
            resume: None,
            in_annotation: false,
            top_end: start,
            shortcut_end: start,
            finished: false,
        }
    }

    pub fn file(&self) -> &Arc<SourceFile> {
        &self.file
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Produce the next lexical event, or `None` after [`LexemeKind::EndTop`].
    ///
    /// After an error the scanner is exhausted.
    pub fn next_lexeme(&mut self) -> Result<Option<Lexeme>, ScanError> {
        loop {
            if let Some(lexeme) = self.found.pop_front() {
                return Ok(Some(lexeme));
            }
            if self.finished {
                return Ok(None);
            }
            let result = match self.file.content().get(self.index).copied() {
                Some(c) => match self.transition(c) {
                    Ok(Flow::Next) => {
                        self.index += 1;
                        Ok(())
                    }
                    Ok(Flow::Again) => Ok(()),
                    Err(e) => Err(e),
                },
                None => self.end_of_input(),
            };
            if let Err(e) = result {
                self.finished = true;
                self.found.clear();
                return Err(e);
            }
        }
    }

    /// Consume the input up to [`LexemeKind::EndTop`] without keeping any
    /// event, returning how many bytes the top-level value occupies from the
    /// scanner's start offset (trailing annotation included, trailing
    /// whitespace excluded).
    pub fn length(mut self) -> Result<usize, ScanError> {
        while let Some(lexeme) = self.next_lexeme()? {
            if lexeme.kind == LexemeKind::EndTop {
                return Ok(lexeme.begin - self.start);
            }
        }
        Ok(self.top_end - self.start)
    }

    fn transition(&mut self, c: u8) -> Result<Flow, ScanError> {
        match self.step {
            Step::BeginValue => self.begin_value(c),
            Step::BeginKeyOrEmpty { annotation } => self.begin_key(c, true, annotation),
            Step::BeginKey { annotation } => self.begin_key(c, false, annotation),
            Step::BareKey => self.bare_key(c),
            Step::AfterKey => self.after_key(c),
            Step::BeginItemOrEmpty { annotation } => self.begin_item(c, true, annotation),
            Step::BeginItem { annotation } => self.begin_item(c, false, annotation),
            Step::EndValue { annotation } => self.end_value(c, annotation),
            Step::EndTop { annotation } => self.end_top(c, annotation),

            Step::InString => self.in_string(c),
            Step::InStringEscape => self.in_string_escape(c),
            Step::InStringUnicode(left) => self.in_string_unicode(c, left),
            Step::Neg => self.neg(c),
            Step::Zero => self.zero(c),
            Step::Int => self.int(c),
            Step::Dot => self.dot(c),
            Step::DotDigits => self.dot_digits(c),
            Step::Exp => self.exp(c),
            Step::ExpSign => self.exp_sign(c),
            Step::ExpDigits => self.exp_digits(c),
            Step::Keyword(rest) => self.keyword(c, rest),

            Step::ShortcutStart { key, rule } => self.shortcut_start(c, key, rule),
            Step::ShortcutName { key } => self.shortcut_name(c, key),
            Step::AfterShortcut => self.after_shortcut(c),
            Step::AfterPipe => self.after_pipe(c),

            Step::AnnotationSlash => self.annotation_slash(c),
            Step::InlineStart => self.inline_start(c),
            Step::InlineAfterRules => self.inline_after_rules(c),
            Step::InlineDash => self.inline_dash(c),
            Step::InlineText => self.inline_text(c),
            Step::MultiStart => self.multi_start(c),
            Step::MultiAfterRules => self.multi_after_rules(c),
            Step::MultiDash => self.multi_dash(c),
            Step::MultiText => self.multi_text(c),
            Step::MultiStar { text } => self.multi_star(c, text),
        }
    }

    // =========================================================================
    // Values and containers
    // =========================================================================

    fn begin_value(&mut self, c: u8) -> Result<Flow, ScanError> {
        let at = self.index;
        match c {
            b' ' | b'\t' | b'\r' => {}
            b'\n' => self.newline(),
            b'{' => {
                self.begin(LexemeKind::ObjectBegin, at);
                self.step = Step::BeginKeyOrEmpty {
                    annotation: self.annotations_allowed(),
                };
            }
            b'[' => {
                self.begin(LexemeKind::ArrayBegin, at);
                self.step = Step::BeginItemOrEmpty {
                    annotation: self.annotations_allowed(),
                };
            }
            b'"' => {
                self.begin(LexemeKind::LiteralBegin, at);
                self.step = Step::InString;
            }
            b'-' => {
                self.begin(LexemeKind::LiteralBegin, at);
                self.step = Step::Neg;
            }
            b'0' => {
                self.begin(LexemeKind::LiteralBegin, at);
                self.step = Step::Zero;
            }
            b'1'..=b'9' => {
                self.begin(LexemeKind::LiteralBegin, at);
                self.step = Step::Int;
            }
            b't' | b'f' | b'n' => {
                self.begin(LexemeKind::LiteralBegin, at);
                self.step = Step::Keyword(match c {
                    b't' => b"rue",
                    b'f' => b"alse",
                    _ => b"ull",
                });
            }
            b'@' if self.mode == ScanMode::Schema => {
                self.begin(LexemeKind::MixedValueBegin, at);
                self.begin(LexemeKind::TypesShortcutBegin, at);
                self.step = Step::ShortcutStart {
                    key: false,
                    rule: false,
                };
            }
            _ => return Err(self.unexpected(c, "looking for beginning of value")),
        }
        Ok(Flow::Next)
    }

    fn begin_key(&mut self, c: u8, or_empty: bool, annotation: bool) -> Result<Flow, ScanError> {
        let at = self.index;
        match c {
            b' ' | b'\t' | b'\r' => {}
            b'\n' => {
                self.newline();
                self.step = if or_empty {
                    Step::BeginKeyOrEmpty { annotation: false }
                } else {
                    Step::BeginKey { annotation: false }
                };
            }
            b'}' if or_empty => {
                self.end(LexemeKind::ObjectEnd, at + 1);
                self.step = self.after_value();
            }
            b'"' => {
                self.begin(LexemeKind::ObjectKeyBegin, at);
                self.step = Step::InString;
            }
            b'@' if self.mode == ScanMode::Schema && !self.in_annotation => {
                self.begin(LexemeKind::ObjectKeyBegin, at);
                self.begin(LexemeKind::KeyShortcutBegin, at);
                self.step = Step::ShortcutStart {
                    key: true,
                    rule: false,
                };
            }
            c if self.in_annotation && (c.is_ascii_alphabetic() || c == b'_') => {
                self.begin(LexemeKind::ObjectKeyBegin, at);
                self.step = Step::BareKey;
            }
            b'/' => {
                let resume = if or_empty {
                    Step::BeginKeyOrEmpty { annotation: false }
                } else {
                    Step::BeginKey { annotation: false }
                };
                return self.annotation_start(c, annotation, resume);
            }
            _ => return Err(self.unexpected(c, "looking for beginning of object key string")),
        }
        Ok(Flow::Next)
    }

    fn bare_key(&mut self, c: u8) -> Result<Flow, ScanError> {
        if c.is_ascii_alphanumeric() || c == b'_' {
            return Ok(Flow::Next);
        }
        self.end(LexemeKind::ObjectKeyEnd, self.index);
        self.step = Step::AfterKey;
        Ok(Flow::Again)
    }

    fn after_key(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b' ' | b'\t' | b'\r' => {}
            b'\n' => self.newline(),
            b':' => {
                self.begin(LexemeKind::ObjectValueBegin, self.index);
                self.step = Step::BeginValue;
            }
            _ => return Err(self.unexpected(c, "after object key")),
        }
        Ok(Flow::Next)
    }

    fn begin_item(&mut self, c: u8, or_empty: bool, annotation: bool) -> Result<Flow, ScanError> {
        let at = self.index;
        match c {
            b' ' | b'\t' | b'\r' => Ok(Flow::Next),
            b'\n' => {
                self.newline();
                self.step = if or_empty {
                    Step::BeginItemOrEmpty { annotation: false }
                } else {
                    Step::BeginItem { annotation: false }
                };
                Ok(Flow::Next)
            }
            b']' if or_empty => {
                self.end(LexemeKind::ArrayEnd, at + 1);
                self.step = self.after_value();
                Ok(Flow::Next)
            }
            b'/' => {
                let resume = if or_empty {
                    Step::BeginItemOrEmpty { annotation: false }
                } else {
                    Step::BeginItem { annotation: false }
                };
                self.annotation_start(c, annotation, resume)
            }
            _ => {
                self.begin(LexemeKind::ArrayItemBegin, at);
                self.step = Step::BeginValue;
                Ok(Flow::Again)
            }
        }
    }

    fn end_value(&mut self, c: u8, annotation: bool) -> Result<Flow, ScanError> {
        let at = self.index;
        let Some(top) = self.top() else {
            self.step = Step::EndTop { annotation };
            return Ok(Flow::Again);
        };
        match top {
            LexemeKind::InlineAnnotationBegin => {
                self.step = Step::InlineAfterRules;
                Ok(Flow::Again)
            }
            LexemeKind::MultiLineAnnotationBegin => {
                self.step = Step::MultiAfterRules;
                Ok(Flow::Again)
            }
            LexemeKind::ObjectValueBegin => match c {
                b' ' | b'\t' | b'\r' => Ok(Flow::Next),
                b'\n' => {
                    self.newline();
                    self.step = Step::EndValue { annotation: false };
                    Ok(Flow::Next)
                }
                b',' => {
                    self.end(LexemeKind::ObjectValueEnd, at);
                    self.step = Step::BeginKey { annotation };
                    Ok(Flow::Next)
                }
                b'}' => {
                    self.end(LexemeKind::ObjectValueEnd, at);
                    self.end(LexemeKind::ObjectEnd, at + 1);
                    self.step = self.after_value();
                    Ok(Flow::Next)
                }
                b'/' => self.annotation_start(c, annotation, Step::EndValue { annotation: false }),
                _ => Err(self.unexpected(c, "after object key:value pair")),
            },
            LexemeKind::ArrayItemBegin => match c {
                b' ' | b'\t' | b'\r' => Ok(Flow::Next),
                b'\n' => {
                    self.newline();
                    self.step = Step::EndValue { annotation: false };
                    Ok(Flow::Next)
                }
                b',' => {
                    self.end(LexemeKind::ArrayItemEnd, at);
                    self.step = Step::BeginItem { annotation };
                    Ok(Flow::Next)
                }
                b']' => {
                    self.end(LexemeKind::ArrayItemEnd, at);
                    self.end(LexemeKind::ArrayEnd, at + 1);
                    self.step = self.after_value();
                    Ok(Flow::Next)
                }
                b'/' => self.annotation_start(c, annotation, Step::EndValue { annotation: false }),
                _ => Err(self.unexpected(c, "after array element")),
            },
            other => panic!("scanner defect: value ended inside {other}"),
        }
    }

    fn end_top(&mut self, c: u8, annotation: bool) -> Result<Flow, ScanError> {
        match c {
            b' ' | b'\t' | b'\r' => Ok(Flow::Next),
            b'\n' => {
                self.newline();
                self.step = Step::EndTop { annotation: false };
                Ok(Flow::Next)
            }
            b'/' if annotation => {
                self.annotation_start(c, true, Step::EndTop { annotation: false })
            }
            _ if self.embedded => {
                self.singleton(LexemeKind::EndTop, self.top_end);
                self.finished = true;
                Ok(Flow::Again)
            }
            b'/' if self.mode == ScanMode::Schema => {
                Err(self.error(ScanErrorKind::AnnotationNotAllowed))
            }
            _ => Err(self.error(ScanErrorKind::TrailingContent { found: c })),
        }
    }

    // =========================================================================
    // Shortcuts
    // =========================================================================

    fn shortcut_start(&mut self, c: u8, key: bool, rule: bool) -> Result<Flow, ScanError> {
        match c {
            b'@' if !key && !rule && self.in_annotation => {
                self.step = Step::ShortcutStart { key, rule: true };
                Ok(Flow::Next)
            }
            c if is_name_byte(c) => {
                self.step = Step::ShortcutName { key };
                Ok(Flow::Next)
            }
            _ => Err(self.unexpected(c, "in type name")),
        }
    }

    fn shortcut_name(&mut self, c: u8, key: bool) -> Result<Flow, ScanError> {
        if is_name_byte(c) {
            return Ok(Flow::Next);
        }
        let at = self.index;
        if key {
            self.end(LexemeKind::KeyShortcutEnd, at);
            self.end(LexemeKind::ObjectKeyEnd, at);
            self.step = Step::AfterKey;
        } else {
            self.end(LexemeKind::TypesShortcutEnd, at);
            self.shortcut_end = at;
            self.step = Step::AfterShortcut;
        }
        Ok(Flow::Again)
    }

    fn after_shortcut(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b' ' | b'\t' => Ok(Flow::Next),
            b'|' => {
                self.step = Step::AfterPipe;
                Ok(Flow::Next)
            }
            _ => {
                self.end(LexemeKind::MixedValueEnd, self.shortcut_end);
                self.step = self.after_value();
                Ok(Flow::Again)
            }
        }
    }

    fn after_pipe(&mut self, c: u8) -> Result<Flow, ScanError> {
        match c {
            b' ' | b'\t' => Ok(Flow::Next),
            b'@' => {
                self.begin(LexemeKind::TypesShortcutBegin, self.index);
                self.step = Step::ShortcutStart {
                    key: false,
                    rule: false,
                };
                Ok(Flow::Next)
            }
            _ => Err(self.unexpected(c, "after '|', expecting a type name")),
        }
    }

    // =========================================================================
    // End of input
    // =========================================================================

    fn end_of_input(&mut self) -> Result<(), ScanError> {
        let len = self.file.len();
        match self.step {
            Step::Zero | Step::Int | Step::DotDigits | Step::ExpDigits => {
                self.end(LexemeKind::LiteralEnd, len);
                self.step = self.after_value();
            }
            Step::ShortcutName { key: false } => {
                self.end(LexemeKind::TypesShortcutEnd, len);
                self.shortcut_end = len;
                self.step = Step::AfterShortcut;
            }
            Step::AfterShortcut => {
                self.end(LexemeKind::MixedValueEnd, self.shortcut_end);
                self.step = self.after_value();
            }
            Step::EndValue { .. } | Step::EndTop { .. } if self.stack.is_empty() => {
                self.singleton(LexemeKind::EndTop, self.top_end);
                self.finished = true;
            }
            Step::InlineStart | Step::InlineAfterRules | Step::InlineDash => {
                self.end_inline_annotation(len);
            }
            Step::EndValue { .. } if self.top() == Some(LexemeKind::InlineAnnotationBegin) => {
                self.end_inline_annotation(len);
            }
            Step::InlineText => {
                self.end(LexemeKind::InlineAnnotationTextEnd, len);
                self.end_inline_annotation(len);
            }
            Step::BeginValue if self.stack.is_empty() => {
                return Err(self.error(ScanErrorKind::EmptyInput));
            }
            _ => {
                return Err(self.error(ScanErrorKind::UnexpectedEof {
                    context: self.context(),
                }));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn begin(&mut self, kind: LexemeKind, at: usize) {
        self.stack.push(Open { kind, begin: at });
        self.found
            .push_back(Lexeme::new(kind, at, at, self.file.clone()));
    }

    fn end(&mut self, kind: LexemeKind, end: usize) {
        let open = self.stack.pop();
        match open {
            Some(open) if Some(open.kind) == kind.begin_kind() => {
                self.found
                    .push_back(Lexeme::new(kind, open.begin, end, self.file.clone()));
                if self.stack.is_empty() {
                    self.top_end = end;
                }
            }
            other => panic!(
                "scanner defect: {kind} does not close {:?}",
                other.map(|o| o.kind)
            ),
        }
    }

    fn singleton(&mut self, kind: LexemeKind, at: usize) {
        self.found
            .push_back(Lexeme::new(kind, at, at, self.file.clone()));
    }

    fn newline(&mut self) {
        if !self.in_annotation {
            self.singleton(LexemeKind::NewLine, self.index);
        }
    }

    fn top(&self) -> Option<LexemeKind> {
        self.stack.last().map(|open| open.kind)
    }

    fn annotations_allowed(&self) -> bool {
        self.mode == ScanMode::Schema && !self.in_annotation
    }

    fn after_value(&self) -> Step {
        Step::EndValue {
            annotation: self.annotations_allowed(),
        }
    }

    fn error(&self, kind: ScanErrorKind) -> ScanError {
        ScanError {
            kind,
            index: self.index,
            file: self.file.clone(),
        }
    }

    fn unexpected(&self, found: u8, context: &'static str) -> ScanError {
        self.error(ScanErrorKind::UnexpectedCharacter { found, context })
    }

    fn context(&self) -> &'static str {
        match self.step {
            Step::InString | Step::InStringEscape | Step::InStringUnicode(_) => {
                "in string literal"
            }
            Step::Neg | Step::Dot | Step::Exp | Step::ExpSign => "in numeric literal",
            Step::Keyword(_) => "in literal true, false or null",
            Step::ShortcutStart { .. } | Step::ShortcutName { .. } | Step::AfterPipe => {
                "in type name"
            }
            Step::AnnotationSlash
            | Step::MultiStart
            | Step::MultiAfterRules
            | Step::MultiDash
            | Step::MultiText
            | Step::MultiStar { .. } => "in annotation",
            _ => match self.top() {
                Some(LexemeKind::ObjectBegin)
                | Some(LexemeKind::ObjectKeyBegin)
                | Some(LexemeKind::ObjectValueBegin) => "in object",
                Some(LexemeKind::ArrayBegin) | Some(LexemeKind::ArrayItemBegin) => "in array",
                Some(LexemeKind::InlineAnnotationBegin)
                | Some(LexemeKind::MultiLineAnnotationBegin) => "in annotation",
                _ => "looking for beginning of value",
            },
        }
    }
}

impl Iterator for Scanner {
    type Item = Result<Lexeme, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_lexeme().transpose()
    }
}

/// Bytes a type or rule name may consist of after its `@` prefix.
pub fn is_name_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'-'
}

/// How many bytes the schema starting at `start` occupies inside `file`.
pub fn schema_length(file: Arc<SourceFile>, start: usize) -> Result<usize, ScanError> {
    Scanner::embedded(file, ScanMode::Schema, start).length()
}
