//! Lexical events produced by the scanner.

use std::fmt;
use std::sync::Arc;

use crate::source::{Location, SourceFile};

/// Kind of a lexical event.
///
/// Kinds come in Begin/End pairs except for the singleton markers
/// [`LexemeKind::NewLine`] and [`LexemeKind::EndTop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexemeKind {
    LiteralBegin,
    LiteralEnd,
    ObjectBegin,
    ObjectEnd,
    ObjectKeyBegin,
    ObjectKeyEnd,
    ObjectValueBegin,
    ObjectValueEnd,
    ArrayBegin,
    ArrayEnd,
    ArrayItemBegin,
    ArrayItemEnd,
    InlineAnnotationBegin,
    InlineAnnotationEnd,
    InlineAnnotationTextBegin,
    InlineAnnotationTextEnd,
    MultiLineAnnotationBegin,
    MultiLineAnnotationEnd,
    MultiLineAnnotationTextBegin,
    MultiLineAnnotationTextEnd,
    MixedValueBegin,
    MixedValueEnd,
    TypesShortcutBegin,
    TypesShortcutEnd,
    KeyShortcutBegin,
    KeyShortcutEnd,
    NewLine,
    EndTop,
}

impl LexemeKind {
    pub fn is_begin(self) -> bool {
        self.end_kind().is_some()
    }

    pub fn is_end(self) -> bool {
        self.begin_kind().is_some()
    }

    /// The End kind closing this Begin kind.
    pub fn end_kind(self) -> Option<LexemeKind> {
        use LexemeKind::*;
        Some(match self {
            LiteralBegin => LiteralEnd,
            ObjectBegin => ObjectEnd,
            ObjectKeyBegin => ObjectKeyEnd,
            ObjectValueBegin => ObjectValueEnd,
            ArrayBegin => ArrayEnd,
            ArrayItemBegin => ArrayItemEnd,
            InlineAnnotationBegin => InlineAnnotationEnd,
            InlineAnnotationTextBegin => InlineAnnotationTextEnd,
            MultiLineAnnotationBegin => MultiLineAnnotationEnd,
            MultiLineAnnotationTextBegin => MultiLineAnnotationTextEnd,
            MixedValueBegin => MixedValueEnd,
            TypesShortcutBegin => TypesShortcutEnd,
            KeyShortcutBegin => KeyShortcutEnd,
            _ => return None,
        })
    }

    /// The Begin kind opened for this End kind.
    pub fn begin_kind(self) -> Option<LexemeKind> {
        use LexemeKind::*;
        Some(match self {
            LiteralEnd => LiteralBegin,
            ObjectEnd => ObjectBegin,
            ObjectKeyEnd => ObjectKeyBegin,
            ObjectValueEnd => ObjectValueBegin,
            ArrayEnd => ArrayBegin,
            ArrayItemEnd => ArrayItemBegin,
            InlineAnnotationEnd => InlineAnnotationBegin,
            InlineAnnotationTextEnd => InlineAnnotationTextBegin,
            MultiLineAnnotationEnd => MultiLineAnnotationBegin,
            MultiLineAnnotationTextEnd => MultiLineAnnotationTextBegin,
            MixedValueEnd => MixedValueBegin,
            TypesShortcutEnd => TypesShortcutBegin,
            KeyShortcutEnd => KeyShortcutBegin,
            _ => return None,
        })
    }

    pub fn is_annotation_begin(self) -> bool {
        matches!(
            self,
            LexemeKind::InlineAnnotationBegin | LexemeKind::MultiLineAnnotationBegin
        )
    }
}

impl fmt::Display for LexemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A positioned lexical event.
///
/// Begin events and singletons have an empty span at the position where they
/// were detected. End events span the whole construct, from the byte where the
/// matching Begin was detected up to (excluding) `end`.
#[derive(Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    pub begin: usize,
    pub end: usize,
    pub file: Arc<SourceFile>,
}

impl Lexeme {
    pub fn new(kind: LexemeKind, begin: usize, end: usize, file: Arc<SourceFile>) -> Self {
        Self {
            kind,
            begin,
            end,
            file,
        }
    }

    /// Raw bytes covered by this lexeme.
    pub fn value(&self) -> &[u8] {
        let content = self.file.content();
        let end = self.end.min(content.len());
        &content[self.begin.min(end)..end]
    }

    /// Raw text covered by this lexeme.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.value()).into_owned()
    }

    pub fn location(&self) -> Location {
        Location::new(self.file.clone(), self.begin)
    }
}

impl fmt::Debug for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}..{}]", self.kind, self.begin, self.end)
    }
}
