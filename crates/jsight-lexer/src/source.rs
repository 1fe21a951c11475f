//! Named source buffers and positions inside them.

use std::fmt;
use std::sync::Arc;

/// A named, immutable byte buffer holding schema or document text.
///
/// The name is only used for diagnostics.
#[derive(PartialEq, Eq, Hash)]
pub struct SourceFile {
    name: String,
    content: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            content: content.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Content as text. Invalid UTF-8 sequences are replaced.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// 1-based line and column of a byte index.
    ///
    /// Columns count characters, not bytes. Indexes past the end are clamped.
    pub fn line_col(&self, index: usize) -> (usize, usize) {
        let index = index.min(self.content.len());
        let before = &self.content[..index];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |p| p + 1);
        let column = String::from_utf8_lossy(&before[line_start..])
            .chars()
            .count()
            + 1;
        (line, column)
    }

    /// Byte range of the line containing `index`, without the line break.
    pub fn line_span(&self, index: usize) -> std::ops::Range<usize> {
        let index = index.min(self.content.len());
        let start = self.content[..index]
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |p| p + 1);
        let end = self.content[index..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.content.len(), |p| index + p);
        let end = if end > start && self.content[end - 1] == b'\r' {
            end - 1
        } else {
            end
        };
        start..end
    }

    /// The source line containing `index`, for quoting in diagnostics.
    pub fn quote(&self, index: usize) -> String {
        String::from_utf8_lossy(&self.content[self.line_span(index)]).into_owned()
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("len", &self.content.len())
            .finish()
    }
}

/// A byte position inside a [`SourceFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: Arc<SourceFile>,
    pub index: usize,
}

impl Location {
    pub fn new(file: Arc<SourceFile>, index: usize) -> Self {
        Self { file, index }
    }

    pub fn line(&self) -> usize {
        self.file.line_col(self.index).0
    }

    pub fn column(&self) -> usize {
        self.file.line_col(self.index).1
    }

    pub fn quote(&self) -> String {
        self.file.quote(self.index)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, column) = self.file.line_col(self.index);
        write!(f, "{}:{}:{}", self.file.name(), line, column)
    }
}
