//! Scan error types.

use std::fmt;
use std::sync::Arc;

use crate::source::{Location, SourceFile};

/// A byte that could not extend the current scanner state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {}", self.location())]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub index: usize,
    pub file: Arc<SourceFile>,
}

impl ScanError {
    pub fn location(&self) -> Location {
        Location::new(self.file.clone(), self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanErrorKind {
    #[error("invalid character {} {context}", byte(.found))]
    UnexpectedCharacter { found: u8, context: &'static str },
    #[error("unexpected end of file {context}")]
    UnexpectedEof { context: &'static str },
    #[error("empty input")]
    EmptyInput,
    #[error("leading zeros are not allowed in numbers")]
    LeadingZero,
    #[error("invalid escape sequence {}", byte(.found))]
    InvalidEscape { found: u8 },
    #[error("control character {} in string literal", byte(.found))]
    ControlCharacter { found: u8 },
    #[error("annotation is not allowed here")]
    AnnotationNotAllowed,
    #[error("invalid character {} after top-level value", byte(.found))]
    TrailingContent { found: u8 },
}

/// Renders a byte the way diagnostics quote it.
struct Byte(u8);

fn byte(found: &u8) -> Byte {
    Byte(*found)
}

impl fmt::Display for Byte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            b'\'' => write!(f, "'\\''"),
            b'"' => write!(f, "'\"'"),
            c if c.is_ascii_graphic() || c == b' ' => write!(f, "'{}'", c as char),
            c => write!(f, "'{}'", std::ascii::escape_default(c)),
        }
    }
}
