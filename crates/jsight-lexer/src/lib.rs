//! Scanner for JSight Schema notation and plain JSON.
//!
//! The scanner turns bytes into a stream of positioned Begin/End events
//! ([`Lexeme`]) instead of a token list, so consumers can build trees or
//! validate documents incrementally.

mod error;
mod lexeme;
mod scanner;
mod source;

pub use error::{ScanError, ScanErrorKind};
pub use lexeme::{Lexeme, LexemeKind};
pub use scanner::{ScanMode, Scanner, is_name_byte, schema_length};
pub use source::{Location, SourceFile};
