//! Rendering [`SchemaError`]s as annotated source snippets.
//!
//! The primary annotation points at the error location. The owning user type
//! becomes a note, and every trace frame becomes a secondary snippet in its
//! own file.

use std::borrow::Cow;
use std::ops::Range;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};
use jsight_schema::{Location, SchemaError};

/// The text of a file an annotation points into.
struct Source<'a> {
    path: &'a str,
    text: Cow<'a, str>,
}

impl<'a> Source<'a> {
    fn new(location: &'a Location) -> Self {
        Self {
            path: location.file.name(),
            text: location.file.text(),
        }
    }

    /// One character at `index`, or an empty span at a line end.
    fn caret(&self, index: usize) -> Range<usize> {
        let text = self.text.as_ref();
        let mut start = index.min(text.len());
        while !text.is_char_boundary(start) {
            start -= 1;
        }
        let width = match text[start..].chars().next() {
            Some('\n' | '\r') | None => 0,
            Some(c) => c.len_utf8(),
        };
        start..start + width
    }
}

/// Renders one error. `styled` enables terminal colors.
pub fn format_error(error: &SchemaError, styled: bool) -> String {
    let title = error.kind.to_string();
    let type_note = error
        .type_name
        .as_ref()
        .map(|name| format!("in type {name}"));
    let primary = error.location.as_ref().map(|l| (Source::new(l), l.index));
    let frames: Vec<_> = error
        .trace
        .iter()
        .map(|frame| (Source::new(&frame.location), frame.location.index))
        .collect();

    let mut groups: Vec<Group<'_>> = Vec::new();
    match &primary {
        Some((source, index)) => {
            groups.push(
                Level::ERROR.primary_title(title.as_str()).element(
                    Snippet::source(source.text.as_ref())
                        .line_start(1)
                        .path(source.path)
                        .annotation(
                            AnnotationKind::Primary
                                .span(source.caret(*index))
                                .label(title.as_str()),
                        ),
                ),
            );
            if let Some(note) = &type_note {
                groups.push(
                    Level::NOTE.primary_title(note.as_str()).element(
                        Snippet::source(source.text.as_ref())
                            .line_start(1)
                            .path(source.path)
                            .annotation(AnnotationKind::Context.span(0..0)),
                    ),
                );
            }
        }
        None => groups.push(
            Level::ERROR.primary_title(title.as_str()).element(
                Snippet::source("")
                    .line_start(1)
                    .annotation(AnnotationKind::Primary.span(0..0)),
            ),
        ),
    }

    for (source, index) in &frames {
        groups.push(
            Level::NOTE.primary_title("reached through").element(
                Snippet::source(source.text.as_ref())
                    .line_start(1)
                    .path(source.path)
                    .annotation(AnnotationKind::Context.span(source.caret(*index))),
            ),
        );
    }

    let renderer = if styled {
        Renderer::styled()
    } else {
        Renderer::plain()
    };
    renderer.render(&groups).to_string()
}

/// Renders several errors, one after another.
pub fn format_errors<'a>(
    errors: impl IntoIterator<Item = &'a SchemaError>,
    styled: bool,
) -> String {
    errors
        .into_iter()
        .map(|e| format_error(e, styled))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use jsight_schema::{Schema, SourceFile};

    use super::*;

    fn compile_error(source: &str, types: &[(&str, &str)]) -> SchemaError {
        let mut schema = Schema::new(SourceFile::new("schema.jst", source));
        for (name, source) in types {
            schema
                .add_type(name, SourceFile::new(format!("{name}.jst"), *source))
                .unwrap();
        }
        schema.compile().unwrap_err()
    }

    #[test]
    fn test_points_at_the_source_line() {
        let error = compile_error("{\n  \"a\": @missing\n}", &[]);
        let rendered = format_error(&error, false);
        assert!(rendered.contains("error: type @missing is not defined"), "{rendered}");
        assert!(rendered.contains("schema.jst:2:"), "{rendered}");
        assert!(rendered.contains("\"a\": @missing"), "{rendered}");
    }

    #[test]
    fn test_type_note_and_trace_frames() {
        let error = compile_error("{}", &[("@self", r#"{"me": @self}"#)]);
        let rendered = format_error(&error, false);
        assert!(rendered.contains("in type @self"), "{rendered}");
        assert!(rendered.contains("reached through"), "{rendered}");
        assert!(rendered.contains("@self.jst"), "{rendered}");
    }

    #[test]
    fn test_unpositioned_error() {
        let mut schema = Schema::new(SourceFile::new("s", "1"));
        let error = schema.add_type("cat", SourceFile::new("t", "1")).unwrap_err();
        let rendered = format_error(&error, false);
        assert!(rendered.contains(r#"invalid type name "cat""#), "{rendered}");
    }

    #[test]
    fn test_caret_at_end_of_line_is_empty() {
        let file = SourceFile::new("f", "ab\ncd");
        let location = Location::new(file, 2);
        let source = Source::new(&location);
        assert_eq!(source.caret(2), 2..2);
        assert_eq!(source.caret(0), 0..1);
        assert_eq!(source.caret(99), 5..5);
    }
}
