use jsight_lexer::{
    Lexeme, LexemeKind, ScanErrorKind, ScanMode, Scanner, SourceFile, schema_length,
};
use pretty_assertions::assert_eq;

fn scan(mode: ScanMode, input: &str) -> Vec<Lexeme> {
    Scanner::new(SourceFile::new("test.jst", input), mode)
        .collect::<Result<Vec<_>, _>>()
        .expect("scan failed")
}

fn texts(mode: ScanMode, input: &str, kind: LexemeKind) -> Vec<String> {
    scan(mode, input)
        .into_iter()
        .filter(|l| l.kind == kind)
        .map(|l| l.text())
        .collect()
}

#[test]
fn test_every_begin_has_matching_end() {
    let input = r#"
{
  "id": 1, // {min: 1}
  "tags": [ "a", @tag ], /* {optional: true} - tags */
  @key: @cat | @dog
}
"#;
    let mut stack = Vec::new();
    for lexeme in scan(ScanMode::Schema, input) {
        if lexeme.kind.is_begin() {
            stack.push(lexeme.kind);
        } else if lexeme.kind.is_end() {
            assert_eq!(stack.pop(), lexeme.kind.begin_kind());
        }
    }
    assert!(stack.is_empty());
}

#[test]
fn test_literal_texts() {
    let input = r#"[ "a\"b", -0.5e+3, true, false, null, 0 ]"#;
    assert_eq!(
        texts(ScanMode::Json, input, LexemeKind::LiteralEnd),
        vec![r#""a\"b""#, "-0.5e+3", "true", "false", "null", "0"]
    );
}

#[test]
fn test_shortcut_texts() {
    assert_eq!(
        texts(ScanMode::Schema, "@cat | @big-dog", LexemeKind::TypesShortcutEnd),
        vec!["@cat", "@big-dog"]
    );
    assert_eq!(
        texts(ScanMode::Schema, "{@id: 1}", LexemeKind::KeyShortcutEnd),
        vec!["@id"]
    );
}

#[test]
fn test_annotation_texts() {
    let input = "{\n  \"a\": 1 // {min: 0} - first\n} /* - top\n level */";
    assert_eq!(
        texts(ScanMode::Schema, input, LexemeKind::InlineAnnotationTextEnd),
        vec!["first"]
    );
    assert_eq!(
        texts(ScanMode::Schema, input, LexemeKind::MultiLineAnnotationTextEnd),
        vec!["top\n level "]
    );
}

#[test]
fn test_top_level_annotation_on_next_line_rejected() {
    let input = "{\n  \"a\": 1\n}\n/* - top */";
    let error = Scanner::new(SourceFile::new("t", input), ScanMode::Schema)
        .find_map(Result::err)
        .unwrap();
    assert_eq!(error.kind, ScanErrorKind::AnnotationNotAllowed);
    assert_eq!(error.index, 13);
    assert_eq!(error.to_string(), "annotation is not allowed here at t:4:1");
}

#[test]
fn test_rule_enum_with_rule_shortcut() {
    let lexemes = scan(ScanMode::Schema, "\"red\" // {enum: @@colors}");
    let shortcut = lexemes
        .iter()
        .find(|l| l.kind == LexemeKind::TypesShortcutEnd)
        .expect("rule shortcut");
    assert_eq!(shortcut.text(), "@@colors");
}

#[test]
fn test_rule_shortcut_outside_annotation_rejected() {
    let error = Scanner::new(SourceFile::new("t", "@@colors"), ScanMode::Schema)
        .find_map(Result::err)
        .unwrap();
    assert_eq!(error.index, 1);
}

#[test]
fn test_new_lines_reported_outside_annotations() {
    let count = scan(ScanMode::Schema, "[\n1,\n2\n]\n")
        .iter()
        .filter(|l| l.kind == LexemeKind::NewLine)
        .count();
    assert_eq!(count, 4);
}

#[test]
fn test_json_mode_rejects_schema_notation() {
    for input in ["@cat", "{@id: 1}", "1 // comment"] {
        let result: Result<Vec<_>, _> =
            Scanner::new(SourceFile::new("t", input), ScanMode::Json).collect();
        assert!(result.is_err(), "{input} should be rejected");
    }
}

#[test]
fn test_errors() {
    let cases = [
        ("", ScanErrorKind::EmptyInput),
        ("   ", ScanErrorKind::EmptyInput),
        ("00", ScanErrorKind::LeadingZero),
        ("\"\\x\"", ScanErrorKind::InvalidEscape { found: b'x' }),
        ("\"a\tb\"", ScanErrorKind::ControlCharacter { found: b'\t' }),
        ("[1] 2", ScanErrorKind::TrailingContent { found: b'2' }),
        (
            "{\"a\" 1}",
            ScanErrorKind::UnexpectedCharacter {
                found: b'1',
                context: "after object key",
            },
        ),
        (
            "[1,]",
            ScanErrorKind::UnexpectedCharacter {
                found: b']',
                context: "looking for beginning of value",
            },
        ),
        (
            "{\"a\": 1",
            ScanErrorKind::UnexpectedEof { context: "in object" },
        ),
        (
            "\"abc",
            ScanErrorKind::UnexpectedEof {
                context: "in string literal",
            },
        ),
    ];
    for (input, expected) in cases {
        let error = Scanner::new(SourceFile::new("t", input), ScanMode::Json)
            .find_map(Result::err)
            .unwrap_or_else(|| panic!("{input:?} should fail"));
        assert_eq!(error.kind, expected, "input {input:?}");
    }
}

#[test]
fn test_error_location_display() {
    let error = Scanner::new(SourceFile::new("doc.json", "{\n  \"a\": tru\n}"), ScanMode::Json)
        .find_map(Result::err)
        .unwrap();
    assert_eq!(error.location().to_string(), "doc.json:2:11");
    assert_eq!(error.location().quote(), "  \"a\": tru");
}

#[test]
fn test_scanner_is_exhausted_after_error() {
    let mut scanner = Scanner::new(SourceFile::new("t", "[1.]"), ScanMode::Json);
    while let Some(item) = scanner.next() {
        if item.is_err() {
            break;
        }
    }
    assert!(scanner.next().is_none());
}

#[test]
fn test_schema_length_of_whole_file() {
    let file = SourceFile::new("t", "[1, 2]  \n");
    assert_eq!(schema_length(file, 0).unwrap(), 6);
}

#[test]
fn test_schema_length_embedded() {
    let file = SourceFile::new("t", "TYPE {\"a\": @cat | @dog} END");
    assert_eq!(schema_length(file, 5).unwrap(), 18);

    let file = SourceFile::new("t", "@cat | @dog\nnext");
    assert_eq!(schema_length(file, 0).unwrap(), 11);
}

#[test]
fn test_schema_length_includes_trailing_annotation() {
    let input = "42 // comment\nnext";
    let file = SourceFile::new("t", input);
    assert_eq!(schema_length(file, 0).unwrap(), 13);

    let input = "{} /* multi\n line */ rest";
    let file = SourceFile::new("t", input);
    assert_eq!(schema_length(file, 0).unwrap(), 20);
}

#[test]
fn test_schema_length_matches_end_top_position() {
    let input = "{\n  \"a\": [1, 2] // {minItems: 1}\n}";
    let lexemes = scan(ScanMode::Schema, input);
    let end_top = lexemes.last().unwrap();
    assert_eq!(end_top.kind, LexemeKind::EndTop);
    let file = SourceFile::new("t", input);
    assert_eq!(schema_length(file, 0).unwrap(), end_top.begin);
    assert_eq!(end_top.begin, input.len());
}
