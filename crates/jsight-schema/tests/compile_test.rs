use jsight_schema::{CompileError, ErrorKind, Schema, SchemaError, SourceFile, TypeName};
use pretty_assertions::assert_eq;

fn schema(source: &str, types: &[(&str, &str)]) -> Schema {
    let mut schema = Schema::new(SourceFile::new("schema.jst", source));
    for (name, source) in types {
        schema
            .add_type(name, SourceFile::new(format!("{name}.jst"), *source))
            .expect("add type");
    }
    schema
}

fn compile_error(source: &str, types: &[(&str, &str)]) -> SchemaError {
    match schema(source, types).compile() {
        Ok(_) => panic!("{source} should not compile"),
        Err(e) => e,
    }
}

#[test]
fn test_compile_error_kinds() {
    let cases: &[(&str, CompileError)] = &[
        (
            r#"{"a": 1, "a": 2}"#,
            CompileError::DuplicateKey("a".into()),
        ),
        (
            r#""x" // {minLength: 1, minLength: 2}"#,
            CompileError::DuplicateRule("minLength".into()),
        ),
        (r#"1 // {color: "red"}"#, CompileError::UnknownRule("color".into())),
        (
            r#"1 // {minLength: 1}"#,
            CompileError::IncompatibleRule {
                rule: "minLength".into(),
                json_type: jsight_schema::JsonType::Integer,
            },
        ),
        (
            r#""abc" // {maxLength: 2}"#,
            CompileError::ExampleViolatesRule {
                rule: "maxLength".into(),
                failure: Box::new(jsight_schema::ValidationFailure::TooLong { max: 2 }),
            },
        ),
        (
            "5 // {min: 6, max: 1}",
            CompileError::ConflictingRules {
                first: "min".into(),
                second: "max".into(),
            },
        ),
        (
            r#""x" // {type: "mixed"}"#,
            CompileError::MissingRule {
                rule: "type: mixed".into(),
                requires: "or".into(),
            },
        ),
        (
            "1.5 // {precision: 2}",
            CompileError::PrecisionRequiresDecimal,
        ),
        ("1 // {optional: true}", CompileError::OptionalOutsideObject),
        (
            r#"{"a": @missing}"#,
            CompileError::UndefinedType(TypeName::new("@missing").unwrap()),
        ),
    ];
    for (source, expected) in cases {
        let error = compile_error(source, &[]);
        assert_eq!(error.as_compile(), Some(expected), "{source}");
    }
}

#[test]
fn test_errors_in_types_name_the_type() {
    let error = compile_error("@cat", &[("@cat", "{\n  \"age\": \"old\" // {min: 1}\n}")]);
    assert_eq!(error.type_name.as_ref().map(TypeName::as_str), Some("@cat"));
    assert_eq!(error.line(), Some(2));
    assert_eq!(error.location.as_ref().map(|l| l.file.name()), Some("@cat.jst"));
    assert!(error.to_string().ends_with("(in type @cat)"));
}

#[test]
fn test_scan_errors_in_schemas() {
    let error = compile_error("{\n  \"a\": 1\n  // late\n}", &[]);
    assert!(matches!(error.kind, ErrorKind::Scan(_)));
    assert_eq!(error.line(), Some(3));
}

#[test]
fn test_recursion() {
    let accepted: &[&[(&str, &str)]] = &[
        &[("@node", "{\"next\": @node // {optional: true}\n}")],
        &[("@node", "{\"children\": [@node]}")],
        &[("@list", "{\"tail\": @list | @end}"), ("@end", "null")],
    ];
    for types in accepted {
        let root = types[0].0;
        assert!(schema(root, types).compile().is_ok(), "{types:?}");
    }

    let error = compile_error(
        "{}",
        &[("@self", r#"{"me": @self}"#)],
    );
    let Some(CompileError::InfiniteRecursion(path)) = error.as_compile() else {
        panic!("unexpected error {error}");
    };
    assert_eq!(path, "@self -> @self");
    assert_eq!(error.trace.len(), 1);
}

#[test]
fn test_property_override_through_all_of() {
    let error = compile_error(
        "{ // {allOf: [@a, @b]}\n}",
        &[("@a", r#"{"id": 1}"#), ("@b", r#"{"id": "x"}"#)],
    );
    assert_eq!(
        error.as_compile(),
        Some(&CompileError::PropertyOverride {
            key: "id".into(),
            from: TypeName::new("@b").unwrap(),
        })
    );
}

#[test]
fn test_embedded_length_matches_scan() {
    let text = "SCHEMA {\n  \"a\": [1, 2] // {maxItems: 3}\n}  \nTAIL";
    let schema = Schema::embedded(SourceFile::new("api.jst", text), 7);
    let length = schema.length().unwrap();
    assert_eq!(&text[7..7 + length], "{\n  \"a\": [1, 2] // {maxItems: 3}\n}");
    assert!(schema.compile().is_ok());
}
