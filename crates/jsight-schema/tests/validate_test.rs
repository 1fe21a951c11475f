use jsight_schema::{
    CompileError, ErrorKind, JsonType, Number, Schema, SchemaError, SourceFile, ValidationFailure,
};
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

fn validate(schema: &Schema, document: &str) -> Result<(), SchemaError> {
    schema.validate(SourceFile::new("document.json", document))
}

fn failure(schema: &Schema, document: &str) -> ValidationFailure {
    match validate(schema, document) {
        Ok(()) => panic!("{document} should not validate"),
        Err(e) => e
            .as_validation()
            .cloned()
            .unwrap_or_else(|| panic!("{document}: {e}")),
    }
}

#[test]
fn test_required_and_unknown_keys() {
    let schema = schema(r#"{"a": 1, "b": 2} // {additionalProperties: false}"#, &[]);
    assert!(validate(&schema, r#"{"a":1,"b":2}"#).is_ok());
    assert_eq!(
        failure(&schema, r#"{"a":1}"#),
        ValidationFailure::RequiredKeysNotFound(vec!["b".into()])
    );
    assert_eq!(
        failure(&schema, r#"{"a":1,"b":2,"c":3}"#),
        ValidationFailure::UnknownKey("c".into())
    );
    assert_eq!(
        failure(&schema, r#"{"a":1,"a":2,"b":3}"#),
        ValidationFailure::DuplicateKey("a".into())
    );
}

#[test]
fn test_error_positions() {
    let schema = schema(r#"{"a": 1, "b": "x"}"#, &[]);
    let error = validate(&schema, "{\n  \"a\": 1,\n  \"b\": 2\n}").unwrap_err();
    assert_eq!((error.line(), error.column()), (Some(3), Some(8)));
    assert_eq!(error.quote().as_deref(), Some("  \"b\": 2"));

    let error = validate(&schema, "\n  {\"a\": 1}").unwrap_err();
    assert_eq!(error.index(), Some(3));
}

#[test]
fn test_union_of_object_types() {
    let schema = schema(
        r#"{"x": @Foo | @Bar}"#,
        &[("@Foo", r#"{"n": "string"}"#), ("@Bar", r#"{"n": 1}"#)],
    );
    assert!(validate(&schema, r#"{"x":{"n":"hi"}}"#).is_ok());
    assert!(validate(&schema, r#"{"x":{"n":1}}"#).is_ok());
    let error = validate(&schema, r#"{"x":{"n":true}}"#).unwrap_err();
    assert_eq!(
        error.as_validation(),
        Some(&ValidationFailure::NoAlternativeMatched)
    );
    assert_eq!(error.index(), Some(5));
}

#[test]
fn test_single_live_alternative_reports_its_error() {
    let schema = schema(
        r#"{"x": @Obj | @List}"#,
        &[("@Obj", r#"{"n": 1}"#), ("@List", "[1]")],
    );
    assert!(validate(&schema, r#"{"x":[1, 2]}"#).is_ok());
    assert_eq!(
        failure(&schema, r#"{"x":{"n":"one"}}"#),
        ValidationFailure::TypeMismatch {
            expected: "integer".into(),
            found: JsonType::String,
        }
    );
    assert_eq!(
        failure(&schema, r#"{"x":"text"}"#),
        ValidationFailure::NoAlternativeMatched
    );
}

#[test]
fn test_enum_and_nullable() {
    let schema = self::schema("1 // {enum: [1, 2, 3]}", &[]);
    assert!(validate(&schema, "2").is_ok());
    assert_eq!(failure(&schema, "4"), ValidationFailure::EnumMismatch);
    assert_eq!(
        failure(&schema, "4").to_string(),
        "value does not match any of the enumeration values"
    );
    assert!(validate(&schema, "null").is_err());

    let nullable = self::schema("1 // {enum: [1, 2, 3], nullable: true}", &[]);
    assert!(validate(&nullable, "null").is_ok());
    assert!(validate(&nullable, "3").is_ok());
}

#[test]
fn test_named_rule_enum() {
    let mut schema = self::schema(r#""red" // {enum: @@colors}"#, &[]);
    schema
        .add_rule(
            "@@colors",
            SourceFile::new("colors.jst", r#"["red", "green" /* default */ ]"#),
        )
        .unwrap();
    assert!(validate(&schema, r#""green""#).is_ok());
    assert_eq!(failure(&schema, r#""blue""#), ValidationFailure::EnumMismatch);
}

#[test]
fn test_numbers_compare_normalized() {
    let schema = self::schema("1.20 // {const: true}", &[]);
    assert!(validate(&schema, "1.2000").is_ok());
    assert!(validate(&schema, "1.2").is_ok());
    assert!(validate(&schema, "1.21").is_err());

    let zero = self::schema("0.0 // {const: true}", &[]);
    assert!(validate(&zero, "-0.0").is_ok());

    let bounded = self::schema("5 // {min: 1, max: 10, exclusiveMaximum: true}", &[]);
    assert!(validate(&bounded, "1").is_ok());
    assert_eq!(
        failure(&bounded, "10"),
        ValidationFailure::AboveMaximum {
            max: Number::from(10u64),
            exclusive: true,
        }
    );
    assert!(validate(&bounded, "2.5").is_err());
}

#[test]
fn test_malformed_documents_fail_at_the_byte() {
    let schema = self::schema("1.5", &[]);
    for (document, index) in [("1.", 2), ("1e", 2), ("01", 1), ("1.5 x", 4)] {
        let error = validate(&schema, document).unwrap_err();
        assert!(matches!(error.kind, ErrorKind::Scan(_)), "{document}");
        assert_eq!(error.index(), Some(index), "{document}");
    }
}

#[test]
fn test_undecodable_string_fails_in_the_document() {
    let schema = self::schema(r#""text""#, &[]);
    let error = validate(&schema, r#""\ud800""#).unwrap_err();
    assert!(error.as_compile().is_none(), "{error}");
    let failure = error.as_validation().cloned();
    assert!(
        matches!(failure, Some(ValidationFailure::InvalidLiteral(ref message)) if message.starts_with("invalid string literal")),
        "{error}"
    );

    let schema = self::schema(r#"["text"]"#, &[]);
    let error = validate(&schema, r#"["x", "\ud800"]"#).unwrap_err();
    assert!(matches!(error.as_validation(), Some(ValidationFailure::InvalidLiteral(_))), "{error}");
    assert_eq!(error.index(), Some(6));
    assert_eq!(error.location.as_ref().map(|l| l.file.name()), Some("document.json"));
}

#[test]
fn test_deeply_nested_documents() {
    let schema = self::schema("@a", &[("@a", "[@a]")]);
    let depth = 2000;
    let document = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
    assert!(validate(&schema, &document).is_ok());

    let document = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
    assert_eq!(
        failure(&schema, &document),
        ValidationFailure::TypeMismatch {
            expected: "array".into(),
            found: JsonType::Integer,
        }
    );
}

#[test]
fn test_key_shortcuts() {
    let schema = schema(r#"{@id: 1}"#, &[("@id", r#""id1" // {regex: "^id"}"#)]);
    assert!(validate(&schema, r#"{"id7": 5, "id8": 6}"#).is_ok());
    assert_eq!(
        failure(&schema, r#"{"x": 5}"#),
        ValidationFailure::UnknownKey("x".into())
    );
    assert_eq!(
        failure(&schema, "{}"),
        ValidationFailure::RequiredKeysNotFound(vec!["@id".into()])
    );
    assert_eq!(
        failure(&schema, r#"{"id1": "five"}"#),
        ValidationFailure::TypeMismatch {
            expected: "integer".into(),
            found: JsonType::String,
        }
    );
}

#[test]
fn test_additional_properties_policies() {
    let cases = [
        (r#"{"a": 1} // {additionalProperties: true}"#, r#"{"a":1,"z":[{}]}"#, true),
        (r#"{"a": 1} // {additionalProperties: "string"}"#, r#"{"a":1,"z":"q"}"#, true),
        (r#"{"a": 1} // {additionalProperties: "string"}"#, r#"{"a":1,"z":2}"#, false),
        (r#"{"a": 1} // {additionalProperties: "email"}"#, r#"{"a":1,"z":"q"}"#, false),
        (r#"{"a": 1} // {additionalProperties: @cat}"#, r#"{"a":1,"z":{"name":"x"}}"#, true),
        (r#"{"a": 1} // {additionalProperties: @cat}"#, r#"{"a":1,"z":{}}"#, false),
        (r#"{"a": 1} // {additionalProperties: @cat | @tag}"#, r#"{"a":1,"z":"t"}"#, true),
    ];
    for (source, document, valid) in cases {
        let schema = schema(source, &[("@cat", r#"{"name": "Tom"}"#), ("@tag", r#""t""#)]);
        assert_eq!(validate(&schema, document).is_ok(), valid, "{source} / {document}");
    }
}

#[test]
fn test_arrays() {
    let schema = self::schema("[1] // {minItems: 1, maxItems: 2}", &[]);
    assert!(validate(&schema, "[7]").is_ok());
    assert_eq!(failure(&schema, "[]"), ValidationFailure::TooFewItems { min: 1 });
    assert_eq!(failure(&schema, "[1,2,3]"), ValidationFailure::TooManyItems { max: 2 });
    assert!(validate(&schema, r#"[1, "a"]"#).is_err());

    let empty = self::schema("[]", &[]);
    assert!(validate(&empty, "[]").is_ok());
    assert_eq!(failure(&empty, "[1]"), ValidationFailure::ArrayNotEmpty);

    let mixed = self::schema(r#"[1, "a"]"#, &[]);
    assert!(validate(&mixed, r#"["b", 2, "c"]"#).is_ok());
    assert!(validate(&mixed, "[true]").is_err());
}

#[test]
fn test_nullable_containers_and_any() {
    let schema = self::schema(
        "{\n  \"a\": {\"b\": 1}, // {nullable: true}\n  \"c\": 1 // {type: \"any\"}\n}",
        &[],
    );
    assert!(validate(&schema, r#"{"a": null, "c": {"x": [1, {"y": null}]}}"#).is_ok());
    assert!(validate(&schema, r#"{"a": {"b": 2}, "c": "text"}"#).is_ok());
    assert!(validate(&schema, r#"{"a": [], "c": 1}"#).is_err());
}

#[test]
fn test_or_rule_with_rule_alternatives() {
    let schema = self::schema(
        "{\n  \"v\": 1 // {or: [{type: \"integer\", min: 0}, {type: \"string\"}]}\n}",
        &[],
    );
    assert!(validate(&schema, r#"{"v": 3}"#).is_ok());
    assert!(validate(&schema, r#"{"v": "s"}"#).is_ok());
    assert_eq!(
        failure(&schema, r#"{"v": -1}"#),
        ValidationFailure::NoAlternativeMatched
    );
}

#[test]
fn test_formats() {
    let cases = [
        (r#""a@b.io" // {type: "email"}"#, r#""x@y.org""#, r#""x@""#),
        (r#""https://a.io" // {type: "uri"}"#, r#""mailto:x@y.org""#, r#""::""#),
        (
            r#""550e8400-e29b-41d4-a716-446655440000" // {type: "uuid"}"#,
            r#""00000000-0000-0000-0000-000000000000""#,
            r#""0000""#,
        ),
        (r#""2021-01-01" // {type: "date"}"#, r#""2024-02-29""#, r#""2023-02-29""#),
        (
            r#""2021-01-01T00:00:00Z" // {type: "datetime"}"#,
            r#""2024-02-29T12:30:00+09:00""#,
            r#""2024-02-29""#,
        ),
    ];
    for (source, good, bad) in cases {
        let schema = self::schema(source, &[]);
        assert!(validate(&schema, good).is_ok(), "{source} / {good}");
        assert!(matches!(
            failure(&schema, bad),
            ValidationFailure::InvalidFormat { .. }
        ));
    }
}

#[test]
fn test_all_of_composition() {
    let schema = schema(
        "{ // {allOf: @base}\n  \"name\": \"x\"\n}",
        &[("@base", r#"{"id": 1}"#)],
    );
    assert!(validate(&schema, r#"{"name": "a", "id": 2}"#).is_ok());
    assert_eq!(
        failure(&schema, r#"{"name": "a"}"#),
        ValidationFailure::RequiredKeysNotFound(vec!["id".into()])
    );
}

#[test]
fn test_compile_errors_surface_on_validate() {
    let schema = schema(
        "@foo",
        &[
            ("@foo", r#"{"bar": @bar}"#),
            ("@bar", r#"{"fizz": @fizz}"#),
            ("@fizz", r#"{"foo": @foo}"#),
        ],
    );
    let error = validate(&schema, "{}").unwrap_err();
    assert_eq!(
        error.as_compile(),
        Some(&CompileError::InfiniteRecursion(
            "@foo -> @bar -> @fizz -> @foo".into()
        ))
    );
}

#[test]
fn test_compiled_schema_is_reusable() {
    let schema = self::schema(r#"{"a": "s"}"#, &[]);
    let compiled = schema.compile().unwrap();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let compiled = &compiled;
                scope.spawn(move || {
                    let document = format!(r#"{{"a": "{i}"}}"#);
                    compiled.validate(SourceFile::new("doc", document))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
    });
    assert!(compiled.validate(SourceFile::new("doc", r#"{"a": 1}"#)).is_err());
    assert!(compiled.validate(SourceFile::new("doc", r#"{"a": "x"}"#)).is_ok());
}
