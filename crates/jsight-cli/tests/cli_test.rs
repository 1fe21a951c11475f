use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

fn scratch_dir(name: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("jsight-cli-{name}-{}", std::process::id()));
    for (path, content) in files {
        let path = dir.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    dir
}

fn jsight(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_jsight"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_validate_documents() {
    let dir = scratch_dir(
        "validate",
        &[
            ("pet.jst", r#"{"name": @name, "age": 3 // {min: 0}
}"#),
            ("name.jst", r#""Tom" // {minLength: 1}"#),
            ("good.json", r#"{"name": "Kitty", "age": 1}"#),
            ("bad.json", "{\"name\": \"Kitty\",\n \"age\": -1}"),
        ],
    );
    let ok = jsight(
        &dir,
        &["validate", "--no-config", "--type", "@name=name.jst", "pet.jst", "good.json"],
    );
    assert!(ok.status.success(), "{}", stderr(&ok));
    assert!(stdout(&ok).contains("good.json"));

    let failed = jsight(
        &dir,
        &["validate", "--no-config", "--type", "@name=name.jst", "pet.jst", "good.json", "bad.json"],
    );
    assert!(!failed.status.success());
    let errors = stderr(&failed);
    assert!(errors.contains("value is less than 0"), "{errors}");
    assert!(errors.contains("bad.json:2:"), "{errors}");
    assert!(errors.contains("1 of 2 document(s) failed"), "{errors}");
}

#[test]
fn test_check_reports_compile_errors() {
    let dir = scratch_dir(
        "check",
        &[
            ("ok.jst", "[1, 2] // {maxItems: 3}"),
            ("broken.jst", "{\n  \"a\": @missing\n}"),
        ],
    );
    let ok = jsight(&dir, &["check", "--no-config", "ok.jst"]);
    assert!(ok.status.success(), "{}", stderr(&ok));

    let failed = jsight(&dir, &["check", "--no-config", "ok.jst", "broken.jst"]);
    assert!(!failed.status.success());
    assert!(stderr(&failed).contains("type @missing is not defined"));
}

#[test]
fn test_check_project_targets() {
    let dir = scratch_dir(
        "project",
        &[
            (
                "jsight.json",
                r#"{
                    "types": {"@cat": "types/cat.jst"},
                    "targets": {"cats": {"schema": "cats.jst", "globs": ["data/*.json"]}},
                    "defaultTargets": ["cats"]
                }"#,
            ),
            ("types/cat.jst", r#"{"name": "Tom"}"#),
            ("cats.jst", "[@cat]"),
            ("data/a.json", r#"[{"name": "A"}]"#),
            ("data/b.json", r#"[{"name": "B"}, {"name": "C"}]"#),
        ],
    );
    let output = jsight(&dir, &["check"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let printed = stdout(&output);
    assert!(printed.contains("[cats]"), "{printed}");
    assert!(printed.contains("2 file(s) ok"), "{printed}");

    let output = jsight(&dir, &["check", "dogs"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown target \"dogs\""));
}

#[test]
fn test_example_and_ast() {
    let dir = scratch_dir(
        "output",
        &[("user.jst", r#"{"id": 1, "email": "a@b.io" // {type: "email"}
}"#)],
    );
    let example = jsight(&dir, &["example", "--no-config", "user.jst"]);
    assert!(example.status.success(), "{}", stderr(&example));
    assert_eq!(stdout(&example), "{\"id\":1,\"email\":\"a@b.io\"}\n");

    let ast = jsight(&dir, &["ast", "--no-config", "--compact", "user.jst"]);
    assert!(ast.status.success(), "{}", stderr(&ast));
    let json: serde_json::Value = serde_json::from_str(&stdout(&ast)).unwrap();
    assert_eq!(json["children"][1]["schemaType"], "email");
}

#[test]
fn test_length() {
    let dir = scratch_dir("length", &[("api.txt", "SCHEMA {\"a\": 1} // note\nNEXT")]);
    let output = jsight(&dir, &["length", "--offset", "7", "api.txt"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "16\n");
}
