mod common;

use common::{listener, plugin_main, task, ClassFile};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn sample_module() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    common::write_classes(
        temp_dir.path(),
        &[
            plugin_main("io.github.grassmc.sample.SamplePaperPlugin"),
            listener("io.github.grassmc.sample.JoinListener"),
            task("io.github.grassmc.sample.AutoSave"),
        ],
    );
    temp_dir
}

/// Test that the binary runs and shows help
#[test]
fn test_help_command() {
    assert_cmd::cargo_bin_cmd!("classmark")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolve plugin entry points"));
}

#[test]
fn test_version_command() {
    assert_cmd::cargo_bin_cmd!("classmark")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("classmark"));
}

#[test]
fn test_analyze_nonexistent_dir() {
    assert_cmd::cargo_bin_cmd!("classmark")
        .args(["analyze", "/nonexistent/build/classes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_analyze_terminal_output() {
    let temp_dir = sample_module();
    assert_cmd::cargo_bin_cmd!("classmark")
        .args(["analyze", temp_dir.path().to_str().unwrap(), "--module", "sample"])
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("io.github.grassmc.sample.SamplePaperPlugin"))
        .stdout(predicate::str::contains("io.github.grassmc.sample.JoinListener"))
        .stdout(predicate::str::contains("io.github.grassmc.sample.AutoSave"));
}

#[test]
fn test_analyze_json_output() {
    let temp_dir = sample_module();
    let output = assert_cmd::cargo_bin_cmd!("classmark")
        .args(["--format", "json", "analyze", temp_dir.path().to_str().unwrap(), "--module", "sample"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let facts = &json["outcome"]["facts"];
    assert_eq!(facts["module"], "sample");
    assert_eq!(facts["entry_point"], "io.github.grassmc.sample.SamplePaperPlugin");
    assert_eq!(facts["bootstrap_hook"], serde_json::Value::Null);
    assert_eq!(facts["listeners"][0], "io.github.grassmc.sample.JoinListener");
    assert_eq!(facts["scheduled_tasks"][0], "io.github.grassmc.sample.AutoSave");
    assert_eq!(json["diagnostics"], serde_json::json!([]));
}

#[test]
fn test_analyze_fatal_exits_non_zero() {
    let temp_dir = TempDir::new().unwrap();
    common::write_classes(temp_dir.path(), &[plugin_main("s.One"), plugin_main("s.Two")]);

    assert_cmd::cargo_bin_cmd!("classmark")
        .args(["--format", "json", "analyze", temp_dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("multiple_entry_points"))
        .stdout(predicate::str::contains("s.One"));
}

#[test]
fn test_analyze_library_without_entry_point() {
    let temp_dir = TempDir::new().unwrap();
    common::write_classes(temp_dir.path(), &[listener("l.Listener")]);

    assert_cmd::cargo_bin_cmd!("classmark")
        .args(["analyze", temp_dir.path().to_str().unwrap()])
        .assert()
        .failure();

    assert_cmd::cargo_bin_cmd!("classmark")
        .args(["analyze", temp_dir.path().to_str().unwrap(), "--library"])
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("l.Listener"));
}

#[test]
fn test_analyze_exclude_prefix() {
    let temp_dir = TempDir::new().unwrap();
    common::write_classes(
        temp_dir.path(),
        &[plugin_main("p.Plugin"), plugin_main("p.sample.SamplePlugin")],
    );

    assert_cmd::cargo_bin_cmd!("classmark")
        .args([
            "--format",
            "json",
            "analyze",
            temp_dir.path().to_str().unwrap(),
            "--exclude",
            "p.sample.",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"entry_point\": \"p.Plugin\""));
}

#[test]
fn test_analyze_writes_output_file() {
    let temp_dir = sample_module();
    let out_dir = TempDir::new().unwrap();
    let out_path = out_dir.path().join("facts.json");

    assert_cmd::cargo_bin_cmd!("classmark")
        .args([
            "analyze",
            temp_dir.path().to_str().unwrap(),
            "--format",
            "json",
            "--output",
            out_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Results written to"));

    let written = fs::read_to_string(&out_path).unwrap();
    assert!(written.contains("io.github.grassmc.sample.SamplePaperPlugin"));
}

#[test]
fn test_malformed_class_is_reported_on_stderr() {
    let temp_dir = sample_module();
    fs::write(temp_dir.path().join("Broken.class"), [0xCA, 0xFE]).unwrap();

    assert_cmd::cargo_bin_cmd!("classmark")
        .args(["analyze", temp_dir.path().to_str().unwrap()])
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stderr(predicate::str::contains("malformed class Broken.class"));
}

#[test]
fn test_classes_command() {
    let temp_dir = TempDir::new().unwrap();
    common::write_classes(
        temp_dir.path(),
        &[ClassFile::new("a.Main$Inner").nested_in("a.Main"), ClassFile::new("a.Main")],
    );

    let output = assert_cmd::cargo_bin_cmd!("classmark")
        .args(["--format", "json", "classes", temp_dir.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["classes"][0]["name"], "a.Main");
    assert_eq!(json["classes"][1]["name"], "a.Main$Inner");
    assert_eq!(json["classes"][1]["enclosing"], "a.Main");
}

#[test]
fn test_rules_command() {
    assert_cmd::cargo_bin_cmd!("classmark")
        .arg("rules")
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("paper/main"))
        .stdout(predicate::str::contains("bukkit/listener"));
}

#[test]
fn test_rules_command_with_custom_file() {
    let temp_dir = TempDir::new().unwrap();
    let rules_path = temp_dir.path().join("rules.yaml");
    fs::write(
        &rules_path,
        "rules:\n  - id: custom/main\n    target: com.example.Addon\n    kind: entry_point\n",
    )
    .unwrap();

    assert_cmd::cargo_bin_cmd!("classmark")
        .args(["--format", "json", "rules", "--rules", rules_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom/main"))
        .stdout(predicate::str::contains("paper/main").not());
}

#[test]
fn test_rules_command_rejects_bad_file() {
    let temp_dir = TempDir::new().unwrap();
    let rules_path = temp_dir.path().join("rules.yaml");
    fs::write(&rules_path, "rules:\n  - id: broken\n    kind: not_a_kind\n").unwrap();

    assert_cmd::cargo_bin_cmd!("classmark")
        .args(["rules", "--rules", rules_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load rules"));
}

#[test]
fn test_analyze_with_configured_main() {
    let temp_dir = TempDir::new().unwrap();
    common::write_classes(temp_dir.path(), &[plugin_main("s.One"), plugin_main("s.Two")]);

    assert_cmd::cargo_bin_cmd!("classmark")
        .args([
            "--format",
            "json",
            "analyze",
            temp_dir.path().to_str().unwrap(),
            "--main",
            "s.Two",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"entry_point\": \"s.Two\""));
}

#[test]
fn test_analyze_skip_nested() {
    let temp_dir = TempDir::new().unwrap();
    common::write_classes(
        temp_dir.path(),
        &[
            plugin_main("s.Main"),
            ClassFile::new("s.Main$1").anonymous_in("s.Main").implements(common::RUNNABLE).method("run", "()V"),
        ],
    );

    assert_cmd::cargo_bin_cmd!("classmark")
        .args(["--format", "json", "analyze", temp_dir.path().to_str().unwrap(), "--skip-nested"])
        .assert()
        .success()
        .stdout(predicate::str::contains("s.Main$1").not());
}
