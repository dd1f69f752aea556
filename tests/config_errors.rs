// tests/config_errors.rs

use std::io::Write;

use checkrun::config::{load_and_validate, load_from_path, parse_str, ConfigFile};
use checkrun::errors::CheckRunError;
use checkrun::types::ControlStatus;
use checkrun::workspace::ModResources;
use checkrun_test_utils::builders::{ConfigFileBuilder, ControlConfigBuilder};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(contents: &str) -> String {
    let file = write_config(contents);
    match load_and_validate(file.path()) {
        Err(CheckRunError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn valid_config_loads_with_defaults() {
    let file = write_config(
        r#"
[dashboard]
name = "storage_compliance"
title = "Storage"
children = ["benchmark.s3", "control.ebs_encrypted"]

[control.ebs_encrypted]
title = "EBS volumes are encrypted"
rows = [
    { resource = "vol-1", status = "ok" },
    { resource = "vol-2", status = "alarm", reason = "unencrypted" },
]

[control.s3_versioning]
error = "access denied"

[benchmark.s3]
children = ["control.s3_versioning"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.config.max_parallel, 10);
    assert_eq!(cfg.dashboard.name, "storage_compliance");
    assert_eq!(cfg.dashboard.children.len(), 2);

    let ebs = &cfg.control["ebs_encrypted"];
    assert_eq!(ebs.rows.len(), 2);
    assert_eq!(ebs.rows[1].status, ControlStatus::Alarm);
    assert_eq!(ebs.rows[1].reason, "unencrypted");
    assert_eq!(
        cfg.control["s3_versioning"].error.as_deref(),
        Some("access denied")
    );

    let resources = ModResources::from_config(&cfg);
    assert!(resources.control("control.ebs_encrypted").is_some());
    let s3 = resources.benchmark("benchmark.s3").unwrap();
    assert_eq!(s3.children, vec!["control.s3_versioning".to_string()]);
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_config("[dashboard\nname = ");
    assert!(matches!(
        load_from_path(file.path()),
        Err(CheckRunError::TomlError(_))
    ));
}

#[test]
fn unknown_row_status_is_rejected_while_parsing() {
    let result = parse_str(
        r#"
[dashboard]
name = "d"
children = ["control.a"]

[control.a]
rows = [{ resource = "r", status = "maybe" }]
"#,
    );
    assert!(matches!(result, Err(CheckRunError::TomlError(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(CheckRunError::IoError(_))));
}

#[test]
fn benchmark_cycle_is_rejected() {
    let msg = expect_config_error(
        r#"
[dashboard]
name = "d"
children = ["benchmark.a"]

[benchmark.a]
children = ["benchmark.b"]

[benchmark.b]
children = ["benchmark.a"]
"#,
    );
    assert!(msg.contains("cycle detected"));
    assert!(msg.contains("'a'") || msg.contains("'b'"));
}

#[test]
fn self_nested_benchmark_is_rejected() {
    let raw = ConfigFileBuilder::new("d")
        .with_child("benchmark.loop")
        .with_benchmark("loop", &["benchmark.loop"])
        .raw();

    match ConfigFile::try_from(raw) {
        Err(CheckRunError::ConfigError(msg)) => assert!(msg.contains("cycle detected")),
        other => panic!("Expected ConfigError, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn unknown_benchmark_child_is_rejected() {
    let msg = expect_config_error(
        r#"
[dashboard]
name = "d"
children = ["benchmark.a"]

[benchmark.a]
children = ["control.nonexistent"]
"#,
    );
    assert!(msg.contains("unknown child"));
    assert!(msg.contains("control.nonexistent"));
}

#[test]
fn benchmark_child_must_be_a_check() {
    let raw = ConfigFileBuilder::new("d")
        .with_child("benchmark.a")
        .with_card("summary")
        .with_benchmark("a", &["card.summary"])
        .raw();

    match ConfigFile::try_from(raw) {
        Err(CheckRunError::ConfigError(msg)) => {
            assert!(msg.contains("card.summary"));
            assert!(msg.contains("only contain controls and benchmarks"));
        }
        other => panic!("Expected ConfigError, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn zero_max_parallel_is_rejected() {
    let msg = expect_config_error(
        r#"
[config]
max_parallel = 0

[dashboard]
name = "d"
children = ["control.a"]
"#,
    );
    assert!(msg.contains("max_parallel must be >= 1"));
}

#[test]
fn dashboard_children_must_be_qualified() {
    let msg = expect_config_error(
        r#"
[dashboard]
name = "d"
children = ["just_a_name"]
"#,
    );
    assert!(msg.contains("[dashboard].children"));
    assert!(msg.contains("just_a_name"));
}

#[test]
fn duplicate_dashboard_children_are_rejected() {
    let raw = ConfigFileBuilder::new("d")
        .with_child("control.a")
        .with_child("control.a")
        .raw();

    match ConfigFile::try_from(raw) {
        Err(CheckRunError::ConfigError(msg)) => assert!(msg.contains("more than once")),
        other => panic!("Expected ConfigError, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn empty_dashboard_is_rejected() {
    let raw = ConfigFileBuilder::new("d").raw();
    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(CheckRunError::ConfigError(_))
    ));
}

#[test]
fn invalid_dashboard_name_is_rejected() {
    let raw = ConfigFileBuilder::new("has space")
        .with_child("control.a")
        .raw();
    match ConfigFile::try_from(raw) {
        Err(CheckRunError::ConfigError(msg)) => assert!(msg.contains("[dashboard].name")),
        other => panic!("Expected ConfigError, got: {:?}", other.map(|_| ())),
    }
}

#[test]
fn dashboard_may_reference_undeclared_controls() {
    let cfg = ConfigFileBuilder::new("d")
        .with_child("control.declared")
        .with_child("control.undeclared")
        .with_control(
            "declared",
            ControlConfigBuilder::new()
                .title("Declared")
                .row("r1", ControlStatus::Ok)
                .build(),
        )
        .build();

    let resources = ModResources::from_config(&cfg);
    assert!(resources.control("control.declared").is_some());
    assert!(resources.leaf_node("control.undeclared").is_none());
    assert_eq!(
        resources.leaf_node_or_ref("control.undeclared").block_type(),
        "control"
    );
}
