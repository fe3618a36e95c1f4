//! The samshee binary: output formats and exit codes

use crate::common;

use samshee::error::exit_code;
use samshee::SectionedSheet;
use std::fs;
use tempfile::TempDir;

fn fixture_arg(name: &str) -> String {
    common::fixture_path(name).to_string_lossy().into_owned()
}

#[test]
fn test_v2_output_from_file() {
    let dir = TempDir::new().unwrap();
    let input = fixture_arg("valid_v2");
    let output = common::run_samshee(dir.path(), &[input.as_str()], None);

    assert!(output.status.success(), "stderr: {}", common::stderr_of(&output));
    let stdout = common::stdout_of(&output);
    assert_eq!(
        SectionedSheet::parse(&stdout).unwrap(),
        SectionedSheet::parse(&common::load_fixture("valid_v2")).unwrap()
    );
}

#[test]
fn test_reads_stdin() {
    let dir = TempDir::new().unwrap();
    let output = common::run_samshee(
        dir.path(),
        &["--output-format", "json", "-"],
        Some(&common::load_fixture("valid_v2")),
    );

    assert!(output.status.success(), "stderr: {}", common::stderr_of(&output));
    let tree: serde_json::Value = serde_json::from_str(&common::stdout_of(&output)).unwrap();
    assert_eq!(tree["Header"]["FileFormatVersion"], 2);
}

#[test]
fn test_v1_sheet_converts_to_sectioned_but_not_v2() {
    let dir = TempDir::new().unwrap();
    let input = fixture_arg("v1");

    let output = common::run_samshee(dir.path(), &["--output-format", "sectioned", input.as_str()], None);
    assert!(output.status.success(), "stderr: {}", common::stderr_of(&output));
    assert!(common::stdout_of(&output).starts_with("[Header]\nIEMFileVersion,4\n"));

    let output = common::run_samshee(dir.path(), &[input.as_str()], None);
    assert_eq!(output.status.code(), Some(i32::from(exit_code::OUTPUT)));
    assert!(output.stdout.is_empty());
    assert!(common::stderr_of(&output).contains("illumina SampleSheetv2 schema spec"));
}

#[test]
fn test_exit_codes() {
    let dir = TempDir::new().unwrap();
    let input = fixture_arg("valid_v2");

    let missing = common::run_samshee(dir.path(), &["missing.csv"], None);
    assert_eq!(missing.status.code(), Some(i32::from(exit_code::READ)));

    let rejected = common::run_samshee(
        dir.path(),
        &["--schema", r#"{"required": ["Cloud_Data"]}"#, input.as_str()],
        None,
    );
    assert_eq!(rejected.status.code(), Some(i32::from(exit_code::VALIDATION)));
    assert!(common::stderr_of(&rejected).contains("anonymous validator #0"));

    let format = common::run_samshee(dir.path(), &["--output-format", "yaml", input.as_str()], None);
    assert_eq!(format.status.code(), Some(i32::from(exit_code::FORMAT)));

    let duplicate = common::run_samshee(dir.path(), &[fixture_arg("duplicate_index").as_str()], None);
    assert_eq!(duplicate.status.code(), Some(i32::from(exit_code::OUTPUT)));
}

#[test]
fn test_builtin_schema_reference_on_command_line() {
    let dir = TempDir::new().unwrap();
    let long_index = common::load_fixture("valid_v2").replace("Index1Cycles,8", "Index1Cycles,12");
    let schema = r#"{"$ref": "urn:samshee:nextseq1k2k/v1"}"#;

    let output = common::run_samshee(
        dir.path(),
        &["--schema", schema, "--output-format", "sectioned", "-"],
        Some(&long_index),
    );
    assert_eq!(output.status.code(), Some(i32::from(exit_code::VALIDATION)));
    assert!(common::stderr_of(&output).contains("NextSeq 1000/2000 read length schema"));
}

#[test]
fn test_local_schema_file_and_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("needs-cloud.json"),
        r#"{"title": "needs cloud", "required": ["Cloud_Data"]}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("samshee.yaml"),
        "resolver:\n  base_dir: .\nvalidation:\n  schemas:\n    - { \"$ref\": \"needs-cloud.json\" }\n",
    )
    .unwrap();

    let ok = common::run_samshee(
        dir.path(),
        &["--config", "samshee.yaml", fixture_arg("basespace").as_str()],
        None,
    );
    assert!(ok.status.success(), "stderr: {}", common::stderr_of(&ok));

    let rejected = common::run_samshee(
        dir.path(),
        &["--config", "samshee.yaml", fixture_arg("valid_v2").as_str()],
        None,
    );
    assert_eq!(rejected.status.code(), Some(i32::from(exit_code::OUTPUT)));
    assert!(common::stderr_of(&rejected).contains("needs cloud"));
}

#[test]
fn test_logging_goes_to_stderr() {
    let dir = TempDir::new().unwrap();
    let input = fixture_arg("valid_v2");
    let output = common::run_samshee(dir.path(), &["-vv", "--output-format", "sectioned", input.as_str()], None);

    assert!(output.status.success());
    assert!(common::stdout_of(&output).starts_with("[Header]"));
    assert!(common::stderr_of(&output).contains("read sheet"));
}
