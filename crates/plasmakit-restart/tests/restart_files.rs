//! Staging restart programs on disk

use plasmakit_restart::{RestartEngine, RestartRequest};
use plasmakit_settings::Config;
use std::fs;
use std::path::Path;

fn engine_writing_to(output: &Path) -> RestartEngine {
    let mut config = Config::default();
    config.restart.output_file = output.to_path_buf();
    RestartEngine::new(config)
}

#[test]
fn test_writes_output_and_records_previous() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("part.ngc");
    let output = dir.path().join("scratch").join("rfl.ngc");
    fs::write(&source, "G21\nG1 X10 Y10\nG1 X20 Y10\n").unwrap();

    let staged = engine_writing_to(&output)
        .restart_file(&source, &RestartRequest::at_line(2), None)
        .unwrap();

    assert_eq!(staged.output_path.as_deref(), Some(output.as_path()));
    assert_eq!(staged.previous_program.as_deref(), Some(source.as_path()));
    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(Some(written.clone()), staged.outcome.program_text());
    assert!(written.ends_with("G1 X20 Y10\n"));
}

#[test]
fn test_rejection_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("part.ngc");
    let output = dir.path().join("rfl.ngc");
    fs::write(&source, "G21\nG41 D1\nG1 X1 Y1\n").unwrap();

    let staged = engine_writing_to(&output)
        .restart_file(&source, &RestartRequest::at_line(2), None)
        .unwrap();

    assert!(staged.outcome.is_rejected());
    assert!(staged.output_path.is_none());
    assert!(staged.previous_program.is_none());
    assert!(!output.exists());
}

#[test]
fn test_restarting_a_restart_keeps_no_previous() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("part.ngc");
    let output = dir.path().join("rfl.ngc");
    fs::write(&source, "G21\nG1 X10 Y10\nG1 X20 Y10\nG1 X20 Y20\n").unwrap();
    let engine = engine_writing_to(&output);

    engine
        .restart_file(&source, &RestartRequest::at_line(2), None)
        .unwrap();
    let again = engine
        .restart_file(&output, &RestartRequest::at_line(0), None)
        .unwrap();
    assert!(again.output_path.is_some());
    assert!(again.previous_program.is_none());
}

#[test]
fn test_explicit_output_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("part.ngc");
    let configured = dir.path().join("configured.ngc");
    let explicit = dir.path().join("explicit.ngc");
    fs::write(&source, "G21\nG1 X1 Y1\nG1 X2 Y2\n").unwrap();

    engine_writing_to(&configured)
        .restart_file(&source, &RestartRequest::at_line(1), Some(&explicit))
        .unwrap();
    assert!(explicit.exists());
    assert!(!configured.exists());
}

#[test]
fn test_missing_source_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = engine_writing_to(&dir.path().join("rfl.ngc"))
        .restart_file(
            &dir.path().join("absent.ngc"),
            &RestartRequest::at_line(0),
            None,
        )
        .unwrap_err();
    assert!(err.is_program_error());
}
