//! Tests for subscriber setup.

use super::*;
use serial_test::serial;

#[test]
fn appender_target_splits_directory_and_name() {
    let (dir, name) = appender_target(Path::new("/var/log/dlm/dlm.log")).unwrap();
    assert_eq!(dir, PathBuf::from("/var/log/dlm"));
    assert_eq!(name, "dlm.log");
}

#[test]
fn appender_target_bare_name_uses_current_directory() {
    let (dir, name) = appender_target(Path::new("dlm.log")).unwrap();
    assert_eq!(dir, PathBuf::from("."));
    assert_eq!(name, "dlm.log");
}

#[test]
fn appender_target_rejects_path_without_file_name() {
    assert!(matches!(
        appender_target(Path::new("/")),
        Err(LoggingError::InvalidPath(_))
    ));
}

#[test]
#[serial(tracing_init)]
fn init_creates_log_directory_if_missing() {
    let temp = tempfile::tempdir().unwrap();
    let log_dir = temp.path().join("state").join("dlm");

    // The subscriber may already be set by another test; the directory is created first.
    let _ = init(&log_dir.join("dlm.log"));

    assert!(log_dir.is_dir(), "Log directory should be created: {:?}", log_dir);
}

#[test]
#[serial(tracing_init)]
fn second_init_reports_subscriber_already_set() {
    let temp = tempfile::tempdir().unwrap();
    let _ = init(&temp.path().join("first.log"));

    assert!(matches!(
        init(&temp.path().join("second.log")),
        Err(LoggingError::SubscriberAlreadySet)
    ));
}

#[test]
#[serial(tracing_init)]
fn env_filter_falls_back_to_default() {
    std::env::remove_var("RUST_LOG");
    assert_eq!(env_filter().to_string(), DEFAULT_FILTER);
}
