use std::path::Path;
use std::time::Duration;

use taskweave::config::{load_config, load_from_str, Config, RawConfig};
use taskweave::errors::TaskweaveError;
use taskweave::fs::mock::MockFileSystem;
use taskweave::lock::LockOptions;

#[test]
fn test_defaults() {
    let cfg = Config::default();
    assert!(cfg.auto_commit());
    assert!(cfg.verify_commands().is_empty());
    assert_eq!(cfg.max_retries(), 3);
    assert_eq!(cfg.max_parallel(), None);
    assert_eq!(cfg.summary_compress_threshold(), 50);
    assert_eq!(cfg.lock_timeout(), Duration::from_secs(30));
    assert_eq!(cfg.lock_stale_after(), Duration::from_secs(60));
    assert_eq!(cfg.verify_timeout(), Duration::from_secs(300));
    assert_eq!(cfg.stash_keep(), 5);

    let opts = LockOptions::default();
    assert_eq!(opts.max_wait, Duration::from_secs(30));
    assert_eq!(opts.poll_interval, Duration::from_millis(50));
}

#[test]
fn test_partial_document_keeps_other_defaults() {
    let cfg = load_from_str(r#"{"auto_commit": false, "max_parallel": 2, "extra": 1}"#).unwrap();
    assert!(!cfg.auto_commit());
    assert_eq!(cfg.max_parallel(), Some(2));
    assert_eq!(cfg.max_retries(), 3);
}

#[test]
fn test_invalid_values_are_rejected() {
    for doc in [
        r#"{"max_retries": 0}"#,
        r#"{"max_parallel": 0}"#,
        r#"{"lock_timeout_ms": 0}"#,
        r#"{"verify_timeout_ms": 0}"#,
        r#"{"verify_commands": ["cargo test", "  "]}"#,
    ] {
        assert!(
            matches!(load_from_str(doc), Err(TaskweaveError::ConfigError(_))),
            "{doc} should be rejected"
        );
    }
    assert!(matches!(
        load_from_str("{not json"),
        Err(TaskweaveError::JsonError(_))
    ));
}

#[test]
fn test_missing_or_blank_file_gives_defaults() {
    let fs = MockFileSystem::new();
    let path = Path::new("/p/.taskweave/config.json");
    assert_eq!(load_config(&fs, path).unwrap(), Config::default());

    fs.add_file(path, "  \n");
    assert_eq!(load_config(&fs, path).unwrap(), Config::default());

    fs.add_file(path, r#"{"stash_keep": 9}"#);
    assert_eq!(load_config(&fs, path).unwrap().stash_keep(), 9);
}

#[test]
fn test_raw_config_serializes_every_field() {
    let json = serde_json::to_value(RawConfig::default()).unwrap();
    for key in [
        "auto_commit",
        "verify_commands",
        "verify_timeout_ms",
        "summary_compress_threshold",
        "max_parallel",
        "max_retries",
        "lock_timeout_ms",
        "lock_stale_after_ms",
        "stash_keep",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
}
