use clap::Parser;
use taskweave::checkpoint_input;
use taskweave::cli::{CliArgs, Command, LogLevel};
use taskweave::logging::resolve_level;
use taskweave::service::CheckpointInput;
use taskweave::types::TaskCategory;
use tracing::Level;

#[test]
fn test_checkpoint_input_success() {
    assert_eq!(
        checkpoint_input("built it".to_string(), false, Vec::new()),
        CheckpointInput::Success {
            detail: "built it".to_string(),
            files: None,
        }
    );
    assert_eq!(
        checkpoint_input("ok".to_string(), false, vec!["a.rs".to_string()]),
        CheckpointInput::Success {
            detail: "ok".to_string(),
            files: Some(vec!["a.rs".to_string()]),
        }
    );
}

#[test]
fn test_checkpoint_input_failure_forms() {
    assert_eq!(
        checkpoint_input("  tests red \n".to_string(), true, Vec::new()),
        CheckpointInput::Failure {
            reason: "tests red".to_string()
        }
    );
    assert_eq!(
        checkpoint_input("FAILED: compile error".to_string(), false, Vec::new()),
        CheckpointInput::Failure {
            reason: "compile error".to_string()
        }
    );
    assert_eq!(
        checkpoint_input("FAILED".to_string(), false, Vec::new()),
        CheckpointInput::Failure {
            reason: String::new()
        }
    );
}

#[test]
fn test_resolve_level_priority() {
    assert_eq!(resolve_level(Some(LogLevel::Debug), Some("error")), Level::DEBUG);
    assert_eq!(resolve_level(None, Some("info")), Level::INFO);
    assert_eq!(resolve_level(None, Some("Warning")), Level::WARN);
    assert_eq!(resolve_level(None, Some(" TRACE ")), Level::TRACE);
    assert_eq!(resolve_level(None, Some("loud")), Level::WARN);
    assert_eq!(resolve_level(None, None), Level::WARN);
}

#[test]
fn test_parse_checkpoint_command() {
    let args = CliArgs::try_parse_from([
        "taskweave",
        "--dir",
        "/tmp/project",
        "checkpoint",
        "002",
        "--detail",
        "done",
        "--files",
        "a.rs",
        "b.rs",
    ])
    .unwrap();
    assert_eq!(args.dir.as_deref(), Some(std::path::Path::new("/tmp/project")));
    match args.command {
        Command::Checkpoint {
            id,
            detail,
            failed,
            files,
        } => {
            assert_eq!(id, "002");
            assert_eq!(detail.as_deref(), Some("done"));
            assert!(!failed);
            assert_eq!(files, vec!["a.rs", "b.rs"]);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_parse_edit_and_add_deps_lists() {
    let args =
        CliArgs::try_parse_from(["taskweave", "edit", "003", "--deps", "001,002", "--category", "backend"])
            .unwrap();
    match args.command {
        Command::Edit { id, deps, category, title, .. } => {
            assert_eq!(id, "003");
            assert_eq!(deps, Some(vec!["001".to_string(), "002".to_string()]));
            assert_eq!(category, Some(TaskCategory::Backend));
            assert_eq!(title, None);
        }
        other => panic!("unexpected command {other:?}"),
    }

    let args = CliArgs::try_parse_from(["taskweave", "add", "Write docs", "--log-level", "debug"]).unwrap();
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    match args.command {
        Command::Add {
            title,
            category,
            description,
            deps,
        } => {
            assert_eq!(title, "Write docs");
            assert_eq!(category, TaskCategory::General);
            assert_eq!(description, "");
            assert!(deps.is_empty());
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_parse_rejects_unknown_input() {
    assert!(CliArgs::try_parse_from(["taskweave", "explode"]).is_err());
    assert!(CliArgs::try_parse_from(["taskweave", "add", "x", "--category", "mobile"]).is_err());
    assert!(matches!(
        CliArgs::try_parse_from(["taskweave", "log"]).unwrap().command,
        Command::Log { limit: 30 }
    ));
    assert!(matches!(
        CliArgs::try_parse_from(["taskweave", "next-batch"]).unwrap().command,
        Command::NextBatch
    ));
}
