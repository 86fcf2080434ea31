mod common;

use common::{Harness, CHAIN};
use taskweave::service::{CheckpointReport, CommitStatus, FinishOutcome, NextReport};

#[test]
fn test_next_report_shows_task_and_context() {
    let h = Harness::with_definition(CHAIN);
    let text = h.service.next().unwrap().to_string();
    assert!(text.starts_with("=== task 001 [backend] A ===\ndeps: none\n"));
    assert!(text.contains("--- context ---\n# Demo\n\nA small demo\n"));
}

#[test]
fn test_empty_next_report() {
    assert_eq!(NextReport::default().to_string(), "No task is ready to run.");
    let finished = NextReport {
        newly_skipped: vec!["003".to_string()],
        all_finished: true,
        ..NextReport::default()
    };
    assert_eq!(
        finished.to_string(),
        "Skipped (upstream dependency failed): 003\nAll tasks finished. Run `taskweave finish`."
    );
}

#[test]
fn test_checkpoint_report_text() {
    let done = CheckpointReport::Completed {
        id: "002".to_string(),
        done: 2,
        total: 3,
        commit: CommitStatus::Committed,
        all_finished: false,
    };
    assert_eq!(done.to_string(), "Task 002 done (2/3) [committed]");

    let retry = CheckpointReport::Retrying {
        id: "002".to_string(),
        attempt: 1,
        max_retries: 3,
    };
    assert_eq!(
        retry.to_string(),
        "Task 002 failed (attempt 1/3); it will be retried"
    );
}

#[test]
fn test_status_and_show_text() {
    let h = Harness::with_definition(CHAIN);
    h.service.next().unwrap();
    h.complete("001", "schema ready");

    let status = h.service.status(None).unwrap().unwrap().to_string();
    assert!(status.starts_with("Demo [running]\nprogress: 1/3 finished"));
    assert!(status.contains("[x] 001 [backend] A - schema ready"));
    assert!(status.contains("[ ] 002 [frontend] B"));

    let show = h.service.show("001").unwrap().to_string();
    assert!(show.contains("status: done"));
    assert!(show.contains("retries: 0/3"));
    assert!(show.ends_with("--- output ---\n# task-001: A\n\nschema ready"));
}

#[test]
fn test_finish_outcome_text() {
    let outcome = FinishOutcome::Completed {
        done: 2,
        skipped: 1,
        failed: 0,
        scripts: Vec::new(),
    };
    assert_eq!(
        outcome.to_string(),
        "Workflow complete: done 2 | skipped 1 | failed 0\nverified with: none"
    );
}
