use chrono::Duration;
use taskweave::model::WorkflowState;
use taskweave::store::document::{parse, render};
use taskweave::types::TaskStatus::{Active, Done, Failed, Pending, Skipped};
use taskweave::types::{TaskCategory, WorkflowStatus};
use taskweave_test_utils::builders::{epoch, task, TaskBuilder, WorkflowStateBuilder};

fn sample_state() -> WorkflowState {
    let mut failed = TaskBuilder::new("003")
        .title("Wire the UI")
        .category(TaskCategory::Frontend)
        .status(Failed)
        .deps(&["001", "002"])
        .description("Hook up the settings page")
        .build();
    failed.retries = 2;
    failed.fail_history = vec![
        "[attempt 1] compile error".to_string(),
        "[attempt 2] tests failed".to_string(),
    ];
    failed.timestamps.last_failed = Some(epoch() + Duration::minutes(30));

    let mut done = TaskBuilder::new("001")
        .title("Schema")
        .category(TaskCategory::Backend)
        .status(Done)
        .summary("tables created")
        .started(epoch() + Duration::minutes(1))
        .build();
    done.timestamps.completed = Some(epoch() + Duration::minutes(9));

    WorkflowStateBuilder::new("Demo workflow")
        .with_task(done)
        .with_task(
            TaskBuilder::new("002")
                .status(Active)
                .deps(&["001"])
                .started(epoch() + Duration::minutes(10))
                .build(),
        )
        .with_task(failed)
        .with_task(task("004", Skipped, &["003"]))
        .with_task(task("005", Pending, &[]))
        .verified(true)
        .build()
}

#[test]
fn test_render_then_parse_preserves_state() {
    let state = sample_state();
    let text = render(&state);
    let parsed = parse(&text).expect("document has a title");
    assert_eq!(parsed, state);
}

#[test]
fn test_render_is_human_readable() {
    let text = render(&sample_state());
    assert!(text.starts_with("# Demo workflow\n"));
    assert!(text.contains("Status: running"));
    assert!(text.contains("| 003 | Wire the UI | frontend | 001,002 | failed | 2 | - | Hook up the settings page |"));
    assert!(text.contains("<!-- meta: "));
}

#[test]
fn test_cells_are_escaped() {
    let state = WorkflowStateBuilder::new("w")
        .with_task(
            TaskBuilder::new("001")
                .title("a | b")
                .summary("line one\nline two")
                .build(),
        )
        .build();
    let text = render(&state);
    assert!(text.contains("| a ∣ b |"));

    let parsed = parse(&text).unwrap();
    assert_eq!(parsed.tasks[0].title, "a ∣ b");
    assert_eq!(parsed.tasks[0].summary, "line one line two");
    assert_eq!(parsed.tasks[0].description, "");
}

#[test]
fn test_parse_without_title_is_none() {
    assert!(parse("").is_none());
    assert!(parse("Status: running\n| 001 | x | general | - | pending | 0 | - | - |\n").is_none());
}

#[test]
fn test_parse_is_lenient() {
    let text = "\
# Hand edited

Status: bogus

| ID | Title | Category | Deps | Status | Retries | Summary | Description |
|----|-------|----------|------|--------|---------|---------|-------------|
| 001 | First | mobile | - | weird | 0 | - | - |
| 002 | Second | backend | 001 | done | 1 | ok | - |
this line is noise
| x | broken row |
";
    let state = parse(text).unwrap();
    assert_eq!(state.name, "Hand edited");
    assert_eq!(state.status, WorkflowStatus::Idle);
    assert_eq!(state.tasks.len(), 2);
    assert_eq!(state.tasks[0].category, TaskCategory::General);
    assert_eq!(state.tasks[0].status, Pending);
    assert_eq!(state.tasks[1].deps, vec!["001"]);
    assert_eq!(state.tasks[1].retries, 1);
    assert!(state.tasks[1].fail_history.is_empty());
    assert!(state.active_task_ids.is_empty());
    assert!(!state.review_done);
}

#[test]
fn test_unreadable_meta_is_ignored() {
    let state = sample_state();
    let text = render(&state).replace("<!-- meta: {", "<!-- meta: {oops");
    let parsed = parse(&text).unwrap();
    assert_eq!(parsed.tasks.len(), state.tasks.len());
    assert!(parsed.active_task_ids.is_empty());
    assert!(!parsed.verified);
}
