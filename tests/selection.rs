use std::time::Duration;

use chrono::Duration as ChronoDuration;
use taskweave::dag::{
    ensure_no_batch_in_flight, find_next_task, find_parallel_tasks, stale_active_tasks, Scheduler,
};
use taskweave::errors::TaskweaveError;
use taskweave::types::TaskStatus::{Active, Done, Failed, Pending, Skipped};
use taskweave::types::WorkflowStatus;
use taskweave_test_utils::builders::{epoch, task, TaskBuilder, WorkflowStateBuilder};

#[test]
fn test_parallel_selection_returns_all_ready_roots() {
    // A, B (needs A), C: A and C can run together.
    let mut tasks = vec![
        task("001", Pending, &[]),
        task("002", Pending, &["001"]),
        task("003", Pending, &[]),
    ];
    let selection = find_parallel_tasks(&mut tasks, None).unwrap();
    assert_eq!(selection.picked, vec![0, 2]);

    tasks[0].status = Done;
    tasks[2].status = Done;
    let selection = find_parallel_tasks(&mut tasks, None).unwrap();
    assert_eq!(selection.picked, vec![1]);
}

#[test]
fn test_next_task_is_first_in_definition_order() {
    let mut tasks = vec![
        task("001", Done, &[]),
        task("002", Pending, &["001"]),
        task("003", Pending, &[]),
    ];
    assert_eq!(find_next_task(&mut tasks).unwrap().picked, vec![1]);
}

#[test]
fn test_missing_dependency_is_never_satisfied() {
    let mut tasks = vec![task("001", Pending, &["042"])];
    assert!(find_parallel_tasks(&mut tasks, None).unwrap().picked.is_empty());
}

#[test]
fn test_max_parallel_truncates_batch() {
    let mut tasks = vec![
        task("001", Pending, &[]),
        task("002", Pending, &[]),
        task("003", Pending, &[]),
    ];
    let selection = find_parallel_tasks(&mut tasks, Some(2)).unwrap();
    assert_eq!(selection.picked, vec![0, 1]);
}

#[test]
fn test_selection_cascades_before_picking() {
    let mut tasks = vec![
        task("001", Failed, &[]),
        task("002", Pending, &["001"]),
        task("003", Pending, &[]),
    ];
    let selection = find_parallel_tasks(&mut tasks, None).unwrap();
    assert_eq!(selection.newly_skipped, vec!["002"]);
    assert_eq!(selection.picked, vec![2]);
    assert_eq!(tasks[1].status, Skipped);
}

#[test]
fn test_cycle_aborts_selection_without_mutation() {
    let mut tasks = vec![
        task("001", Failed, &[]),
        task("002", Pending, &["001"]),
        task("003", Pending, &["004"]),
        task("004", Pending, &["003"]),
    ];
    let before = tasks.clone();

    let err = find_next_task(&mut tasks).unwrap_err();
    assert!(matches!(err, TaskweaveError::DependencyCycle(_)));
    assert_eq!(tasks, before);
}

#[test]
fn test_dispatch_marks_tasks_active() {
    let mut state = WorkflowStateBuilder::new("w")
        .with_task(task("001", Pending, &[]))
        .with_task(task("002", Pending, &[]))
        .with_task(task("003", Pending, &["001"]))
        .build();
    let now = epoch() + ChronoDuration::minutes(5);

    let step = Scheduler::new(None).dispatch_batch(&mut state, now).unwrap();

    assert_eq!(step.dispatched, vec!["001", "002"]);
    assert!(!step.workflow_finishing);
    assert_eq!(state.active_task_ids, vec!["001", "002"]);
    assert_eq!(state.tasks[0].status, Active);
    assert_eq!(state.tasks[0].timestamps.started, Some(now));
    assert_eq!(state.tasks[2].status, Pending);
}

#[test]
fn test_dispatch_refused_while_batch_in_flight() {
    let mut state = WorkflowStateBuilder::new("w")
        .with_task(task("001", Active, &[]))
        .with_task(task("002", Pending, &[]))
        .build();

    assert!(ensure_no_batch_in_flight(&state).is_err());
    let err = Scheduler::default().dispatch_next(&mut state, epoch()).unwrap_err();
    match err {
        TaskweaveError::BatchInFlight(ids) => assert_eq!(ids, vec!["001"]),
        other => panic!("expected BatchInFlight, got {other:?}"),
    }
    assert_eq!(state.tasks[1].status, Pending);
}

#[test]
fn test_dispatch_refused_when_paused() {
    let mut state = WorkflowStateBuilder::new("w")
        .status(WorkflowStatus::Idle)
        .with_task(task("001", Pending, &[]))
        .build();
    let err = Scheduler::default().dispatch_next(&mut state, epoch()).unwrap_err();
    assert!(matches!(err, TaskweaveError::InvalidState(_)));
}

#[test]
fn test_dispatch_moves_finished_workflow_to_finishing() {
    let mut state = WorkflowStateBuilder::new("w")
        .with_task(task("001", Done, &[]))
        .with_task(task("002", Failed, &[]))
        .build();
    let step = Scheduler::default().dispatch_batch(&mut state, epoch()).unwrap();
    assert!(step.dispatched.is_empty());
    assert!(step.workflow_finishing);
    assert_eq!(state.status, WorkflowStatus::Finishing);
}

#[test]
fn test_stale_active_tasks() {
    let now = epoch() + ChronoDuration::hours(1);
    let tasks = vec![
        TaskBuilder::new("001").status(Active).started(epoch()).build(),
        TaskBuilder::new("002")
            .status(Active)
            .started(now - ChronoDuration::seconds(10))
            .build(),
        TaskBuilder::new("003").status(Done).started(epoch()).build(),
        TaskBuilder::new("004").status(Active).build(),
    ];
    assert_eq!(
        stale_active_tasks(&tasks, now, Duration::from_secs(60)),
        vec!["001"]
    );
}

#[test]
fn test_join_runs_after_both_parents() {
    let mut tasks = vec![
        task("001", Pending, &[]),
        task("002", Pending, &["001"]),
        task("003", Pending, &["001", "002"]),
    ];
    assert_eq!(find_parallel_tasks(&mut tasks, None).unwrap().picked, vec![0]);

    tasks[0].status = Done;
    assert_eq!(find_parallel_tasks(&mut tasks, None).unwrap().picked, vec![1]);

    tasks[1].status = Done;
    assert_eq!(find_parallel_tasks(&mut tasks, None).unwrap().picked, vec![2]);
}
