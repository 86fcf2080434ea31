use taskweave::dag::detect_cycles;
use taskweave::model::Task;
use taskweave::types::TaskStatus::{Active, Done, Pending};
use taskweave_test_utils::builders::task;

fn assert_closed_cycle(tasks: &[Task], cycle: &[String]) {
    assert!(cycle.len() >= 2, "cycle too short: {cycle:?}");
    assert_eq!(cycle.first(), cycle.last());
    for pair in cycle.windows(2) {
        let from = tasks.iter().find(|t| t.id == pair[0]).unwrap();
        assert!(
            from.deps.contains(&pair[1]),
            "{} does not depend on {} in {cycle:?}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_chain_has_no_cycle() {
    let tasks = vec![
        task("001", Pending, &[]),
        task("002", Pending, &["001"]),
        task("003", Pending, &["002"]),
    ];
    assert_eq!(detect_cycles(&tasks), None);
}

#[test]
fn test_two_task_cycle_starts_and_ends_with_same_id() {
    let tasks = vec![task("001", Pending, &["002"]), task("002", Pending, &["001"])];
    let cycle = detect_cycles(&tasks).expect("cycle");
    assert_eq!(cycle, vec!["001", "002", "001"]);
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let tasks = vec![task("001", Pending, &["001"])];
    assert_eq!(detect_cycles(&tasks), Some(vec!["001".to_string(), "001".to_string()]));
}

#[test]
fn test_cycle_through_terminal_task_is_ignored() {
    let tasks = vec![task("001", Done, &["002"]), task("002", Pending, &["001"])];
    assert_eq!(detect_cycles(&tasks), None);
}

#[test]
fn test_cycle_found_away_from_first_task() {
    let tasks = vec![
        task("001", Pending, &[]),
        task("002", Active, &["003"]),
        task("003", Pending, &["004"]),
        task("004", Pending, &["002"]),
    ];
    let cycle = detect_cycles(&tasks).expect("cycle");
    assert_eq!(cycle.len(), 4);
    assert_closed_cycle(&tasks, &cycle);
}

#[test]
fn test_unknown_dependencies_are_ignored() {
    let tasks = vec![task("001", Pending, &["999"])];
    assert_eq!(detect_cycles(&tasks), None);
}
