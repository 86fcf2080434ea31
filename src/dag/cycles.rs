// src/dag/cycles.rs

use std::collections::HashMap;

use crate::model::Task;
use crate::types::TaskId;

/// Find a dependency cycle among the non-terminal (pending/active) tasks.
///
/// Terminal tasks and unknown dependency ids are ignored. The returned
/// sequence starts and ends with the same id, and each id depends on the
/// next one: `["001", "002", "001"]` means 001 depends on 002 and 002 on 001.
pub fn detect_cycles(tasks: &[Task]) -> Option<Vec<TaskId>> {
    let index: HashMap<&str, usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.is_terminal())
        .map(|(i, t)| (t.id.as_str(), i))
        .collect();

    // Edge direction: task -> dep.
    let adjacency: Vec<Vec<usize>> = tasks
        .iter()
        .map(|t| {
            if t.is_terminal() {
                return Vec::new();
            }
            t.deps
                .iter()
                .filter_map(|d| index.get(d.as_str()).copied())
                .collect()
        })
        .collect();

    let n = tasks.len();
    let mut visited = vec![false; n];
    let mut on_stack = vec![false; n];
    let mut parent: Vec<Option<usize>> = vec![None; n];

    for root in 0..n {
        if visited[root] || tasks[root].is_terminal() {
            continue;
        }

        // Explicit stack of (node, next edge to follow).
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        visited[root] = true;
        on_stack[root] = true;

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            match adjacency[node].get(frame.1).copied() {
                Some(next) => {
                    frame.1 += 1;
                    if on_stack[next] {
                        return Some(reconstruct(tasks, &parent, node, next));
                    }
                    if !visited[next] {
                        visited[next] = true;
                        on_stack[next] = true;
                        parent[next] = Some(node);
                        stack.push((next, 0));
                    }
                }
                None => {
                    on_stack[node] = false;
                    stack.pop();
                }
            }
        }
    }

    None
}

/// Walk parent pointers from `from` back to `to` (the back-edge target).
fn reconstruct(tasks: &[Task], parent: &[Option<usize>], from: usize, to: usize) -> Vec<TaskId> {
    let mut path = vec![from];
    let mut cur = from;
    while cur != to {
        match parent[cur] {
            Some(p) => {
                cur = p;
                path.push(cur);
            }
            None => break,
        }
    }
    path.reverse();
    path.push(to);
    path.into_iter().map(|i| tasks[i].id.clone()).collect()
}
