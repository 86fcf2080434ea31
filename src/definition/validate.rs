// src/definition/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::definition::model::WorkflowDefinition;

/// Findings of [`validate_definition`]. Any error makes the definition
/// unusable; warnings are informational.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl DefinitionReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate_definition(def: &WorkflowDefinition) -> DefinitionReport {
    let mut report = DefinitionReport::default();

    if def.name.trim().is_empty() {
        report
            .errors
            .push("workflow name is missing (expected a `# <name>` heading)".to_string());
    }
    if def.tasks.is_empty() {
        report
            .errors
            .push("no tasks found (expected lines like `1. [backend] Title`)".to_string());
    }

    let ids: Vec<String> = (0..def.tasks.len()).map(WorkflowDefinition::id_of).collect();
    let known: HashSet<&str> = ids.iter().map(String::as_str).collect();

    for (task, id) in def.tasks.iter().zip(&ids) {
        for dep in &task.deps {
            if !known.contains(dep.as_str()) {
                report.errors.push(format!(
                    "task {id} \"{}\" depends on unknown task id {dep}",
                    task.title
                ));
            }
        }
        if task.deps.iter().any(|d| d == id) {
            report
                .errors
                .push(format!("task {id} \"{}\" cannot depend on itself", task.title));
        }
        let unique: HashSet<&String> = task.deps.iter().collect();
        if unique.len() < task.deps.len() {
            report
                .warnings
                .push(format!("task {id} \"{}\" lists a dependency more than once", task.title));
        }
    }

    if let Some(message) = cycle_error(def, &ids, &known) {
        report.errors.push(message);
    }

    report
}

fn cycle_error(def: &WorkflowDefinition, ids: &[String], known: &HashSet<&str>) -> Option<String> {
    // Edge direction: dep -> task. Self-deps and unknown ids are reported
    // separately, so they are left out here.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for id in ids {
        graph.add_node(id.as_str());
    }
    for (task, id) in def.tasks.iter().zip(ids) {
        for dep in &task.deps {
            if dep != id && known.contains(dep.as_str()) {
                graph.add_edge(dep.as_str(), id.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => None,
        Err(cycle) => Some(format!(
            "dependency cycle detected involving task {}",
            cycle.node_id()
        )),
    }
}
