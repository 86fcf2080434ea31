// src/definition/markdown.rs

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::definition::model::{TaskSpec, WorkflowDefinition};
use crate::definition::DefinitionParser;
use crate::errors::Result;
use crate::types::{TaskCategory, TaskId};

static TASK_WITH_DEPS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)\.\s+\[\s*([\w-]+)\s*\]\s+(.+)\s+\((?:deps?)\s*:\s*([^)]*)\)\s*$")
        .expect("task-with-deps pattern is valid")
});

static TASK_NO_DEPS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.\s+\[\s*([\w-]+)\s*\]\s+(.+?)\s*$").expect("task pattern is valid")
});

static DESC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\t|\s{2,})(.+)$").expect("description pattern is valid"));

/// Parser for definitions of the form:
///
/// ```text
/// # Workflow name
/// Optional one-line description
/// 1. [backend] Title (deps: 2, 3)
///    indented description lines
/// 2. [frontend] Another title
/// ```
///
/// Unknown categories become `general`. Tasks are numbered `001`, `002`, ...
/// in order of appearance regardless of the numbers the author used.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownParser;

impl DefinitionParser for MarkdownParser {
    fn parse(&self, raw: &str) -> Result<WorkflowDefinition> {
        Ok(parse_markdown(raw))
    }
}

fn is_task_line(line: &str) -> bool {
    TASK_WITH_DEPS_RE.is_match(line) || TASK_NO_DEPS_RE.is_match(line)
}

pub fn parse_markdown(raw: &str) -> WorkflowDefinition {
    let lines: Vec<&str> = raw.lines().map(|l| l.trim_end_matches('\r')).collect();
    let mut def = WorkflowDefinition::default();
    let mut user_deps: Vec<Vec<String>> = Vec::new();
    let mut number_to_id: HashMap<String, TaskId> = HashMap::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        i += 1;

        if def.name.is_empty() {
            if let Some(title) = line.strip_prefix("# ") {
                def.name = title.trim().to_string();
            }
            continue;
        }

        if def.description.is_empty()
            && !line.starts_with('#')
            && !line.trim().is_empty()
            && !is_task_line(line)
        {
            def.description = line.trim().to_string();
            continue;
        }

        let caps = match TASK_WITH_DEPS_RE
            .captures(line)
            .or_else(|| TASK_NO_DEPS_RE.captures(line))
        {
            Some(caps) => caps,
            None => continue,
        };

        let id = WorkflowDefinition::id_of(def.tasks.len());
        let number = caps[1].to_string();
        number_to_id.insert(format!("{number:0>3}"), id.clone());
        number_to_id.insert(number, id);

        let deps: Vec<String> = caps
            .get(4)
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let mut description = Vec::new();
        while i < lines.len() {
            match DESC_RE.captures(lines[i]) {
                Some(desc) => {
                    description.push(desc[1].trim().to_string());
                    i += 1;
                }
                None => break,
            }
        }

        def.tasks.push(TaskSpec {
            title: caps[3].trim().to_string(),
            category: TaskCategory::parse_lenient(&caps[2]),
            deps: Vec::new(),
            description: description.join("\n"),
        });
        user_deps.push(deps);
    }

    // Resolve author numbers to system ids. Unresolvable references are kept
    // as written so validation can report them.
    for (task, deps) in def.tasks.iter_mut().zip(user_deps) {
        task.deps = deps
            .into_iter()
            .map(|d| {
                number_to_id
                    .get(&format!("{d:0>3}"))
                    .or_else(|| number_to_id.get(&d))
                    .cloned()
                    .unwrap_or(d)
            })
            .collect();
    }

    debug!(name = %def.name, tasks = def.tasks.len(), "parsed markdown definition");
    def
}
