use taskweave::definition::markdown::parse_markdown;
use taskweave::definition::{validate_definition, DefinitionParser, MarkdownParser};
use taskweave::types::TaskCategory;

#[test]
fn test_parses_name_description_and_tasks() {
    let def = parse_markdown(
        "# Shop\n\
         An online shop\n\
         \n\
         1. [backend] Data model\n\
         \x20\x20Tables for users and orders\n\
         \x20\x20plus migrations\n\
         2. [Frontend] Checkout page (deps: 1)\n\
         3. [ops] Deploy (Deps: 1, 2)\n",
    );
    assert_eq!(def.name, "Shop");
    assert_eq!(def.description, "An online shop");
    assert_eq!(def.tasks.len(), 3);

    assert_eq!(def.tasks[0].title, "Data model");
    assert_eq!(def.tasks[0].category, TaskCategory::Backend);
    assert_eq!(
        def.tasks[0].description,
        "Tables for users and orders\nplus migrations"
    );
    assert_eq!(def.tasks[1].title, "Checkout page");
    assert_eq!(def.tasks[1].category, TaskCategory::Frontend);
    assert_eq!(def.tasks[1].deps, vec!["001"]);
    assert_eq!(def.tasks[2].category, TaskCategory::General);
    assert_eq!(def.tasks[2].deps, vec!["001", "002"]);
}

#[test]
fn test_author_numbers_are_remapped() {
    let def = parse_markdown(
        "# Gaps\n\
         10. [general] First\n\
         20. [general] Second (deps: 10)\n\
         30. [general] Third (dep: 20, 99)\n",
    );
    assert_eq!(def.tasks[1].deps, vec!["001"]);
    assert_eq!(def.tasks[2].deps, vec!["002", "99"]);

    let report = validate_definition(&def);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("unknown task id 99"));
}

#[test]
fn test_padded_references_resolve() {
    let def = MarkdownParser
        .parse("# Pad\n1. [general] A\n2. [general] B (deps: 001)\n")
        .unwrap();
    assert_eq!(def.tasks[1].deps, vec!["001"]);
    assert!(validate_definition(&def).is_ok());
}

#[test]
fn test_validation_reports_structural_errors() {
    let missing_name = parse_markdown("1. [general] A\n");
    let report = validate_definition(&missing_name);
    assert!(!report.is_ok());
    assert!(report.errors.iter().any(|e| e.contains("name is missing")));

    let no_tasks = parse_markdown("# Empty\nJust words\n");
    assert!(validate_definition(&no_tasks)
        .errors
        .iter()
        .any(|e| e.contains("no tasks")));

    let self_dep = parse_markdown("# Self\n1. [general] A (deps: 1)\n");
    assert!(validate_definition(&self_dep)
        .errors
        .iter()
        .any(|e| e.contains("cannot depend on itself")));
}

#[test]
fn test_validation_detects_cycles() {
    let def = parse_markdown(
        "# Loop\n\
         1. [general] A (deps: 3)\n\
         2. [general] B (deps: 1)\n\
         3. [general] C (deps: 2)\n",
    );
    let report = validate_definition(&def);
    assert!(report
        .errors
        .iter()
        .any(|e| e.starts_with("dependency cycle detected involving task")));
}

#[test]
fn test_duplicate_dependency_is_a_warning() {
    let def = parse_markdown("# Dup\n1. [general] A\n2. [general] B (deps: 1, 1)\n");
    let report = validate_definition(&def);
    assert!(report.is_ok());
    assert_eq!(report.warnings.len(), 1);
}
