use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tally::io::file::{FileHandle, MemoryFile};
use tally::io::logger::MemoryLogger;
use tally::model::config::Settings;
use tally::model::todo::{AttributeValue, TodoItem, TodoStatus};
use tally::ops::file_ops::FileOperations;
use tally::parse::{FileTodoParser, line_to_string, parse_line};

fn read_fixture(fixture_name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(fixture_name);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Could not read fixture {}: {}", fixture_name, e))
}

/// Helper: every line of a fixture survives parse + serialize byte-for-byte
fn assert_lines_round_trip(fixture_name: &str) {
    let source = read_fixture(fixture_name);
    let output: Vec<String> = source
        .split('\n')
        .map(|line| line_to_string(&parse_line(line)))
        .collect();

    assert_eq!(
        output.join("\n"),
        source,
        "Round-trip failed for fixture: {}",
        fixture_name
    );
}

fn texts(todos: &[TodoItem]) -> Vec<&str> {
    todos.iter().map(|t| t.text.as_str()).collect()
}

// ============================================================================
// Line round-trip tests
// ============================================================================

#[test]
fn round_trip_weekly_note() {
    assert_lines_round_trip("weekly.md");
}

#[test]
fn round_trip_crlf_note() {
    assert_lines_round_trip("crlf.md");
}

#[test]
fn round_trip_dataview_note() {
    assert_lines_round_trip("dataview.md");
}

// ============================================================================
// File parsing
// ============================================================================

#[test]
fn parse_weekly_note_tree() {
    let todos = FileTodoParser::default().parse_content(&read_fixture("weekly.md"));

    assert_eq!(
        texts(&todos),
        vec![
            "Draft the quarterly report",
            "Ping legal about the contract",
            "Hand off onboarding to Sam",
            "Old idea with   odd spacing",
            "Farmers market",
            "Renew passport",
            "no space after marker",
        ]
    );

    let report = &todos[0];
    assert_eq!(report.line, Some(6));
    assert_eq!(texts(&report.subtasks), vec!["Collect numbers", "Write summary"]);
    assert_eq!(texts(&report.subtasks[1].subtasks), vec!["Tabbed follow-up"]);
    assert_eq!(report.subtasks[0].status, TodoStatus::Complete);
    assert_eq!(report.subtasks[1].status, TodoStatus::InProgress);

    let statuses: Vec<TodoStatus> = todos[1..4].iter().map(|t| t.status).collect();
    assert_eq!(
        statuses,
        vec![
            TodoStatus::AttentionRequired,
            TodoStatus::Delegated,
            TodoStatus::Canceled
        ]
    );

    assert_eq!(todos[4].attribute("due"), Some(&AttributeValue::text("2024-05-18")));
    assert_eq!(texts(&todos[6].subtasks), vec!["Deeply indented orphan"]);
}

#[test]
fn parse_dataview_note() {
    let settings = Settings {
        use_dataview_syntax: true,
        ..Settings::default()
    };
    let todos = FileTodoParser::from_settings(&settings).parse_content(&read_fixture("dataview.md"));

    assert_eq!(texts(&todos), vec!["Pay rent", "Book flights"]);
    assert_eq!(todos[0].attribute("priority"), Some(&AttributeValue::text("high")));
    assert_eq!(todos[1].attribute("selected"), Some(&AttributeValue::Flag));
    assert_eq!(texts(&todos[1].subtasks), vec!["Pick seats"]);
}

// ============================================================================
// Mutation round-trips
// ============================================================================

async fn parsed_file(content: String) -> (Arc<MemoryFile>, Vec<TodoItem>) {
    let file = Arc::new(MemoryFile::new("note.md", content));
    let handle: FileHandle = file.clone();
    let todos = FileTodoParser::default()
        .parse_md_file(&handle)
        .await
        .unwrap();
    (file, todos)
}

#[tokio::test]
async fn set_attribute_leaves_other_lines_alone() {
    let source = read_fixture("weekly.md");
    let (file, todos) = parsed_file(source.clone()).await;
    let ops = FileOperations::new(&Settings::default(), Arc::new(MemoryLogger::new()));

    // "Write summary", nested two levels down
    let summary = &todos[0].subtasks[1];
    ops.update_attribute(summary, "priority", AttributeValue::text("high"))
        .await
        .unwrap();

    let before: Vec<&str> = source.split('\n').collect();
    let after_content = file.snapshot();
    let after: Vec<&str> = after_content.split('\n').collect();
    assert_eq!(after.len(), before.len());
    for (number, (old, new)) in before.iter().zip(&after).enumerate() {
        if number == 8 {
            assert_eq!(*new, "  - [>] Write summary @priority(high)");
        } else {
            assert_eq!(old, new, "line {} changed", number);
        }
    }
}

#[tokio::test]
async fn status_change_on_crlf_note_keeps_line_endings() {
    let source = read_fixture("crlf.md");
    let (file, todos) = parsed_file(source).await;
    let ops = FileOperations::new(&Settings::default(), Arc::new(MemoryLogger::new()));

    let mut child = todos[0].subtasks[0].clone();
    assert_eq!(child.text, "Windows child");
    child.status = TodoStatus::Todo;
    ops.update_todo_status(&child, "completed").await.unwrap();

    assert_eq!(
        file.snapshot(),
        "- [ ] Windows line one @due(2024-06-01)\r\n  - [ ] Windows child\r\n\r\nTrailing prose\r\n"
    );
}
