use serde::Serialize;

use crate::model::todo::{Attributes, TodoItem, TodoStatus};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TodoJson {
    /// Stable key for clients that track todos between runs
    pub id: String,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub status: TodoStatus,
    pub text: String,
    #[serde(skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<TodoJson>,
}

#[derive(Serialize)]
pub struct LineChangeJson {
    pub file: String,
    pub line: usize,
    pub content: String,
}

pub fn todo_to_json(todo: &TodoItem) -> TodoJson {
    TodoJson {
        id: todo.todo_id(),
        file: todo.file.as_ref().map(|f| f.id()),
        line: todo.line,
        status: todo.status,
        text: todo.text.clone(),
        attributes: todo.attributes.clone(),
        subtasks: todo.subtasks.iter().map(todo_to_json).collect(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

fn format_attributes(attributes: &Attributes) -> String {
    attributes
        .iter()
        .map(|(key, value)| match value.as_text() {
            Some(text) => format!(" {}={}", key, text),
            None => format!(" {}", key),
        })
        .collect()
}

/// One todo as a single line: `[x] text  key=value flag  (file:line)`
pub fn format_todo_line(todo: &TodoItem) -> String {
    let location = match (&todo.file, todo.line) {
        (Some(file), Some(line)) => format!("  ({}:{})", file.id(), line),
        (Some(file), None) => format!("  ({})", file.id()),
        _ => String::new(),
    };
    let attrs = format_attributes(&todo.attributes);
    let attrs = if attrs.is_empty() {
        attrs
    } else {
        format!(" {}", attrs)
    };
    format!(
        "[{}] {}{}{}",
        todo.status.checkbox_char(),
        todo.text,
        attrs,
        location
    )
}

/// A todo followed by its subtasks, two spaces per level
pub fn format_todo_tree(todo: &TodoItem, indent: usize) -> Vec<String> {
    let mut lines = vec![format!("{}{}", "  ".repeat(indent), format_todo_line(todo))];
    for sub in &todo.subtasks {
        lines.extend(format_todo_tree(sub, indent + 1));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::file::MemoryFile;
    use crate::model::todo::AttributeValue;
    use pretty_assertions::assert_eq;

    fn sample() -> TodoItem {
        let mut todo = TodoItem::new(TodoStatus::InProgress, "Plan trip");
        todo.file = Some(MemoryFile::new("travel.md", "").handle());
        todo.line = Some(3);
        todo.attributes.insert("due".into(), AttributeValue::text("2024-06-01"));
        todo.attributes.insert("selected".into(), AttributeValue::Flag);
        let mut sub = TodoItem::new(TodoStatus::Complete, "Book hotel");
        sub.line = Some(4);
        sub.file = todo.file.clone();
        todo.subtasks.push(sub);
        todo
    }

    #[test]
    fn test_format_todo_tree() {
        let lines = format_todo_tree(&sample(), 0);
        assert_eq!(
            lines,
            vec![
                "[>] Plan trip  due=2024-06-01 selected  (travel.md:3)",
                "  [x] Book hotel  (travel.md:4)",
            ]
        );
    }

    #[test]
    fn test_todo_json() {
        let json = serde_json::to_string_pretty(&todo_to_json(&sample())).unwrap();
        insta::assert_snapshot!(json, @r###"
        {
          "id": "travel.md-Plan trip",
          "file": "travel.md",
          "line": 3,
          "status": "in-progress",
          "text": "Plan trip",
          "attributes": {
            "due": "2024-06-01",
            "selected": true
          },
          "subtasks": [
            {
              "id": "travel.md-Book hotel",
              "file": "travel.md",
              "line": 4,
              "status": "complete",
              "text": "Book hotel"
            }
          ]
        }
        "###);
    }
}
