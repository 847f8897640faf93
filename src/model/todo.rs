use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::io::file::FileHandle;

/// Todo checkbox state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TodoStatus {
    AttentionRequired,
    Todo,
    InProgress,
    Delegated,
    Complete,
    Canceled,
}

impl TodoStatus {
    /// The character written inside the checkbox `[ ]`
    pub fn checkbox_char(self) -> char {
        match self {
            TodoStatus::Todo => ' ',
            TodoStatus::Canceled => '-',
            TodoStatus::AttentionRequired => '!',
            TodoStatus::Complete => 'x',
            TodoStatus::Delegated => 'd',
            TodoStatus::InProgress => '>',
        }
    }

    /// Map a checkbox character to a status. Case-insensitive; unknown marks
    /// fall back to `Todo`.
    pub fn from_checkbox_char(c: char) -> TodoStatus {
        match c.to_ascii_lowercase() {
            'x' => TodoStatus::Complete,
            ']' | '-' | 'c' => TodoStatus::Canceled,
            '>' => TodoStatus::InProgress,
            '!' => TodoStatus::AttentionRequired,
            'd' => TodoStatus::Delegated,
            _ => TodoStatus::Todo,
        }
    }

    /// Whether the todo is closed (done or dropped)
    pub fn is_closed(self) -> bool {
        matches!(self, TodoStatus::Complete | TodoStatus::Canceled)
    }

    /// Ordering used by list views: active states first, closed states last.
    pub fn sort_rank(self) -> u8 {
        match self {
            TodoStatus::AttentionRequired => 0,
            TodoStatus::InProgress => 1,
            TodoStatus::Todo => 2,
            TodoStatus::Delegated => 3,
            TodoStatus::Complete => 4,
            TodoStatus::Canceled => 5,
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TodoStatus::AttentionRequired => "attention-required",
            TodoStatus::Todo => "todo",
            TodoStatus::InProgress => "in-progress",
            TodoStatus::Delegated => "delegated",
            TodoStatus::Complete => "complete",
            TodoStatus::Canceled => "canceled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}' (expected todo, in-progress, attention-required, delegated, complete or canceled)")]
pub struct UnknownStatus(pub String);

impl FromStr for TodoStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "todo" => Ok(TodoStatus::Todo),
            "in-progress" | "inprogress" | "ongoing" => Ok(TodoStatus::InProgress),
            "attention-required" | "attention" => Ok(TodoStatus::AttentionRequired),
            "delegated" => Ok(TodoStatus::Delegated),
            "complete" | "done" => Ok(TodoStatus::Complete),
            "canceled" | "cancelled" => Ok(TodoStatus::Canceled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// The value of an inline attribute: a bare flag (`@selected`) or text
/// (`@due(2025-01-01)`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Flag,
    Text(String),
}

impl AttributeValue {
    pub fn text(value: impl Into<String>) -> Self {
        AttributeValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Flag => None,
            AttributeValue::Text(s) => Some(s),
        }
    }
}

/// Flags serialize as `true`, text as a plain string.
impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeValue::Flag => serializer.serialize_bool(true),
            AttributeValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

pub type Attributes = IndexMap<String, AttributeValue>;

/// A todo parsed from a checkbox line, with its nested subtasks
#[derive(Debug, Clone)]
pub struct TodoItem {
    pub status: TodoStatus,
    /// Description with list marker, checkbox, date prefix and attributes removed
    pub text: String,
    /// The file this todo was parsed from
    pub file: Option<FileHandle>,
    pub attributes: Attributes,
    /// Zero-based line number at parse time. Goes stale when the file is
    /// edited before the index refreshes.
    pub line: Option<usize>,
    pub subtasks: Vec<TodoItem>,
    pub folder_type: Option<String>,
    pub project: Option<String>,
}

impl TodoItem {
    pub fn new(status: TodoStatus, text: impl Into<String>) -> Self {
        TodoItem {
            status,
            text: text.into(),
            file: None,
            attributes: Attributes::new(),
            line: None,
            subtasks: Vec::new(),
            folder_type: None,
            project: None,
        }
    }

    /// Identity usable by callers to key UI state (fold state, selection).
    pub fn todo_id(&self) -> String {
        let file_id = self.file.as_ref().map(|f| f.id()).unwrap_or_default();
        format!("{}-{}", file_id, self.text)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Stamp `file` on this todo and every nested subtask.
    pub fn set_file_recursive(&mut self, file: &FileHandle) {
        self.file = Some(file.clone());
        for subtask in &mut self.subtasks {
            subtask.set_file_recursive(file);
        }
    }
}

/// Equality ignores the file handle; two todos are equal when they parsed to
/// the same content at the same line.
impl PartialEq for TodoItem {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status
            && self.text == other.text
            && self.attributes == other.attributes
            && self.line == other.line
            && self.subtasks == other.subtasks
            && self.folder_type == other.folder_type
            && self.project == other.project
    }
}

impl Eq for TodoItem {}

/// The root todos parsed from one file
#[derive(Debug, Clone)]
pub struct TodosInFile {
    pub file: FileHandle,
    pub todos: Vec<TodoItem>,
}
