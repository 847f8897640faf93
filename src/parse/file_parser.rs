use crate::io::file::{FileError, FileHandle};
use crate::model::config::Settings;
use crate::model::todo::TodoItem;
use crate::parse::line_ops::{LineOperations, TodoParsingResult};

/// Turns one document into a forest of todos.
pub struct FileTodoParser {
    line_operations: LineOperations,
}

impl Default for FileTodoParser {
    fn default() -> Self {
        FileTodoParser::new(LineOperations::default())
    }
}

impl FileTodoParser {
    pub fn new(line_operations: LineOperations) -> Self {
        FileTodoParser { line_operations }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        FileTodoParser::new(LineOperations::new(settings))
    }

    pub fn line_operations(&self) -> &LineOperations {
        &self.line_operations
    }

    /// Read `file` and parse it. Every returned todo, nested ones included,
    /// carries the file handle.
    pub async fn parse_md_file(&self, file: &FileHandle) -> Result<Vec<TodoItem>, FileError> {
        let content = file.content().await?;
        let mut todos = self.parse_content(&content);
        for todo in &mut todos {
            todo.set_file_recursive(file);
        }
        Ok(todos)
    }

    /// Parse document text into root todos with their subtasks nested.
    ///
    /// Lines are split on `\n` only; a `\r` left at the end of a line ends up
    /// in the remainder and is trimmed off the todo text.
    pub fn parse_content(&self, content: &str) -> Vec<TodoItem> {
        let lines: Vec<&str> = content.split('\n').collect();
        let results: Vec<TodoParsingResult> = lines
            .iter()
            .enumerate()
            .map(|(number, line)| self.line_operations.to_todo(line, number))
            .filter(TodoParsingResult::is_todo)
            .collect();
        build_tree(&lines, results)
    }
}

/// Nest todos by indentation.
///
/// A stack holds the open ancestors, deepest last. For each todo, ancestors
/// at the same or a deeper level are popped; whatever remains on top becomes
/// the parent. Equal indentation therefore makes siblings, and a todo
/// indented further than its predecessor's parent but less than the
/// predecessor attaches to the nearest shallower ancestor.
fn build_tree(lines: &[&str], results: Vec<TodoParsingResult>) -> Vec<TodoItem> {
    let count = results.len();
    let mut parent_of: Vec<Option<usize>> = vec![None; count];
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for (i, result) in results.iter().enumerate() {
        if lines
            .get(result.line_number)
            .is_some_and(|line| line.trim().is_empty())
        {
            continue;
        }
        while stack
            .last()
            .is_some_and(|&(_, level)| level >= result.indent_level)
        {
            stack.pop();
        }
        parent_of[i] = stack.last().map(|&(parent, _)| parent);
        stack.push((i, result.indent_level));
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (i, parent) in parent_of.iter().enumerate() {
        if let Some(parent) = parent {
            children[*parent].push(i);
        }
    }

    // Children always come after their parent, so assembling back to front
    // finishes every subtree before its parent needs it.
    let mut slots: Vec<Option<TodoItem>> = results.into_iter().map(|r| r.todo).collect();
    for i in (0..count).rev() {
        let subtasks: Vec<TodoItem> = children[i]
            .iter()
            .filter_map(|&child| slots[child].take())
            .collect();
        if let Some(todo) = slots[i].as_mut() {
            todo.subtasks = subtasks;
        }
    }

    parent_of
        .iter()
        .enumerate()
        .filter(|(_, parent)| parent.is_none())
        .filter_map(|(i, _)| slots[i].take())
        .collect()
}
