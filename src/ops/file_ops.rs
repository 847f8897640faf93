use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::io::file::{FileError, FileHandle};
use crate::io::logger::Logger;
use crate::model::config::Settings;
use crate::model::todo::{AttributeValue, TodoItem};
use crate::parse::completion::format_date;
use crate::parse::line_ops::LineOperations;

/// Error type for in-place todo edits
#[derive(Debug, thiserror::Error)]
pub enum FileOpError {
    #[error(transparent)]
    File(#[from] FileError),
    /// The todo's line number no longer exists in the file
    #[error("line {line} is out of range (file has {len} lines)")]
    LineOutOfRange { line: usize, len: usize },
}

/// What to do with one attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeUpdate {
    Set(AttributeValue),
    Remove,
}

impl From<AttributeValue> for AttributeUpdate {
    fn from(value: AttributeValue) -> Self {
        AttributeUpdate::Set(value)
    }
}

/// Rewrites single todo lines in their files.
///
/// Each call re-reads the file, changes exactly one line and writes the whole
/// content back with the file's line endings. Calls against the same file
/// must be awaited one after another; concurrent calls race and the last
/// write wins.
pub struct FileOperations {
    line_operations: LineOperations,
    logger: Arc<dyn Logger>,
}

impl FileOperations {
    pub fn new(settings: &Settings, logger: Arc<dyn Logger>) -> Self {
        FileOperations {
            line_operations: LineOperations::with_logger(settings, logger.clone()),
            logger,
        }
    }

    pub fn line_operations(&self) -> &LineOperations {
        &self.line_operations
    }

    pub async fn update_attribute(
        &self,
        todo: &TodoItem,
        name: &str,
        update: impl Into<AttributeUpdate>,
    ) -> Result<(), FileOpError> {
        let update = update.into();
        let Some((file, line)) = self.locate(todo) else {
            return Ok(());
        };
        self.update_line(&file, line, |raw| self.apply_attribute(raw, name, &update))
            .await
    }

    /// Delete `name` from the todo's line. Absent keys are fine.
    pub async fn remove_attribute(&self, todo: &TodoItem, name: &str) -> Result<(), FileOpError> {
        self.update_attribute(todo, name, AttributeUpdate::Remove).await
    }

    /// Write the todo's current in-memory status to its checkbox, then stamp
    /// or clear `completed_attribute`. Uses today's local date.
    pub async fn update_todo_status(
        &self,
        todo: &TodoItem,
        completed_attribute: &str,
    ) -> Result<(), FileOpError> {
        self.update_todo_status_on(todo, completed_attribute, Local::now().date_naive())
            .await
    }

    /// Two separate read-modify-write passes: the checkbox first, then the
    /// completion attribute (set to `today` for closed states, removed
    /// otherwise).
    pub async fn update_todo_status_on(
        &self,
        todo: &TodoItem,
        completed_attribute: &str,
        today: NaiveDate,
    ) -> Result<(), FileOpError> {
        let Some((file, line)) = self.locate(todo) else {
            return Ok(());
        };
        let mark = todo.status.checkbox_char();
        self.update_line(&file, line, |raw| self.line_operations.set_checkmark(raw, mark))
            .await?;

        let update = if todo.status.is_closed() {
            AttributeUpdate::Set(AttributeValue::Text(format_date(today)))
        } else {
            AttributeUpdate::Remove
        };
        self.update_attribute(todo, completed_attribute, update).await
    }

    /// Replace line `line` of `file` with `edit(old_line)`.
    ///
    /// The file uses `\r\n` throughout if it contains one anywhere, `\n`
    /// otherwise.
    pub async fn update_line<F>(&self, file: &FileHandle, line: usize, edit: F) -> Result<(), FileOpError>
    where
        F: FnOnce(&str) -> String,
    {
        let content = file.content().await?;
        let eol = if content.contains("\r\n") { "\r\n" } else { "\n" };
        let mut lines: Vec<String> = content.split(eol).map(str::to_string).collect();
        let len = lines.len();
        let Some(target) = lines.get_mut(line) else {
            return Err(FileOpError::LineOutOfRange { line, len });
        };
        let edited = edit(target.as_str());
        *target = edited;
        file.set_content(&lines.join(eol)).await?;
        Ok(())
    }

    fn apply_attribute(&self, raw: &str, name: &str, update: &AttributeUpdate) -> String {
        let value = match update {
            AttributeUpdate::Set(value) => Some(value.clone()),
            AttributeUpdate::Remove => None,
        };
        self.line_operations.set_attribute(raw, name, value)
    }

    fn locate(&self, todo: &TodoItem) -> Option<(FileHandle, usize)> {
        let Some(file) = todo.file.clone() else {
            self.logger
                .error(&format!("Todo '{}' has no file, not updating", todo.text));
            return None;
        };
        let Some(line) = todo.line else {
            self.logger.error(&format!(
                "Todo '{}' in {} has no line number, not updating",
                todo.text,
                file.id()
            ));
            return None;
        };
        Some((file, line))
    }
}
