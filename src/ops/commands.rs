//! Line edits behind the editor shortcuts. Each takes the line under the
//! cursor and returns its replacement; lines that are not todos come back
//! unchanged.

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::io::logger::Logger;
use crate::model::config::Settings;
use crate::model::todo::{AttributeValue, TodoStatus};
use crate::parse::completion::format_date;
use crate::parse::line_ops::LineOperations;

pub struct LineCommands {
    line_operations: LineOperations,
    completed_attribute: String,
    /// `None` when start times are not tracked
    started_attribute: Option<String>,
}

impl LineCommands {
    pub fn new(settings: &Settings, logger: Arc<dyn Logger>) -> Self {
        LineCommands {
            line_operations: LineOperations::with_logger(settings, logger),
            completed_attribute: settings.completed_date_attribute.clone(),
            started_attribute: settings
                .track_start_time
                .then(|| settings.started_attribute.clone()),
        }
    }

    pub fn line_operations(&self) -> &LineOperations {
        &self.line_operations
    }

    pub fn toggle_checked(&self, line: &str) -> String {
        self.toggle_checked_on(line, Local::now().date_naive())
    }

    /// Check a todo and stamp its completion date, or uncheck it and drop
    /// the date if it is already complete.
    pub fn toggle_checked_on(&self, line: &str, today: NaiveDate) -> String {
        let Some(current) = self.status_of(line) else {
            return line.to_string();
        };
        let ops = &self.line_operations;
        if current == TodoStatus::Complete {
            let line = ops.set_checkmark(line, TodoStatus::Todo.checkbox_char());
            ops.set_attribute(&line, &self.completed_attribute, None)
        } else {
            let line = ops.set_checkmark(line, TodoStatus::Complete.checkbox_char());
            ops.set_attribute(
                &line,
                &self.completed_attribute,
                Some(AttributeValue::Text(format_date(today))),
            )
        }
    }

    pub fn toggle_ongoing(&self, line: &str) -> String {
        self.toggle_ongoing_on(line, Local::now().date_naive())
    }

    /// Mark a todo in progress, or uncheck it if it already is. The first
    /// time a todo starts it gets a start date; an existing one is kept.
    pub fn toggle_ongoing_on(&self, line: &str, today: NaiveDate) -> String {
        let Some(current) = self.status_of(line) else {
            return line.to_string();
        };
        let ops = &self.line_operations;
        if current == TodoStatus::InProgress {
            return ops.set_checkmark(line, TodoStatus::Todo.checkbox_char());
        }
        let line = ops.set_checkmark(line, TodoStatus::InProgress.checkbox_char());
        match &self.started_attribute {
            Some(started) if !self.has_attribute(&line, started) => ops.set_attribute(
                &line,
                started,
                Some(AttributeValue::Text(format_date(today))),
            ),
            _ => line,
        }
    }

    /// Normalize shorthand attributes (`@today`, `@high`, `@due(friday)`).
    pub fn complete_line(&self, line: &str) -> String {
        self.line_operations.convert_attributes(line)
    }

    fn status_of(&self, line: &str) -> Option<TodoStatus> {
        self.line_operations
            .to_todo(line, 0)
            .todo
            .map(|todo| todo.status)
    }

    fn has_attribute(&self, line: &str, name: &str) -> bool {
        let parsed = self.line_operations.parse_line(line);
        self.line_operations
            .parse_attributes(&parsed.remainder)
            .attributes
            .contains_key(name)
    }
}
