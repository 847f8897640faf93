use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::io::logger::{Logger, TracingLogger};
use crate::model::config::Settings;
use crate::model::todo::{AttributeValue, TodoItem, TodoStatus};
use crate::parse::attributes::{self, AttributeSyntax, AttributesStructure};
use crate::parse::completion::{complete_date, complete_priority, format_date};
use crate::parse::line::{self, ParsedLine, indent_level};

/// Result of running the grammar over one line of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoParsingResult {
    pub line_number: usize,
    /// Present when the line carries a checkbox
    pub todo: Option<TodoItem>,
    pub indent_level: usize,
}

impl TodoParsingResult {
    pub fn is_todo(&self) -> bool {
        self.todo.is_some()
    }
}

/// Line-level grammar bound to one attribute syntax.
///
/// The syntax is chosen once from [`Settings::use_dataview_syntax`]; every
/// other operation is syntax-agnostic.
pub struct LineOperations {
    syntax: Box<dyn AttributeSyntax>,
    due_date_attribute: String,
    logger: Arc<dyn Logger>,
}

impl Default for LineOperations {
    fn default() -> Self {
        LineOperations::new(&Settings::default())
    }
}

impl LineOperations {
    pub fn new(settings: &Settings) -> Self {
        LineOperations::with_logger(settings, Arc::new(TracingLogger))
    }

    pub fn with_logger(settings: &Settings, logger: Arc<dyn Logger>) -> Self {
        LineOperations {
            syntax: attributes::syntax_for(settings.use_dataview_syntax),
            due_date_attribute: settings.due_date_attribute.clone(),
            logger,
        }
    }

    pub fn syntax(&self) -> &dyn AttributeSyntax {
        self.syntax.as_ref()
    }

    pub fn parse_line(&self, raw: &str) -> ParsedLine {
        line::parse_line(raw)
    }

    pub fn line_to_string(&self, parsed: &ParsedLine) -> String {
        line::line_to_string(parsed)
    }

    pub fn parse_attributes(&self, text: &str) -> AttributesStructure {
        attributes::parse_attributes(self.syntax(), &self.due_date_attribute, text)
    }

    pub fn attributes_to_string(&self, structure: &AttributesStructure) -> String {
        attributes::attributes_to_string(self.syntax(), structure)
    }

    /// Parse a line as a todo. Lines without a checkbox are not todos but
    /// still report their indentation.
    pub fn to_todo(&self, raw: &str, line_number: usize) -> TodoParsingResult {
        let parsed = self.parse_line(raw);
        let indent_level = indent_level(&parsed.indentation);
        let todo = parsed.checkbox_mark().map(|mark| {
            let structure = self.parse_attributes(&parsed.remainder);
            let mut todo = TodoItem::new(
                TodoStatus::from_checkbox_char(mark),
                structure.text_without_attributes,
            );
            todo.attributes = structure.attributes;
            todo.line = Some(line_number);
            todo
        });
        TodoParsingResult {
            line_number,
            todo,
            indent_level,
        }
    }

    /// Force the checkbox to `[mark]`, adding one if missing.
    pub fn set_checkmark(&self, raw: &str, mark: char) -> String {
        let mut parsed = self.parse_line(raw);
        parsed.set_checkbox(mark);
        self.line_to_string(&parsed)
    }

    /// Remove the checkbox if present, otherwise add `[ ]`.
    pub fn toggle_todo(&self, raw: &str) -> String {
        let mut parsed = self.parse_line(raw);
        if parsed.has_checkbox() {
            parsed.clear_checkbox();
        } else {
            parsed.set_checkbox(' ');
        }
        self.line_to_string(&parsed)
    }

    /// Set `name` to `value` on a line, or remove it when `value` is `None`.
    /// Everything outside the attribute list is left as it was.
    pub fn set_attribute(&self, raw: &str, name: &str, value: Option<AttributeValue>) -> String {
        let mut parsed = self.parse_line(raw);
        let mut structure = self.parse_attributes(&parsed.remainder);
        match value {
            Some(value) => {
                structure.attributes.insert(name.to_string(), value);
            }
            None => {
                structure.attributes.shift_remove(name);
            }
        }
        parsed.remainder = self.attributes_to_string(&structure);
        self.line_to_string(&parsed)
    }

    /// Normalize shorthand attributes on a line, relative to today.
    pub fn convert_attributes(&self, raw: &str) -> String {
        self.convert_attributes_on(raw, Local::now().date_naive())
    }

    /// Normalize shorthand attributes: date expressions become ISO dates
    /// (`@due(tomorrow)`, `@today`) and priority flags become
    /// `@priority(<word>)` (`@high`).
    pub fn convert_attributes_on(&self, raw: &str, today: NaiveDate) -> String {
        let mut parsed = self.parse_line(raw);
        let mut structure = self.parse_attributes(&parsed.remainder);
        self.convert_date_attributes(&mut structure, today);
        convert_priority_attributes(&mut structure);
        parsed.remainder = self.attributes_to_string(&structure);
        self.line_to_string(&parsed)
    }

    fn convert_date_attributes(&self, structure: &mut AttributesStructure, today: NaiveDate) {
        let keys: Vec<String> = structure.attributes.keys().cloned().collect();
        for key in keys {
            let Some(value) = structure.attributes.get(&key).cloned() else {
                continue;
            };
            match value {
                AttributeValue::Text(text) => {
                    if let Some(date) = self.resolve_date(&text, today) {
                        structure
                            .attributes
                            .insert(key, AttributeValue::Text(format_date(date)));
                    }
                }
                AttributeValue::Flag => {
                    if let Some(date) = self.resolve_date(&key, today) {
                        structure.attributes.shift_remove(&key);
                        structure.attributes.insert(
                            self.due_date_attribute.clone(),
                            AttributeValue::Text(format_date(date)),
                        );
                    }
                }
            }
        }
    }

    fn resolve_date(&self, expression: &str, today: NaiveDate) -> Option<NaiveDate> {
        match complete_date(expression, today) {
            Ok(date) => date,
            Err(e) => {
                self.logger.error(&format!("Date completion failed: {}", e));
                None
            }
        }
    }
}

fn convert_priority_attributes(structure: &mut AttributesStructure) {
    let keys: Vec<String> = structure.attributes.keys().cloned().collect();
    for key in keys {
        if let Some(priority) = complete_priority(&key) {
            structure.attributes.shift_remove(&key);
            structure
                .attributes
                .insert("priority".to_string(), AttributeValue::text(priority));
        }
    }
}
