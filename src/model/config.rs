use serde::{Deserialize, Serialize};

/// Configuration from `.tally.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Write attributes as `[key:: value]` instead of `@key(value)`
    #[serde(default)]
    pub use_dataview_syntax: bool,
    #[serde(default = "default_due_date_attribute")]
    pub due_date_attribute: String,
    #[serde(default = "default_completed_date_attribute")]
    pub completed_date_attribute: String,
    #[serde(default = "default_selected_attribute")]
    pub selected_attribute: String,
    #[serde(default = "default_started_attribute")]
    pub started_attribute: String,
    /// Stamp `started_attribute` when a todo is first marked in progress
    #[serde(default = "default_true")]
    pub track_start_time: bool,
    /// Folders whose files never enter the index (when `ignore_archived_todos`)
    #[serde(default)]
    pub ignored_folders: Vec<String>,
    #[serde(default = "default_true")]
    pub ignore_archived_todos: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            use_dataview_syntax: false,
            due_date_attribute: default_due_date_attribute(),
            completed_date_attribute: default_completed_date_attribute(),
            selected_attribute: default_selected_attribute(),
            started_attribute: default_started_attribute(),
            track_start_time: true,
            ignored_folders: Vec::new(),
            ignore_archived_todos: true,
        }
    }
}

impl Settings {
    /// The subset of settings the index consults for its exclusion policy
    pub fn index_settings(&self) -> IndexSettings {
        IndexSettings {
            ignore_archived_todos: self.ignore_archived_todos,
            ignored_folders: self.ignored_folders.clone(),
        }
    }
}

/// Folder exclusion policy for the todo index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSettings {
    pub ignore_archived_todos: bool,
    pub ignored_folders: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_due_date_attribute() -> String {
    "due".to_string()
}

fn default_completed_date_attribute() -> String {
    "completed".to_string()
}

fn default_selected_attribute() -> String {
    "selected".to_string()
}

fn default_started_attribute() -> String {
    "started".to_string()
}
