use std::sync::Arc;

use futures::future::BoxFuture;

use crate::io::file::{FileError, FileHandle};
use crate::io::logger::Logger;
use crate::model::config::{IndexSettings, Settings};
use crate::model::todo::{TodoItem, TodosInFile};
use crate::ops::event::UpdateEvent;
use crate::parse::file_parser::FileTodoParser;
use crate::parse::folder_parser::FolderTodoParser;
use crate::parse::line_ops::LineOperations;

/// Error type for index transitions
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The host reported a change for a file it never handed to the index
    #[error("file not indexed: {id}")]
    FileNotIndexed { id: String },
    #[error(transparent)]
    Parse(#[from] FileError),
}

/// Live aggregate of the todos found in a set of files.
///
/// The host feeds file lifecycle events; after each change every listener
/// receives the fresh list of root todos.
pub struct TodoIndex {
    files: Vec<TodosInFile>,
    settings: IndexSettings,
    file_parser: Arc<FileTodoParser>,
    folder_parser: FolderTodoParser,
    logger: Arc<dyn Logger>,
    on_update: UpdateEvent<Vec<TodoItem>>,
}

impl TodoIndex {
    pub fn new(settings: &Settings, logger: Arc<dyn Logger>) -> Self {
        let line_operations = LineOperations::with_logger(settings, logger.clone());
        let file_parser = Arc::new(FileTodoParser::new(line_operations));
        TodoIndex {
            files: Vec::new(),
            settings: settings.index_settings(),
            folder_parser: FolderTodoParser::new(file_parser.clone(), logger.clone()),
            file_parser,
            logger,
            on_update: UpdateEvent::new(),
        }
    }

    /// Register a listener for every future change.
    pub fn on_update<F>(&self, listener: F)
    where
        F: Fn(Vec<TodoItem>) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.on_update.listen(listener);
    }

    /// Root todos of every indexed file, in entry order. Subtasks stay
    /// nested under their parents.
    pub fn todos(&self) -> Vec<TodoItem> {
        self.files
            .iter()
            .flat_map(|entry| entry.todos.iter().cloned())
            .collect()
    }

    pub fn files(&self) -> &[TodosInFile] {
        &self.files
    }

    pub fn is_excluded(&self, file: &FileHandle) -> bool {
        let excluded = self.settings.ignore_archived_todos
            && self
                .settings
                .ignored_folders
                .iter()
                .any(|folder| file.is_in_folder(folder));
        if excluded {
            self.logger
                .debug(&format!("File ignored because archived: {}", file.id()));
        }
        excluded
    }

    /// Replace the whole index with `files`, minus excluded ones.
    pub async fn files_loaded(&mut self, files: Vec<FileHandle>) -> Result<(), IndexError> {
        let admitted: Vec<FileHandle> = files
            .into_iter()
            .filter(|file| !self.is_excluded(file))
            .collect();
        self.files = self.folder_parser.parse_files(&admitted).await?;
        self.notify().await;
        Ok(())
    }

    /// Add a new file. A repeated create for an id already in the index
    /// replaces that entry in place, so each file appears at most once.
    pub async fn file_created(&mut self, file: FileHandle) -> Result<(), IndexError> {
        if self.is_excluded(&file) {
            return Ok(());
        }
        let id = file.id();
        self.logger.debug(&format!("File created: {}", id));
        let todos = self.file_parser.parse_md_file(&file).await?;
        let entry = TodosInFile { file, todos };
        match self.files.iter().position(|existing| existing.file.id() == id) {
            Some(position) => {
                self.logger
                    .warn(&format!("File {} was already indexed, replacing it", id));
                self.files[position] = entry;
            }
            None => self.files.push(entry),
        }
        self.notify().await;
        Ok(())
    }

    pub async fn file_updated(&mut self, file: FileHandle) -> Result<(), IndexError> {
        if self.is_excluded(&file) {
            return Ok(());
        }
        self.logger.debug(&format!("File updated: {}", file.id()));
        let position = self.position_of(&file)?;
        let todos = self.file_parser.parse_md_file(&file).await?;
        self.files[position].todos = todos;
        self.notify().await;
        Ok(())
    }

    pub async fn file_deleted(&mut self, file: FileHandle) -> Result<(), IndexError> {
        if self.is_excluded(&file) {
            return Ok(());
        }
        self.logger.debug(&format!("File deleted: {}", file.id()));
        let position = self.position_of(&file)?;
        self.files.remove(position);
        self.notify().await;
        Ok(())
    }

    /// Nothing to do: handles report their new id themselves, so later
    /// lookups by identity find the entry under its new name.
    pub async fn file_renamed(&mut self, old_id: &str, file: FileHandle) -> Result<(), IndexError> {
        self.logger
            .debug(&format!("File renamed from {} to {}", old_id, file.id()));
        Ok(())
    }

    fn position_of(&self, file: &FileHandle) -> Result<usize, IndexError> {
        let id = file.id();
        self.files
            .iter()
            .position(|entry| entry.file.id() == id)
            .ok_or_else(|| {
                self.logger
                    .error(&format!("Could not find file {} in the index", id));
                IndexError::FileNotIndexed { id }
            })
    }

    async fn notify(&self) {
        self.on_update.fire(self.todos()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::file::{MemoryFile, TodoFile};
    use crate::io::logger::{Level, MemoryLogger};
    use futures::FutureExt;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn archive_settings() -> Settings {
        Settings {
            ignored_folders: vec!["archive".to_string()],
            ..Settings::default()
        }
    }

    fn index(settings: &Settings) -> (TodoIndex, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::new());
        (TodoIndex::new(settings, logger.clone()), logger)
    }

    fn texts(todos: &[TodoItem]) -> Vec<String> {
        todos.iter().map(|t| t.text.clone()).collect()
    }

    /// Collects every list delivered to listeners
    fn record(index: &TodoIndex) -> Arc<Mutex<Vec<Vec<String>>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        index.on_update(move |todos| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(texts(&todos));
            }
            .boxed()
        });
        seen
    }

    #[tokio::test]
    async fn test_aggregation_follows_entry_order() {
        let (mut index, _) = index(&Settings::default());
        let a = MemoryFile::new("a.md", "- [ ] A1\n- [ ] A2").handle();
        let b = MemoryFile::new("b.md", "- [ ] B1").handle();
        let c = MemoryFile::new("c.md", "- [ ] C1\n  - [ ] C1 child").handle();

        index.files_loaded(vec![a, b]).await.unwrap();
        index.file_created(c).await.unwrap();

        let todos = index.todos();
        assert_eq!(texts(&todos), vec!["A1", "A2", "B1", "C1"]);
        assert_eq!(texts(&todos[3].subtasks), vec!["C1 child"]);
    }

    #[tokio::test]
    async fn test_repeated_create_keeps_one_entry() {
        let (mut index, logger) = index(&Settings::default());
        let a = Arc::new(MemoryFile::new("a.md", "- [ ] A"));
        let a_handle: FileHandle = a.clone();
        let b = MemoryFile::new("b.md", "- [ ] B").handle();
        index.files_loaded(vec![a_handle, b]).await.unwrap();

        a.replace("- [ ] A again");
        index.file_created(a.clone()).await.unwrap();
        index.file_created(a.clone()).await.unwrap();

        assert_eq!(index.files().len(), 2);
        assert_eq!(texts(&index.todos()), vec!["A again", "B"]);
        assert_eq!(logger.messages(Level::Warn).len(), 2);
    }

    #[tokio::test]
    async fn test_transitions_are_logged_at_debug() {
        let (mut index, logger) = index(&archive_settings());
        let a = MemoryFile::new("a.md", "- [ ] A").handle();
        let old = MemoryFile::new("Archive/old.md", "- [ ] Old").handle();

        index.files_loaded(vec![old]).await.unwrap();
        index.file_created(a.clone()).await.unwrap();
        index.file_updated(a.clone()).await.unwrap();
        index.file_deleted(a).await.unwrap();

        let transitions: Vec<String> = logger
            .messages(Level::Debug)
            .into_iter()
            .filter(|msg| msg.starts_with("File "))
            .collect();
        assert_eq!(
            transitions,
            vec![
                "File ignored because archived: Archive/old.md",
                "File created: a.md",
                "File updated: a.md",
                "File deleted: a.md",
            ]
        );
    }

    #[tokio::test]
    async fn test_excluded_files_never_enter() {
        let (mut index, logger) = index(&archive_settings());
        let live = MemoryFile::new("notes/today.md", "- [ ] Live").handle();
        let old = MemoryFile::new("Archive/2023.md", "- [ ] Old").handle();
        let later = MemoryFile::new("archive/later.md", "- [ ] Later").handle();

        index.files_loaded(vec![live, old.clone()]).await.unwrap();
        index.file_created(later.clone()).await.unwrap();
        assert_eq!(texts(&index.todos()), vec!["Live"]);

        index.file_updated(old.clone()).await.unwrap();
        index.file_deleted(later).await.unwrap();
        assert_eq!(texts(&index.todos()), vec!["Live"]);
        assert!(logger.messages(Level::Error).is_empty());
    }

    #[tokio::test]
    async fn test_exclusion_needs_the_toggle() {
        let settings = Settings {
            ignore_archived_todos: false,
            ..archive_settings()
        };
        let (mut index, _) = index(&settings);
        let old = MemoryFile::new("archive/2023.md", "- [ ] Old").handle();
        index.file_created(old).await.unwrap();
        assert_eq!(texts(&index.todos()), vec!["Old"]);
    }

    #[tokio::test]
    async fn test_update_of_unknown_file_is_an_error() {
        let (mut index, logger) = index(&Settings::default());
        let stranger = MemoryFile::new("stranger.md", "- [ ] Who").handle();

        let err = index.file_updated(stranger.clone()).await.unwrap_err();
        assert!(matches!(err, IndexError::FileNotIndexed { ref id } if id == "stranger.md"));
        assert!(index.file_deleted(stranger).await.is_err());
        assert_eq!(logger.messages(Level::Error).len(), 2);
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let (mut index, _) = index(&Settings::default());
        let a = Arc::new(MemoryFile::new("a.md", "- [ ] First"));
        let a_handle: FileHandle = a.clone();
        let b = MemoryFile::new("b.md", "- [ ] Second").handle();
        index.files_loaded(vec![a_handle, b]).await.unwrap();

        a.replace("- [x] First, done\n- [ ] Another");
        index.file_updated(a.clone()).await.unwrap();

        let todos = index.todos();
        assert_eq!(texts(&todos), vec!["First, done", "Another", "Second"]);
        assert!(todos[0].status.is_closed());
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let (mut index, _) = index(&Settings::default());
        let a = MemoryFile::new("a.md", "- [ ] A").handle();
        let b = MemoryFile::new("b.md", "- [ ] B").handle();
        index.files_loaded(vec![a.clone(), b]).await.unwrap();

        index.file_deleted(a).await.unwrap();
        assert_eq!(texts(&index.todos()), vec!["B"]);
        assert_eq!(index.files().len(), 1);
    }

    #[tokio::test]
    async fn test_files_loaded_discards_previous_entries() {
        let (mut index, _) = index(&Settings::default());
        index
            .files_loaded(vec![MemoryFile::new("a.md", "- [ ] A").handle()])
            .await
            .unwrap();
        index
            .files_loaded(vec![MemoryFile::new("b.md", "- [ ] B").handle()])
            .await
            .unwrap();
        assert_eq!(texts(&index.todos()), vec!["B"]);
    }

    #[tokio::test]
    async fn test_listeners_see_each_change() {
        let (mut index, _) = index(&Settings::default());
        let first = record(&index);
        let a = MemoryFile::new("a.md", "- [ ] A").handle();

        index.files_loaded(vec![a.clone()]).await.unwrap();
        let second = record(&index);
        index
            .file_created(MemoryFile::new("b.md", "- [ ] B").handle())
            .await
            .unwrap();
        index.file_deleted(a).await.unwrap();

        assert_eq!(
            *first.lock().unwrap(),
            vec![vec!["A"], vec!["A", "B"], vec!["B"]]
        );
        assert_eq!(*second.lock().unwrap(), vec![vec!["A", "B"], vec!["B"]]);
    }

    #[tokio::test]
    async fn test_rename_is_a_logged_no_op() {
        let (mut index, logger) = index(&Settings::default());
        let seen = record(&index);
        let file = Arc::new(MemoryFile::new("old.md", "- [ ] Keep"));
        let handle: FileHandle = file.clone();
        index.files_loaded(vec![handle]).await.unwrap();

        file.rename("new.md").await.unwrap();
        index.file_renamed("old.md", file.clone()).await.unwrap();

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(
            logger.messages(Level::Debug).last().map(String::as_str),
            Some("File renamed from old.md to new.md")
        );

        // The handle reports its new id, so updates keep finding the entry.
        file.replace("- [ ] Kept");
        index.file_updated(file).await.unwrap();
        assert_eq!(texts(&index.todos()), vec!["Kept"]);
    }

    #[tokio::test]
    async fn test_failed_parse_leaves_index_untouched() {
        let (mut index, _) = index(&Settings::default());
        index
            .files_loaded(vec![MemoryFile::new("a.md", "- [ ] A").handle()])
            .await
            .unwrap();

        let err = index
            .file_created(MemoryFile::unreadable("locked.md").handle())
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::Parse(_)));
        assert_eq!(texts(&index.todos()), vec!["A"]);
    }
}
