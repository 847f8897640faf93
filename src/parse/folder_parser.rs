use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;

use crate::io::file::{FileError, FileHandle};
use crate::io::logger::Logger;
use crate::model::todo::TodosInFile;
use crate::parse::file_parser::FileTodoParser;

/// Parses a batch of files concurrently.
pub struct FolderTodoParser {
    file_parser: Arc<FileTodoParser>,
    logger: Arc<dyn Logger>,
}

impl FolderTodoParser {
    pub fn new(file_parser: Arc<FileTodoParser>, logger: Arc<dyn Logger>) -> Self {
        FolderTodoParser {
            file_parser,
            logger,
        }
    }

    /// Parse every file. The result lines up with `files` position by
    /// position. One failing read fails the whole batch.
    pub async fn parse_files(&self, files: &[FileHandle]) -> Result<Vec<TodosInFile>, FileError> {
        self.logger.debug(&format!("Loading {} files", files.len()));
        let started = Instant::now();

        let parsed = try_join_all(files.iter().map(|file| async move {
            let todos = self.file_parser.parse_md_file(file).await?;
            Ok::<_, FileError>(TodosInFile {
                file: file.clone(),
                todos,
            })
        }))
        .await?;

        self.logger.debug(&format!(
            "Loaded {} files in {}ms",
            parsed.len(),
            started.elapsed().as_millis()
        ));
        Ok(parsed)
    }
}
