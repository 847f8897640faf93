pub mod attributes;
pub mod completion;
pub mod file_parser;
pub mod folder_parser;
pub mod line;
pub mod line_ops;

pub use file_parser::FileTodoParser;
pub use folder_parser::FolderTodoParser;
pub use line::{ParsedLine, line_to_string, parse_line};
pub use line_ops::{LineOperations, TodoParsingResult};
