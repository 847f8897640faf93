//! Index and edit the checkbox todos embedded in markdown notes.
//!
//! Lines like `- [ ] Call mom @due(2024-05-16)` are parsed into [`TodoItem`]s,
//! nested by indentation, collected across files by a [`TodoIndex`] that the
//! host keeps current with file events, and edited in place by
//! [`FileOperations`] without disturbing anything else in the note.

pub mod cli;
pub mod io;
pub mod model;
pub mod ops;
pub mod parse;

pub use io::file::{DiskFile, FileError, FileHandle, MemoryFile, TodoFile};
pub use io::logger::{Logger, TracingLogger};
pub use model::config::Settings;
pub use model::todo::{AttributeValue, TodoItem, TodoStatus, TodosInFile};
pub use ops::file_ops::{AttributeUpdate, FileOpError, FileOperations};
pub use ops::index::{IndexError, TodoIndex};
