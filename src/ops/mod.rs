pub mod commands;
pub mod event;
pub mod file_ops;
pub mod index;
pub mod matcher;

pub use commands::LineCommands;
pub use event::UpdateEvent;
pub use file_ops::{AttributeUpdate, FileOpError, FileOperations};
pub use index::{IndexError, TodoIndex};
pub use matcher::TodoMatcher;
