pub mod config_io;
pub mod file;
pub mod logger;
