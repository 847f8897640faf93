use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use walkdir::WalkDir;

/// Error type for file handle operations
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

/// A document that may contain todos. The host owns the handle; the index and
/// the writer only hold shared references to it.
#[async_trait]
pub trait TodoFile: Send + Sync + fmt::Debug {
    /// Stable identity used as the index key. Reports the new identity after
    /// a rename.
    fn id(&self) -> String;
    /// Display name
    fn name(&self) -> String;
    fn path(&self) -> String;
    fn is_in_folder(&self, folder: &str) -> bool;
    async fn content(&self) -> Result<String, FileError>;
    /// Replace the whole document
    async fn set_content(&self, content: &str) -> Result<(), FileError>;
    async fn last_modified(&self) -> Result<DateTime<Utc>, FileError>;
    async fn rename(&self, new_path: &str) -> Result<(), FileError>;
}

pub type FileHandle = Arc<dyn TodoFile>;

/// A markdown file inside a vault directory.
///
/// The identity is the vault-relative path with `/` separators, so the same
/// note keeps the same id across platforms.
#[derive(Debug)]
pub struct DiskFile {
    root: PathBuf,
    relative: Mutex<String>,
}

impl DiskFile {
    pub fn new(root: impl Into<PathBuf>, relative: impl Into<String>) -> Self {
        DiskFile {
            root: root.into(),
            relative: Mutex::new(relative.into()),
        }
    }

    /// Build a handle from an absolute path under `root`
    pub fn from_path(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        Some(DiskFile::new(root, relative_id(relative)))
    }

    pub fn handle(self) -> FileHandle {
        Arc::new(self)
    }

    fn relative(&self) -> String {
        lock(&self.relative).clone()
    }

    /// Absolute path on disk
    pub fn full_path(&self) -> PathBuf {
        self.root.join(self.relative())
    }
}

#[async_trait]
impl TodoFile for DiskFile {
    fn id(&self) -> String {
        self.relative()
    }

    fn name(&self) -> String {
        let relative = self.relative();
        Path::new(&relative)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(relative.as_str())
            .to_string()
    }

    fn path(&self) -> String {
        self.relative()
    }

    fn is_in_folder(&self, folder: &str) -> bool {
        self.relative()
            .to_lowercase()
            .starts_with(&folder.to_lowercase())
    }

    async fn content(&self) -> Result<String, FileError> {
        let path = self.full_path();
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| FileError::Read { path, source })
    }

    async fn set_content(&self, content: &str) -> Result<(), FileError> {
        let path = self.full_path();
        let bytes = content.as_bytes().to_vec();
        let target = path.clone();
        let result = tokio::task::spawn_blocking(move || atomic_write(&target, &bytes))
            .await
            .unwrap_or_else(|join| Err(std::io::Error::other(join)));
        result.map_err(|source| FileError::Write { path, source })
    }

    async fn last_modified(&self) -> Result<DateTime<Utc>, FileError> {
        let path = self.full_path();
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|source| FileError::Read {
                path: path.clone(),
                source,
            })?;
        let modified = meta
            .modified()
            .map_err(|source| FileError::Read { path, source })?;
        Ok(DateTime::<Utc>::from(modified))
    }

    async fn rename(&self, new_path: &str) -> Result<(), FileError> {
        let from = self.full_path();
        let to = self.root.join(new_path);
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FileError::Rename {
                    from: from.clone(),
                    to: to.clone(),
                    source,
                })?;
        }
        tokio::fs::rename(&from, &to)
            .await
            .map_err(|source| FileError::Rename {
                from,
                to: to.clone(),
                source,
            })?;
        *lock(&self.relative) = new_path.to_string();
        Ok(())
    }
}

/// A document held in memory, for hosts that keep notes outside the
/// filesystem (editor buffers, sync layers) and for tests.
#[derive(Debug)]
pub struct MemoryFile {
    path: Mutex<String>,
    content: Mutex<String>,
    modified: Mutex<DateTime<Utc>>,
    unreadable: bool,
}

impl MemoryFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        MemoryFile {
            path: Mutex::new(path.into()),
            content: Mutex::new(content.into()),
            modified: Mutex::new(Utc::now()),
            unreadable: false,
        }
    }

    /// A file whose reads always fail
    pub fn unreadable(path: impl Into<String>) -> Self {
        MemoryFile {
            unreadable: true,
            ..MemoryFile::new(path, "")
        }
    }

    pub fn handle(self) -> FileHandle {
        Arc::new(self)
    }

    /// Current content, without going through the async API
    pub fn snapshot(&self) -> String {
        lock(&self.content).clone()
    }

    /// Replace the content without going through the async API
    pub fn replace(&self, content: impl Into<String>) {
        *lock(&self.content) = content.into();
        *lock(&self.modified) = Utc::now();
    }
}

#[async_trait]
impl TodoFile for MemoryFile {
    fn id(&self) -> String {
        lock(&self.path).clone()
    }

    fn name(&self) -> String {
        let path = lock(&self.path).clone();
        Path::new(&path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(path.as_str())
            .to_string()
    }

    fn path(&self) -> String {
        lock(&self.path).clone()
    }

    fn is_in_folder(&self, folder: &str) -> bool {
        lock(&self.path)
            .to_lowercase()
            .starts_with(&folder.to_lowercase())
    }

    async fn content(&self) -> Result<String, FileError> {
        if self.unreadable {
            return Err(FileError::Read {
                path: PathBuf::from(self.path()),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "unreadable"),
            });
        }
        Ok(self.snapshot())
    }

    async fn set_content(&self, content: &str) -> Result<(), FileError> {
        self.replace(content);
        Ok(())
    }

    async fn last_modified(&self) -> Result<DateTime<Utc>, FileError> {
        Ok(*lock(&self.modified))
    }

    async fn rename(&self, new_path: &str) -> Result<(), FileError> {
        *lock(&self.path) = new_path.to_string();
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Write `content` to a temp file in the same directory, then move it into
/// place so readers never see a half-written note.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn relative_id(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Collect every markdown file under `root`, sorted by id. Hidden
/// directories (`.git`, `.obsidian`, ...) are skipped.
pub fn scan_vault(root: &Path) -> Vec<FileHandle> {
    let mut files: Vec<DiskFile> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with('.'))
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("md"))
        .filter_map(|entry| DiskFile::from_path(root, entry.path()))
        .collect();
    files.sort_by_key(|f| f.id());
    files.into_iter().map(DiskFile::handle).collect()
}
