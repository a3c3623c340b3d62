//! Platform file handles.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use crate::error::RecordError;

/// Where a handle's bytes live.
#[derive(Clone)]
pub enum FileSource {
    /// Content already in memory (e.g. a browser `File` read into a buffer).
    Memory(Arc<[u8]>),
    /// Content on the local filesystem.
    Path(PathBuf),
    /// Metadata only; content cannot be read.
    Detached,
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Detached => f.write_str("Detached"),
        }
    }
}

/// The immutable tuple that identifies a selected file.
///
/// Two handles with the same identity are the same file for duplicate
/// detection, regardless of where their bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub last_modified: i64,
}

/// A raw file as handed over by the platform (file input, drop, path).
#[derive(Debug, Clone)]
pub struct FileHandle {
    name: String,
    size: u64,
    mime_type: String,
    /// Milliseconds since the Unix epoch.
    last_modified: i64,
    source: FileSource,
}

impl FileHandle {
    /// Creates a metadata-only handle.
    pub fn new(
        name: impl Into<String>,
        size: u64,
        mime_type: impl Into<String>,
        last_modified: i64,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            last_modified,
            source: FileSource::Detached,
        }
    }

    /// Creates a handle over in-memory content. Size is taken from the buffer.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        last_modified: i64,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            mime_type: mime_type.into(),
            last_modified,
            source: FileSource::Memory(bytes),
        }
    }

    /// Stats a local file and builds a handle for it.
    ///
    /// The MIME type is guessed from the extension; unknown extensions
    /// yield an empty type, like a browser does.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(RecordError::NotAFile(path.display().to_string()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let last_modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .map(str::to_string)
            .unwrap_or_default();

        Ok(Self {
            name,
            size: metadata.len(),
            mime_type,
            last_modified,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn last_modified(&self) -> i64 {
        self.last_modified
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Lowercased extension without the dot, or empty.
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
            _ => String::new(),
        }
    }

    pub fn identity(&self) -> FileIdentity {
        FileIdentity {
            name: self.name.clone(),
            size: self.size,
            mime_type: self.mime_type.clone(),
            last_modified: self.last_modified,
        }
    }

    /// Whether both handles describe the same file (name, size, type, mtime).
    pub fn same_file(&self, other: &FileHandle) -> bool {
        self.name == other.name
            && self.size == other.size
            && self.mime_type == other.mime_type
            && self.last_modified == other.last_modified
    }

    /// Reads the whole content.
    pub async fn read_all(&self) -> Result<Vec<u8>, RecordError> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.to_vec()),
            FileSource::Path(path) => Ok(tokio::fs::read(path).await?),
            FileSource::Detached => Err(RecordError::Detached(self.name.clone())),
        }
    }
}
