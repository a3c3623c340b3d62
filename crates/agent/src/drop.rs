//! Drop payload resolution.
//!
//! A drop carries file handles and, on native hosts, filesystem paths that
//! may be directories. A [`DropResolver`] flattens that into the list of
//! files handed to ingestion.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use fileagent_record::FileHandle;
use tracing::debug;

use crate::error::AgentError;

#[derive(Debug, Clone)]
pub enum DroppedItem {
    File(FileHandle),
    /// A file or directory on the local filesystem.
    Path(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct DropPayload {
    pub items: Vec<DroppedItem>,
}

impl DropPayload {
    pub fn files(files: impl IntoIterator<Item = FileHandle>) -> Self {
        Self {
            items: files.into_iter().map(DroppedItem::File).collect(),
        }
    }

    pub fn paths(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            items: paths
                .into_iter()
                .map(|p| DroppedItem::Path(p.into()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub type DropFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<FileHandle>, AgentError>> + Send + 'a>>;

/// Turns a drop payload into a flat file list.
pub trait DropResolver: Send + Sync {
    fn resolve<'a>(&'a self, payload: &'a DropPayload) -> DropFuture<'a>;
}

/// Resolves paths on the local filesystem, recursing into directories.
///
/// Directory entries are visited in name order so repeated drops of the
/// same tree produce the same batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDropResolver;

impl FsDropResolver {
    async fn collect(path: PathBuf, files: &mut Vec<FileHandle>) -> Result<(), AgentError> {
        let mut pending = vec![path];
        while let Some(current) = pending.pop() {
            let metadata = tokio::fs::metadata(&current).await?;
            if metadata.is_file() {
                files.push(FileHandle::from_path(&current).await?);
                continue;
            }
            if !metadata.is_dir() {
                continue;
            }

            let mut entries = Vec::new();
            let mut dir = tokio::fs::read_dir(&current).await?;
            while let Some(entry) = dir.next_entry().await? {
                entries.push(entry.path());
            }
            entries.sort();
            debug!(dir = %current.display(), entries = entries.len(), "walking dropped directory");
            // Reverse so the stack pops in name order.
            pending.extend(entries.into_iter().rev());
        }
        Ok(())
    }
}

impl DropResolver for FsDropResolver {
    fn resolve<'a>(&'a self, payload: &'a DropPayload) -> DropFuture<'a> {
        Box::pin(async move {
            let mut files = Vec::new();
            for item in &payload.items {
                match item {
                    DroppedItem::File(file) => files.push(file.clone()),
                    DroppedItem::Path(path) => Self::collect(path.clone(), &mut files).await?,
                }
            }
            Ok(files)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("b.txt"), b"B").unwrap();
        fs::write(root.join("a.png"), b"A").unwrap();
        fs::create_dir_all(root.join("nested").join("deep")).unwrap();
        fs::write(root.join("nested").join("c.pdf"), b"CC").unwrap();
        fs::write(root.join("nested").join("deep").join("d.txt"), b"DDD").unwrap();
        dir
    }

    #[tokio::test]
    async fn walks_directories_in_name_order() {
        let dir = create_test_tree();
        let payload = DropPayload::paths([dir.path()]);
        let files = FsDropResolver.resolve(&payload).await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a.png", "b.txt", "c.pdf", "d.txt"]);
        assert_eq!(files[0].mime_type(), "image/png");
        assert_eq!(files[3].size(), 3);
    }

    #[tokio::test]
    async fn handles_pass_through() {
        let payload = DropPayload::files([FileHandle::new("x.bin", 1, "", 0)]);
        let files = FsDropResolver.resolve(&payload).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name(), "x.bin");
    }

    #[tokio::test]
    async fn missing_path_fails() {
        let payload = DropPayload::paths(["/nonexistent/path/that/does/not/exist"]);
        assert!(FsDropResolver.resolve(&payload).await.is_err());
    }
}
