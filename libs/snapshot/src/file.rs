use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::{SnapshotStore, SnapshotWriter};

pub const DEFAULT_SNAPSHOT_PATH: &str = "last_stack.fb";

/// Снимок в одном файле на диске.
///
/// Файл перезаписывается целиком (truncate), права `rw-r--r--`.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open_truncated(&self) -> io::Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut opts = OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        opts.mode(0o644);
        opts.open(&self.path).await
    }
}

impl Default for FileSnapshot {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_PATH)
    }
}

impl SnapshotStore for FileSnapshot {
    fn create(&self) -> Pin<Box<dyn Future<Output = io::Result<SnapshotWriter>> + Send + '_>> {
        Box::pin(async move {
            let file = self.open_truncated().await?;
            tracing::debug!(path = %self.path.display(), "snapshot truncated");
            Ok(Box::new(BufWriter::new(file)) as SnapshotWriter)
        })
    }

    fn replace<'a>(&'a self, bytes: &'a [u8]) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut file = self.open_truncated().await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot replaced");
            Ok(())
        })
    }

    fn load(&self) -> Pin<Box<dyn Future<Output = io::Result<Vec<u8>>> + Send + '_>> {
        Box::pin(async move { tokio::fs::read(&self.path).await })
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
