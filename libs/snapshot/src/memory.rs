use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use tokio::io::AsyncWrite;

use crate::{SnapshotStore, SnapshotWriter};

/// In-memory снимок для тестов и dry-run режимов.
///
/// Клоны делят одно содержимое, так что тест может держать клон и
/// смотреть, что записал сервис.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    data: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Текущее содержимое; `None`, если снимок ещё не создавался.
    pub fn contents(&self) -> Option<Vec<u8>> {
        lock(&self.data).clone()
    }
}

fn lock(data: &Mutex<Option<Vec<u8>>>) -> MutexGuard<'_, Option<Vec<u8>>> {
    data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SnapshotStore for MemorySnapshot {
    fn create(&self) -> Pin<Box<dyn Future<Output = io::Result<SnapshotWriter>> + Send + '_>> {
        Box::pin(async move {
            *lock(&self.data) = Some(Vec::new());
            Ok(Box::new(MemoryWriter { data: self.data.clone() }) as SnapshotWriter)
        })
    }

    fn replace<'a>(&'a self, bytes: &'a [u8]) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            *lock(&self.data) = Some(bytes.to_vec());
            Ok(())
        })
    }

    fn load(&self) -> Pin<Box<dyn Future<Output = io::Result<Vec<u8>>> + Send + '_>> {
        Box::pin(async move {
            self.contents()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "snapshot not written yet"))
        })
    }

    fn location(&self) -> String {
        "memory".into()
    }
}

struct MemoryWriter {
    data: Arc<Mutex<Option<Vec<u8>>>>,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        lock(&self.data).get_or_insert_with(Vec::new).extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[tokio::test]
    async fn unwritten_snapshot_is_not_found() {
        let snap = MemorySnapshot::new();
        assert_eq!(snap.load().await.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn create_resets_previous_contents() {
        let snap = MemorySnapshot::new();
        snap.replace(b"old stream").await.unwrap();

        let mut writer = snap.create().await.unwrap();
        assert_eq!(snap.contents().unwrap(), b"");
        writer.write_all(b"new").await.unwrap();

        assert_eq!(snap.load().await.unwrap(), b"new");
    }
}
