//! Last-Stack snapshot: копия последнего переданного или принятого потока.
//!
//! Снимок всегда один и перезаписывается целиком; история не хранится.
//! Доступ сериализуется через [`SnapshotGuard`], чтобы generate / ingest /
//! replay не гонялись за один и тот же файл.

mod file;
mod memory;

use std::future::Future;
use std::io;
use std::ops::Deref;
use std::pin::Pin;
use std::sync::Arc;

use tokio::io::AsyncWrite;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub use file::{DEFAULT_SNAPSHOT_PATH, FileSnapshot};
pub use memory::MemorySnapshot;

/// Writer снимка. Пишет в свежеобнулённый снимок.
pub type SnapshotWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Хранилище снимка.
pub trait SnapshotStore: Send + Sync {
    /// Обнулить снимок и вернуть writer для инкрементальной записи.
    fn create(&self) -> Pin<Box<dyn Future<Output = io::Result<SnapshotWriter>> + Send + '_>>;

    /// Заменить снимок байтами `bytes` как есть.
    fn replace<'a>(&'a self, bytes: &'a [u8]) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>>;

    /// Прочитать снимок целиком.
    fn load(&self) -> Pin<Box<dyn Future<Output = io::Result<Vec<u8>>> + Send + '_>>;

    /// Где лежит снимок (для логов).
    fn location(&self) -> String;
}

/// Единственный владелец снимка. Клонируется дёшево, все клоны делят один lock.
#[derive(Clone)]
pub struct SnapshotGuard {
    inner: Arc<Mutex<Box<dyn SnapshotStore>>>,
}

impl SnapshotGuard {
    pub fn new(store: impl SnapshotStore + 'static) -> Self {
        Self::from_boxed(Box::new(store))
    }

    pub fn from_boxed(store: Box<dyn SnapshotStore>) -> Self {
        Self { inner: Arc::new(Mutex::new(store)) }
    }

    /// Дождаться эксклюзивного доступа. Lease можно увести в другую задачу.
    pub async fn lock(&self) -> SnapshotLease {
        SnapshotLease { guard: self.inner.clone().lock_owned().await }
    }
}

/// Эксклюзивный доступ к снимку до drop.
pub struct SnapshotLease {
    guard: OwnedMutexGuard<Box<dyn SnapshotStore>>,
}

impl Deref for SnapshotLease {
    type Target = dyn SnapshotStore;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}
