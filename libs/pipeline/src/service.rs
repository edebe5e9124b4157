use std::sync::Arc;

use tokio::io::AsyncWrite;

use epm_api::{RecordCodec, StreamObserver, ValueSource};
use epm_codec::EpmCodec;
use epm_framing::write_stream;
use epm_snapshot::{SnapshotGuard, SnapshotLease, SnapshotWriter};

use crate::PipelineError;
use crate::observer::{IngestReport, observe_stream};

// ═══════════════════════════════════════════════════════════════
//  StreamService
// ═══════════════════════════════════════════════════════════════

/// Операции над потоком EPM и снимком последнего потока.
///
/// Все три операции сериализуются на снимке через [`SnapshotGuard`].
#[derive(Clone)]
pub struct StreamService {
    snapshot: SnapshotGuard,
    codec: Arc<dyn RecordCodec>,
}

impl StreamService {
    pub fn new(snapshot: SnapshotGuard, codec: Arc<dyn RecordCodec>) -> Self {
        Self { snapshot, codec }
    }

    /// Сервис с FlatBuffers-кодеком EPM.
    pub fn epm(snapshot: SnapshotGuard) -> Self {
        Self::new(snapshot, Arc::new(EpmCodec::new()))
    }

    pub fn codec(&self) -> &dyn RecordCodec {
        &*self.codec
    }

    /// Захватить снимок и обнулить его.
    ///
    /// Ошибка создания снимка возвращается здесь, до первого байта в сеть.
    /// Снимок остаётся захваченным, пока живёт [`GenerateJob`].
    pub async fn begin_generate(&self) -> Result<GenerateJob, PipelineError> {
        let lease = self.snapshot.lock().await;
        let writer = lease.create().await.map_err(|source| PipelineError::SnapshotCreate {
            location: lease.location(),
            source,
        })?;
        Ok(GenerateJob { lease, writer, codec: self.codec.clone() })
    }

    /// Сгенерировать `count` записей одновременно в `network` и в снимок.
    pub async fn generate(
        &self,
        network: &mut (dyn AsyncWrite + Unpin + Send),
        count: usize,
        source: &mut dyn ValueSource,
    ) -> Result<u64, PipelineError> {
        self.begin_generate().await?.run(network, count, source).await
    }

    /// Сохранить принятые байты в снимок как есть, затем разобрать их.
    pub async fn ingest(
        &self,
        bytes: &[u8],
        observer: &mut dyn StreamObserver,
    ) -> Result<IngestReport, PipelineError> {
        let lease = self.snapshot.lock().await;
        lease.replace(bytes).await.map_err(|source| PipelineError::SnapshotWrite {
            location: lease.location(),
            source,
        })?;
        let report = observe_stream(bytes, &*self.codec, observer);
        tracing::info!(
            snapshot = %lease.location(),
            bytes = report.bytes,
            records = report.records,
            malformed = report.malformed,
            truncated_at = ?report.truncated_at,
            "stream ingested"
        );
        Ok(report)
    }

    /// Разобрать текущий снимок, ничего не записывая.
    pub async fn replay_last(&self, observer: &mut dyn StreamObserver) -> Result<IngestReport, PipelineError> {
        let lease = self.snapshot.lock().await;
        let location = lease.location();
        let bytes = lease
            .load()
            .await
            .map_err(|source| PipelineError::SnapshotRead { location: location.clone(), source })?;
        drop(lease);

        let report = observe_stream(&bytes, &*self.codec, observer);
        tracing::info!(
            snapshot = %location,
            bytes = report.bytes,
            records = report.records,
            malformed = report.malformed,
            truncated_at = ?report.truncated_at,
            "snapshot replayed"
        );
        Ok(report)
    }
}

// ═══════════════════════════════════════════════════════════════
//  GenerateJob
// ═══════════════════════════════════════════════════════════════

/// Генерация с уже захваченным и обнулённым снимком.
pub struct GenerateJob {
    lease: SnapshotLease,
    writer: SnapshotWriter,
    codec: Arc<dyn RecordCodec>,
}

impl GenerateJob {
    /// Записать поток в `network` и снимок. Снимок освобождается по завершении.
    ///
    /// При ошибке записи в снимке остаётся то, что успело уйти до аборта.
    pub async fn run(
        mut self,
        network: &mut (dyn AsyncWrite + Unpin + Send),
        count: usize,
        source: &mut dyn ValueSource,
    ) -> Result<u64, PipelineError> {
        let location = self.lease.location();
        let snapshot: &mut (dyn AsyncWrite + Unpin + Send) = &mut *self.writer;
        let result = write_stream(&mut [network, snapshot], count, source, &*self.codec).await;

        match &result {
            Ok(bytes) => tracing::info!(snapshot = %location, count, bytes, "stream generated"),
            Err(e) => tracing::warn!(snapshot = %location, count, error = %e, "stream generation aborted"),
        }
        result.map_err(PipelineError::Stream)
    }
}
