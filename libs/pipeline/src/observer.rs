use epm_api::{ErrorKind, FrameError, Record, RecordCodec, StreamObserver};
use epm_framing::parse_stream;

// ═══════════════════════════════════════════════════════════════
//  Report
// ═══════════════════════════════════════════════════════════════

/// Итог разбора одного потока.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub bytes: usize,
    pub records: usize,
    pub malformed: usize,
    /// Смещение, на котором поток оборвался, если оборвался.
    pub truncated_at: Option<usize>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.malformed == 0 && self.truncated_at.is_none()
    }
}

/// Разобрать поток и отдать каждое событие наблюдателю.
///
/// Битые фреймы пропускаются, обрыв завершает разбор.
pub fn observe_stream(bytes: &[u8], codec: &dyn RecordCodec, observer: &mut dyn StreamObserver) -> IngestReport {
    let mut report = IngestReport { bytes: bytes.len(), ..IngestReport::default() };

    for (index, event) in parse_stream(bytes, codec).enumerate() {
        match event {
            Ok(record) => {
                report.records += 1;
                observer.on_record(index, &record);
            }
            Err(e) => {
                match &e {
                    FrameError::IncompleteLengthPrefix { offset, .. }
                    | FrameError::IncompleteMessage { offset, .. } => report.truncated_at = Some(*offset),
                    _ => report.malformed += 1,
                }
                observer.on_error(index, &e);
            }
        }
    }
    report
}

// ═══════════════════════════════════════════════════════════════
//  Observers
// ═══════════════════════════════════════════════════════════════

/// Пишет каждую запись событием `tracing` (уровень info), ошибки на уровне warn.
pub struct TracingObserver {
    version: &'static str,
    source: &'static str,
}

impl TracingObserver {
    /// `version`: file identifier кодека; `source`: откуда пришёл поток (для логов).
    pub fn new(version: &'static str, source: &'static str) -> Self {
        Self { version, source }
    }
}

impl StreamObserver for TracingObserver {
    fn on_record(&mut self, index: usize, record: &Record) {
        tracing::info!(
            source = self.source,
            index,
            version = self.version,
            dn = %record.dn,
            legal_name = %record.legal_name,
            email = %record.email,
            telephone = %record.telephone,
            "record"
        );
    }

    fn on_error(&mut self, index: usize, error: &FrameError) {
        tracing::warn!(source = self.source, index, kind = %error.kind(), error = %error, "frame error");
    }
}

/// Событие разбора в сравнимом виде.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    Record { index: usize, record: Record },
    Error { index: usize, kind: ErrorKind, message: String },
}

/// Собирает события в память.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    pub events: Vec<ObservedEvent>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.events.iter().filter_map(|e| match e {
            ObservedEvent::Record { record, .. } => Some(record),
            ObservedEvent::Error { .. } => None,
        })
    }
}

impl StreamObserver for CollectingObserver {
    fn on_record(&mut self, index: usize, record: &Record) {
        self.events.push(ObservedEvent::Record { index, record: record.clone() });
    }

    fn on_error(&mut self, index: usize, error: &FrameError) {
        self.events.push(ObservedEvent::Error {
            index,
            kind: error.kind(),
            message: error.to_string(),
        });
    }
}
