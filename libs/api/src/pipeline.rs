use crate::{CodecError, FrameError, Record};

// ════════════════════════════════════════════════════════════════
//  Stream Traits
// ════════════════════════════════════════════════════════════════

/// Кодек одной записи: поля ↔ payload.
///
/// Payload не содержит префикса длины: его вычисляет фреймер.
/// Внутренняя раскладка полей принадлежит схеме кодека.
pub trait RecordCodec: Send + Sync {
    /// Закодировать запись. Детерминирован для одинаковых полей.
    fn encode(&self, record: &Record) -> Result<Vec<u8>, CodecError>;

    /// Декодировать payload (file identifier + данные полей).
    fn decode(&self, payload: &[u8]) -> Result<Record, CodecError>;

    /// File identifier, который кодек встраивает в каждый payload.
    fn file_identifier(&self) -> &'static str;
}

/// Источник значений полей для генерации потока.
pub trait ValueSource: Send {
    /// Значения для записи с порядковым номером `index`.
    fn next_record(&mut self, index: usize) -> Record;
}

impl<F> ValueSource for F
where
    F: FnMut(usize) -> Record + Send,
{
    fn next_record(&mut self, index: usize) -> Record {
        self(index)
    }
}

/// Наблюдатель за результатами разбора потока.
///
/// `index`: порядковый номер фрейма в потоке, начиная с нуля.
pub trait StreamObserver: Send {
    fn on_record(&mut self, index: usize, record: &Record);

    fn on_error(&mut self, index: usize, error: &FrameError);
}
