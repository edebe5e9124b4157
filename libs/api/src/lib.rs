//! Общие типы EPM-стрима: запись, ошибки фрейминга и кодека, контракты
//! между кодеком, фреймером и адаптерами транспорта.
//!
//! Крейт не зависит от tokio: асинхронные контракты (snapshot storage)
//! живут в крейтах, которые их реализуют.

mod error;
mod pipeline;
mod types;

pub use error::{CodecError, ErrorKind, FrameError};
pub use pipeline::{RecordCodec, StreamObserver, ValueSource};
pub use types::{DEFAULT_COUNT, EPM_FILE_ID, LENGTH_PREFIX_LEN, Record};
