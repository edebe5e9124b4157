//! Адаптер транспорта и persistence поверх фреймера.
//!
//! - generate: codec → framer → {сеть, снимок}
//! - ingest: байты → снимок (как есть) → framer → codec → observer
//! - replay: снимок → framer → codec → observer, без записи

pub mod error;
mod observer;
mod service;
mod source;

pub use error::PipelineError;
pub use observer::{CollectingObserver, IngestReport, ObservedEvent, TracingObserver, observe_stream};
pub use service::{GenerateJob, StreamService};
pub use source::{RandomValues, values_for};
