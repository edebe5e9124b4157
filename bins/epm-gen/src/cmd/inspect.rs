use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use epm_api::{ErrorKind, FrameError, Record, RecordCodec, StreamObserver};
use epm_codec::EpmCodec;
use epm_framing::FrameCodec;
use epm_pipeline::IngestReport;

use super::config::InspectArgs;
use super::error::GenError;

/// Размер буфера чтения файла.
const READ_CAPACITY: usize = 64 * 1024;

pub async fn run(args: &InspectArgs) -> Result<(), GenError> {
    let file = tokio::fs::File::open(&args.path).await.map_err(GenError::file(&args.path))?;
    let len = file.metadata().await.map_err(GenError::file(&args.path))?.len();

    let mut observer = PrintObserver { quiet: args.quiet };
    let mut report = inspect_stream(file, &EpmCodec, &mut observer).await?;
    report.bytes = usize::try_from(len).unwrap_or(usize::MAX);

    tracing::info!(
        path = %args.path,
        bytes = report.bytes,
        records = report.records,
        malformed = report.malformed,
        truncated_at = ?report.truncated_at,
        "stream inspected"
    );
    Ok(())
}

/// Разобрать поток кусками, не загружая его целиком.
///
/// Битые записи пропускаются, обрыв или слишком длинный фрейм завершают
/// разбор. Ошибкой возвращается только I/O.
pub async fn inspect_stream<R>(
    reader: R,
    codec: &dyn RecordCodec,
    observer: &mut dyn StreamObserver,
) -> Result<IngestReport, GenError>
where
    R: AsyncRead + Unpin,
{
    let mut frames = FramedRead::with_capacity(reader, FrameCodec::new(), READ_CAPACITY);
    let mut report = IngestReport::default();
    let mut index = 0;

    while let Some(item) = frames.next().await {
        match item {
            Ok(frame) => match codec.decode(&frame.payload) {
                Ok(record) => {
                    report.records += 1;
                    observer.on_record(index, &record);
                }
                Err(source) => {
                    report.malformed += 1;
                    observer.on_error(index, &FrameError::MalformedRecord { offset: frame.offset, source });
                }
            },
            Err(e) if e.kind() == ErrorKind::Io => return Err(e.into()),
            Err(e) => {
                match &e {
                    FrameError::IncompleteLengthPrefix { offset, .. }
                    | FrameError::IncompleteMessage { offset, .. } => report.truncated_at = Some(*offset),
                    _ => report.malformed += 1,
                }
                observer.on_error(index, &e);
                break;
            }
        }
        index += 1;
    }
    Ok(report)
}

/// Печатает записи в stdout, ошибки фреймов в лог.
struct PrintObserver {
    quiet: bool,
}

impl StreamObserver for PrintObserver {
    fn on_record(&mut self, index: usize, record: &Record) {
        if !self.quiet {
            println!("# {index}\n{record}\n");
        }
    }

    fn on_error(&mut self, index: usize, error: &FrameError) {
        tracing::warn!(index, kind = %error.kind(), error = %error, "frame error");
    }
}
