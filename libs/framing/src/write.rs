use tokio::io::{AsyncWrite, AsyncWriteExt};

use epm_api::{FrameError, LENGTH_PREFIX_LEN, Record, RecordCodec, ValueSource};

/// Дописать `[u32 LE length][payload]` в выходной буфер.
pub fn frame_payload(payload: &[u8], buf: &mut Vec<u8>) -> Result<(), FrameError> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::FrameTooLarge {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;
    buf.reserve(LENGTH_PREFIX_LEN + payload.len());
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(payload);
    Ok(())
}

/// Закодировать запись в готовый фрейм.
pub fn encode_frame<C>(codec: &C, record: &Record) -> Result<Vec<u8>, FrameError>
where
    C: RecordCodec + ?Sized,
{
    let payload = codec.encode(record).map_err(FrameError::Encode)?;
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    frame_payload(&payload, &mut frame)?;
    Ok(frame)
}

/// Сгенерировать `count` записей и записать поток во все `sinks`.
///
/// Каждый фрейм уходит во все sink'и по порядку, прежде чем генерируется
/// следующий; весь поток в памяти не держится. Первая же ошибка записи
/// прерывает генерацию: sink'и остаются с тем, что успели получить.
///
/// Возвращает число байт, записанных в каждый sink.
pub async fn write_stream<C, S>(
    sinks: &mut [&mut (dyn AsyncWrite + Unpin + Send)],
    count: usize,
    source: &mut S,
    codec: &C,
) -> Result<u64, FrameError>
where
    C: RecordCodec + ?Sized,
    S: ValueSource + ?Sized,
{
    let mut frame = Vec::new();
    let mut written = 0u64;

    for index in 0..count {
        let record = source.next_record(index);
        let payload = codec.encode(&record).map_err(FrameError::Encode)?;
        frame.clear();
        frame_payload(&payload, &mut frame)?;

        let mut failed = None;
        for (sink_index, sink) in sinks.iter_mut().enumerate() {
            if let Err(e) = sink.write_all(&frame).await {
                failed = Some((sink_index, e));
                break;
            }
        }
        if let Some((sink_index, e)) = failed {
            tracing::warn!(sink = sink_index, frame = index, written, error = %e, "sink write failed, aborting stream");
            flush_quietly(sinks).await;
            return Err(FrameError::Io(e));
        }
        written += frame.len() as u64;
    }

    for sink in sinks.iter_mut() {
        sink.flush().await?;
    }
    Ok(written)
}

/// Дослать уже записанное после аборта; ошибки здесь не важны.
async fn flush_quietly(sinks: &mut [&mut (dyn AsyncWrite + Unpin + Send)]) {
    for sink in sinks.iter_mut() {
        let _ = sink.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_little_endian_payload_length() {
        let mut buf = Vec::new();
        frame_payload(&[7u8; 258], &mut buf).unwrap();
        assert_eq!(&buf[..4], &[2, 1, 0, 0]);
        assert_eq!(buf.len(), 262);
    }

    #[test]
    fn frames_append() {
        let mut buf = Vec::new();
        frame_payload(b"ab", &mut buf).unwrap();
        frame_payload(b"", &mut buf).unwrap();
        assert_eq!(buf, [2, 0, 0, 0, b'a', b'b', 0, 0, 0, 0]);
    }
}
