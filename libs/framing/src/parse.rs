use std::iter::FusedIterator;

use epm_api::{FrameError, LENGTH_PREFIX_LEN, Record, RecordCodec};

/// Один фрейм внутри буфера: смещение префикса длины и payload без префикса.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub offset: usize,
    pub payload: &'a [u8],
}

/// Разбить буфер на фреймы, не заглядывая в payload.
pub fn frames(buf: &[u8]) -> Frames<'_> {
    Frames { buf, offset: 0, done: false }
}

/// Ленивый однопроходный итератор по фреймам буфера.
///
/// На обрыве потока выдаёт `IncompleteLengthPrefix` или `IncompleteMessage`
/// и завершается. Повторный разбор возможен только новым вызовом [`frames`].
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    buf: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> Frames<'a> {
    /// Смещение следующего фрейма.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<Frame<'a>, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let rest = match self.buf.get(self.offset..) {
            Some(rest) if !rest.is_empty() => rest,
            _ => {
                self.done = true;
                return None;
            }
        };

        let Some(prefix) = rest.first_chunk::<LENGTH_PREFIX_LEN>() else {
            self.done = true;
            return Some(Err(FrameError::IncompleteLengthPrefix {
                offset: self.offset,
                remaining: rest.len(),
            }));
        };
        let declared = u32::from_le_bytes(*prefix) as usize;

        let body = &rest[LENGTH_PREFIX_LEN..];
        let Some(payload) = body.get(..declared) else {
            self.done = true;
            return Some(Err(FrameError::IncompleteMessage {
                offset: self.offset,
                declared,
                remaining: body.len(),
            }));
        };

        let frame = Frame { offset: self.offset, payload };
        self.offset += LENGTH_PREFIX_LEN + declared;
        Some(Ok(frame))
    }
}

impl FusedIterator for Frames<'_> {}

/// Разобрать поток в записи.
///
/// Payload, который кодек не смог разобрать, даёт `MalformedRecord`, и разбор
/// продолжается со следующего фрейма: границы фреймов от содержимого
/// payload не зависят.
pub fn parse_stream<'a, C>(buf: &'a [u8], codec: &'a C) -> Records<'a, C>
where
    C: RecordCodec + ?Sized,
{
    Records { frames: frames(buf), codec }
}

/// Итератор записей поверх [`Frames`].
pub struct Records<'a, C: ?Sized> {
    frames: Frames<'a>,
    codec: &'a C,
}

impl<C> Iterator for Records<'_, C>
where
    C: RecordCodec + ?Sized,
{
    type Item = Result<Record, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = match self.frames.next()? {
            Ok(frame) => frame,
            Err(e) => return Some(Err(e)),
        };
        Some(
            self.codec
                .decode(frame.payload)
                .map_err(|source| FrameError::MalformedRecord { offset: frame.offset, source }),
        )
    }
}

impl<C> FusedIterator for Records<'_, C> where C: RecordCodec + ?Sized {}
