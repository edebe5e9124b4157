//! Tokio codec для потокового разбора фреймов.
//!
//! В отличие от [`frames`](crate::frames), не требует всего потока в памяти:
//! байты приходят кусками произвольного размера, состояние разбора живёт
//! в кодеке между вызовами.
//!
//! ```text
//! AwaitingLengthPrefix ──4 байта──▶ AwaitingPayload(len) ──len байт──▶ frame
//!          ▲                                                            │
//!          └────────────────────────────────────────────────────────────┘
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use epm_api::{FrameError, LENGTH_PREFIX_LEN};

/// Верхняя граница разового резерва под payload.
const MAX_RESERVE: usize = 1024 * 1024;

/// Payload фрейма и смещение его префикса от начала потока.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub offset: usize,
    pub payload: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    AwaitingLengthPrefix,
    AwaitingPayload { declared: usize },
}

/// Length-prefixed codec: `[u32 LE length][payload]`.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    state: DecodeState,
    /// Смещение начала текущего фрейма.
    frame_start: usize,
    /// 0 = без ограничения.
    max_frame_len: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    pub fn new() -> Self {
        Self {
            state: DecodeState::AwaitingLengthPrefix,
            frame_start: 0,
            max_frame_len: 0,
        }
    }

    /// Отклонять фреймы с объявленной длиной больше `max` байт.
    pub fn with_max_frame_len(max: usize) -> Self {
        Self { max_frame_len: max, ..Self::new() }
    }

    /// Разбор стоит на границе фрейма.
    pub fn is_idle(&self) -> bool {
        self.state == DecodeState::AwaitingLengthPrefix
    }
}

impl Decoder for FrameCodec {
    type Item = DecodedFrame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<DecodedFrame>, FrameError> {
        loop {
            match self.state {
                DecodeState::AwaitingLengthPrefix => {
                    if src.len() < LENGTH_PREFIX_LEN {
                        return Ok(None);
                    }
                    let declared = src.get_u32_le() as usize;
                    if self.max_frame_len > 0 && declared > self.max_frame_len {
                        return Err(FrameError::FrameTooLarge { len: declared, max: self.max_frame_len });
                    }
                    // объявленной длине не доверяем: резервируем не больше чанка
                    src.reserve(declared.saturating_sub(src.len()).min(MAX_RESERVE));
                    self.state = DecodeState::AwaitingPayload { declared };
                }
                DecodeState::AwaitingPayload { declared } => {
                    if src.len() < declared {
                        return Ok(None);
                    }
                    let frame = DecodedFrame {
                        offset: self.frame_start,
                        payload: src.split_to(declared).freeze(),
                    };
                    self.frame_start += LENGTH_PREFIX_LEN + declared;
                    self.state = DecodeState::AwaitingLengthPrefix;
                    return Ok(Some(frame));
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<DecodedFrame>, FrameError> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        match self.state {
            DecodeState::AwaitingLengthPrefix if src.is_empty() => Ok(None),
            DecodeState::AwaitingLengthPrefix => Err(FrameError::IncompleteLengthPrefix {
                offset: self.frame_start,
                remaining: src.len(),
            }),
            DecodeState::AwaitingPayload { declared } => Err(FrameError::IncompleteMessage {
                offset: self.frame_start,
                declared,
                remaining: src.len(),
            }),
        }
    }
}

impl Encoder<&[u8]> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, payload: &[u8], dst: &mut BytesMut) -> Result<(), FrameError> {
        let len = u32::try_from(payload.len()).map_err(|_| FrameError::FrameTooLarge {
            len: payload.len(),
            max: u32::MAX as usize,
        })?;
        dst.reserve(LENGTH_PREFIX_LEN + payload.len());
        dst.put_u32_le(len);
        dst.put_slice(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_for_prefix_then_payload() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&[3u8, 0][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(codec.is_idle());

        buf.extend_from_slice(&[0, 0, b'x']);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(!codec.is_idle());

        buf.extend_from_slice(b"yz");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame, DecodedFrame { offset: 0, payload: Bytes::from_static(b"xyz") });
        assert!(codec.is_idle());
        assert!(buf.is_empty());
    }

    #[test]
    fn eof_inside_payload_is_incomplete_message() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&[5u8, 0, 0, 0, 1, 2][..]);
        let err = codec.decode_eof(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            FrameError::IncompleteMessage { offset: 0, declared: 5, remaining: 2 }
        ));
    }

    #[test]
    fn eof_inside_prefix_is_incomplete_prefix() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&[0u8, 0, 0, 0, 9][..]);
        let first = codec.decode_eof(&mut buf).unwrap().unwrap();
        assert!(first.payload.is_empty());
        let err = codec.decode_eof(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::IncompleteLengthPrefix { offset: 4, remaining: 1 }));
    }

    #[test]
    fn clean_eof_is_none() {
        let mut codec = FrameCodec::new();
        assert!(codec.decode_eof(&mut BytesMut::new()).unwrap().is_none());
    }

    #[test]
    fn oversized_declared_length_rejected() {
        let mut codec = FrameCodec::with_max_frame_len(16);
        let mut buf = BytesMut::from(&17u32.to_le_bytes()[..]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { len: 17, max: 16 }));
    }

    #[test]
    fn encoder_writes_prefix() {
        let mut codec = FrameCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(&b"hello"[..], &mut dst).unwrap();
        assert_eq!(&dst[..], &[5, 0, 0, 0, b'h', b'e', b'l', b'l', b'o']);
    }
}
