//! Length-prefixed фрейминг потока записей EPM.
//!
//! Поток: конкатенация фреймов `[u32 LE length][payload]` без разделителей.
//! Запись ([`write_stream`]) идёт инкрементально сразу в несколько sink'ов;
//! чтение доступно целиком по буферу ([`parse_stream`], [`frames`]) и
//! потоково, кусками произвольного размера ([`FrameCodec`]).

mod codec;
mod parse;
mod write;

pub use codec::{DecodedFrame, FrameCodec};
pub use parse::{Frame, Frames, Records, frames, parse_stream};
pub use write::{encode_frame, frame_payload, write_stream};
