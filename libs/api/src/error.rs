/// Category of a stream error. Lets callers decide what to do with it
/// (report and stop, skip the frame, fail the request).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Stream ended mid-frame. Non-fatal: parsing stops, the condition is reported.
    Truncated,
    /// Frame boundaries are intact but the payload is not a valid record.
    Malformed,
    /// Read/write/create failure against the network or the filesystem.
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Truncated => f.write_str("truncated"),
            ErrorKind::Malformed => f.write_str("malformed"),
            ErrorKind::Io => f.write_str("io"),
        }
    }
}

/// Ошибка кодека одной записи.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("payload too short: {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },

    #[error("file identifier mismatch: expected {expected:?}, found {found:?}")]
    IdentifierMismatch { expected: &'static str, found: String },

    #[error("invalid record structure: {0}")]
    Invalid(String),
}

/// Ошибка фрейминга потока `[u32 LE length][payload]...`.
///
/// `IncompleteLengthPrefix` и `IncompleteMessage` не фатальны: они
/// завершают текущий проход парсера и сообщают, где поток оборвался.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("incomplete size prefix at offset {offset}: {remaining} bytes left")]
    IncompleteLengthPrefix { offset: usize, remaining: usize },

    #[error("incomplete message at offset {offset}: declared {declared} bytes, {remaining} available")]
    IncompleteMessage {
        offset: usize,
        declared: usize,
        remaining: usize,
    },

    #[error("malformed record at offset {offset}: {source}")]
    MalformedRecord {
        offset: usize,
        #[source]
        source: CodecError,
    },

    #[error("encode record: {0}")]
    Encode(#[source] CodecError),

    #[error("frame too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: usize },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FrameError::IncompleteLengthPrefix { .. } | FrameError::IncompleteMessage { .. } => {
                ErrorKind::Truncated
            }
            FrameError::MalformedRecord { .. }
            | FrameError::Encode(_)
            | FrameError::FrameTooLarge { .. } => ErrorKind::Malformed,
            FrameError::Io(_) => ErrorKind::Io,
        }
    }

    /// Поток оборван: дальше парсить нечего.
    pub fn is_truncation(&self) -> bool {
        self.kind() == ErrorKind::Truncated
    }
}

impl From<FrameError> for std::io::Error {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Io(io) => io,
            FrameError::IncompleteLengthPrefix { .. } | FrameError::IncompleteMessage { .. } => {
                std::io::Error::new(std::io::ErrorKind::UnexpectedEof, e)
            }
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}
