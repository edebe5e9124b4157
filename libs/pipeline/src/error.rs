use epm_api::FrameError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("create snapshot ({location}): {source}")]
    SnapshotCreate { location: String, source: std::io::Error },

    #[error("write snapshot ({location}): {source}")]
    SnapshotWrite { location: String, source: std::io::Error },

    #[error("read snapshot ({location}): {source}")]
    SnapshotRead { location: String, source: std::io::Error },

    #[error("stream: {0}")]
    Stream(#[from] FrameError),
}
