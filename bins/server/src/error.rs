#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("{0}")]
    Api(#[from] stream_api_server::ApiError),

    #[error("api task: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("signal: {0}")]
    Signal(#[from] std::io::Error),
}
