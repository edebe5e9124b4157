use epm_api::FrameError;

#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("{path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Stream(#[from] FrameError),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },
}

impl GenError {
    pub fn file(path: &str) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::File { path: path.to_owned(), source }
    }
}
