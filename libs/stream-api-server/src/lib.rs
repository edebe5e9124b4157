use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use epm_api::DEFAULT_COUNT;
use epm_pipeline::StreamService;

mod http;

pub use http::resolve_count;

/// Тексты ответов, на которые опираются клиенты.
pub mod messages {
    pub const DATA_PROCESSED: &str = "Data processed";
    pub const LAST_FILE_PROCESSED: &str = "Last file processed";
    pub const FAILED_TO_CREATE_FILE: &str = "Failed to create file";
    pub const FAILED_TO_READ_BODY: &str = "Failed to read request body";
    pub const FAILED_TO_WRITE_FILE: &str = "Failed to write file";
    pub const FAILED_TO_READ_FILE: &str = "Failed to read file";
    pub const NOT_FOUND: &str = "404 page not found";
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bind api {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("axum serve: {0}")]
    Serve(#[source] std::io::Error),
}

/// Параметры HTTP-слоя.
#[derive(Debug, Clone)]
pub struct ApiOptions {
    /// Сколько записей отдавать в `/stream` без `count`.
    pub default_count: usize,
    /// Максимальный размер тела `/submit`.
    pub body_limit: usize,
    /// Ёмкость канала между генератором и телом ответа.
    pub pipe_buffer: usize,
    pub index_path: PathBuf,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            default_count: DEFAULT_COUNT,
            body_limit: 64 * 1024 * 1024,
            pipe_buffer: 64 * 1024,
            index_path: PathBuf::from("web/index.html"),
        }
    }
}

#[derive(Clone)]
struct AppState {
    service: StreamService,
    default_count: usize,
    pipe_buffer: usize,
    index_path: Arc<PathBuf>,
}

/// Маршруты API поверх [`StreamService`].
pub fn router(service: StreamService, options: ApiOptions) -> Router {
    let state = AppState {
        service,
        default_count: options.default_count,
        pipe_buffer: options.pipe_buffer.max(1),
        index_path: Arc::new(options.index_path),
    };

    Router::new()
        .route("/", get(http::handle_index))
        .route("/stream", get(http::handle_stream))
        .route("/submit", post(http::handle_submit))
        .route("/last", get(http::handle_last))
        .layer(DefaultBodyLimit::max(options.body_limit))
        .with_state(state)
}

/// Поднять API на `addr` и обслуживать до отмены `shutdown`.
pub async fn run(
    addr: SocketAddr,
    service: StreamService,
    options: ApiOptions,
    shutdown: CancellationToken,
) -> Result<(), ApiError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ApiError::Bind { addr, source })?;
    tracing::info!(%addr, "api listening");

    serve(listener, router(service, options), shutdown).await
}

/// Обслуживать уже привязанный listener.
pub async fn serve(listener: TcpListener, app: Router, shutdown: CancellationToken) -> Result<(), ApiError> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(ApiError::Serve)
}
