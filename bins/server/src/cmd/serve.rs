use std::io;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use epm_pipeline::StreamService;
use epm_snapshot::{FileSnapshot, SnapshotGuard};

use crate::config::{ServeArgs, ServerConfig};
use crate::error::ServerError;

/// Сколько ждать завершения активных ответов после сигнала остановки.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Сигналы остановки: Ctrl+C везде, SIGTERM на unix (stop контейнера).
///
/// Обработчик SIGTERM ставится в [`ShutdownSignal::install`], до первого
/// `recv`, чтобы сигнал, пришедший во время старта, не убил процесс.
pub struct ShutdownSignal {
    #[cfg(unix)]
    term: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            term: tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?,
        })
    }

    /// Ждать первый сигнал; возвращает его имя для лога.
    pub async fn recv(&mut self) -> io::Result<&'static str> {
        #[cfg(unix)]
        {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => signal.map(|()| "SIGINT"),
                _ = self.term.recv() => Ok("SIGTERM"),
            }
        }
        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
        }
    }
}

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    let mut shutdown = ShutdownSignal::install()?;

    // --- Load config ---
    let config = ServerConfig::load(&args.config)?;
    tracing::info!(
        config = %args.config,
        snapshot = %config.snapshot_path.display(),
        index = %config.index_path.display(),
        default_count = config.default_count,
        "loaded config"
    );

    // --- CancellationToken for graceful shutdown ---
    let token = CancellationToken::new();

    // --- Snapshot + service ---
    let snapshot = SnapshotGuard::new(FileSnapshot::new(&config.snapshot_path));
    let service = StreamService::epm(snapshot);

    // --- API server ---
    let addr = config.addr();
    let api_token = token.clone();
    let mut api_handle = tokio::spawn(stream_api_server::run(addr, service, config.api_options(), api_token));

    tracing::info!(%addr, "server ready");

    // --- Ожидание сигнала или падения API ---
    tokio::select! {
        signal = shutdown.recv() => {
            tracing::info!(signal = signal?, "shutting down...");
        }
        joined = &mut api_handle => {
            return Ok(joined??);
        }
    }

    token.cancel();

    // Drain: активные потоки дописываются, затем abort
    match tokio::time::timeout(DRAIN_TIMEOUT, &mut api_handle).await {
        Ok(Ok(result)) => result?,
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            tracing::warn!(timeout = ?DRAIN_TIMEOUT, "drain timed out, aborting api");
            api_handle.abort();
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}
