use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use epm_snapshot::DEFAULT_SNAPSHOT_PATH;
use stream_api_server::ApiOptions;

use crate::error::ServerError;

#[derive(Parser)]
#[command(name = "epm-server", version, about = "Потоковая передача EPM-записей по HTTP")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Запустить сервер
    Serve(ServeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Путь к TOML конфиг файлу
    #[arg(long, default_value = "config.toml", env = "EPM_CONFIG")]
    pub config: String,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Файл последнего потока.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    /// Страница для `GET /`.
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
    /// Число записей в `/stream` без `count`.
    #[serde(default = "default_count")]
    pub default_count: usize,
    /// Лимит тела `/submit`, байт.
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
    /// Буфер между генератором и HTTP-ответом, байт.
    #[serde(default = "default_pipe_buffer")]
    pub pipe_buffer: usize,
}

fn default_listen_addr() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}
fn default_port() -> u16 {
    8080
}
fn default_snapshot_path() -> PathBuf {
    PathBuf::from(DEFAULT_SNAPSHOT_PATH)
}
fn default_index_path() -> PathBuf {
    ApiOptions::default().index_path
}
fn default_count() -> usize {
    ApiOptions::default().default_count
}
fn default_body_limit() -> usize {
    ApiOptions::default().body_limit
}
fn default_pipe_buffer() -> usize {
    ApiOptions::default().pipe_buffer
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            snapshot_path: default_snapshot_path(),
            index_path: default_index_path(),
            default_count: default_count(),
            body_limit: default_body_limit(),
            pipe_buffer: default_pipe_buffer(),
        }
    }
}

impl ServerConfig {
    /// Прочитать конфиг; отсутствующий файл означает значения по умолчанию.
    pub fn load(path: &str) -> Result<Self, ServerError> {
        if !Path::new(path).exists() {
            tracing::info!(config = %path, "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ServerError::Config { context: "parse", detail: format!("'{path}': {e}") })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ServerError> {
        if self.pipe_buffer == 0 {
            return Err(ServerError::Config { context: "validate", detail: "pipe_buffer must be > 0".into() });
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.port)
    }

    pub fn api_options(&self) -> ApiOptions {
        ApiOptions {
            default_count: self.default_count,
            body_limit: self.body_limit,
            pipe_buffer: self.pipe_buffer,
            index_path: self.index_path.clone(),
        }
    }
}
