use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use rstest::rstest;
use tokio::io::AsyncWrite;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use epm_codec::EpmCodec;
use epm_framing::{encode_frame, parse_stream};
use epm_pipeline::{StreamService, values_for};
use epm_snapshot::{FileSnapshot, MemorySnapshot, SnapshotGuard, SnapshotStore, SnapshotWriter};
use stream_api_server::{ApiOptions, messages, router, serve};

/// Сервер на случайном порту; гасится при drop.
struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
}

impl TestServer {
    async fn start(store: impl SnapshotStore + 'static, options: ApiOptions) -> Self {
        let service = StreamService::epm(SnapshotGuard::new(store));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();

        tokio::spawn(serve(listener, router(service, options), shutdown.clone()));
        Self { addr, shutdown }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn submitted_stream(ns: &[u32]) -> Vec<u8> {
    ns.iter().flat_map(|&n| encode_frame(&EpmCodec, &values_for(n)).unwrap()).collect()
}

/// Снапшот, запись в который ломается после `limit` байт (диск кончился).
struct DiskFullSnapshot {
    limit: usize,
}

struct DiskFullWriter {
    left: usize,
}

impl AsyncWrite for DiskFullWriter {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        if buf.len() > self.left {
            return Poll::Ready(Err(io::Error::other("no space left on device")));
        }
        self.left -= buf.len();
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl SnapshotStore for DiskFullSnapshot {
    fn create(&self) -> Pin<Box<dyn Future<Output = io::Result<SnapshotWriter>> + Send + '_>> {
        let writer: SnapshotWriter = Box::new(DiskFullWriter { left: self.limit });
        Box::pin(async move { Ok(writer) })
    }

    fn replace<'a>(&'a self, _bytes: &'a [u8]) -> Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'a>> {
        Box::pin(async { Err(io::Error::other("no space left on device")) })
    }

    fn load(&self) -> Pin<Box<dyn Future<Output = io::Result<Vec<u8>>> + Send + '_>> {
        Box::pin(async { Err(io::Error::from(io::ErrorKind::NotFound)) })
    }

    fn location(&self) -> String {
        "disk-full".to_owned()
    }
}

#[rstest]
#[case::absent("", 1000)]
#[case::explicit("?count=3", 3)]
#[case::zero("?count=0", 0)]
#[case::negative("?count=-4", 0)]
#[case::unparsable("?count=lots", 1000)]
#[case::repeated("?count=2&count=3", 2)]
#[case::with_other_params("?seed=9&count=4", 4)]
#[tokio::test]
async fn stream_honours_count(#[case] query: &str, #[case] expected: usize) {
    let memory = MemorySnapshot::new();
    let server = TestServer::start(memory.clone(), ApiOptions::default()).await;

    let response = reqwest::get(server.url(&format!("/stream{query}"))).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()[reqwest::header::CONTENT_TYPE],
        "application/octet-stream"
    );
    let body = response.bytes().await.unwrap();

    let records: Vec<_> = parse_stream(&body, &EpmCodec).collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), expected);
    assert_eq!(memory.contents().unwrap(), body.as_ref());
}

#[tokio::test]
async fn small_pipe_still_streams_everything() {
    let memory = MemorySnapshot::new();
    let options = ApiOptions { pipe_buffer: 16, ..ApiOptions::default() };
    let server = TestServer::start(memory.clone(), options).await;

    let body = reqwest::get(server.url("/stream?count=200")).await.unwrap().bytes().await.unwrap();

    assert_eq!(parse_stream(&body, &EpmCodec).filter(|r| r.is_ok()).count(), 200);
    assert_eq!(memory.contents().unwrap(), body.as_ref());
}

#[tokio::test]
async fn snapshot_failure_mid_stream_aborts_body() {
    let server = TestServer::start(DiskFullSnapshot { limit: 1000 }, ApiOptions::default()).await;

    let response = reqwest::get(server.url("/stream?count=1000")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.bytes().await.is_err(), "short stream must not finish cleanly");
}

#[tokio::test]
async fn stream_fails_when_snapshot_cannot_be_created() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(FileSnapshot::new(dir.path()), ApiOptions::default()).await;

    let response = reqwest::get(server.url("/stream?count=5")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text().await.unwrap(), messages::FAILED_TO_CREATE_FILE);
}

#[tokio::test]
async fn submit_then_last() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("last_stack.fb");
    let server = TestServer::start(FileSnapshot::new(&path), ApiOptions::default()).await;
    let client = reqwest::Client::new();

    let body = submitted_stream(&[1, 2, 3]);
    let response = client.post(server.url("/submit")).body(body.clone()).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), messages::DATA_PROCESSED);
    assert_eq!(std::fs::read(&path).unwrap(), body);

    let response = client.get(server.url("/last")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), messages::LAST_FILE_PROCESSED);
    assert_eq!(std::fs::read(&path).unwrap(), body);
}

#[tokio::test]
async fn submit_keeps_garbage_verbatim() {
    let memory = MemorySnapshot::new();
    let server = TestServer::start(memory.clone(), ApiOptions::default()).await;

    let garbage = b"\x05\x00\x00\x00abc".to_vec();
    let response = reqwest::Client::new()
        .post(server.url("/submit"))
        .body(garbage.clone())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(memory.contents().unwrap(), garbage);
}

#[tokio::test]
async fn oversized_submit_is_rejected() {
    let memory = MemorySnapshot::new();
    let options = ApiOptions { body_limit: 16, ..ApiOptions::default() };
    let server = TestServer::start(memory.clone(), options).await;

    let response = reqwest::Client::new()
        .post(server.url("/submit"))
        .body(submitted_stream(&[1]))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text().await.unwrap(), messages::FAILED_TO_READ_BODY);
    assert!(memory.contents().is_none());
}

#[tokio::test]
async fn last_without_snapshot_fails() {
    let server = TestServer::start(MemorySnapshot::new(), ApiOptions::default()).await;

    let response = reqwest::get(server.url("/last")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text().await.unwrap(), messages::FAILED_TO_READ_FILE);
}

#[tokio::test]
async fn index_page_is_served_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let index_path = dir.path().join("index.html");

    let missing = TestServer::start(
        MemorySnapshot::new(),
        ApiOptions { index_path: index_path.clone(), ..ApiOptions::default() },
    )
    .await;
    let response = reqwest::get(missing.url("/")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    std::fs::write(&index_path, "<h1>EPM</h1>").unwrap();
    let response = reqwest::get(missing.url("/")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
    assert_eq!(response.text().await.unwrap(), "<h1>EPM</h1>");
}

#[test]
fn default_options_point_at_bundled_page() {
    assert_eq!(ApiOptions::default().index_path, PathBuf::from("web/index.html"));
    assert_eq!(ApiOptions::default().default_count, 1000);
}
