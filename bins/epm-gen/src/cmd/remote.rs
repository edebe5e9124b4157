use tokio::io::AsyncWriteExt;

use super::config::{FetchArgs, SubmitArgs, endpoint};
use super::error::GenError;

// ═══════════════════════════════════════════════════════════════
//  fetch: GET /stream → файл
// ═══════════════════════════════════════════════════════════════

pub async fn fetch(args: &FetchArgs) -> Result<(), GenError> {
    let client = reqwest::Client::new();
    let mut request = client.get(endpoint(&args.url, "/stream"));
    if let Some(count) = args.count {
        request = request.query(&[("count", count)]);
    }
    let mut response = ensure_success(request.send().await?).await?;

    let file = tokio::fs::File::create(&args.out).await.map_err(GenError::file(&args.out))?;
    let mut out = tokio::io::BufWriter::new(file);
    let mut bytes = 0u64;
    while let Some(chunk) = response.chunk().await? {
        out.write_all(&chunk).await.map_err(GenError::file(&args.out))?;
        bytes += chunk.len() as u64;
    }
    out.flush().await.map_err(GenError::file(&args.out))?;

    tracing::info!(url = %args.url, out = %args.out, bytes, "stream fetched");
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
//  submit: файл → POST /submit
// ═══════════════════════════════════════════════════════════════

pub async fn submit(args: &SubmitArgs) -> Result<(), GenError> {
    let body = tokio::fs::read(&args.path).await.map_err(GenError::file(&args.path))?;
    let bytes = body.len();

    let response = reqwest::Client::new()
        .post(endpoint(&args.url, "/submit"))
        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
        .body(body)
        .send()
        .await?;
    let answer = ensure_success(response).await?.text().await?;

    tracing::info!(url = %args.url, path = %args.path, bytes, answer = %answer, "stream submitted");
    Ok(())
}

/// Не-2xx ответ превращается в [`GenError::Status`] с телом ответа.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GenError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GenError::Status { status: status.as_u16(), body })
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;
    use tokio_util::sync::CancellationToken;

    use epm_framing::frames;
    use epm_pipeline::StreamService;
    use epm_snapshot::{FileSnapshot, MemorySnapshot, SnapshotGuard, SnapshotStore};
    use stream_api_server::{ApiOptions, router, serve};

    use super::*;

    async fn start(store: impl SnapshotStore + 'static) -> (String, CancellationToken) {
        let service = StreamService::epm(SnapshotGuard::new(store));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let shutdown = CancellationToken::new();
        tokio::spawn(serve(listener, router(service, ApiOptions::default()), shutdown.clone()));
        (url, shutdown)
    }

    #[tokio::test]
    async fn fetch_then_submit_restores_snapshot() {
        let memory = MemorySnapshot::new();
        let (url, shutdown) = start(memory.clone()).await;
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.fb").to_string_lossy().into_owned();
        let second = dir.path().join("second.fb").to_string_lossy().into_owned();

        fetch(&FetchArgs { url: url.clone(), count: Some(7), out: first.clone() }).await.unwrap();
        let fetched = std::fs::read(&first).unwrap();
        assert_eq!(frames(&fetched).count(), 7);
        assert_eq!(memory.contents().unwrap(), fetched);

        fetch(&FetchArgs { url: url.clone(), count: Some(2), out: second }).await.unwrap();
        assert_ne!(memory.contents().unwrap(), fetched);

        submit(&SubmitArgs { url, path: first }).await.unwrap();
        assert_eq!(memory.contents().unwrap(), fetched);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn server_failure_is_reported_with_body() {
        let dir = tempfile::tempdir().unwrap();
        let (url, shutdown) = start(FileSnapshot::new(dir.path())).await;
        let out = dir.path().join("out.fb").to_string_lossy().into_owned();

        let err = fetch(&FetchArgs { url, count: None, out }).await.unwrap_err();
        match err {
            GenError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "Failed to create file");
            }
            other => panic!("unexpected: {other}"),
        }

        shutdown.cancel();
    }
}
