use std::io;

use axum::body::{Body, Bytes};
use axum::extract::rejection::BytesRejection;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use futures_util::StreamExt;
use futures_util::stream;
use tokio::sync::oneshot;
use tokio_util::io::ReaderStream;

use epm_pipeline::{RandomValues, TracingObserver};

use super::AppState;
use super::messages::*;

/// Число записей из сырого `count`.
///
/// Отрицательное значение даёт пустой поток; отсутствующее или
/// нечисловое значение заменяется на `default`.
pub fn resolve_count(raw: Option<&str>, default: usize) -> usize {
    match raw.map(str::parse::<i64>) {
        Some(Ok(n)) if n < 0 => 0,
        Some(Ok(n)) => usize::try_from(n).unwrap_or(usize::MAX),
        Some(Err(_)) | None => default,
    }
}

fn internal_error(message: &'static str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}

// ═══════════════════════════════════════════════════════════════
//  GET /stream?count=N
// ═══════════════════════════════════════════════════════════════

/// Первое значение параметра `name`; повторы игнорируются.
fn first_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
}

pub(crate) async fn handle_stream(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let count = resolve_count(first_param(&params, "count"), state.default_count);

    let job = match state.service.begin_generate().await {
        Ok(job) => job,
        Err(e) => {
            tracing::error!(error = %e, "generate rejected");
            return internal_error(FAILED_TO_CREATE_FILE);
        }
    };

    // Генератор пишет в duplex, тело ответа читает с другого конца.
    // Клиент отвалился: reader закрыт, запись падает и генерация прерывается.
    let (mut writer, reader) = tokio::io::duplex(state.pipe_buffer);
    let (done_tx, done_rx) = oneshot::channel();
    tokio::spawn(async move {
        let mut source = RandomValues::new();
        let result = job.run(&mut writer, count, &mut source).await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, count, "stream aborted mid-response");
        }
        drop(writer);
        let _ = done_tx.send(result.map_err(|e| e.to_string()));
    });

    // Заголовки уже ушли, поэтому ошибка генерации обрывает chunked-тело:
    // клиент видит сбой, а не короткий, но корректный поток.
    let outcome = stream::once(done_rx).filter_map(|done| async move {
        match done {
            Ok(Ok(_)) => None,
            Ok(Err(reason)) => Some(Err(io::Error::other(reason))),
            Err(_) => Some(Err(io::Error::other("stream task dropped"))),
        }
    });
    let body = ReaderStream::new(reader).chain(outcome);

    ([(header::CONTENT_TYPE, "application/octet-stream")], Body::from_stream(body)).into_response()
}

// ═══════════════════════════════════════════════════════════════
//  POST /submit
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_submit(State(state): State<AppState>, body: Result<Bytes, BytesRejection>) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "submit body rejected");
            return internal_error(FAILED_TO_READ_BODY);
        }
    };

    let mut observer = TracingObserver::new(state.service.codec().file_identifier(), "submit");
    match state.service.ingest(&body, &mut observer).await {
        Ok(_) => (StatusCode::OK, DATA_PROCESSED).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "submit not persisted");
            internal_error(FAILED_TO_WRITE_FILE)
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  GET /last
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_last(State(state): State<AppState>) -> Response {
    let mut observer = TracingObserver::new(state.service.codec().file_identifier(), "last");
    match state.service.replay_last(&mut observer).await {
        Ok(_) => (StatusCode::OK, LAST_FILE_PROCESSED).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "replay failed");
            internal_error(FAILED_TO_READ_FILE)
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  GET /
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_index(State(state): State<AppState>) -> Response {
    match tokio::fs::read(state.index_path.as_path()).await {
        Ok(page) => Html(page).into_response(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND).into_response(),
        Err(e) => {
            tracing::error!(path = %state.index_path.display(), error = %e, "index page unreadable");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
