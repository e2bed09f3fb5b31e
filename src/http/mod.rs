use axum::extract::{FromRequest, Multipart, Path as AxumPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::jobs::queue::QUEUE_SPLITTER;
use crate::jobs::{JobInput, JobOptions, JobPaths, JobState, JobStatus};
use crate::workers::WorkerContext;

#[derive(Clone)]
pub struct AppState {
    pub ctx: WorkerContext,
}

#[derive(Debug, Deserialize)]
pub struct InputPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobJson {
    pub input: InputPayload,
    #[serde(default)]
    pub options: Option<JobOptions>,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub status_url: String,
    pub result_url: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

fn input_from_payload(payload: InputPayload) -> Result<JobInput, Box<Response>> {
    if payload.value.trim().is_empty() {
        return Err(Box::new(error_response(StatusCode::BAD_REQUEST, "input.value must not be empty")));
    }
    match payload.kind.as_str() {
        "url" => Ok(JobInput::Url { value: payload.value }),
        "path" => Ok(JobInput::Path { value: payload.value }),
        "upload" => Ok(JobInput::Upload { value: payload.value }),
        other => Err(Box::new(error_response(StatusCode::BAD_REQUEST, format!("unknown input type: {other}")))),
    }
}

async fn create_job_from_json(state: &AppState, payload: CreateJobJson) -> Response {
    let input = match input_from_payload(payload.input) {
        Ok(input) => input,
        Err(resp) => return *resp,
    };
    finalize_create(state, input, payload.options.unwrap_or_default()).await
}

async fn create_job_from_multipart(state: &AppState, mut multipart: Multipart) -> Response {
    let mut input_type = "upload".to_string();
    let mut options: JobOptions = JobOptions::default();
    let job_id = Uuid::new_v4().to_string();
    let paths = JobPaths::new(state.ctx.store.storage_root(), &job_id);
    let mut got_file = false;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
        };
        match field.name().unwrap_or("") {
            "input_type" => {
                if let Ok(text) = field.text().await {
                    input_type = text;
                }
            }
            "options" => {
                if let Ok(text) = field.text().await {
                    if let Ok(parsed) = serde_json::from_str::<JobOptions>(&text) {
                        options = parsed;
                    }
                }
            }
            "file" => {
                let Ok(bytes) = field.bytes().await else {
                    return error_response(StatusCode::BAD_REQUEST, "could not read uploaded file");
                };
                if let Err(err) = crate::shared::ensure_directory(&paths.input_dir) {
                    return error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
                }
                if let Err(err) = std::fs::write(paths.original_mp4(), &bytes) {
                    return error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
                }
                got_file = true;
            }
            _ => {}
        }
    }

    if input_type != "upload" || !got_file {
        return error_response(StatusCode::BAD_REQUEST, "multipart upload requires a file part");
    }

    let input = JobInput::Upload { value: job_id.clone() };
    finalize_create_with_id(state, job_id, input, options).await
}

async fn finalize_create(state: &AppState, input: JobInput, options: JobOptions) -> Response {
    let job_id = Uuid::new_v4().to_string();
    finalize_create_with_id(state, job_id, input, options).await
}

async fn finalize_create_with_id(state: &AppState, job_id: String, input: JobInput, options: JobOptions) -> Response {
    let job_state = JobState::new(job_id.clone(), input, options, Utc::now());
    if let Err(err) = state.ctx.store.create(&job_state).await {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
    }
    state.ctx.enqueue(QUEUE_SPLITTER, job_id.clone()).await;

    let body = CreateJobResponse {
        job_id: job_id.clone(),
        status: JobStatus::Queued,
        status_url: format!("/v1/transcriptions/jobs/{job_id}"),
        result_url: format!("/v1/transcriptions/jobs/{job_id}/result"),
    };
    (StatusCode::ACCEPTED, Json(body)).into_response()
}

async fn create_job(state: State<AppState>, headers: axum::http::HeaderMap, body: axum::body::Bytes) -> Response {
    let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("");

    if content_type.starts_with("multipart/form-data") {
        let request = axum::http::Request::builder()
            .header(header::CONTENT_TYPE, content_type)
            .body(axum::body::Body::from(body))
            .expect("well-formed multipart request");
        let multipart = match Multipart::from_request(request, &state.0).await {
            Ok(multipart) => multipart,
            Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
        };
        return create_job_from_multipart(&state.0, multipart).await;
    }

    match serde_json::from_slice::<CreateJobJson>(&body) {
        Ok(payload) => create_job_from_json(&state.0, payload).await,
        Err(err) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
    }
}

async fn get_job(State(state): State<AppState>, AxumPath(job_id): AxumPath<String>) -> Response {
    match state.ctx.store.load(&job_id).await {
        Ok(Some(job)) => Json(job).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "job not found"),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

#[derive(Debug, Serialize)]
struct ResultResponse {
    job_id: String,
    status: JobStatus,
    result: Option<crate::jobs::JobResult>,
    download_url: String,
}

async fn get_result(State(state): State<AppState>, AxumPath(job_id): AxumPath<String>) -> Response {
    let job = match state.ctx.store.load(&job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "job not found"),
        Err(err) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    };
    if job.status != JobStatus::Done {
        return (StatusCode::CONFLICT, Json(serde_json::json!({"status": job.status}))).into_response();
    }
    Json(ResultResponse {
        job_id: job.job_id.clone(),
        status: job.status,
        result: job.result,
        download_url: format!("/v1/transcriptions/jobs/{job_id}/download"),
    })
    .into_response()
}

async fn download_job(State(state): State<AppState>, AxumPath(job_id): AxumPath<String>) -> Response {
    let job = match state.ctx.store.load(&job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "job not found"),
        Err(err) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    };
    if job.status != JobStatus::Done {
        return (StatusCode::CONFLICT, Json(serde_json::json!({"status": job.status}))).into_response();
    }
    let paths = JobPaths::new(state.ctx.store.storage_root(), &job_id);
    let zip_path = paths.output_zip();
    let Ok(bytes) = std::fs::read(&zip_path) else {
        return error_response(StatusCode::NOT_FOUND, "zip artifact not found");
    };

    let download_name = job
        .result
        .and_then(|r| r.download_name)
        .unwrap_or_else(|| format!("sealium_transcription_{job_id}.zip"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{download_name}\"")),
        ],
        bytes,
    )
        .into_response()
}

/// Cancels a job, idempotent on terminal states: a job already `done`,
/// `failed`, or `canceled` is returned unchanged rather than regressed to
/// `canceled` (spec.md §3/§6).
async fn cancel_job(State(state): State<AppState>, AxumPath(job_id): AxumPath<String>) -> Response {
    let job = match state.ctx.store.load(&job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "job not found"),
        Err(err) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    };

    if !job.status.can_transition_to(JobStatus::Canceled) {
        return Json(job).into_response();
    }

    match state.ctx.store.set_status(&job_id, JobStatus::Canceled).await {
        Ok(Some(job)) => Json(job).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "job not found"),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

/// Builds the HTTP intake router described in spec.md §6, grounded in the
/// teacher's `subsonic::create_router` — permissive CORS, `with_state`.
pub fn create_router(ctx: WorkerContext) -> Router {
    let state = AppState { ctx };
    Router::new()
        .route("/v1/transcriptions/jobs", post(create_job))
        .route("/v1/transcriptions/jobs/:id", get(get_job))
        .route("/v1/transcriptions/jobs/:id/result", get(get_result))
        .route("/v1/transcriptions/jobs/:id/download", get(download_job))
        .route("/v1/transcriptions/jobs/:id/cancel", post(cancel_job))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use tokio::sync::OnceCell;

    use super::*;
    use crate::adapters::test_support::{FakeDownloader, FakeMediaTools, FakePdfWriter, FakeTranscriber, RecordingErrorMonitor};
    use crate::config::Config;
    use crate::jobs::{JobOptions, JobStore};

    fn test_state(storage_root: std::path::PathBuf) -> AppState {
        AppState {
            ctx: WorkerContext {
                store: Arc::new(JobStore::new(storage_root.clone())),
                config: Arc::new(Config::for_tests(storage_root)),
                downloader: Arc::new(FakeDownloader),
                media: Arc::new(FakeMediaTools::new(1.0, String::new())),
                transcriber: Arc::new(FakeTranscriber::new(vec![])),
                pdf_writer: Arc::new(FakePdfWriter),
                error_monitor: Arc::new(RecordingErrorMonitor::default()),
                queue: Arc::new(OnceCell::new()),
            },
        }
    }

    #[tokio::test]
    async fn canceling_a_non_terminal_job_marks_it_canceled() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path().to_path_buf());
        let job_id = "job-1".to_string();
        let input = JobInput::Path { value: "unused".to_string() };
        let job = JobState::new(job_id.clone(), input, JobOptions::default(), Utc::now());
        state.ctx.store.create(&job).await.unwrap();

        let resp = cancel_job(State(state.clone()), AxumPath(job_id.clone())).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let stored = state.ctx.store.load(&job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Canceled);
    }

    #[tokio::test]
    async fn canceling_a_done_job_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path().to_path_buf());
        let job_id = "job-2".to_string();
        let input = JobInput::Path { value: "unused".to_string() };
        let job = JobState::new(job_id.clone(), input, JobOptions::default(), Utc::now());
        state.ctx.store.create(&job).await.unwrap();
        state.ctx.store.set_status(&job_id, JobStatus::Done).await.unwrap();

        let resp = cancel_job(State(state.clone()), AxumPath(job_id.clone())).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let stored = state.ctx.store.load(&job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Done);
    }
}
