use crate::{server::SharedState, templates};
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use recognition_model::preprocess_bytes;
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

const ROUTE: &str = "/prediction";
const FILE_FIELD: &str = "file";

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Request is not a multipart upload: {0}")]
    NotMultipart(#[from] MultipartRejection),
    #[error("Failed to read multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("No `file` field in upload")]
    MissingFile,
    #[error("Uploaded file is empty")]
    EmptyFile,
    #[error("Model error: {0}")]
    Model(#[from] recognition_model::Error),
    #[error("Prediction worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl PredictionError {
    pub fn reason(&self) -> &'static str {
        match self {
            PredictionError::NotMultipart(_) => "not_multipart",
            PredictionError::Multipart(_) => "multipart",
            PredictionError::MissingFile => "missing_file",
            PredictionError::EmptyFile => "empty_file",
            PredictionError::Model(e) => e.reason(),
            PredictionError::Worker(_) => "worker",
        }
    }
}

// Every failure renders the same page with a 200, whatever the cause.
impl IntoResponse for PredictionError {
    fn into_response(self) -> Response {
        (StatusCode::OK, Html(templates::render_failure())).into_response()
    }
}

#[instrument(skip(state, multipart))]
pub async fn predict_image_file(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    state.metrics.record_request(ROUTE);
    let start = Instant::now();

    match run_prediction(&state, multipart).await {
        Ok(class_index) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            state.metrics.record_prediction_duration(duration_ms, ROUTE);
            tracing::info!("Predicted class {} in {} ms", class_index, duration_ms);

            let label = state.labels.get(class_index);
            Html(templates::render_prediction(class_index, label)).into_response()
        }
        Err(err) => {
            tracing::warn!(reason = err.reason(), "Upload rejected: {}", err);
            state.metrics.record_failure(err.reason());
            err.into_response()
        }
    }
}

async fn run_prediction(
    state: &SharedState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<usize, PredictionError> {
    let image_data = read_upload(multipart?).await?;
    tracing::debug!("Received upload of {} bytes", image_data.len());

    let model_service = state.model_service.clone();
    let class_index = tokio::task::spawn_blocking(move || {
        let tensor = preprocess_bytes(&image_data)?;
        model_service.predict(&tensor)
    })
    .await??;

    Ok(class_index)
}

async fn read_upload(mut multipart: Multipart) -> Result<Bytes, PredictionError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            let image_data = field.bytes().await?;
            if image_data.is_empty() {
                return Err(PredictionError::EmptyFile);
            }
            return Ok(image_data);
        }
    }

    Err(PredictionError::MissingFile)
}
