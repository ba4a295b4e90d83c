use crate::{
    server::{build_router, SharedState},
    telemetry::Metrics,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    response::Response,
    Router,
};
use image::{ImageBuffer, ImageFormat, Rgb};
use recognition_model::{ClassLabels, Error, ImageTensor, ModelService};
use std::{io::Cursor, sync::Arc};

const BOUNDARY: &str = "recognition-boundary";

/// Puts all probability mass on one class.
pub struct FixedModelService {
    class_index: usize,
}

impl FixedModelService {
    pub fn new(class_index: usize) -> Self {
        Self { class_index }
    }
}

impl ModelService for FixedModelService {
    fn infer(&self, _input: &ImageTensor) -> recognition_model::Result<Vec<f32>> {
        let mut scores = vec![0.0; self.class_index + 3];
        scores[self.class_index] = 1.0;
        Ok(scores)
    }
}

pub struct FailingModelService;

impl ModelService for FailingModelService {
    fn infer(&self, _input: &ImageTensor) -> recognition_model::Result<Vec<f32>> {
        Err(Error::SessionPoisoned)
    }
}

pub fn test_router(
    model_service: impl ModelService,
    labels: ClassLabels,
    max_upload_bytes: usize,
) -> Router {
    let state = SharedState {
        model_service: Arc::new(model_service),
        labels: Arc::new(labels),
        metrics: Arc::new(Metrics::new().unwrap()),
    };
    build_router(state, max_upload_bytes)
}

/// A PNG with enough variation that it does not compress to nothing.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_fn(width, height, |x, y| {
        Rgb([
            (x.wrapping_mul(7) ^ y.wrapping_mul(13)) as u8,
            (x.wrapping_mul(y) >> 3) as u8,
            (x + y) as u8,
        ])
    });
    let mut image_data: Vec<u8> = Vec::new();
    img.write_to(&mut Cursor::new(&mut image_data), ImageFormat::Png)
        .unwrap();
    image_data
}

pub fn multipart_request(field: &str, filename: &str, data: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/prediction")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
