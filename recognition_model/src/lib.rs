//! Image preprocessing and class prediction for the recognition service.
//!
//! Uploaded images are turned into a fixed `(1, 224, 224, 3)` tensor with
//! values in `[0, 1]`, then handed to a [`ModelService`] that returns the
//! argmax class index.

pub mod config;
pub mod error;
pub mod labels;
pub mod model_service;
pub mod ort_service;
pub mod preprocess;

pub use error::{Error, ErrorKind, Result};
pub use labels::ClassLabels;
pub use model_service::{argmax, ModelService};
pub use ort_service::OrtModelService;
pub use preprocess::{
    preprocess_bytes, preprocess_path, preprocess_reader, ImageTensor, IMAGE_SIZE, INPUT_SHAPE,
};
