use crate::{
    config::{ModelConfig, Validatable},
    error::{Error, Result},
    model_service::ModelService,
    preprocess::ImageTensor,
};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

/// ONNX Runtime backed classifier.
///
/// The model file is loaded once into a pool of sessions that requests use
/// in round-robin order; each session is only ever run by one caller at a
/// time.
#[derive(Clone)]
pub struct OrtModelService {
    sessions: Arc<Vec<Arc<Mutex<Session>>>>,
    counter: Arc<AtomicUsize>,
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self> {
        let model_path = model_config.get_path();
        if model_config.validate().is_err() {
            return Err(Error::ModelNotFound { path: model_path });
        }

        let num_instances = model_config.num_instances.max(1);
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .with_intra_threads(model_config.intra_threads)?
                    .commit_from_file(&model_path)?;
                Ok(Arc::new(Mutex::new(session)))
            })
            .collect::<std::result::Result<Vec<_>, ort::Error>>()
            .map_err(|source| Error::ModelLoad {
                path: model_path.clone(),
                source,
            })?;

        tracing::info!(
            "Created {} ONNX sessions from {:?}",
            num_instances,
            model_path
        );

        Ok(Self {
            counter: Arc::new(AtomicUsize::new(0)),
            sessions: Arc::new(sessions),
        })
    }
}

impl ModelService for OrtModelService {
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) % self.sessions.len();
        let mut session = self.sessions[index]
            .lock()
            .map_err(|_| Error::SessionPoisoned)?;

        tracing::debug!("Handling request with session {}", index);
        let owned_buffer;
        let input_view = if input.view().is_standard_layout() {
            input.view()
        } else {
            owned_buffer = input.as_standard_layout().into_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view).map_err(Error::Inference)?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(Error::Inference)?;

        let output = outputs.values().next().ok_or(Error::EmptyOutput)?;
        let (_shape, scores) = output
            .try_extract_tensor::<f32>()
            .map_err(Error::Inference)?;

        Ok(scores.to_vec())
    }
}
