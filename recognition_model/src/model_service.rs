use crate::{
    error::{Error, Result},
    preprocess::{ImageTensor, INPUT_SHAPE},
};

/// A loaded classification model.
///
/// Implementations are shared read-only across request threads.
pub trait ModelService: Send + Sync + 'static {
    /// Runs the model once on a batch of one image and returns its class scores.
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>>;

    /// Returns the index of the highest scoring class for `input`.
    fn predict(&self, input: &ImageTensor) -> Result<usize> {
        check_input_shape(input)?;
        let scores = self.infer(input)?;

        tracing::debug!("Model returned {} class scores", scores.len());
        argmax(&scores).ok_or(Error::EmptyOutput)
    }
}

pub fn check_input_shape(input: &ImageTensor) -> Result<()> {
    if input.shape() != INPUT_SHAPE.as_slice() {
        return Err(Error::ShapeMismatch {
            expected: INPUT_SHAPE.to_vec(),
            actual: input.shape().to_vec(),
        });
    }
    Ok(())
}

/// Index of the largest score. Ties go to the lowest index and NaN never wins.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, value)| !value.is_nan())
        .reduce(|accum, row| if row.1 > accum.1 { row } else { accum })
        .map(|(index, _)| index)
}
