use std::path::Path;
use std::sync::Mutex;

use ndarray::{ArrayD, CowArray};
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::builder::SessionBuilder;
use ort::session::Session;
use ort::value::{DynValue, ValueType};

use crate::error::{Error, Result};

/// Anything that turns a preprocessed batch into per-class scores.
pub trait Classifier: Send + Sync {
    /// Scores for the first image of the batch.
    fn predict(&self, input: ArrayD<f32>) -> Result<Vec<f32>>;

    /// Output width declared by the model, when known.
    fn num_classes(&self) -> Option<usize> {
        None
    }
}

pub struct OnnxModel {
    provider: [ort::execution_providers::ExecutionProviderDispatch; 1],
}

impl OnnxModel {
    pub fn new(cuda: bool) -> Self {
        let provider = if cuda {
            [CUDAExecutionProvider::default().build().error_on_failure()]
        } else {
            [CPUExecutionProvider::default().build()]
        };
        Self { provider }
    }

    pub fn load_model(&self, model_path: impl AsRef<Path>) -> Result<Session> {
        let session = SessionBuilder::new()?
            .with_execution_providers(self.provider.clone())?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)?;
        Ok(session)
    }
}

/// ONNX Runtime session wrapped for shared use across requests.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    num_classes: Option<usize>,
}

impl OnnxClassifier {
    pub fn load(model_path: impl AsRef<Path>, cuda: bool) -> Result<Self> {
        let session = OnnxModel::new(cuda).load_model(model_path)?;
        Ok(Self::from_session(session))
    }

    pub fn from_session(session: Session) -> Self {
        for input in &session.inputs {
            tracing::info!(name = %input.name, shape = ?dimensions(&input.input_type), "model input");
        }
        for output in &session.outputs {
            tracing::info!(name = %output.name, shape = ?dimensions(&output.output_type), "model output");
        }
        let num_classes = session
            .outputs
            .first()
            .and_then(|o| dimensions(&o.output_type))
            .and_then(|dims| dims.last().copied())
            .filter(|&d| d > 0)
            .map(|d| d as usize);
        Self {
            session: Mutex::new(session),
            num_classes,
        }
    }
}

fn dimensions(ty: &ValueType) -> Option<Vec<i64>> {
    match ty {
        ValueType::Tensor { dimensions, .. } => Some(dimensions.clone()),
        _ => None,
    }
}

/// Flattens the first output into scores, widening half-precision exports to
/// f32 and keeping at most `width` values.
fn scores_from_value(value: &DynValue, width: Option<usize>) -> Result<Vec<f32>> {
    let scores: Vec<f32> = match value.try_extract_tensor::<f32>() {
        Ok(tensor) => tensor.iter().copied().collect(),
        Err(_) => value
            .try_extract_tensor::<half::f16>()?
            .iter()
            .map(|v| v.to_f32())
            .collect(),
    };
    let width = width.unwrap_or(scores.len());
    Ok(scores.into_iter().take(width).collect())
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: ArrayD<f32>) -> Result<Vec<f32>> {
        let xs = CowArray::from(input);
        let input_data = ort::inputs![xs.view()]?;
        let session = self
            .session
            .lock()
            .map_err(|_| Error::Inference("model session lock poisoned".to_string()))?;
        let ys = session.run(input_data)?;
        let (_name, value) = ys
            .iter()
            .next()
            .ok_or_else(|| Error::Inference("model produced no outputs".to_string()))?;
        scores_from_value(&value, self.num_classes)
    }

    fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::f16;
    use ndarray::Array2;
    use ort::value::Tensor;

    #[test]
    fn f32_output_is_flattened() {
        let value = Tensor::from_array(Array2::from_shape_vec((1, 4), vec![0.1f32, 0.2, 0.3, 0.4]).unwrap())
            .unwrap()
            .into_dyn();
        assert_eq!(scores_from_value(&value, None).unwrap(), vec![0.1, 0.2, 0.3, 0.4]);
        assert_eq!(scores_from_value(&value, Some(4)).unwrap().len(), 4);
    }

    #[test]
    fn f16_output_is_widened() {
        let halves: Vec<f16> = [0.25f32, 0.5, 0.125].iter().map(|&v| f16::from_f32(v)).collect();
        let value = Tensor::from_array(Array2::from_shape_vec((1, 3), halves).unwrap())
            .unwrap()
            .into_dyn();
        assert_eq!(scores_from_value(&value, None).unwrap(), vec![0.25, 0.5, 0.125]);
    }

    #[test]
    fn output_wider_than_declared_classes_is_trimmed() {
        let value = Tensor::from_array(Array2::from_shape_vec((2, 3), vec![0.7f32, 0.2, 0.1, 9.0, 9.0, 9.0]).unwrap())
            .unwrap()
            .into_dyn();
        assert_eq!(scores_from_value(&value, Some(3)).unwrap(), vec![0.7, 0.2, 0.1]);

        let halves: Vec<f16> = (0..6).map(|i| f16::from_f32(i as f32)).collect();
        let value = Tensor::from_array(Array2::from_shape_vec((1, 6), halves).unwrap())
            .unwrap()
            .into_dyn();
        assert_eq!(scores_from_value(&value, Some(2)).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn integer_output_is_rejected() {
        let value = Tensor::from_array(Array2::from_shape_vec((1, 2), vec![1i64, 2]).unwrap())
            .unwrap()
            .into_dyn();
        assert!(scores_from_value(&value, None).is_err());
    }
}
