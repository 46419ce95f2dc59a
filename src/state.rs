//! Process-wide state shared by every request.

use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use ndarray::ArrayView1;

use crate::error::{Error, Result};
use crate::mapping::Labels;
use crate::model::Classifier;
use crate::postprocess::{filter_by_plant, softmax, DEFAULT_MIN_PLANT_MASS};
use crate::preprocess::Processor;
use crate::report::{assemble, Diagnosis, Metadata, ReportOptions};

#[derive(Debug, Clone)]
pub struct Settings {
    /// Apply softmax to raw model outputs (for exports that end in logits)
    pub softmax: bool,
    pub min_plant_mass: f32,
    pub report: ReportOptions,
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            softmax: false,
            min_plant_mass: DEFAULT_MIN_PLANT_MASS,
            report: ReportOptions::default(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

pub struct AppState {
    /// `None` only when the service runs without a model
    pub classifier: Option<Arc<dyn Classifier>>,
    pub processor: Processor,
    pub labels: Labels,
    pub settings: Settings,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        classifier: Option<Arc<dyn Classifier>>,
        processor: Processor,
        labels: Labels,
        settings: Settings,
    ) -> Self {
        if let Some(n) = classifier.as_ref().and_then(|c| c.num_classes()) {
            if n != labels.len() {
                tracing::warn!(
                    model_classes = n,
                    labels = labels.len(),
                    "model output size does not match the label list"
                );
            }
        }
        Self {
            classifier,
            processor,
            labels,
            settings,
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    /// Runs the full pipeline on one decoded image. Blocking.
    pub fn diagnose(&self, image: &DynamicImage, plant_hint: Option<&str>) -> Result<Diagnosis> {
        let classifier = self.classifier.as_ref().ok_or(Error::ModelNotLoaded)?;
        let t = Instant::now();

        let xs = self.processor.preprocess(std::slice::from_ref(image))?;
        let mut scores = classifier.predict(xs)?;
        if scores.is_empty() {
            return Err(Error::Inference("model returned no scores".to_string()));
        }
        if self.settings.softmax {
            scores = softmax(ArrayView1::from(&scores)).to_vec();
        }

        let (scores, filter) = filter_by_plant(&scores, &self.labels, plant_hint, self.settings.min_plant_mass);
        let mut diagnosis = assemble(&scores, &self.labels, filter, self.settings.report);
        diagnosis.metadata = Some(Metadata {
            processing_time_ms: t.elapsed().as_secs_f64() * 1000.0,
            timestamp: chrono::Utc::now().to_rfc3339(),
            image_width: image.width(),
            image_height: image.height(),
        });
        Ok(diagnosis)
    }
}
