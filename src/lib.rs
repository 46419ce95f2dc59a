pub mod advice;
pub mod cli;
pub mod error;
pub mod helpers;
pub mod mapping;
pub mod model;
pub mod postprocess;
pub mod preprocess;
pub mod report;
pub mod service;
pub mod state;

pub use crate::advice::{disease_info, DiseaseInfo, Severity};
pub use crate::cli::Args;
pub use crate::error::{Error, Result};
pub use crate::helpers::resolve_model;
pub use crate::mapping::{load_class_mapping, split_label, Labels};
pub use crate::model::{Classifier, OnnxClassifier, OnnxModel};
pub use crate::postprocess::{argmax_and_max, filter_by_plant, softmax, top_k, PlantFilter};
pub use crate::preprocess::{decode_base64, decode_image, Layout, PreprocessConfig, Processor};
pub use crate::report::{assemble, Diagnosis, ReportOptions};
pub use crate::service::router;
pub use crate::state::{AppState, Settings, SharedState};
