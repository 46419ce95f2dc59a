//! Turns a score vector into the JSON diagnosis returned to clients.

use serde::Serialize;

use crate::advice::{disease_info, is_healthy, recommendation, DiseaseInfo};
use crate::mapping::{split_label, Labels};
use crate::postprocess::{argmax_and_max, top_k, PlantFilter};

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub plant: String,
    pub disease: String,
    pub full_class: String,
    pub confidence: f32,
    pub is_healthy: bool,
    pub plant_filter: PlantFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopPrediction {
    pub class: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub processing_time_ms: f64,
    pub timestamp: String,
    pub image_width: u32,
    pub image_height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    pub success: bool,
    pub prediction: Prediction,
    pub disease_info: DiseaseInfo,
    pub top_predictions: Vec<TopPrediction>,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Knobs for [`assemble`].
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub top_k: usize,
    pub low_confidence: f32,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            low_confidence: 0.5,
        }
    }
}

/// Builds the diagnosis for already filtered `scores`.
pub fn assemble(scores: &[f32], labels: &Labels, filter: PlantFilter, options: ReportOptions) -> Diagnosis {
    let (index, confidence) = argmax_and_max(scores);
    let full_class = labels.name(index).into_owned();
    let parts = split_label(&full_class);
    let healthy = is_healthy(parts.disease);
    let info = *disease_info(&full_class);

    // Unknown indices are left out of the ranking.
    let top_predictions = top_k(scores, options.top_k)
        .into_iter()
        .filter_map(|i| {
            labels.get(i).map(|class| TopPrediction {
                class: class.to_string(),
                confidence: scores[i],
            })
        })
        .collect();

    let warning = if filter.matched_plant.is_some() && !filter.confident_match {
        Some(format!(
            "The image does not look like a {} leaf; showing predictions across all plants",
            filter.requested.as_deref().unwrap_or("requested")
        ))
    } else if confidence < options.low_confidence {
        Some(format!(
            "Low confidence prediction ({:.1}%); consider retaking the photo in good light",
            confidence * 100.0
        ))
    } else {
        None
    };

    Diagnosis {
        success: true,
        recommendation: recommendation(parts.disease, &info),
        prediction: Prediction {
            plant: parts.plant.to_string(),
            disease: parts.disease.to_string(),
            full_class: full_class.clone(),
            confidence,
            is_healthy: healthy,
            plant_filter: filter,
        },
        disease_info: info,
        top_predictions,
        warning,
        metadata: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::{Severity, GENERIC_INFO};
    use crate::postprocess::{filter_by_plant, DEFAULT_MIN_PLANT_MASS};

    fn no_filter() -> PlantFilter {
        filter_by_plant(&[], &Labels::default(), None, DEFAULT_MIN_PLANT_MASS).1
    }

    #[test]
    fn diseased_prediction() {
        let labels = Labels::default();
        let mut scores = vec![0.0; labels.len()];
        scores[30] = 0.7; // Tomato___Late_blight
        scores[29] = 0.2;
        scores[37] = 0.1;

        let d = assemble(&scores, &labels, no_filter(), ReportOptions::default());
        assert_eq!(d.prediction.plant, "Tomato");
        assert_eq!(d.prediction.disease, "Late_blight");
        assert_eq!(d.prediction.full_class, "Tomato___Late_blight");
        assert!(!d.prediction.is_healthy);
        assert_eq!(d.disease_info.severity, Severity::High);
        assert!(d.recommendation.starts_with("Disease detected: Late blight."));
        assert!(d.warning.is_none());

        let classes: Vec<_> = d.top_predictions.iter().map(|p| p.class.as_str()).collect();
        assert_eq!(classes, ["Tomato___Late_blight", "Tomato___Early_blight", "Tomato___healthy"]);
    }

    #[test]
    fn healthy_prediction() {
        let labels = Labels::default();
        let mut scores = vec![0.0; labels.len()];
        scores[3] = 0.95;
        scores[0] = 0.05;

        let d = assemble(&scores, &labels, no_filter(), ReportOptions::default());
        assert!(d.prediction.is_healthy);
        assert_eq!(d.disease_info.severity, Severity::None);
        assert_eq!(d.recommendation, "Your plant appears to be healthy! Continue with regular care.");
    }

    #[test]
    fn index_past_label_list_is_a_placeholder() {
        let labels = Labels::default();
        let mut scores = vec![0.0; labels.len() + 1];
        scores[labels.len()] = 0.9;
        scores[5] = 0.1;

        let d = assemble(&scores, &labels, no_filter(), ReportOptions::default());
        assert_eq!(d.prediction.full_class, "Class_38");
        assert_eq!(d.prediction.plant, "Class_38");
        assert_eq!(d.prediction.disease, "Unknown");
        assert_eq!(d.disease_info, GENERIC_INFO);
        assert_eq!(d.top_predictions.len(), 2);
        assert_eq!(d.top_predictions[0].class, "Cherry_(including_sour)___Powdery_mildew");
    }

    #[test]
    fn low_confidence_warns() {
        let labels = Labels::default();
        let scores = vec![1.0 / labels.len() as f32; labels.len()];
        let d = assemble(&scores, &labels, no_filter(), ReportOptions::default());
        assert!(d.warning.unwrap().contains("Low confidence"));
    }

    #[test]
    fn rejected_plant_filter_warns() {
        let labels = Labels::default();
        let mut scores = vec![0.0; labels.len()];
        scores[1] = 0.95;
        scores[20] = 0.05;
        let (scores, filter) = filter_by_plant(&scores, &labels, Some("potato"), DEFAULT_MIN_PLANT_MASS);

        let d = assemble(&scores, &labels, filter, ReportOptions::default());
        assert_eq!(d.prediction.full_class, "Apple___Black_rot");
        assert!(!d.prediction.plant_filter.confident_match);
        assert!(d.warning.unwrap().contains("potato"));
    }

    #[test]
    fn top_k_is_configurable() {
        let labels = Labels::default();
        let scores: Vec<f32> = (0..labels.len()).map(|i| i as f32).collect();
        let options = ReportOptions { top_k: 5, ..Default::default() };
        let d = assemble(&scores, &labels, no_filter(), options);
        assert_eq!(d.top_predictions.len(), 5);
        assert_eq!(d.top_predictions[0].class, "Tomato___healthy");
    }

    #[test]
    fn serializes_expected_fields() {
        let labels = Labels::default();
        let mut scores = vec![0.0; labels.len()];
        scores[0] = 1.0;
        let d = assemble(&scores, &labels, no_filter(), ReportOptions::default());
        let json = serde_json::to_value(&d).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["prediction"]["full_class"], "Apple___Apple_scab");
        assert_eq!(json["disease_info"]["severity"], "Moderate");
        assert_eq!(json["top_predictions"][0]["class"], "Apple___Apple_scab");
        assert!(json.get("warning").is_none());
        assert_eq!(json["prediction"]["plant_filter"]["applied"], false);
    }
}
