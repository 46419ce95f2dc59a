use ndarray::{Array1, ArrayView1};
use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::mapping::Labels;

/// Retained mass below which plant filtering is abandoned.
pub const DEFAULT_MIN_PLANT_MASS: f32 = 0.15;

/// Applies softmax to a 1D array and returns a new Array1<f32>.
pub fn softmax(slice: ArrayView1<'_, f32>) -> Array1<f32> {
    let max_val = slice.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_vals: Array1<f32> = slice.mapv(|x| (x - max_val).exp());
    let sum_exp: f32 = exp_vals.sum();
    exp_vals.mapv(|v| v / sum_exp)
}

/// Index and value of the largest score; the first index wins ties.
/// An empty vector yields `(0, -inf)`.
pub fn argmax_and_max(scores: &[f32]) -> (usize, f32) {
    scores
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(max_idx, max_val), (i, &val)| {
            if val > max_val { (i, val) } else { (max_idx, max_val) }
        })
}

/// Indices of the `k` highest scores, highest first. Equal scores keep index order
/// and NaN ranks last.
pub fn top_k(scores: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by_key(|&i| {
        let s = scores[i];
        std::cmp::Reverse(OrderedFloat(if s.is_nan() { f32::NEG_INFINITY } else { s }))
    });
    indices.truncate(k);
    indices
}

/// What plant-scoped filtering did to a prediction vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantFilter {
    /// Hint as sent by the client
    pub requested: Option<String>,
    /// Plant name from the label list the hint resolved to
    pub matched_plant: Option<String>,
    /// Whether the returned scores were restricted to `matched_plant`
    pub applied: bool,
    /// False when the image carried too little mass for the requested plant
    pub confident_match: bool,
    /// Summed confidence of the matched plant's classes before renormalizing
    pub retained_mass: Option<f32>,
}

impl PlantFilter {
    fn passthrough(requested: Option<&str>) -> Self {
        Self {
            requested: requested.map(str::to_string),
            matched_plant: None,
            applied: false,
            confident_match: true,
            retained_mass: None,
        }
    }
}

/// Restricts `scores` to the classes of the plant named by `hint`.
///
/// Classes of other plants are zeroed and the rest renormalized to sum to one.
/// When the retained mass is below `min_mass` the original scores come back
/// unchanged with `confident_match == false`. Unknown or empty hints pass the
/// scores through untouched.
pub fn filter_by_plant(
    scores: &[f32],
    labels: &Labels,
    hint: Option<&str>,
    min_mass: f32,
) -> (Vec<f32>, PlantFilter) {
    let requested = hint.map(str::trim).filter(|h| !h.is_empty());
    let Some(plant) = requested.and_then(|h| labels.match_plant(h)) else {
        return (scores.to_vec(), PlantFilter::passthrough(requested));
    };

    let keep = labels.indices_for_plant(plant);
    let retained_mass: f32 = keep.iter().filter_map(|&i| scores.get(i)).sum();

    let mut report = PlantFilter {
        requested: requested.map(str::to_string),
        matched_plant: Some(plant.to_string()),
        applied: false,
        confident_match: false,
        retained_mass: Some(retained_mass),
    };

    if retained_mass < min_mass || retained_mass <= 0.0 {
        tracing::debug!(plant, retained_mass, "plant filter below threshold, keeping raw scores");
        return (scores.to_vec(), report);
    }

    let mut filtered = vec![0.0; scores.len()];
    for &i in &keep {
        if let Some(&score) = scores.get(i) {
            filtered[i] = score / retained_mass;
        }
    }
    report.applied = true;
    report.confident_match = true;
    (filtered, report)
}
