use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;

/// Separator between the plant and disease halves of a class label.
pub const LABEL_SEPARATOR: &str = "___";

/// PlantVillage classes in model output order.
pub const PLANT_VILLAGE_CLASSES: [&str; 38] = [
    "Apple___Apple_scab",
    "Apple___Black_rot",
    "Apple___Cedar_apple_rust",
    "Apple___healthy",
    "Blueberry___healthy",
    "Cherry_(including_sour)___Powdery_mildew",
    "Cherry_(including_sour)___healthy",
    "Corn_(maize)___Cercospora_leaf_spot Gray_leaf_spot",
    "Corn_(maize)___Common_rust_",
    "Corn_(maize)___Northern_Leaf_Blight",
    "Corn_(maize)___healthy",
    "Grape___Black_rot",
    "Grape___Esca_(Black_Measles)",
    "Grape___Leaf_blight_(Isariopsis_Leaf_Spot)",
    "Grape___healthy",
    "Orange___Haunglongbing_(Citrus_greening)",
    "Peach___Bacterial_spot",
    "Peach___healthy",
    "Pepper,_bell___Bacterial_spot",
    "Pepper,_bell___healthy",
    "Potato___Early_blight",
    "Potato___Late_blight",
    "Potato___healthy",
    "Raspberry___healthy",
    "Soybean___healthy",
    "Squash___Powdery_mildew",
    "Strawberry___Leaf_scorch",
    "Strawberry___healthy",
    "Tomato___Bacterial_spot",
    "Tomato___Early_blight",
    "Tomato___Late_blight",
    "Tomato___Leaf_Mold",
    "Tomato___Septoria_leaf_spot",
    "Tomato___Spider_mites Two-spotted_spider_mite",
    "Tomato___Target_Spot",
    "Tomato___Tomato_Yellow_Leaf_Curl_Virus",
    "Tomato___Tomato_mosaic_virus",
    "Tomato___healthy",
];

/// Plant and disease halves of a class label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassParts<'a> {
    pub plant: &'a str,
    pub disease: &'a str,
}

/// Splits `"<Plant>___<Disease>"`. A label without separator keeps the whole
/// text as plant and reports the disease as `Unknown`.
pub fn split_label(label: &str) -> ClassParts<'_> {
    let mut parts = label.split(LABEL_SEPARATOR);
    let plant = parts.next().filter(|p| !p.is_empty()).unwrap_or("Unknown");
    let disease = parts.next().filter(|d| !d.is_empty()).unwrap_or("Unknown");
    ClassParts { plant, disease }
}

/// Lowercases and drops everything that is not a letter or digit, so that
/// `"Pepper, bell"` and `"Pepper,_bell"` compare equal.
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Ordered class labels; index `i` names output `i` of the model.
#[derive(Debug, Clone)]
pub struct Labels {
    names: Vec<String>,
}

impl Default for Labels {
    fn default() -> Self {
        Self::new(PLANT_VILLAGE_CLASSES.iter().map(|s| s.to_string()).collect())
    }
}

impl Labels {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Label for `index`, or `Class_<index>` past the end of the list.
    pub fn name(&self, index: usize) -> Cow<'_, str> {
        match self.get(index) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("Class_{}", index)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Distinct plant names in first-seen order.
    pub fn plants(&self) -> Vec<&str> {
        let mut plants: Vec<&str> = Vec::new();
        for label in self.iter() {
            let plant = split_label(label).plant;
            if !plants.contains(&plant) {
                plants.push(plant);
            }
        }
        plants
    }

    /// Resolves a free-text plant hint to the plant name used in the labels.
    ///
    /// An exact match (ignoring case and punctuation) wins; otherwise the first
    /// plant whose name starts with the hint is taken, so `"corn"` resolves to
    /// `"Corn_(maize)"`. Empty hints resolve to nothing.
    pub fn match_plant(&self, hint: &str) -> Option<&str> {
        let hint = normalize(hint);
        if hint.is_empty() {
            return None;
        }
        let plants = self.plants();
        plants
            .iter()
            .find(|plant| normalize(plant) == hint)
            .or_else(|| plants.iter().find(|plant| normalize(plant).starts_with(&hint)))
            .copied()
    }

    /// Indices of the classes belonging to `plant`.
    pub fn indices_for_plant(&self, plant: &str) -> Vec<usize> {
        self.iter()
            .enumerate()
            .filter(|(_, label)| split_label(label).plant == plant)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Reads one label per line, skipping blank lines. Index 0 is the first label.
pub fn load_class_mapping(file_path: impl AsRef<Path>) -> Result<Labels> {
    let file = File::open(file_path)?;
    let reader = BufReader::new(file);

    let mut names = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }

    Ok(Labels::new(names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn splits_plant_and_disease() {
        let parts = split_label("Corn_(maize)___Common_rust_");
        assert_eq!(parts.plant, "Corn_(maize)");
        assert_eq!(parts.disease, "Common_rust_");
    }

    #[test]
    fn label_without_separator_has_unknown_disease() {
        let parts = split_label("Class_42");
        assert_eq!(parts.plant, "Class_42");
        assert_eq!(parts.disease, "Unknown");
    }

    #[test]
    fn out_of_range_index_gets_placeholder_name() {
        let labels = Labels::default();
        assert_eq!(labels.name(3), "Apple___healthy");
        assert_eq!(labels.name(38), "Class_38");
    }

    #[test]
    fn default_labels_cover_fourteen_plants() {
        let labels = Labels::default();
        assert_eq!(labels.len(), 38);
        assert_eq!(labels.plants().len(), 14);
    }

    #[test]
    fn plant_hint_matching() {
        let labels = Labels::default();
        assert_eq!(labels.match_plant("tomato"), Some("Tomato"));
        assert_eq!(labels.match_plant("  TOMATO "), Some("Tomato"));
        assert_eq!(labels.match_plant("corn"), Some("Corn_(maize)"));
        assert_eq!(labels.match_plant("Pepper, bell"), Some("Pepper,_bell"));
        assert_eq!(labels.match_plant("cherry"), Some("Cherry_(including_sour)"));
        assert_eq!(labels.match_plant("banana"), None);
        assert_eq!(labels.match_plant(""), None);
        assert_eq!(labels.match_plant(" - "), None);
    }

    #[test]
    fn indices_for_plant_are_contiguous_for_apple() {
        let labels = Labels::default();
        assert_eq!(labels.indices_for_plant("Apple"), vec![0, 1, 2, 3]);
        assert_eq!(labels.indices_for_plant("Tomato").len(), 10);
    }

    #[test]
    fn loads_labels_from_file() {
        let path = std::env::temp_dir().join(format!("leafcheck-labels-{}.txt", std::process::id()));
        {
            let mut file = File::create(&path).unwrap();
            writeln!(file, "Apple___healthy").unwrap();
            writeln!(file).unwrap();
            writeln!(file, "  Tomato___Leaf_Mold  ").unwrap();
        }
        let labels = load_class_mapping(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get(1), Some("Tomato___Leaf_Mold"));
    }
}
