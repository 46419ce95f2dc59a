//! Static agronomic advice keyed by class label.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    None,
    Low,
    Moderate,
    High,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiseaseInfo {
    pub severity: Severity,
    pub treatment: &'static str,
    pub prevention: &'static str,
    pub causes: &'static str,
    pub symptoms: &'static str,
    pub best_practices: &'static [&'static str],
}

/// Returned for labels without an entry, including `Class_<n>` placeholders.
pub const GENERIC_INFO: DiseaseInfo = DiseaseInfo {
    severity: Severity::Unknown,
    treatment: "Consult with agricultural expert",
    prevention: "Follow general plant care practices",
    causes: "Not identified",
    symptoms: "Not documented for this class",
    best_practices: &[
        "Send a sample to a local extension service for confirmation",
        "Isolate the affected plant until the cause is known",
    ],
};

const HEALTHY_PRACTICES: &[&str] = &[
    "Keep a regular watering and fertilizing schedule",
    "Inspect leaves weekly for early signs of disease",
    "Remove plant debris at the end of the season",
];

const fn healthy(prevention: &'static str) -> DiseaseInfo {
    DiseaseInfo {
        severity: Severity::None,
        treatment: "No treatment needed",
        prevention,
        causes: "None",
        symptoms: "No disease symptoms detected",
        best_practices: HEALTHY_PRACTICES,
    }
}

static DISEASE_INFO: &[(&str, DiseaseInfo)] = &[
    ("Apple___Apple_scab", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Apply fungicide sprays, remove infected leaves",
        prevention: "Good air circulation, avoid overhead watering",
        causes: "Fungus Venturia inaequalis overwintering in fallen leaves",
        symptoms: "Olive-green to black velvety spots on leaves and fruit, leaf curling",
        best_practices: &[
            "Rake and destroy fallen leaves in autumn",
            "Plant scab-resistant cultivars",
            "Start protective sprays at green tip",
        ],
    }),
    ("Apple___Black_rot", DiseaseInfo {
        severity: Severity::High,
        treatment: "Remove infected parts, apply copper-based fungicide",
        prevention: "Prune for good airflow, sanitize tools",
        causes: "Fungus Botryosphaeria obtusa entering through wounds and dead wood",
        symptoms: "Purple-bordered leaf spots (frog-eye), rotting fruit, sunken limb cankers",
        best_practices: &[
            "Cut out cankers and mummified fruit during dormancy",
            "Disinfect pruning tools between cuts",
            "Avoid bark injuries from equipment",
        ],
    }),
    ("Apple___Cedar_apple_rust", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Apply myclobutanil or sulfur fungicide from pink bud stage",
        prevention: "Remove nearby juniper hosts, plant resistant varieties",
        causes: "Fungus Gymnosporangium juniperi-virginianae alternating between apple and juniper",
        symptoms: "Bright yellow-orange spots on upper leaf surface, tube-like structures underneath",
        best_practices: &[
            "Remove galls from junipers within a few hundred meters",
            "Spray during wet spring weather when spores are released",
        ],
    }),
    ("Apple___healthy", healthy("Annual dormant pruning and balanced fertilization")),
    ("Blueberry___healthy", healthy("Maintain acidic soil (pH 4.5-5.5) and mulch the root zone")),
    ("Cherry_(including_sour)___Powdery_mildew", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Apply sulfur or potassium bicarbonate fungicide, remove infected shoots",
        prevention: "Prune for open canopy, avoid excess nitrogen",
        causes: "Fungus Podosphaera clandestina favored by warm days and humid nights",
        symptoms: "White powdery patches on young leaves, leaf curling and distortion",
        best_practices: &[
            "Begin sprays at shuck fall",
            "Irrigate at the base rather than overhead",
        ],
    }),
    ("Cherry_(including_sour)___healthy", healthy("Prune after harvest to keep the canopy open")),
    ("Corn_(maize)___Cercospora_leaf_spot Gray_leaf_spot", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Apply strobilurin or triazole fungicide at tasseling if lesions spread",
        prevention: "Crop rotation, tillage of residue, resistant hybrids",
        causes: "Fungus Cercospora zeae-maydis surviving on corn residue",
        symptoms: "Rectangular gray to tan lesions running parallel to leaf veins",
        best_practices: &[
            "Rotate away from corn for at least one season",
            "Scout lower leaves from mid-season onward",
        ],
    }),
    ("Corn_(maize)___Common_rust_", DiseaseInfo {
        severity: Severity::Low,
        treatment: "Fungicide only when pustules reach upper leaves before silking",
        prevention: "Plant resistant hybrids, early planting",
        causes: "Fungus Puccinia sorghi carried by wind from southern regions",
        symptoms: "Cinnamon-brown powdery pustules on both leaf surfaces",
        best_practices: &[
            "Scout weekly during cool humid weather",
            "Choose hybrids with rust resistance ratings",
        ],
    }),
    ("Corn_(maize)___Northern_Leaf_Blight", DiseaseInfo {
        severity: Severity::High,
        treatment: "Apply foliar fungicide at first lesions on upper leaves",
        prevention: "Resistant hybrids, crop rotation, residue management",
        causes: "Fungus Exserohilum turcicum favored by moderate temperatures and heavy dew",
        symptoms: "Long cigar-shaped gray-green lesions on leaves",
        best_practices: &[
            "Bury or remove infected residue after harvest",
            "Avoid continuous corn in the same field",
        ],
    }),
    ("Corn_(maize)___healthy", healthy("Rotate crops and keep balanced soil fertility")),
    ("Grape___Black_rot", DiseaseInfo {
        severity: Severity::High,
        treatment: "Apply mancozeb or myclobutanil from bud break, remove mummified berries",
        prevention: "Canopy management, sanitation of vineyard floor",
        causes: "Fungus Guignardia bidwellii overwintering in mummies and canes",
        symptoms: "Tan leaf spots with dark borders, shriveled black berries",
        best_practices: &[
            "Remove all mummies from vines and ground before spring",
            "Keep sprays on a 10-14 day interval during wet weather",
        ],
    }),
    ("Grape___Esca_(Black_Measles)", DiseaseInfo {
        severity: Severity::High,
        treatment: "No cure; remove severely affected vines and prune out infected wood",
        prevention: "Protect pruning wounds, prune in dry weather",
        causes: "Wood-infecting fungi including Phaeomoniella and Phaeoacremonium species",
        symptoms: "Tiger-stripe leaf discoloration, dark spotting on berries, sudden vine collapse",
        best_practices: &[
            "Seal large pruning wounds",
            "Mark symptomatic vines and prune them last",
        ],
    }),
    ("Grape___Leaf_blight_(Isariopsis_Leaf_Spot)", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Apply copper or mancozeb fungicide, remove infected leaves",
        prevention: "Improve air circulation, avoid wetting foliage",
        causes: "Fungus Pseudocercospora vitis",
        symptoms: "Irregular dark brown spots on older leaves, premature defoliation",
        best_practices: &[
            "Thin shoots to open the canopy",
            "Collect and destroy fallen leaves",
        ],
    }),
    ("Grape___healthy", healthy("Keep the canopy open and monitor during wet periods")),
    ("Orange___Haunglongbing_(Citrus_greening)", DiseaseInfo {
        severity: Severity::High,
        treatment: "No cure; remove infected trees to protect the grove",
        prevention: "Control Asian citrus psyllid, use certified disease-free nursery stock",
        causes: "Bacterium Candidatus Liberibacter spread by the Asian citrus psyllid",
        symptoms: "Blotchy asymmetric leaf mottling, lopsided bitter fruit, twig dieback",
        best_practices: &[
            "Inspect new flush for psyllids",
            "Report suspected cases to the local plant protection office",
        ],
    }),
    ("Peach___Bacterial_spot", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Apply copper sprays in dormancy and oxytetracycline during the season",
        prevention: "Plant resistant cultivars, avoid sandy exposed sites",
        causes: "Bacterium Xanthomonas arboricola pv. pruni spread by wind-driven rain",
        symptoms: "Small angular water-soaked leaf spots turning to shot holes, pitted fruit",
        best_practices: &[
            "Use windbreaks to reduce leaf injury",
            "Avoid excess nitrogen that promotes tender growth",
        ],
    }),
    ("Peach___healthy", healthy("Prune annually and apply dormant sprays")),
    ("Pepper,_bell___Bacterial_spot", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Apply copper-based bactericide, remove infected plants",
        prevention: "Use disease-free seed, crop rotation, avoid overhead irrigation",
        causes: "Xanthomonas bacteria carried on seed and spread by splashing water",
        symptoms: "Small water-soaked leaf spots becoming brown with yellow halo, scabby fruit",
        best_practices: &[
            "Rotate out of peppers and tomatoes for two years",
            "Do not work in the field while foliage is wet",
        ],
    }),
    ("Pepper,_bell___healthy", healthy("Stake plants and water at the base")),
    ("Potato___Early_blight", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Apply chlorothalonil or mancozeb fungicide, remove lower infected leaves",
        prevention: "Crop rotation, adequate fertilization, avoid plant stress",
        causes: "Fungus Alternaria solani surviving in soil and plant debris",
        symptoms: "Dark brown concentric-ring (target) spots on older leaves",
        best_practices: &[
            "Hill soil around plants",
            "Destroy volunteer potatoes and cull piles",
        ],
    }),
    ("Potato___Late_blight", DiseaseInfo {
        severity: Severity::High,
        treatment: "Immediate fungicide application, destroy infected plants",
        prevention: "Certified seed tubers, good drainage, avoid overhead watering",
        causes: "Water mold Phytophthora infestans spreading rapidly in cool wet weather",
        symptoms: "Dark water-soaked lesions with white mold on leaf undersides, rotting tubers",
        best_practices: &[
            "Monitor regional blight forecasts",
            "Kill vines two weeks before harvest",
            "Never compost infected plants",
        ],
    }),
    ("Potato___healthy", healthy("Use certified seed and rotate fields")),
    ("Raspberry___healthy", healthy("Remove old floricanes after fruiting")),
    ("Soybean___healthy", healthy("Rotate with non-legume crops and scout regularly")),
    ("Squash___Powdery_mildew", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Apply sulfur, neem oil, or potassium bicarbonate, remove heavily infected leaves",
        prevention: "Resistant varieties, full sun, proper spacing",
        causes: "Fungi Podosphaera xanthii and Erysiphe cichoracearum",
        symptoms: "White powdery spots on leaves and stems, yellowing foliage",
        best_practices: &[
            "Start treatment at the first spots",
            "Avoid crowding plants",
        ],
    }),
    ("Strawberry___Leaf_scorch", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Remove infected leaves, apply captan or myclobutanil fungicide",
        prevention: "Renovate beds after harvest, use drip irrigation",
        causes: "Fungus Diplocarpon earlianum",
        symptoms: "Small dark purple spots merging until leaves look scorched",
        best_practices: &[
            "Replant beds every three to four years",
            "Mow and remove old foliage after harvest",
        ],
    }),
    ("Strawberry___healthy", healthy("Mulch with straw and renew beds periodically")),
    ("Tomato___Bacterial_spot", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Apply copper-based bactericide, remove infected leaves",
        prevention: "Disease-free seed and transplants, crop rotation",
        causes: "Xanthomonas bacteria spread by rain splash and handling",
        symptoms: "Small dark greasy spots on leaves and raised scabby spots on fruit",
        best_practices: &[
            "Avoid handling wet plants",
            "Disinfect stakes and cages between seasons",
        ],
    }),
    ("Tomato___Early_blight", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Apply fungicide, remove affected leaves",
        prevention: "Crop rotation, mulching, proper spacing",
        causes: "Fungus Alternaria solani surviving in soil and debris",
        symptoms: "Brown spots with concentric rings on lower leaves, yellowing around lesions",
        best_practices: &[
            "Mulch to stop soil splashing onto leaves",
            "Stake plants to keep foliage off the ground",
        ],
    }),
    ("Tomato___Late_blight", DiseaseInfo {
        severity: Severity::High,
        treatment: "Immediate fungicide application, remove infected plants",
        prevention: "Avoid overhead watering, ensure good drainage",
        causes: "Water mold Phytophthora infestans",
        symptoms: "Large greasy gray-green lesions on leaves and stems, firm brown fruit rot",
        best_practices: &[
            "Bag and remove infected plants, do not compost",
            "Keep tomatoes away from potato plantings",
        ],
    }),
    ("Tomato___Leaf_Mold", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Improve ventilation, apply chlorothalonil or copper fungicide",
        prevention: "Keep relative humidity below 85%, space plants widely",
        causes: "Fungus Passalora fulva, mainly in greenhouses and high tunnels",
        symptoms: "Pale yellow spots on upper leaf surface with olive-green mold underneath",
        best_practices: &[
            "Vent greenhouses in the morning",
            "Prune lower leaves for airflow",
        ],
    }),
    ("Tomato___Septoria_leaf_spot", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Remove infected lower leaves, apply chlorothalonil or copper fungicide",
        prevention: "Crop rotation, mulch, water at the base",
        causes: "Fungus Septoria lycopersici surviving on plant debris",
        symptoms: "Many small circular spots with dark borders and gray centers",
        best_practices: &[
            "Remove weeds from the nightshade family",
            "Clean up all debris after the season",
        ],
    }),
    ("Tomato___Spider_mites Two-spotted_spider_mite", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Spray insecticidal soap or miticide, release predatory mites",
        prevention: "Avoid drought stress and dusty conditions",
        causes: "Pest Tetranychus urticae thriving in hot dry weather",
        symptoms: "Fine yellow stippling on leaves, webbing on leaf undersides",
        best_practices: &[
            "Hose down foliage to knock back populations",
            "Avoid broad-spectrum insecticides that kill predators",
        ],
    }),
    ("Tomato___Target_Spot", DiseaseInfo {
        severity: Severity::Moderate,
        treatment: "Apply chlorothalonil or azoxystrobin fungicide, remove infected leaves",
        prevention: "Improve airflow, crop rotation",
        causes: "Fungus Corynespora cassiicola",
        symptoms: "Brown spots with concentric rings and light centers on leaves and fruit",
        best_practices: &[
            "Prune to open the canopy",
            "Remove crop residue after harvest",
        ],
    }),
    ("Tomato___Tomato_Yellow_Leaf_Curl_Virus", DiseaseInfo {
        severity: Severity::High,
        treatment: "No cure; remove infected plants and control whiteflies",
        prevention: "Resistant varieties, insect netting, whitefly control",
        causes: "Begomovirus transmitted by the silverleaf whitefly",
        symptoms: "Upward curling yellow leaves, stunted growth, flower drop",
        best_practices: &[
            "Use yellow sticky traps to monitor whiteflies",
            "Keep a host-free period between crops",
        ],
    }),
    ("Tomato___Tomato_mosaic_virus", DiseaseInfo {
        severity: Severity::High,
        treatment: "No cure; remove and destroy infected plants",
        prevention: "Use certified seed, disinfect tools and hands",
        causes: "Tobamovirus spread mechanically by tools, hands and infected seed",
        symptoms: "Light and dark green mottled leaves, leaf distortion, uneven fruit ripening",
        best_practices: &[
            "Wash hands with soap before handling plants",
            "Do not use tobacco products around tomatoes",
        ],
    }),
    ("Tomato___healthy", healthy("Stake, mulch and water consistently at the base")),
];

/// Advice record for `label`, or [`GENERIC_INFO`] when the label is unknown.
pub fn disease_info(label: &str) -> &'static DiseaseInfo {
    DISEASE_INFO
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, info)| info)
        .unwrap_or(&GENERIC_INFO)
}

/// A class is healthy when its disease component mentions "healthy".
pub fn is_healthy(disease: &str) -> bool {
    disease.to_lowercase().contains("healthy")
}

/// `"Cercospora_leaf_spot Gray_leaf_spot"` -> `"Cercospora leaf spot Gray leaf spot"`.
pub fn display_name(disease: &str) -> Cow<'_, str> {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let re = SEPARATORS.get_or_init(|| Regex::new(r"[_\s]+").expect("separator pattern is valid"));
    match re.replace_all(disease, " ") {
        Cow::Borrowed(s) => Cow::Borrowed(s.trim()),
        Cow::Owned(s) => Cow::Owned(s.trim().to_string()),
    }
}

/// Short natural-language advice for the primary prediction.
pub fn recommendation(disease: &str, info: &DiseaseInfo) -> String {
    if is_healthy(disease) {
        return "Your plant appears to be healthy! Continue with regular care.".to_string();
    }
    let name = display_name(disease);
    match info.severity {
        Severity::High => format!(
            "Disease detected: {}. This is a serious disease, act promptly: {}.",
            name, info.treatment
        ),
        Severity::Low => format!(
            "Disease detected: {}. Usually minor, monitor the plant: {}.",
            name, info.treatment
        ),
        _ => format!("Disease detected: {}. {}.", name, info.treatment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::PLANT_VILLAGE_CLASSES;

    #[test]
    fn every_builtin_class_has_advice() {
        for label in PLANT_VILLAGE_CLASSES {
            assert_ne!(disease_info(label), &GENERIC_INFO, "missing advice for {}", label);
        }
    }

    #[test]
    fn unknown_label_gets_generic_record() {
        let info = disease_info("Class_99");
        assert_eq!(info.severity, Severity::Unknown);
        assert_eq!(info.treatment, "Consult with agricultural expert");
    }

    #[test]
    fn healthy_detection_is_case_insensitive() {
        assert!(is_healthy("healthy"));
        assert!(is_healthy("Healthy_leaf"));
        assert!(!is_healthy("Late_blight"));
    }

    #[test]
    fn display_name_collapses_underscores() {
        assert_eq!(display_name("Common_rust_"), "Common rust");
        assert_eq!(
            display_name("Spider_mites Two-spotted_spider_mite"),
            "Spider mites Two-spotted spider mite"
        );
        assert_eq!(display_name("Leaf"), "Leaf");
    }

    #[test]
    fn recommendation_depends_on_health_and_severity() {
        let healthy = recommendation("healthy", disease_info("Tomato___healthy"));
        assert!(healthy.contains("healthy"));

        let high = recommendation("Late_blight", disease_info("Tomato___Late_blight"));
        assert!(high.starts_with("Disease detected: Late blight."));
        assert!(high.contains("act promptly"));

        let low = recommendation("Common_rust_", disease_info("Corn_(maize)___Common_rust_"));
        assert!(low.contains("monitor"));

        let unknown = recommendation("Unknown", &GENERIC_INFO);
        assert_eq!(unknown, "Disease detected: Unknown. Consult with agricultural expert.");
    }
}
