use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;
const FALL_LABEL: &str = "fall";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BoundingBox {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

/// One object returned by the inference service. Only the label and the
/// confidence drive detection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Prediction {
    #[serde(rename = "class", default = "unknown_class")]
    pub class_name: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    // Some model versions emit the box under this name instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bear: Option<BoundingBox>,
}

fn unknown_class() -> String {
    "unknown".to_string()
}

impl Prediction {
    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref().or(self.bear.as_ref())
    }

    pub fn is_fall(&self, threshold: f64) -> bool {
        self.class_name.to_lowercase().contains(FALL_LABEL) && self.confidence > threshold
    }
}

/// True when any prediction qualifies as a fall above `threshold`.
pub fn classify(predictions: &[Prediction], threshold: f64) -> bool {
    predictions.iter().any(|p| p.is_fall(threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(class_name: &str, confidence: f64) -> Prediction {
        Prediction {
            class_name: class_name.to_string(),
            confidence,
            bbox: None,
            bear: None,
        }
    }

    #[test]
    fn matches_fall_label_case_insensitively() {
        assert!(classify(&[prediction("FALL", 0.9)], 0.5));
        assert!(classify(&[prediction("Fallen-Person", 0.6)], 0.5));
        assert!(!classify(&[prediction("standing", 0.99)], 0.5));
    }

    #[test]
    fn confidence_must_be_strictly_above_threshold() {
        assert!(!classify(&[prediction("fall", 0.5)], 0.5));
        assert!(classify(&[prediction("fall", 0.500_1)], 0.5));
    }

    #[test]
    fn any_qualifying_prediction_is_enough() {
        let predictions = [
            prediction("person", 0.95),
            prediction("fall", 0.3),
            prediction("fall", 0.7),
        ];
        assert!(classify(&predictions, 0.5));
        assert!(!classify(&[], 0.5));
    }

    #[test]
    fn parses_missing_fields_and_legacy_box() {
        let pred: Prediction =
            serde_json::from_str(r#"{"bear": {"x": 1, "y": 2, "width": 3, "height": 4}}"#)
                .unwrap();

        assert_eq!(pred.class_name, "unknown");
        assert_eq!(pred.confidence, 0.0);
        assert_eq!(
            pred.bounding_box(),
            Some(&BoundingBox {
                x: 1.0,
                y: 2.0,
                width: 3.0,
                height: 4.0
            })
        );
    }

    #[test]
    fn prefers_bbox_over_legacy_box() {
        let pred: Prediction = serde_json::from_str(
            r#"{"class": "fall", "confidence": 0.8, "bbox": {"x": 5}, "bear": {"x": 9}}"#,
        )
        .unwrap();

        assert_eq!(pred.bounding_box().map(|b| b.x), Some(5.0));
    }
}
