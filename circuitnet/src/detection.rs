//! Detector Output
//!
//! Component records as handed over by the object detector: a class label,
//! an axis-aligned bounding box and the keypoints where the component's
//! leads meet the wiring. Records are read from the detector's
//! `circuit_info.json` and normalized before node extraction.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::CircuitNetError;

/// Label reserved for ground symbols (compared case-insensitively)
pub const GROUND_LABEL: &str = "GND";

/// Integer pixel coordinate, serialized as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The detector pads missing keypoints with `(0, 0)`
    pub fn is_padding(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl From<[i64; 2]> for Point {
    fn from([x, y]: [i64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Pixel rectangle with inclusive corners, serialized as `[x1, y1, x2, y2]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i64; 4]", into = "[i64; 4]")]
pub struct BoundingBox {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl BoundingBox {
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i64 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> i64 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Reorder corners so that `x1 <= x2` and `y1 <= y2`
    pub fn normalized(self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }
}

impl From<[i64; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [i64; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [i64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One detected component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub label: String,
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub connection_points: Vec<Point>,
}

impl ComponentRecord {
    pub fn new(
        label: impl Into<String>,
        bounding_box: BoundingBox,
        connection_points: Vec<Point>,
    ) -> Self {
        Self {
            label: label.into(),
            bounding_box,
            connection_points,
        }
    }

    pub fn is_ground(&self) -> bool {
        self.label.eq_ignore_ascii_case(GROUND_LABEL)
    }

    /// Drop padding keypoints and fix inverted box corners
    pub fn normalized(mut self) -> Self {
        self.bounding_box = self.bounding_box.normalized();
        self.connection_points.retain(|p| !p.is_padding());
        self
    }
}

/// Parse detector JSON (an array of component records)
pub fn parse_detections(content: &str) -> Result<Vec<ComponentRecord>, CircuitNetError> {
    let records: Vec<ComponentRecord> = serde_json::from_str(content)?;
    Ok(records.into_iter().map(ComponentRecord::normalized).collect())
}

/// Load and normalize a detector JSON file
pub fn load_detections(path: &Path) -> Result<Vec<ComponentRecord>, CircuitNetError> {
    let content = std::fs::read_to_string(path)?;
    let records = parse_detections(&content)?;
    tracing::debug!("Loaded {} detections from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detector_json() {
        let json = r#"[
            {"label": "R_1", "bounding_box": [10, 20, 60, 40], "connection_points": [[12, 30], [58, 30]]},
            {"label": "gnd", "bounding_box": [5, 5, 15, 15], "connection_points": [[10, 5]]}
        ]"#;

        let records = parse_detections(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label, "R_1");
        assert_eq!(records[0].bounding_box, BoundingBox::new(10, 20, 60, 40));
        assert_eq!(records[0].connection_points, vec![Point::new(12, 30), Point::new(58, 30)]);
        assert!(!records[0].is_ground());
        assert!(records[1].is_ground());
    }

    #[test]
    fn test_padding_keypoints_removed() {
        let json = r#"[{"label": "C_1", "bounding_box": [0, 0, 30, 30], "connection_points": [[0, 0], [15, 0], [0, 0]]}]"#;

        let records = parse_detections(json).unwrap();
        assert_eq!(records[0].connection_points, vec![Point::new(15, 0)]);
    }

    #[test]
    fn test_inverted_box_normalized() {
        let record = ComponentRecord::new("L_1", BoundingBox::new(50, 40, 10, 20), vec![]).normalized();
        assert_eq!(record.bounding_box, BoundingBox::new(10, 20, 50, 40));
        assert!(!record.bounding_box.is_degenerate());
    }

    #[test]
    fn test_extreme_box_size_saturates() {
        let bbox = BoundingBox::new(i64::MIN, -5, i64::MAX, 5);
        assert_eq!(bbox.width(), i64::MAX);
        assert_eq!(bbox.height(), 10);
        assert!(!bbox.is_degenerate());
    }

    #[test]
    fn test_missing_connection_points_defaults_empty() {
        let json = r#"[{"label": "D_1", "bounding_box": [1, 2, 3, 4]}]"#;
        let records = parse_detections(json).unwrap();
        assert!(records[0].connection_points.is_empty());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(parse_detections("{not json").is_err());
    }

    #[test]
    fn test_roundtrip_shape() {
        let record = ComponentRecord::new("V_1", BoundingBox::new(1, 2, 3, 4), vec![Point::new(5, 6)]);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"label":"V_1","bounding_box":[1,2,3,4],"connection_points":[[5,6]]}"#
        );
    }
}
