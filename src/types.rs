//! Core data types: box geometry and detection records.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Axis-aligned bounding box in LTWH (Left-Top-Width-Height) format.
///
/// Width and height are expected to be non-negative but this is not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Get the area of the bounding box.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Get the right coordinate (left + width).
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Get the bottom coordinate (top + height).
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Check if the bounding box is valid (positive dimensions).
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Area of the axis-aligned overlap with `other`, clipped at zero.
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let x_left = self.left.max(other.left);
        let y_top = self.top.max(other.top);
        let x_right = self.right().min(other.right());
        let y_bottom = self.bottom().min(other.bottom());

        (x_right - x_left).max(0.0) * (y_bottom - y_top).max(0.0)
    }

    /// Area covered by either box.
    pub fn union_area(&self, other: &BoundingBox) -> f64 {
        self.area() + other.area() - self.intersection_area(other)
    }

    /// Intersection over Union with `other`.
    ///
    /// Returns 0.0 when the union area is not positive, e.g. for two
    /// zero-area boxes at the same location.
    ///
    /// # Example
    ///
    /// ```
    /// use benchmark_eval::types::BoundingBox;
    ///
    /// let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    /// let b = BoundingBox::new(5.0, 5.0, 10.0, 10.0);
    /// assert!((a.iou(&b) - 25.0 / 175.0).abs() < 1e-12);
    /// ```
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let union = self.union_area(other);
        if union > 0.0 {
            self.intersection_area(other) / union
        } else {
            0.0
        }
    }
}

fn default_confidence() -> f64 {
    1.0
}

/// A single detected (or annotated) object, one row of a detection file.
///
/// Equality and hashing cover every field, so duplicate detections can be
/// removed with a `HashSet`. Floats compare by bit pattern for hashing and
/// by value for equality, which agree for every non-NaN input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedObjectInfo {
    pub label_name: String,
    pub bbox_x: f64,
    pub bbox_y: f64,
    pub bbox_width: f64,
    pub bbox_height: f64,
    pub image_name: String,
    pub image_width: i64,
    pub image_height: i64,
    /// Confidence score, 1.0 for ground truth rows without a score.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl DetectedObjectInfo {
    /// Create a detection with the default confidence of 1.0.
    pub fn new(
        label_name: impl Into<String>,
        bbox: BoundingBox,
        image_name: impl Into<String>,
        image_width: i64,
        image_height: i64,
    ) -> Self {
        Self {
            label_name: label_name.into(),
            bbox_x: bbox.left,
            bbox_y: bbox.top,
            bbox_width: bbox.width,
            bbox_height: bbox.height,
            image_name: image_name.into(),
            image_width,
            image_height,
            confidence: default_confidence(),
        }
    }

    /// Return a copy with the given confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Box view of the `bbox_*` fields.
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.bbox_x, self.bbox_y, self.bbox_width, self.bbox_height)
    }
}

impl PartialEq for DetectedObjectInfo {
    fn eq(&self, other: &Self) -> bool {
        self.label_name == other.label_name
            && self.bbox_x == other.bbox_x
            && self.bbox_y == other.bbox_y
            && self.bbox_width == other.bbox_width
            && self.bbox_height == other.bbox_height
            && self.image_name == other.image_name
            && self.image_width == other.image_width
            && self.image_height == other.image_height
            && self.confidence == other.confidence
    }
}

impl Eq for DetectedObjectInfo {}

// -0.0 and 0.0 are equal, so they must hash the same.
fn hash_f64<H: Hasher>(value: f64, state: &mut H) {
    let normalized = if value == 0.0 { 0.0 } else { value };
    normalized.to_bits().hash(state);
}

impl Hash for DetectedObjectInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label_name.hash(state);
        hash_f64(self.bbox_x, state);
        hash_f64(self.bbox_y, state);
        hash_f64(self.bbox_width, state);
        hash_f64(self.bbox_height, state);
        self.image_name.hash(state);
        self.image_width.hash(state);
        self.image_height.hash(state);
        hash_f64(self.confidence, state);
    }
}
