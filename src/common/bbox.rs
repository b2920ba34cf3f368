use serde::{Deserialize, Serialize};
use crate::detection_runners::ort_detector::nms::Nms;

/// Unfiltered box proposal in model (letterboxed) space.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f32,
    pub class_id: u32,
}

impl Candidate {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f32, class_id: u32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence,
            class_id,
        }
    }

    /// Builds a candidate from a center box `(cx, cy, w, h)`.
    pub fn from_cxcywh(cx: f64, cy: f64, w: f64, h: f64, confidence: f32, class_id: u32) -> Self {
        Self::new(
            cx - w / 2.0,
            cy - h / 2.0,
            cx + w / 2.0,
            cy + h / 2.0,
            confidence,
            class_id,
        )
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Area of the box, zero for inverted boxes.
    pub fn area(&self) -> f64 {
        self.width().max(0.) * self.height().max(0.)
    }

    /// Computes the intersection area between this box and another.
    pub fn intersect(&self, other: &Candidate) -> f64 {
        let left = self.x1.max(other.x1);
        let right = self.x2.min(other.x2);
        let top = self.y1.max(other.y1);
        let bottom = self.y2.min(other.y2);
        (right - left).max(0.) * (bottom - top).max(0.)
    }

    /// Computes the union area between this box and another.
    pub fn union(&self, other: &Candidate) -> f64 {
        self.area() + other.area() - self.intersect(other)
    }

    pub fn xy1_xy2(&self) -> (f64, f64, f64, f64) {
        (self.x1, self.y1, self.x2, self.y2)
    }

    pub fn with_x1y1_x2y2(mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_class_id(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }
}

impl Nms for Candidate {
    fn iou(&self, other: &Self) -> f64 {
        let inter = self.intersect(other);
        if inter <= 0. {
            return 0.;
        }
        let union = self.union(other);
        if union <= 0. {
            return 0.;
        }
        inter / union
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }

    fn class_id(&self) -> u32 {
        self.class_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_box_converts_to_corners() {
        let c = Candidate::from_cxcywh(50., 40., 20., 10., 0.8, 3);
        assert_eq!(c.xy1_xy2(), (40., 35., 60., 45.));
        assert_eq!(c.class_id, 3);
    }

    #[test]
    fn iou_of_overlapping_boxes() {
        let a = Candidate::new(0., 0., 100., 100., 0.9, 0);
        let b = Candidate::new(10., 10., 110., 110., 0.7, 0);
        // 8100 / (10000 + 10000 - 8100)
        assert!((a.iou(&b) - 0.680_672).abs() < 1e-5);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = Candidate::new(0., 0., 10., 10., 0.9, 0);
        let b = Candidate::new(20., 20., 30., 30., 0.9, 0);
        assert_eq!(a.iou(&b), 0.);
        assert_eq!(a.intersect(&b), 0.);
    }
}
