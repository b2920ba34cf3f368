//! Interprets raw model output tensors as box candidates.

use crate::common::Candidate;
use crate::detection_runners::input_wrapper::X;
use crate::errors::DetectError;
use crate::Result;

/// Upper bound on rows in a pre-suppressed `[1, N, 6]` output.
pub const MAX_PRE_SUPPRESSED_ROWS: usize = 300;
const PRE_SUPPRESSED_ROW_LEN: usize = 6;
const BOX_FEATURES: usize = 4;

/// Output layout, resolved once from the tensor shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// `[1, N, 6]`, rows of `[x1, y1, x2, y2, confidence, class_id]`. NMS already applied.
    PreSuppressed { rows: usize },
    /// `[1, 4 + nc, anchors]`, one column per anchor: `cx, cy, w, h` then class scores.
    RawAnchors { num_classes: usize, num_anchors: usize },
    Unrecognized,
}

impl OutputLayout {
    pub fn classify(shape: &[usize]) -> Self {
        match *shape {
            [1, rows, PRE_SUPPRESSED_ROW_LEN] if rows <= MAX_PRE_SUPPRESSED_ROWS => {
                OutputLayout::PreSuppressed { rows }
            }
            [1, features, anchors] if features > BOX_FEATURES && anchors >= features => {
                OutputLayout::RawAnchors {
                    num_classes: features - BOX_FEATURES,
                    num_anchors: anchors,
                }
            }
            _ => OutputLayout::Unrecognized,
        }
    }

    pub fn needs_nms(&self) -> bool {
        matches!(self, OutputLayout::RawAnchors { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputLayout::PreSuppressed { .. } => "pre-suppressed",
            OutputLayout::RawAnchors { .. } => "raw-anchors",
            OutputLayout::Unrecognized => "unrecognized",
        }
    }
}

/// Decoder output: candidates above the threshold, in tensor order.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub layout: OutputLayout,
    pub candidates: Vec<Candidate>,
}

/// Decodes `output` into model-space candidates, dropping those below `conf_threshold`.
pub fn decode(output: &X, conf_threshold: f32) -> Result<Decoded> {
    let shape = output.dims();
    let layout = OutputLayout::classify(&shape);
    let data = output.contiguous();

    let candidates = match layout {
        OutputLayout::PreSuppressed { rows } => decode_pre_suppressed(&data, rows, conf_threshold),
        OutputLayout::RawAnchors { num_classes, num_anchors } => {
            decode_raw_anchors(&data, num_classes, num_anchors, conf_threshold)
        }
        OutputLayout::Unrecognized => return Err(DetectError::UnsupportedOutputLayout { shape }),
    };

    Ok(Decoded { layout, candidates })
}

fn decode_pre_suppressed(data: &[f32], rows: usize, conf_threshold: f32) -> Vec<Candidate> {
    data.chunks_exact(PRE_SUPPRESSED_ROW_LEN)
        .take(rows)
        .filter(|row| row[4].is_finite() && row[4] >= conf_threshold)
        .map(|row| {
            Candidate::new(
                row[0] as f64,
                row[1] as f64,
                row[2] as f64,
                row[3] as f64,
                row[4],
                row[5].max(0.).round() as u32,
            )
        })
        .collect()
}

/// Feature `f` of anchor `a` lives at `data[f * num_anchors + a]`.
fn decode_raw_anchors(data: &[f32], num_classes: usize, num_anchors: usize, conf_threshold: f32) -> Vec<Candidate> {
    let at = |f: usize, a: usize| data[f * num_anchors + a];

    (0..num_anchors)
        .filter_map(|a| {
            let (class_id, confidence) = (0..num_classes)
                .map(|c| (c, at(BOX_FEATURES + c, a)))
                .filter(|(_, score)| score.is_finite())
                .max_by(|x, y| x.1.total_cmp(&y.1))?;

            if !(confidence >= conf_threshold) {
                return None;
            }

            Some(Candidate::from_cxcywh(
                at(0, a) as f64,
                at(1, a) as f64,
                at(2, a) as f64,
                at(3, a) as f64,
                confidence,
                class_id as u32,
            ))
        })
        .collect()
}
