/// Anything that can take part in greedy non-maximum suppression.
pub trait Nms {
    fn iou(&self, other: &Self) -> f64;
    fn confidence(&self) -> f32;
    fn class_id(&self) -> u32;
}

/// Greedy NMS. Sorts `boxes` by descending confidence, then drops every box whose
/// IoU with an already kept box is strictly above `iou_threshold`. When
/// `class_aware` is set, boxes of different classes never suppress each other.
///
/// Survivors stay in descending confidence order.
pub fn nms<T: Nms>(boxes: &mut Vec<T>, iou_threshold: f32, class_aware: bool) {
    boxes.sort_by(|b1, b2| b2.confidence().total_cmp(&b1.confidence()));
    let iou_threshold = iou_threshold as f64;

    let mut current_index = 0;
    for index in 0..boxes.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            if class_aware && boxes[prev_index].class_id() != boxes[index].class_id() {
                continue;
            }
            if boxes[prev_index].iou(&boxes[index]) > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            boxes.swap(current_index, index);
            current_index += 1;
        }
    }
    boxes.truncate(current_index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Candidate;

    fn boxes() -> Vec<Candidate> {
        vec![
            Candidate::new(12., 12., 110., 110., 0.8, 1),
            Candidate::new(10., 10., 110., 110., 0.9, 0),
            Candidate::new(200., 200., 260., 260., 0.7, 0),
        ]
    }

    #[test]
    fn class_agnostic_suppresses_overlapping_classes() {
        let mut b = boxes();
        nms(&mut b, 0.45, false);
        assert_eq!(b.len(), 2);
        assert_eq!(b[0].confidence, 0.9);
        assert_eq!(b[1].confidence, 0.7);
    }

    #[test]
    fn class_aware_keeps_other_classes() {
        let mut b = boxes();
        nms(&mut b, 0.45, true);
        assert_eq!(b.len(), 3);
        let confs: Vec<f32> = b.iter().map(|c| c.confidence).collect();
        assert_eq!(confs, vec![0.9, 0.8, 0.7]);
    }

    #[test]
    fn iou_equal_to_threshold_is_kept() {
        // Two 10x10 boxes sharing half their width: IoU = 50 / 150.
        let mut b = vec![
            Candidate::new(0., 0., 10., 10., 0.9, 0),
            Candidate::new(5., 0., 15., 10., 0.8, 0),
        ];
        let iou = b[0].iou(&b[1]);
        nms(&mut b, iou as f32 + 1e-6, false);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn single_and_empty_inputs() {
        let mut empty: Vec<Candidate> = vec![];
        nms(&mut empty, 0.45, false);
        assert!(empty.is_empty());

        let mut one = vec![Candidate::new(0., 0., 1., 1., 0.1, 3)];
        nms(&mut one, 0.0, false);
        assert_eq!(one.len(), 1);
    }
}
