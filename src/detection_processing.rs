use std::time::{Duration, Instant};
use image::RgbImage;
use crate::common::{Candidate, Detection, DetectorConfig, LetterboxTransform};
use crate::data::{ClassNames, X};
use crate::detection_runners::inference_process::InferenceSession;
use crate::detection_runners::ort_detector::{decode, image_ops, nms};
use crate::{utils, Result};

/// Maps a model-space box back into the source image, clamped to its bounds.
/// Returns `None` when a corner is not finite or the clamped box has no area.
pub fn remap(candidate: &Candidate, transform: &LetterboxTransform) -> Option<Candidate> {
    let (src_w, src_h) = (transform.src_w as f64, transform.src_h as f64);
    let (x1, y1) = transform.inverse(candidate.x1, candidate.y1);
    let (x2, y2) = transform.inverse(candidate.x2, candidate.y2);
    if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
        return None;
    }

    let (x1, x2) = (x1.clamp(0., src_w), x2.clamp(0., src_w));
    let (y1, y2) = (y1.clamp(0., src_h), y2.clamp(0., src_h));
    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(candidate.with_x1y1_x2y2(x1, y1, x2, y2))
}

/// Remaps surviving candidates and attaches labels. Order is preserved.
pub fn build_detections(candidates: &[Candidate], transform: &LetterboxTransform, class_names: &ClassNames) -> Vec<Detection> {
    candidates
        .iter()
        .filter_map(|c| remap(c, transform))
        .map(|c| Detection::new(c.x1, c.y1, c.x2, c.y2, c.confidence, c.class_id, class_names.label(c.class_id)))
        .collect()
}

/// Decode, NMS when the layout calls for it, remap and label.
pub fn process_predictions(
    output: &X,
    transform: &LetterboxTransform,
    class_names: &ClassNames,
    conf_threshold: f32,
    config: &DetectorConfig,
) -> Result<Vec<Detection>> {
    let decoded = decode(output, conf_threshold)?;
    let mut candidates = decoded.candidates;

    if decoded.layout.needs_nms() {
        let before = candidates.len();
        nms(&mut candidates, config.iou_threshold, config.class_aware_nms);
        log::trace!("NMS kept {} of {} candidates", candidates.len(), before);
    }

    Ok(build_detections(&candidates, transform, class_names))
}

/// Full single-image path against one session. Sequential; batch workers call it.
pub fn process_image(
    session: &dyn InferenceSession,
    image: &RgbImage,
    class_names: &ClassNames,
    input_size: u32,
    conf_threshold: f32,
    config: &DetectorConfig,
) -> Result<Vec<Detection>> {
    let detect_time = Instant::now();
    let mut _detect_elapsed = Duration::ZERO;

    let (input, transform) = image_ops::preprocess(image, input_size, config.pad_value)?;
    _detect_elapsed = utils::trace("Preprocessing input", detect_time, _detect_elapsed);

    let output = session.run(&input)?;
    _detect_elapsed = utils::trace("Detection run", detect_time, _detect_elapsed);

    let detections = process_predictions(&output, &transform, class_names, conf_threshold, config)?;
    _detect_elapsed = utils::trace("Postprocessing", detect_time, _detect_elapsed);

    log::debug!("{} detections in {:.2?}", detections.len(), detect_time.elapsed());
    Ok(detections)
}
