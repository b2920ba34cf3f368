use std::path::{Path, PathBuf};
use regex::Regex;
use crate::utils;

pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat",
    "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack",
    "umbrella", "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball",
    "kite", "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket",
    "bottle", "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple",
    "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake",
    "chair", "couch", "potted plant", "bed", "dining table", "toilet", "tv", "laptop",
    "mouse", "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink",
    "refrigerator", "book", "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Largest class index accepted from model metadata.
pub const MAX_EMBEDDED_CLASSES: usize = 4096;

/// Where a model's class names came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelSource {
    Embedded,
    /// `labels_path` from the config.
    Explicit(PathBuf),
    Sidecar(PathBuf),
    BuiltIn,
}

impl LabelSource {
    /// Label file behind this source, if it is file based.
    pub fn path(&self) -> Option<&Path> {
        match self {
            LabelSource::Explicit(path) | LabelSource::Sidecar(path) => Some(path),
            LabelSource::Embedded | LabelSource::BuiltIn => None,
        }
    }
}

/// Ordered class names, index = class id.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassNames {
    names: Vec<String>,
    source: LabelSource,
}

impl ClassNames {
    pub fn new(names: Vec<String>, source: LabelSource) -> Self {
        Self { names, source }
    }

    pub fn coco() -> Self {
        Self::new(COCO_CLASSES.iter().map(|s| s.to_string()).collect(), LabelSource::BuiltIn)
    }

    /// Picks embedded labels, then the explicit labels file, then sidecar
    /// files next to the model, then the built-in vocabulary.
    pub fn resolve(embedded: Option<Vec<String>>, explicit: Option<&Path>, model_path: &Path) -> Self {
        if let Some(names) = embedded.filter(|n| !n.is_empty()) {
            log::info!("Using {} class names embedded in the model", names.len());
            return Self::new(names, LabelSource::Embedded);
        }

        let candidates = explicit
            .map(|p| LabelSource::Explicit(p.to_path_buf()))
            .into_iter()
            .chain(sidecar_candidates(model_path).into_iter().map(LabelSource::Sidecar));

        for source in candidates {
            let Some(path) = source.path() else { continue };
            if !path.is_file() {
                continue;
            }
            match utils::file_to_vec(path) {
                Ok(lines) => {
                    let names: Vec<String> = lines
                        .into_iter()
                        .map(|l| l.trim().to_string())
                        .filter(|l| !l.is_empty())
                        .collect();
                    if names.is_empty() {
                        log::warn!("Label file {} is empty, skipping", path.display());
                        continue;
                    }
                    log::info!("Loaded {} class names from {}", names.len(), path.display());
                    return Self::new(names, source);
                }
                Err(err) => {
                    log::warn!("Failed to read label file {}: {err}", path.display());
                }
            }
        }

        log::info!("Using default COCO class names");
        Self::coco()
    }

    /// Label for a class id, `class_<id>` when out of range.
    pub fn label(&self, class_id: u32) -> String {
        match self.names.get(class_id as usize) {
            Some(name) => name.clone(),
            None => format!("class_{class_id}"),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn source(&self) -> &LabelSource {
        &self.source
    }
}

/// Sidecar label files tried next to a model, in priority order.
pub fn sidecar_candidates(model_path: &Path) -> Vec<PathBuf> {
    let dir = model_path.parent().unwrap_or_else(|| Path::new("."));
    let mut paths = Vec::with_capacity(4);
    if let Some(stem) = model_path.file_stem().and_then(|s| s.to_str()) {
        paths.push(dir.join(format!("{stem}.names")));
        paths.push(dir.join(format!("{stem}.txt")));
    }
    paths.push(dir.join("classes.names"));
    paths.push(dir.join("classes.txt"));
    paths
}

/// Parses the ONNX `names` metadata string,
/// e.g. `{0: 'person', 1: 'bicycle', 27: "yellow_lady's_slipper"}`.
/// Returns `None` when any index is unparsable or not below [`MAX_EMBEDDED_CLASSES`].
pub fn parse_embedded_names(raw: &str) -> Option<Vec<String>> {
    // Python reprs double-quote a name only when it contains a single quote.
    let re = Regex::new(r#"(\d+)\s*:\s*(?:'([^']*)'|"([^"]*)")"#).ok()?;
    let mut indexed: Vec<(usize, String)> = re
        .captures_iter(raw)
        .map(|cap| {
            let idx = cap.get(1)?.as_str().parse::<usize>().ok()?;
            if idx >= MAX_EMBEDDED_CLASSES {
                log::warn!("Ignoring embedded class names: index {idx} out of range");
                return None;
            }
            let name = cap.get(2).or_else(|| cap.get(3))?;
            Some((idx, name.as_str().to_string()))
        })
        .collect::<Option<_>>()?;
    if indexed.is_empty() {
        return None;
    }
    indexed.sort_by_key(|(i, _)| *i);

    let len = indexed.last().map(|(i, _)| i + 1).unwrap_or(0);
    let mut names: Vec<String> = (0..len).map(|i| format!("class_{i}")).collect();
    for (i, name) in indexed {
        names[i] = name;
    }
    Some(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parses_metadata_names() {
        let raw = r#"{0: 'person', 1: 'bicycle', 2: 'sports ball', 3: "yellow_lady's_slipper"}"#;
        let names = parse_embedded_names(raw).unwrap();
        assert_eq!(names, vec!["person", "bicycle", "sports ball", "yellow_lady's_slipper"]);
    }

    #[test]
    fn oversized_metadata_index_is_rejected() {
        assert!(parse_embedded_names("{18446744073709551615: 'a'}").is_none());
        assert!(parse_embedded_names("{0: 'a', 100000000000: 'x'}").is_none());
        assert!(parse_embedded_names("{0: 'a', 99999999999999999999999: 'x'}").is_none());
        assert!(parse_embedded_names(&format!("{{{MAX_EMBEDDED_CLASSES}: 'x'}}")).is_none());

        let sparse = parse_embedded_names("{0: 'a', 3: 'd'}").unwrap();
        assert_eq!(sparse, vec!["a", "class_1", "class_2", "d"]);
    }

    #[test]
    fn garbage_metadata_is_none() {
        assert!(parse_embedded_names("not a dict").is_none());
    }

    #[test]
    fn label_falls_back_to_class_id() {
        let names = ClassNames::new(vec!["cat".into()], LabelSource::BuiltIn);
        assert_eq!(names.label(0), "cat");
        assert_eq!(names.label(5), "class_5");
    }

    #[test]
    fn embedded_wins_over_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("det.onnx");
        fs::write(dir.path().join("det.names"), "a\nb\n").unwrap();

        let names = ClassNames::resolve(Some(vec!["x".into()]), None, &model);
        assert_eq!(names.source(), &LabelSource::Embedded);
        assert_eq!(names.names(), ["x".to_string()]);
    }

    #[test]
    fn sidecar_priority_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("det.onnx");
        fs::write(dir.path().join("classes.txt"), "low\n").unwrap();
        fs::write(dir.path().join("det.txt"), "helmet\n\n  vest \n").unwrap();

        let names = ClassNames::resolve(None, None, &model);
        assert_eq!(names.source(), &LabelSource::Sidecar(dir.path().join("det.txt")));
        assert_eq!(names.names(), ["helmet".to_string(), "vest".to_string()]);
    }

    #[test]
    fn explicit_labels_path_is_tried_first() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("det.onnx");
        let explicit = dir.path().join("custom_labels.txt");
        fs::write(&explicit, "forklift\n").unwrap();
        fs::write(dir.path().join("det.names"), "other\n").unwrap();

        let names = ClassNames::resolve(None, Some(&explicit), &model);
        assert_eq!(names.label(0), "forklift");
        assert_eq!(names.source(), &LabelSource::Explicit(explicit));
    }

    #[test]
    fn no_labels_anywhere_uses_coco() {
        let dir = tempfile::tempdir().unwrap();
        let names = ClassNames::resolve(None, None, &dir.path().join("m.onnx"));
        assert_eq!(names.source(), &LabelSource::BuiltIn);
        assert_eq!(names.len(), 80);
        assert_eq!(names.label(0), "person");
    }
}
