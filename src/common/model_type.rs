use serde::{Deserialize, Serialize};

/// Kind of model a caller asks the manager to load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    #[default] Yolo,
    SegmentAnything,
    Custom,
}

// Hardcoded model type names. Storing the "proper" spelling and the lowercase version.
static YOLO: [&str; 2] = ["YOLO", "yolo"];
static SEGMENT_ANYTHING: [&str; 2] = ["SegmentAnything", "segmentanything"];
static CUSTOM: [&str; 2] = ["Custom", "custom"];

impl ModelType {
    pub fn from_str(model_type: &str) -> Option<Self> {
        match model_type.to_lowercase().as_str() {
            "yolo" => Some(ModelType::Yolo),
            "segmentanything" | "sam" => Some(ModelType::SegmentAnything),
            "custom" => Some(ModelType::Custom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Yolo => YOLO[0],
            ModelType::SegmentAnything => SEGMENT_ANYTHING[0],
            ModelType::Custom => CUSTOM[0],
        }
    }

    pub fn str_lowercase(&self) -> &'static str {
        match self {
            ModelType::Yolo => YOLO[1],
            ModelType::SegmentAnything => SEGMENT_ANYTHING[1],
            ModelType::Custom => CUSTOM[1],
        }
    }

    /// Whether the detection backend can load this kind of model.
    pub fn is_detector(&self) -> bool {
        matches!(self, ModelType::Yolo | ModelType::Custom)
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
