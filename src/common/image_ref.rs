use std::path::{Path, PathBuf};
use std::sync::Arc;
use image::{DynamicImage, RgbImage};
use crate::errors::DetectError;
use crate::Result;

/// Reference to one image of a batch: either a file on disk or an already
/// decoded buffer. The key identifies the image in batch results.
#[derive(Debug, Clone)]
pub enum ImageRef {
    Path(PathBuf),
    Memory {
        key: String,
        image: Arc<RgbImage>,
    },
}

impl ImageRef {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        ImageRef::Path(path.as_ref().to_path_buf())
    }

    pub fn from_rgb(key: impl Into<String>, image: RgbImage) -> Self {
        ImageRef::Memory {
            key: key.into(),
            image: Arc::new(image),
        }
    }

    pub fn from_dynamic(key: impl Into<String>, image: DynamicImage) -> Self {
        Self::from_rgb(key, image.to_rgb8())
    }

    pub fn key(&self) -> String {
        match self {
            ImageRef::Path(path) => path.to_string_lossy().into_owned(),
            ImageRef::Memory { key, .. } => key.clone(),
        }
    }

    /// Decodes the referenced image into packed RGB8.
    pub fn load(&self) -> Result<Arc<RgbImage>> {
        let image = match self {
            ImageRef::Path(path) => {
                if !path.exists() {
                    return Err(DetectError::ImageDecode(format!(
                        "image not found: {}",
                        path.display()
                    )));
                }
                let decoded = image::open(path).map_err(|e| {
                    DetectError::ImageDecode(format!("{}: {e}", path.display()))
                })?;
                Arc::new(decoded.to_rgb8())
            }
            ImageRef::Memory { image, .. } => Arc::clone(image),
        };

        let (w, h) = image.dimensions();
        if w == 0 || h == 0 || image.as_raw().is_empty() {
            return Err(DetectError::ImageDecode(format!(
                "zero-sized image {} ({w}x{h})",
                self.key()
            )));
        }
        Ok(image)
    }
}

impl From<PathBuf> for ImageRef {
    fn from(path: PathBuf) -> Self {
        ImageRef::Path(path)
    }
}

impl From<&str> for ImageRef {
    fn from(path: &str) -> Self {
        ImageRef::Path(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_ref_uses_its_key() {
        let r = ImageRef::from_rgb("frame-7", RgbImage::new(4, 4));
        assert_eq!(r.key(), "frame-7");
        assert_eq!(r.load().unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn empty_buffer_is_a_decode_error() {
        let r = ImageRef::from_rgb("empty", RgbImage::new(0, 0));
        assert!(matches!(r.load(), Err(DetectError::ImageDecode(_))));
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let r = ImageRef::from_path("/definitely/not/here.png");
        assert_eq!(r.key(), "/definitely/not/here.png");
        assert!(matches!(r.load(), Err(DetectError::ImageDecode(_))));
    }
}
