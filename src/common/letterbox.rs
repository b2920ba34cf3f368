use crate::errors::DetectError;
use crate::Result;

/// Aspect-preserving resize + centered pad from a `src_w x src_h` image into a
/// `dst_size x dst_size` canvas. Pads are whole pixels, the offset the resized
/// image is actually pasted at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxTransform {
    pub scale: f64,
    pub pad_x: f64,
    pub pad_y: f64,
    pub src_w: u32,
    pub src_h: u32,
    pub dst_size: u32,
}

impl LetterboxTransform {
    pub fn new(src_w: u32, src_h: u32, dst_size: u32) -> Result<Self> {
        if src_w == 0 || src_h == 0 {
            return Err(DetectError::ImageDecode(format!(
                "zero-sized source image ({src_w}x{src_h})"
            )));
        }
        if dst_size == 0 {
            return Err(DetectError::Config("model input size must be non-zero".to_string()));
        }

        let dst = dst_size as f64;
        let scale = (dst / src_w as f64).min(dst / src_h as f64);

        let mut transform = Self {
            scale,
            pad_x: 0.,
            pad_y: 0.,
            src_w,
            src_h,
            dst_size,
        };
        let (w, h) = transform.resized_dims();
        transform.pad_x = ((dst_size - w) / 2) as f64;
        transform.pad_y = ((dst_size - h) / 2) as f64;
        Ok(transform)
    }

    /// Size of the resized image inside the canvas.
    pub fn resized_dims(&self) -> (u32, u32) {
        let w = (self.src_w as f64 * self.scale).round() as u32;
        let h = (self.src_h as f64 * self.scale).round() as u32;
        (w.clamp(1, self.dst_size), h.clamp(1, self.dst_size))
    }

    /// Offset at which the resized image is pasted; equal to the pads.
    pub fn paste_offset(&self) -> (u32, u32) {
        (self.pad_x as u32, self.pad_y as u32)
    }

    /// Original-image point to model space.
    pub fn forward(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale + self.pad_x, y * self.scale + self.pad_y)
    }

    /// Model-space point back to original-image space, unclamped.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn landscape_image_is_padded_vertically() {
        let t = LetterboxTransform::new(800, 600, 640).unwrap();
        assert!((t.scale - 0.8).abs() < 1e-12);
        assert_eq!(t.pad_x, 0.);
        assert!((t.pad_y - 80.).abs() < 1e-9);
        assert_eq!(t.resized_dims(), (640, 480));
        assert_eq!(t.paste_offset(), (0, 80));
    }

    #[test]
    fn portrait_image_is_padded_horizontally() {
        let t = LetterboxTransform::new(300, 600, 640).unwrap();
        assert!((t.scale - 640. / 600.).abs() < 1e-12);
        assert!((t.pad_x - 160.).abs() < 1e-9);
        assert_eq!(t.pad_y, 0.);
    }

    #[test]
    fn pads_match_the_pasted_pixels() {
        // 801x600 scales to 640x479.4, pasted at row 80 after rounding.
        let t = LetterboxTransform::new(801, 600, 640).unwrap();
        assert_eq!(t.resized_dims(), (640, 479));
        assert_eq!(t.paste_offset(), (0, 80));
        assert_eq!((t.pad_x, t.pad_y), (0., 80.));

        let (_, top) = t.forward(0., 0.);
        assert_eq!(top, t.paste_offset().1 as f64);
        let (_, y) = t.inverse(0., 80.);
        assert_eq!(y, 0.);

        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let t = LetterboxTransform::new(rng.gen_range(1..4000), rng.gen_range(1..4000), rng.gen_range(32..1280)).unwrap();
            let (w, h) = t.resized_dims();
            let (left, top) = t.paste_offset();
            assert_eq!((left as f64, top as f64), (t.pad_x, t.pad_y));
            assert!(left + w <= t.dst_size && top + h <= t.dst_size);
        }
    }

    #[test]
    fn zero_sized_source_is_rejected() {
        assert!(matches!(
            LetterboxTransform::new(0, 10, 640),
            Err(DetectError::ImageDecode(_))
        ));
        assert!(matches!(
            LetterboxTransform::new(10, 0, 640),
            Err(DetectError::ImageDecode(_))
        ));
    }

    #[test]
    fn forward_then_inverse_returns_point() {
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let w = rng.gen_range(1..4000);
            let h = rng.gen_range(1..4000);
            let s = rng.gen_range(32..1280);
            let t = LetterboxTransform::new(w, h, s).unwrap();

            let x = rng.gen_range(0.0..w as f64);
            let y = rng.gen_range(0.0..h as f64);
            let (mx, my) = t.forward(x, y);
            let (bx, by) = t.inverse(mx, my);
            assert!((bx - x).abs() < 1e-6, "x {x} -> {bx} for {w}x{h}@{s}");
            assert!((by - y).abs() < 1e-6, "y {y} -> {by} for {w}x{h}@{s}");
        }
    }
}
