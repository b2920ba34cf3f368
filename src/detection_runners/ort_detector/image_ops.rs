//! Functions to preprocess images.

use fast_image_resize::{
    images::Image as FirImage,
    pixels::PixelType,
    FilterType, ResizeAlg, ResizeOptions, Resizer,
};
use image::RgbImage;
use crate::common::LetterboxTransform;
use crate::detection_runners::input_wrapper::X;
use crate::errors::DetectError;
use crate::Result;

/// Letterboxes `image` into an `input_size x input_size` canvas filled with
/// `pad_value`, then lays it out as a `[1, 3, S, S]` tensor scaled to `[0, 1]`.
///
/// Returns the tensor with the transform needed to map boxes back.
pub fn preprocess(image: &RgbImage, input_size: u32, pad_value: u8) -> Result<(X, LetterboxTransform)> {
    let transform = LetterboxTransform::new(image.width(), image.height(), input_size)?;
    let canvas = letterbox_image(image, &transform, pad_value)?;
    let flat = nchw_normalize_flat(&canvas, input_size)?;

    let s = input_size as usize;
    let x = X::from_shape_vec(&[1, 3, s, s], flat)?;
    Ok((x, transform))
}

pub fn to_fir_image<'a>(image: &RgbImage) -> Result<FirImage<'a>> {
    let (width, height) = image.dimensions();
    FirImage::from_vec_u8(width, height, image.as_raw().clone(), PixelType::U8x3)
        .map_err(DetectError::image_decode)
}

fn resize_image<'a>(img: &FirImage, target_w: u32, target_h: u32) -> Result<FirImage<'a>> {
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    let mut dst = FirImage::new(target_w, target_h, PixelType::U8x3);
    Resizer::new()
        .resize(img, &mut dst, &options)
        .map_err(DetectError::image_decode)?;
    Ok(dst)
}

/// Packed RGB canvas of `dst_size * dst_size * 3` bytes.
fn letterbox_image(image: &RgbImage, transform: &LetterboxTransform, pad_value: u8) -> Result<Vec<u8>> {
    let (new_w, new_h) = transform.resized_dims();
    let (left, top) = transform.paste_offset();
    let size = transform.dst_size as usize;

    let resized: Vec<u8> = if (new_w, new_h) == image.dimensions() {
        image.as_raw().clone()
    } else {
        let src = to_fir_image(image)?;
        resize_image(&src, new_w, new_h)?.into_vec()
    };

    let mut canvas = vec![pad_value; size * size * 3];
    let row_len = new_w as usize * 3;
    for (y, row) in resized.chunks_exact(row_len).enumerate() {
        let start = ((top as usize + y) * size + left as usize) * 3;
        canvas[start..start + row_len].copy_from_slice(row);
    }

    Ok(canvas)
}

fn nchw_normalize_flat(buf: &[u8], size: u32) -> Result<Vec<f32>> {
    let hw = size as usize * size as usize;

    if buf.len() != hw * 3 {
        return Err(DetectError::image_decode(format!(
            "Unexpected buffer size: got {}, expected {}",
            buf.len(),
            hw * 3
        )));
    }

    let mut out = vec![0.0f32; buf.len()];
    for i in 0..hw {
        out[i] = buf[3 * i] as f32 / 255.0;
        out[i + hw] = buf[3 * i + 1] as f32 / 255.0;
        out[i + 2 * hw] = buf[3 * i + 2] as f32 / 255.0;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn landscape_image_gets_top_and_bottom_bands() {
        let img = RgbImage::from_pixel(800, 600, Rgb([255, 255, 255]));
        let (x, t) = preprocess(&img, 640, 0).unwrap();

        assert_eq!(x.dims(), vec![1, 3, 640, 640]);
        assert_eq!(t.paste_offset(), (0, 80));
        for c in 0..3 {
            assert_eq!(x[[0, c, 0, 320]], 0.0);
            assert_eq!(x[[0, c, 79, 320]], 0.0);
            assert!(x[[0, c, 320, 320]] > 0.99);
            assert_eq!(x[[0, c, 560, 320]], 0.0);
            assert_eq!(x[[0, c, 639, 0]], 0.0);
        }
    }

    #[test]
    fn channels_are_planar_rgb() {
        let img = RgbImage::from_pixel(64, 64, Rgb([255, 0, 51]));
        let (x, t) = preprocess(&img, 64, 0).unwrap();

        assert_eq!(t.scale, 1.0);
        assert_eq!(x[[0, 0, 10, 10]], 1.0);
        assert_eq!(x[[0, 1, 10, 10]], 0.0);
        assert!((x[[0, 2, 10, 10]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn pad_value_fills_the_bands() {
        let img = RgbImage::from_pixel(100, 50, Rgb([0, 0, 0]));
        let (x, _) = preprocess(&img, 100, 114).unwrap();
        assert!((x[[0, 1, 0, 0]] - 114. / 255.).abs() < 1e-6);
        assert_eq!(x[[0, 1, 50, 50]], 0.0);
    }

    #[test]
    fn empty_image_is_rejected() {
        let img = RgbImage::new(0, 0);
        assert!(matches!(preprocess(&img, 640, 0), Err(DetectError::ImageDecode(_))));
    }
}
