//! Grayscale raster helpers: decode, blur, brightness bias, and
//! side-by-side composition.

use image::{GrayImage, Luma};

use crate::types::{Dimensions, ScribbleError};

/// Decode raw image bytes (PNG, JPEG, BMP, WebP) into grayscale.
///
/// # Errors
///
/// Returns [`ScribbleError::EmptyInput`] if `bytes` is empty,
/// [`ScribbleError::ImageDecode`] if the data cannot be decoded, and
/// [`ScribbleError::EmptyImage`] if it decodes to zero pixels.
pub fn decode_grayscale(bytes: &[u8]) -> Result<GrayImage, ScribbleError> {
    if bytes.is_empty() {
        return Err(ScribbleError::EmptyInput);
    }

    let gray = image::load_from_memory(bytes)?.to_luma8();
    let Dimensions { width, height } = Dimensions::of(&gray);
    if width == 0 || height == 0 {
        return Err(ScribbleError::EmptyImage { width, height });
    }
    Ok(gray)
}

/// Gaussian blur with standard deviation `sigma`.
///
/// Non-positive sigma returns the image unchanged, since `imageproc`
/// panics on `sigma <= 0.0`.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 || !sigma.is_finite() {
        return image.clone();
    }

    imageproc::filter::gaussian_blur_f32(image, sigma)
}

/// Add `bias` to every pixel, clamping to `0..=255`.
///
/// Brightening pushes light grays to white while dark areas survive,
/// which previews the effect of a drawing threshold without a hard
/// binary cut.
#[must_use = "returns the biased image"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn add_saturating(image: &GrayImage, bias: f32) -> GrayImage {
    let mut out = image.clone();
    for p in out.pixels_mut() {
        let v = (f32::from(p.0[0]) + bias).round().clamp(0.0, 255.0);
        p.0[0] = v as u8;
    }
    out
}

/// Place `left` and `right` next to each other.
///
/// The result is as tall as the taller input; uncovered pixels are
/// white.
#[must_use]
pub fn side_by_side(left: &GrayImage, right: &GrayImage) -> GrayImage {
    let width = left.width() + right.width();
    let height = left.height().max(right.height());
    let mut out = GrayImage::from_pixel(width, height, Luma([255]));
    image::imageops::replace(&mut out, left, 0, 0);
    image::imageops::replace(&mut out, right, i64::from(left.width()), 0);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode_png(img: &GrayImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::L8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(matches!(
            decode_grayscale(&[]),
            Err(ScribbleError::EmptyInput)
        ));
    }

    #[test]
    fn corrupt_bytes_returns_decode_error() {
        assert!(matches!(
            decode_grayscale(&[0xFF, 0xFE, 0x00, 0x01]),
            Err(ScribbleError::ImageDecode(_))
        ));
    }

    #[test]
    fn png_decodes_to_same_gray_values() {
        let img = GrayImage::from_fn(7, 3, |x, y| Luma([(x * 30 + y) as u8]));
        let decoded = decode_grayscale(&encode_png(&img)).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn zero_sigma_blur_is_identity() {
        let img = GrayImage::from_fn(6, 6, |x, _| Luma([if x < 3 { 0 } else { 255 }]));
        assert_eq!(gaussian_blur(&img, 0.0), img);
    }

    #[test]
    fn blur_softens_edge() {
        let img = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 5 { 0 } else { 255 }]));
        let blurred = gaussian_blur(&img, 2.0);
        assert!(blurred.get_pixel(4, 5).0[0] > 0);
        assert!(blurred.get_pixel(5, 5).0[0] < 255);
    }

    #[test]
    fn bias_saturates_at_white_and_black() {
        let img = GrayImage::from_fn(3, 1, |x, _| Luma([[0, 100, 250][x as usize]]));
        let bright = add_saturating(&img, 20.0);
        assert_eq!(bright.as_raw(), &vec![20, 120, 255]);
        let dark = add_saturating(&img, -50.0);
        assert_eq!(dark.as_raw(), &vec![0, 50, 200]);
    }

    #[test]
    fn side_by_side_layout() {
        let left = GrayImage::from_pixel(2, 3, Luma([10]));
        let right = GrayImage::from_pixel(4, 2, Luma([20]));
        let out = side_by_side(&left, &right);
        assert_eq!(out.dimensions(), (6, 3));
        assert_eq!(out.get_pixel(1, 2).0[0], 10);
        assert_eq!(out.get_pixel(2, 0).0[0], 20);
        assert_eq!(out.get_pixel(5, 2).0[0], 255);
    }
}
