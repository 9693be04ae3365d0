use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, Rgb, RgbImage};
use tracing::{debug, instrument};

use super::{EditedImage, EditorError, ImageEditor};
use crate::models::EditType;

const JPEG_QUALITY: u8 = 95;

/// 3x3 kernels, normalised by their sum inside `filter3x3`
const SMOOTH: [f32; 9] = [1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0];
const EDGE_ENHANCE: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 10.0, -1.0, -1.0, -1.0, -1.0];
const EDGE_ENHANCE_MORE: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0];

/// 5x5 smoothing kernel, weights sum to 100
#[rustfmt::skip]
const SMOOTH_MORE: [f32; 25] = [
    1.0, 1.0,  1.0, 1.0, 1.0,
    1.0, 5.0,  5.0, 5.0, 1.0,
    1.0, 5.0, 44.0, 5.0, 1.0,
    1.0, 5.0,  5.0, 5.0, 1.0,
    1.0, 1.0,  1.0, 1.0, 1.0,
];

/// Deterministic pixel pipeline that needs no network access
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalEditor;

impl LocalEditor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageEditor for LocalEditor {
    fn name(&self) -> &'static str {
        "local"
    }

    #[instrument(skip(self, input), fields(size = input.len()))]
    async fn edit(&self, input: &[u8], edit_type: EditType, intensity: u8) -> Result<EditedImage, EditorError> {
        let input = input.to_vec();
        let bytes = tokio::task::spawn_blocking(move || process(&input, edit_type, intensity))
            .await
            .map_err(|err| EditorError::Task(err.to_string()))??;

        debug!("Local {} edit produced {} bytes", edit_type, bytes.len());

        Ok(EditedImage {
            bytes,
            extension: "jpg",
            content_type: "image/jpeg",
        })
    }
}

/// Decodes, edits and re-encodes an image as JPEG
fn process(input: &[u8], edit_type: EditType, intensity: u8) -> Result<Vec<u8>, EditorError> {
    let img = image::load_from_memory(input).map_err(EditorError::Decode)?.to_rgb8();
    let edited = apply(img, edit_type, f32::from(intensity.min(100)) / 100.0);

    let mut out = Vec::new();
    edited
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))
        .map_err(EditorError::Encode)?;
    Ok(out)
}

/// Applies one edit with strength `f` in 0.0..=1.0
pub(crate) fn apply(img: RgbImage, edit_type: EditType, f: f32) -> RgbImage {
    match edit_type {
        EditType::Enhance => {
            let img = contrast(&img, 1.0 + f * 0.5);
            let img = brightness(&img, 1.0 + f * 0.2);
            let img = sharpness(&img, 1.0 + f * 0.7);
            saturation(&img, 1.0 + f * 0.3)
        }
        EditType::Colorize => {
            let img = saturation(&img, 1.0 + f * 1.5);
            let img = contrast(&img, 1.0 + f * 0.3);
            brightness(&img, 1.0 + f * 0.1)
        }
        EditType::Style => {
            if f > 0.7 {
                let img = imageops::filter3x3(&img, &EDGE_ENHANCE_MORE);
                saturation(&img, 1.0 + f)
            } else if f > 0.4 {
                let img = imageops::filter3x3(&img, &EDGE_ENHANCE);
                contrast(&img, 1.0 + f * 0.5)
            } else {
                let img = filter5x5(&img, &SMOOTH_MORE);
                saturation(&img, 1.0 + f * 0.5)
            }
        }
        EditType::Restore => {
            let img = median3x3(&img);
            let img = sharpness(&img, 1.0 + f * 0.8);
            let img = contrast(&img, 1.0 + f * 0.4);
            if f > 0.5 {
                imageops::unsharpen(&img, 2.0, 3)
            } else {
                img
            }
        }
        EditType::Retouch => {
            let img = gaussian(&img, f * 2.0);
            let img = brightness(&img, 1.0 + f * 0.1);
            contrast(&img, 1.0 - f * 0.1)
        }
        EditType::Background => {
            let blurred = gaussian(&img, f * 5.0);
            focus_composite(&img, &blurred)
        }
    }
}

fn clamp(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn luma(pixel: &Rgb<u8>) -> f32 {
    let [r, g, b] = pixel.0;
    0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)
}

/// Interpolates each pixel away from (factor > 1) or towards a degenerate image
fn blend(degenerate: &RgbImage, img: &RgbImage, factor: f32) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let d = degenerate.get_pixel(x, y).0;
        let p = img.get_pixel(x, y).0;
        Rgb(std::array::from_fn(|c| {
            clamp(f32::from(d[c]) + (f32::from(p[c]) - f32::from(d[c])) * factor)
        }))
    })
}

pub(crate) fn brightness(img: &RgbImage, factor: f32) -> RgbImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        pixel.0 = pixel.0.map(|c| clamp(f32::from(c) * factor));
    }
    out
}

/// Scales each pixel's distance from the mean grey level
pub(crate) fn contrast(img: &RgbImage, factor: f32) -> RgbImage {
    let count = (img.width() * img.height()).max(1) as f32;
    let mean = (img.pixels().map(luma).sum::<f32>() / count).round();
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        pixel.0 = pixel.0.map(|c| clamp(mean + (f32::from(c) - mean) * factor));
    }
    out
}

/// Scales each pixel's distance from its own grey value
pub(crate) fn saturation(img: &RgbImage, factor: f32) -> RgbImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        let grey = luma(pixel);
        pixel.0 = pixel.0.map(|c| clamp(grey + (f32::from(c) - grey) * factor));
    }
    out
}

fn sharpness(img: &RgbImage, factor: f32) -> RgbImage {
    let smoothed = imageops::filter3x3(img, &SMOOTH);
    blend(&smoothed, img, factor)
}

/// Convolves with a 5x5 kernel normalised by its sum, clamping at the edges
fn filter5x5(img: &RgbImage, kernel: &[f32; 25]) -> RgbImage {
    let (width, height) = img.dimensions();
    let sum: f32 = kernel.iter().sum();
    let max_x = width.saturating_sub(1) as i64;
    let max_y = height.saturating_sub(1) as i64;

    RgbImage::from_fn(width, height, |x, y| {
        let mut acc = [0.0f32; 3];
        for (i, weight) in kernel.iter().enumerate() {
            let dx = (i % 5) as i64 - 2;
            let dy = (i / 5) as i64 - 2;
            let sx = (x as i64 + dx).clamp(0, max_x) as u32;
            let sy = (y as i64 + dy).clamp(0, max_y) as u32;
            let pixel = img.get_pixel(sx, sy);
            for channel in 0..3 {
                acc[channel] += f32::from(pixel[channel]) * weight;
            }
        }
        Rgb(acc.map(|value| clamp(value / sum)))
    })
}

fn gaussian(img: &RgbImage, sigma: f32) -> RgbImage {
    if sigma <= 0.0 {
        return img.clone();
    }
    imageops::blur(img, sigma)
}

fn median3x3(img: &RgbImage) -> RgbImage {
    let (w, h) = img.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let mut channels = [[0u8; 9]; 3];
        let mut n = 0;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let sx = (i64::from(x) + dx).clamp(0, i64::from(w) - 1) as u32;
                let sy = (i64::from(y) + dy).clamp(0, i64::from(h) - 1) as u32;
                let p = img.get_pixel(sx, sy).0;
                for c in 0..3 {
                    channels[c][n] = p[c];
                }
                n += 1;
            }
        }
        Rgb(channels.map(|mut values| {
            values.sort_unstable();
            values[4]
        }))
    })
}

/// Keeps the centre sharp and fades to `blurred` towards the edges
///
/// Mask weight grows linearly with distance from the centre and reaches full
/// blur at a third of the shorter side.
pub(crate) fn focus_composite(original: &RgbImage, blurred: &RgbImage) -> RgbImage {
    let (w, h) = original.dimensions();
    let (cx, cy) = ((w / 2) as f32, (h / 2) as f32);
    let radius = (w.min(h) / 3) as f32;

    RgbImage::from_fn(w, h, |x, y| {
        let distance = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
        let alpha = if radius > 0.0 && distance < radius {
            (255.0 * distance / radius).floor() / 255.0
        } else {
            1.0
        };
        let o = original.get_pixel(x, y).0;
        let b = blurred.get_pixel(x, y).0;
        Rgb(std::array::from_fn(|c| {
            clamp(f32::from(b[c]) * alpha + f32::from(o[c]) * (1.0 - alpha))
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::png_bytes;

    fn solid(r: u8, g: u8, b: u8) -> RgbImage {
        RgbImage::from_pixel(4, 4, Rgb([r, g, b]))
    }

    #[test]
    fn test_brightness_scales_and_clamps() {
        let out = brightness(&solid(100, 200, 0), 1.5);
        assert_eq!(out.get_pixel(0, 0).0, [150, 255, 0]);
    }

    #[test]
    fn test_saturation_zero_is_grey() {
        let out = saturation(&solid(200, 100, 50), 0.0);
        let [r, g, b] = out.get_pixel(1, 1).0;
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn test_contrast_leaves_flat_image_alone() {
        let img = solid(90, 90, 90);
        assert_eq!(contrast(&img, 2.0), img);
    }

    #[test]
    fn test_contrast_spreads_values() {
        let mut img = solid(100, 100, 100);
        img.put_pixel(0, 0, Rgb([200, 200, 200]));

        let out = contrast(&img, 2.0);

        assert!(out.get_pixel(0, 0).0[0] > 200);
        assert!(out.get_pixel(1, 1).0[0] < 100);
    }

    #[test]
    fn test_filter5x5_keeps_flat_image() {
        let img = solid(120, 60, 30);
        assert_eq!(filter5x5(&img, &SMOOTH_MORE), img);
    }

    #[test]
    fn test_filter5x5_reaches_two_pixels_out() {
        let mut img = RgbImage::new(9, 9);
        img.put_pixel(4, 4, Rgb([255, 255, 255]));

        let smoothed = filter5x5(&img, &SMOOTH_MORE);

        // 255 * 44 / 100 at the centre, 255 * 1 / 100 on the outer ring
        assert_eq!(smoothed.get_pixel(4, 4)[0], 112);
        assert_eq!(smoothed.get_pixel(6, 6)[0], 3);
        assert_eq!(smoothed.get_pixel(7, 7)[0], 0);
    }

    #[test]
    fn test_median_removes_single_speck() {
        let mut img = solid(10, 10, 10);
        img.put_pixel(2, 2, Rgb([255, 255, 255]));

        let out = median3x3(&img);

        assert_eq!(out.get_pixel(2, 2).0, [10, 10, 10]);
    }

    #[test]
    fn test_focus_composite_keeps_centre() {
        let original = RgbImage::from_pixel(9, 9, Rgb([0, 0, 0]));
        let blurred = RgbImage::from_pixel(9, 9, Rgb([255, 255, 255]));

        let out = focus_composite(&original, &blurred);

        assert_eq!(out.get_pixel(4, 4).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_zero_intensity_retouch_is_identity() {
        let img = RgbImage::from_fn(6, 6, |x, y| Rgb([(x * 40) as u8, (y * 40) as u8, 7]));
        assert_eq!(apply(img.clone(), EditType::Retouch, 0.0), img);
    }

    #[test]
    fn test_every_edit_keeps_dimensions() {
        let img = RgbImage::from_fn(10, 7, |x, y| Rgb([(x * 20) as u8, (y * 30) as u8, 99]));
        for edit_type in EditType::ALL {
            for f in [0.0, 0.3, 0.6, 1.0] {
                let out = apply(img.clone(), edit_type, f);
                assert_eq!(out.dimensions(), (10, 7), "{} at {}", edit_type, f);
            }
        }
    }

    #[tokio::test]
    async fn test_edit_outputs_jpeg() {
        let editor = LocalEditor::new();

        let edited = editor.edit(&png_bytes(16, 12), EditType::Enhance, 80).await.unwrap();

        assert_eq!(edited.extension, "jpg");
        assert_eq!(edited.content_type, "image/jpeg");
        assert_eq!(image::guess_format(&edited.bytes).unwrap(), image::ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&edited.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 12));
    }

    #[tokio::test]
    async fn test_edit_rejects_garbage() {
        let result = LocalEditor::new().edit(b"nope", EditType::Style, 50).await;
        assert!(matches!(result, Err(EditorError::Decode(_))));
    }
}
