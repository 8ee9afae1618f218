//! Raster compressor
//!
//! Decodes an image, shrinks it to fit a bounding box (never upscaling) and
//! re-encodes it as JPEG. Every image that passes through here leaves as
//! `image/jpeg`, whatever it came in as.

use std::io::Cursor;

use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ExtendedColorType,
    ImageDecoder, ImageReader, Limits, Rgb, RgbImage,
};
use log::debug;

use super::payload::{EncodedAsset, RawHandle, JPEG};
use crate::error::{AssetError, Result};

/// Bounding box and quality for recompression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressSettings {
    pub max_width: u32,
    pub max_height: u32,
    /// 0.0 - 1.0
    pub quality: f32,
}

impl Default for CompressSettings {
    fn default() -> Self {
        Self {
            max_width: 1200,
            max_height: 1200,
            quality: 0.75,
        }
    }
}

/// Caps applied before and during decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_width: u32,
    pub max_height: u32,
    pub max_alloc_bytes: u64,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_width: 16_384,
            max_height: 16_384,
            max_alloc_bytes: 512 * 1024 * 1024,
        }
    }
}

impl DecodeLimits {
    fn to_image_limits(self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_width);
        limits.max_image_height = Some(self.max_height);
        limits.max_alloc = Some(self.max_alloc_bytes);
        limits
    }
}

/// Target dimensions for an image of `width` x `height` inside the box.
///
/// Images already inside the box keep their size. Larger ones are scaled by
/// `min(max_width / width, max_height / height)` with each side rounded and
/// kept within `1..=max`.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let ratio = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let target_width = ((width as f64 * ratio).round() as u32).clamp(1, max_width.max(1));
    let target_height = ((height as f64 * ratio).round() as u32).clamp(1, max_height.max(1));

    (target_width, target_height)
}

/// Map the 0.0 - 1.0 quality scale onto the JPEG encoder's 1 - 100
fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCompressor {
    limits: DecodeLimits,
}

impl RasterCompressor {
    pub fn new(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    /// Decode, resize and re-encode the handle's content.
    ///
    /// Decoding and encoding are CPU-bound, so they run on the blocking pool.
    pub async fn compress(
        &self,
        handle: &RawHandle,
        settings: CompressSettings,
    ) -> Result<EncodedAsset> {
        let bytes = handle.read().await?;
        let name = handle.name().to_string();
        let limits = self.limits;

        tokio::task::spawn_blocking(move || compress_bytes(&name, &bytes, settings, limits))
            .await
            .map_err(|e| AssetError::encode(handle.name(), format!("Task join error: {}", e)))?
    }
}

/// Blocking implementation of the compressor
pub fn compress_bytes(
    name: &str,
    bytes: &[u8],
    settings: CompressSettings,
    limits: DecodeLimits,
) -> Result<EncodedAsset> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AssetError::decode(name, e))?;
    reader.limits(limits.to_image_limits());

    // Pixels are stored in sensor order; the EXIF tag says how to display them
    let mut decoder = reader
        .into_decoder()
        .map_err(|e| AssetError::decode(name, e))?;
    let orientation = decoder
        .orientation()
        .map_err(|e| AssetError::decode(name, e))?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| AssetError::decode(name, e))?;
    img.apply_orientation(orientation);
    let (width, height) = (img.width(), img.height());

    let (target_width, target_height) =
        fit_within(width, height, settings.max_width, settings.max_height);
    let resized = if (target_width, target_height) == (width, height) {
        img
    } else {
        img.resize_exact(target_width, target_height, FilterType::Lanczos3)
    };

    // Fresh surface per call, never shared between encodes
    let surface = flatten_onto_white(&resized);

    let mut encoded = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut encoded, jpeg_quality(settings.quality));
    encoder
        .encode(
            surface.as_raw(),
            surface.width(),
            surface.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| AssetError::encode(name, e))?;

    debug!(
        "compressed {}: {}x{} -> {}x{}, {} -> {} bytes",
        name,
        width,
        height,
        surface.width(),
        surface.height(),
        bytes.len(),
        encoded.len()
    );

    Ok(EncodedAsset::new(JPEG, encoded))
}

/// JPEG has no alpha channel; composite transparent pixels over white.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{jpeg_bytes, png_bytes, rgba_png_bytes, with_exif_orientation};
    use proptest::prelude::*;

    fn compress_with_defaults(name: &str, bytes: &[u8]) -> Result<EncodedAsset> {
        compress_bytes(name, bytes, CompressSettings::default(), DecodeLimits::default())
    }

    fn decoded_dimensions(asset: &EncodedAsset) -> (u32, u32) {
        let img = image::load_from_memory(asset.bytes()).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_fit_within_keeps_small_images() {
        assert_eq!(fit_within(800, 600, 1200, 1200), (800, 600));
        assert_eq!(fit_within(1200, 1200, 1200, 1200), (1200, 1200));
    }

    #[test]
    fn test_fit_within_scales_by_tighter_side() {
        assert_eq!(fit_within(2400, 1200, 1200, 1200), (1200, 600));
        assert_eq!(fit_within(1000, 3000, 1200, 1200), (400, 1200));
        assert_eq!(fit_within(3000, 2000, 1200, 1200), (1200, 800));
    }

    #[test]
    fn test_fit_within_never_collapses_to_zero() {
        assert_eq!(fit_within(10_000, 3, 1200, 1200), (1200, 1));
    }

    #[test]
    fn test_jpeg_quality_mapping() {
        assert_eq!(jpeg_quality(0.75), 75);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(1.0), 100);
    }

    proptest! {
        #[test]
        fn prop_no_upscaling(
            max_w in 1..4000u32,
            max_h in 1..4000u32,
            w_frac in 0.0..=1.0f64,
            h_frac in 0.0..=1.0f64,
        ) {
            let w = ((max_w as f64 * w_frac) as u32).max(1);
            let h = ((max_h as f64 * h_frac) as u32).max(1);
            prop_assert_eq!(fit_within(w, h, max_w, max_h), (w, h));
        }

        #[test]
        fn prop_oversized_images_keep_aspect_and_fit(
            w in 1..20_000u32,
            h in 1..20_000u32,
            max_w in 1..4000u32,
            max_h in 1..4000u32,
        ) {
            prop_assume!(w > max_w || h > max_h);
            let (tw, th) = fit_within(w, h, max_w, max_h);
            prop_assert!(tw <= max_w && th <= max_h);
            prop_assert!(tw >= 1 && th >= 1);

            let ratio = f64::min(max_w as f64 / w as f64, max_h as f64 / h as f64);
            prop_assert!((tw as f64 - w as f64 * ratio).abs() <= 1.0);
            prop_assert!((th as f64 - h as f64 * ratio).abs() <= 1.0);
        }
    }

    #[test]
    fn test_small_png_keeps_dimensions() {
        let bytes = png_bytes(640, 480);
        let asset = compress_with_defaults("small.png", &bytes).unwrap();

        assert_eq!(asset.media_type(), JPEG);
        assert_eq!(
            image::guess_format(asset.bytes()).unwrap(),
            image::ImageFormat::Jpeg
        );
        assert_eq!(decoded_dimensions(&asset), (640, 480));
    }

    #[test]
    fn test_large_png_is_bounded() {
        let bytes = png_bytes(2400, 1600);
        let asset = compress_with_defaults("wide.png", &bytes).unwrap();

        assert_eq!(decoded_dimensions(&asset), (1200, 800));
    }

    #[test]
    fn test_custom_box() {
        let bytes = png_bytes(300, 900);
        let settings = CompressSettings {
            max_width: 100,
            max_height: 100,
            quality: 0.5,
        };
        let asset = compress_bytes("tall.png", &bytes, settings, DecodeLimits::default()).unwrap();

        assert_eq!(decoded_dimensions(&asset), (33, 100));
    }

    #[test]
    fn test_transparency_flattened_onto_white() {
        let bytes = rgba_png_bytes(16, 16, [0, 0, 0, 0]);
        let asset = compress_with_defaults("clear.png", &bytes).unwrap();

        let img = image::load_from_memory(asset.bytes()).unwrap().to_rgb8();
        let [r, g, b] = img.get_pixel(8, 8).0;
        assert!(r > 240 && g > 240 && b > 240);
    }

    #[test]
    fn test_exif_rotation_applied_before_resize() {
        // Landscape sensor data shot in portrait (Orientation 6: rotate 90 CW)
        let bytes = with_exif_orientation(&jpeg_bytes(2400, 1200), 6);
        let asset = compress_with_defaults("portrait.jpg", &bytes).unwrap();

        assert_eq!(decoded_dimensions(&asset), (600, 1200));
    }

    #[test]
    fn test_exif_upright_orientation_keeps_layout() {
        let bytes = with_exif_orientation(&jpeg_bytes(2400, 1200), 1);
        let asset = compress_with_defaults("landscape.jpg", &bytes).unwrap();

        assert_eq!(decoded_dimensions(&asset), (1200, 600));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = compress_with_defaults("notes.png", b"definitely not an image").unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }

    #[test]
    fn test_decode_limits_reject_huge_images() {
        let bytes = png_bytes(300, 200);
        let limits = DecodeLimits {
            max_width: 100,
            max_height: 100,
            max_alloc_bytes: 64 * 1024 * 1024,
        };
        let err =
            compress_bytes("big.png", &bytes, CompressSettings::default(), limits).unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_compress_handle() {
        let handle = RawHandle::from_bytes("photo.png", "image/png", png_bytes(1600, 1600));
        let asset = RasterCompressor::default()
            .compress(&handle, CompressSettings::default())
            .await
            .unwrap();

        assert_eq!(asset.media_type(), JPEG);
        assert_eq!(decoded_dimensions(&asset), (1200, 1200));
    }
}
