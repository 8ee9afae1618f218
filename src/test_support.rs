//! In-memory fixtures shared by unit tests

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use crate::error::{AssetError, Result};
use crate::media::{AssetEncoder, EncodedAsset, MediaKind, RawHandle};

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

fn write(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    write(DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    write(DynamicImage::ImageRgb8(gradient(width, height)), ImageFormat::Jpeg)
}

/// Insert an APP1 Exif segment carrying only an Orientation tag right after
/// the JPEG start-of-image marker.
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    let mut exif = b"Exif\0\0".to_vec();
    // Big-endian TIFF header, first IFD at offset 8
    exif.extend_from_slice(b"MM\0\x2A\0\0\0\x08");
    exif.extend_from_slice(&1u16.to_be_bytes());
    // Tag 0x0112, type SHORT, count 1, value left-aligned in the 4-byte slot
    exif.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0, 0, 0, 1]);
    exif.extend_from_slice(&orientation.to_be_bytes());
    exif.extend_from_slice(&[0, 0]);
    exif.extend_from_slice(&0u32.to_be_bytes());

    let length = (exif.len() + 2) as u16;
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(&exif);
    out.extend_from_slice(&jpeg[2..]);
    out
}

pub fn rgba_png_bytes(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(pixel));
    write(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// Encoder double that records how often it was asked to encode
pub struct CountingEncoder {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingEncoder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn output() -> EncodedAsset {
        EncodedAsset::new("image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xD9])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AssetEncoder for CountingEncoder {
    async fn encode(&self, handle: &RawHandle, _kind: MediaKind) -> Result<EncodedAsset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(AssetError::decode(handle.name(), "not an image"))
        } else {
            Ok(Self::output())
        }
    }
}
