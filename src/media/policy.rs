//! Encoding policy: which encoder handles an incoming file
//!
//! Rules, first match wins:
//! 1. documents are passed through
//! 2. images the codec cannot decode (SVG, HEIC) are passed through
//! 3. PNGs and images above the size threshold are recompressed
//! 4. everything else (small JPEG/WebP/...) is passed through

use std::future::Future;

use log::debug;

use super::compressor::{CompressSettings, DecodeLimits, RasterCompressor};
use super::direct::DirectEncoder;
use super::payload::{is_decodable_raster, EncodedAsset, MediaKind, RawHandle, PNG};
use crate::error::Result;

/// Encoder chosen for one file
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Encoder {
    Raster(CompressSettings),
    Direct,
}

/// Per-entity policy flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyVariant {
    /// Rules 1-4
    Standard,
    /// Every file is treated as a document (rule 1 only)
    DocumentsOnly,
}

/// Turns a raw handle into an encoded payload.
///
/// The reconciler only talks to this seam; `EncodingPolicy` is the
/// production implementation.
pub trait AssetEncoder {
    fn encode(
        &self,
        handle: &RawHandle,
        kind: MediaKind,
    ) -> impl Future<Output = Result<EncodedAsset>> + Send;
}

#[derive(Debug, Clone, Copy)]
pub struct EncodingPolicy {
    variant: PolicyVariant,
    settings: CompressSettings,
    compress_threshold: u64,
    compressor: RasterCompressor,
}

impl EncodingPolicy {
    pub const DEFAULT_COMPRESS_THRESHOLD: u64 = 500_000;

    pub fn standard() -> Self {
        Self::for_variant(PolicyVariant::Standard)
    }

    pub fn documents() -> Self {
        Self::for_variant(PolicyVariant::DocumentsOnly)
    }

    pub fn for_variant(variant: PolicyVariant) -> Self {
        Self {
            variant,
            settings: CompressSettings::default(),
            compress_threshold: Self::DEFAULT_COMPRESS_THRESHOLD,
            compressor: RasterCompressor::default(),
        }
    }

    pub fn with_settings(mut self, settings: CompressSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_threshold(mut self, bytes: u64) -> Self {
        self.compress_threshold = bytes;
        self
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.compressor = RasterCompressor::new(limits);
        self
    }

    /// Same settings under another variant
    pub fn with_variant(mut self, variant: PolicyVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn variant(&self) -> PolicyVariant {
        self.variant
    }

    pub fn select_encoder(&self, handle: &RawHandle, kind: MediaKind) -> Encoder {
        if self.variant == PolicyVariant::DocumentsOnly || kind == MediaKind::Document {
            return Encoder::Direct;
        }
        if !is_decodable_raster(handle.media_type()) {
            return Encoder::Direct;
        }

        let is_png = handle.media_type().trim().eq_ignore_ascii_case(PNG);
        if is_png || handle.byte_length() > self.compress_threshold {
            Encoder::Raster(self.settings)
        } else {
            Encoder::Direct
        }
    }

    pub async fn run(&self, encoder: Encoder, handle: &RawHandle) -> Result<EncodedAsset> {
        match encoder {
            Encoder::Raster(settings) => self.compressor.compress(handle, settings).await,
            Encoder::Direct => DirectEncoder.encode(handle).await,
        }
    }
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl AssetEncoder for EncodingPolicy {
    async fn encode(&self, handle: &RawHandle, kind: MediaKind) -> Result<EncodedAsset> {
        let encoder = self.select_encoder(handle, kind);
        debug!(
            "{} ({:?}, {} bytes) -> {:?}",
            handle.name(),
            kind,
            handle.byte_length(),
            encoder
        );
        self.run(encoder, handle).await
    }
}
