//! Media normalization
//!
//! This module handles:
//! - Wrapping picked files as raw handles (memory or disk backed)
//! - Recompressing raster images to bounded JPEGs
//! - Passing documents and small images through untouched
//! - Deciding which of the two a file goes through

pub mod compressor;
pub mod direct;
pub mod payload;
pub mod policy;

pub use compressor::{CompressSettings, DecodeLimits, RasterCompressor};
pub use direct::DirectEncoder;
pub use payload::{EncodedAsset, MediaKind, RawHandle};
pub use policy::{AssetEncoder, Encoder, EncodingPolicy, PolicyVariant};
