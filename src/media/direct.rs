//! Pass-through encoder for documents and small images

use log::debug;

use super::payload::{EncodedAsset, RawHandle};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectEncoder;

impl DirectEncoder {
    /// Wrap the handle's bytes with its original media type, untouched.
    pub async fn encode(&self, handle: &RawHandle) -> Result<EncodedAsset> {
        let bytes = handle.read().await?;
        debug!(
            "encoding {} as-is ({}, {} bytes)",
            handle.name(),
            handle.media_type(),
            bytes.len()
        );
        Ok(EncodedAsset::new(handle.media_type(), bytes.to_vec()))
    }
}
