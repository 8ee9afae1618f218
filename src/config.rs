//! Runtime configuration
//!
//! All values have defaults, so a configuration file only needs to name the
//! settings it overrides. The file is JSON, like every other document the
//! console exchanges.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AssetError, Result};
use crate::media::compressor::{CompressSettings, DecodeLimits};
use crate::media::policy::EncodingPolicy;
use crate::submit::NumericDefaults;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    // ========== Compression ==========
    /// Bounding box for recompressed images (pixels)
    pub max_width: u32,
    pub max_height: u32,

    /// Lossy re-encode quality on a 0.0 - 1.0 scale
    pub quality: f32,

    /// Images larger than this are always recompressed
    pub compress_threshold_bytes: u64,

    // ========== Decode limits ==========
    /// Images with larger intrinsic dimensions are rejected before decode
    pub max_decode_width: u32,
    pub max_decode_height: u32,

    /// Upper bound on decoder allocations
    pub max_decode_alloc_bytes: u64,

    // ========== Submit ==========
    /// Substituted for blank optional quantity fields
    pub default_quantity: i64,

    /// Substituted for blank optional price fields
    pub default_price: f64,

    // ========== Storage ==========
    /// Record catalog location; the user data directory when unset
    pub catalog_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let compress = CompressSettings::default();
        let limits = DecodeLimits::default();
        Self {
            max_width: compress.max_width,
            max_height: compress.max_height,
            quality: compress.quality,
            compress_threshold_bytes: EncodingPolicy::DEFAULT_COMPRESS_THRESHOLD,
            max_decode_width: limits.max_width,
            max_decode_height: limits.max_height,
            max_decode_alloc_bytes: limits.max_alloc_bytes,
            default_quantity: 0,
            default_price: 0.0,
            catalog_path: None,
        }
    }
}

impl Config {
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AssetError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| AssetError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<()> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(AssetError::Config(
                "max_width and max_height must be positive".into(),
            ));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(AssetError::Config(format!(
                "quality must be within (0, 1], got {}",
                self.quality
            )));
        }
        Ok(())
    }

    pub fn compress_settings(&self) -> CompressSettings {
        CompressSettings {
            max_width: self.max_width,
            max_height: self.max_height,
            quality: self.quality,
        }
    }

    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_width: self.max_decode_width,
            max_height: self.max_decode_height,
            max_alloc_bytes: self.max_decode_alloc_bytes,
        }
    }

    pub fn numeric_defaults(&self) -> NumericDefaults {
        NumericDefaults {
            quantity: self.default_quantity,
            price: self.default_price,
        }
    }

    /// Standard encoding policy built from these settings
    pub fn encoding_policy(&self) -> EncodingPolicy {
        EncodingPolicy::standard()
            .with_settings(self.compress_settings())
            .with_threshold(self.compress_threshold_bytes)
            .with_limits(self.decode_limits())
    }

    /// Where the record catalog lives.
    ///
    /// - Linux: ~/.local/share/admin-assets/catalog.db
    /// - macOS: ~/Library/Application Support/admin-assets/catalog.db
    /// - Windows: %APPDATA%\admin-assets\catalog.db
    pub fn catalog_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.catalog_path {
            return Ok(path.clone());
        }
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| AssetError::Config("could not determine user data directory".into()))?;
        path.push("admin-assets");
        path.push("catalog.db");
        Ok(path)
    }
}
