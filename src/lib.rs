//! Media normalization and upload-state reconciliation for the association
//! admin console.
//!
//! Flow of a save:
//! 1. picker events are capped to one file (`picker`)
//! 2. a newly picked file is routed to the raster compressor or passed
//!    through (`media`)
//! 3. the result is reconciled against the stored asset (`reconcile`)
//! 4. the outcome is merged with the normalized form values (`submit`)
//! 5. the record goes to the store (`store`)
//!
//! `editor::EditSession` drives the whole sequence for one open editor.

pub mod config;
pub mod editor;
pub mod entity;
pub mod error;
pub mod media;
pub mod picker;
pub mod reconcile;
pub mod store;
pub mod submit;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use editor::EditSession;
pub use entity::{AssetFieldSpec, EntityKind};
pub use error::{AssetError, OverflowWarning, Result};
pub use reconcile::{reconcile, AssetReconciliationOutcome};
