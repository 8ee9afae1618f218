//! File picker state
//!
//! This module handles:
//! - Picker entries (persisted references and newly picked local files)
//! - Capping the list at one entry on every interaction
//! - Tracking whether the user touched the picker during a session
//! - The per-entity asset field built on top of the list

pub mod field;
pub mod list;
pub mod normalizer;
pub mod selection;

pub use field::AssetField;
pub use list::{PickerList, Provenance};
pub use normalizer::{normalize, Normalized, PickerEvent};
pub use selection::{FileSelection, SelectionSource, SelectionStatus};
