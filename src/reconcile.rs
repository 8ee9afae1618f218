//! Asset state reconciliation
//!
//! Combines the entity's persisted asset reference with the picker list into
//! the action the save must carry:
//!
//! | prior   | list                               | outcome           |
//! |---------|------------------------------------|-------------------|
//! | present | emptied by the user                | `Removed`         |
//! | present | one local file                     | `Replaced(..)`    |
//! | present | one entry with only the reference  | `Unchanged`       |
//! | absent  | empty                              | `Unchanged`       |
//! | absent  | one local file                     | `Replaced(..)`    |
//!
//! A list nobody touched is always `Unchanged`, whatever it holds.

use log::{info, warn};

use crate::error::Result;
use crate::media::{AssetEncoder, EncodedAsset};
use crate::picker::{PickerList, SelectionSource, SelectionStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetReconciliationOutcome {
    /// Re-send the persisted reference as-is (or keep it absent)
    Unchanged,
    /// New content to persist
    Replaced(EncodedAsset),
    /// Clear the persisted field with an explicit null
    Removed,
}

impl AssetReconciliationOutcome {
    /// Short name for logs; the payload itself is never printed
    pub fn label(&self) -> &'static str {
        match self {
            AssetReconciliationOutcome::Unchanged => "unchanged",
            AssetReconciliationOutcome::Replaced(_) => "replaced",
            AssetReconciliationOutcome::Removed => "removed",
        }
    }
}

/// Decide the outcome for one save attempt.
///
/// A local file is encoded (and awaited) before the outcome is returned. On
/// encode failure the entry is marked `Error` and the error is returned, so
/// no outcome exists for a save that must not proceed.
pub async fn reconcile<E: AssetEncoder>(
    prior: Option<&str>,
    list: &mut PickerList,
    encoder: &E,
) -> Result<AssetReconciliationOutcome> {
    if !list.is_touched() {
        return Ok(AssetReconciliationOutcome::Unchanged);
    }

    let Some(entry) = list.selected() else {
        return Ok(match prior {
            Some(_) => {
                info!("asset removed by user");
                AssetReconciliationOutcome::Removed
            }
            None => AssetReconciliationOutcome::Unchanged,
        });
    };

    let identity = entry.identity;
    match entry.source.clone() {
        SelectionSource::Local(handle) => {
            list.set_status(identity, SelectionStatus::Pending);
            match encoder.encode(&handle, handle.kind()).await {
                Ok(asset) => {
                    list.set_status(identity, SelectionStatus::Done);
                    Ok(AssetReconciliationOutcome::Replaced(asset))
                }
                Err(e) => {
                    warn!("could not encode {}: {}", handle.name(), e);
                    list.set_status(identity, SelectionStatus::Error);
                    Err(e)
                }
            }
        }
        SelectionSource::Persisted(reference) => {
            if prior != Some(reference.as_str()) {
                warn!("picker holds a reference the entity does not own; leaving asset unchanged");
            }
            Ok(AssetReconciliationOutcome::Unchanged)
        }
    }
}
