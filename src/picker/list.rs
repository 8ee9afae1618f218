//! Picker list with explicit provenance
//!
//! An edit session's list starts seeded with the persisted asset, a new
//! entity's list starts empty. Emptiness alone cannot tell "the user removed
//! the file" from "nothing happened yet", so the list records whether any
//! picker event was applied.

use uuid::Uuid;

use super::normalizer::{normalize, PickerEvent};
use super::selection::{FileSelection, SelectionStatus};
use crate::error::OverflowWarning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// No picker event applied since the session started
    Untouched,
    Touched,
}

#[derive(Debug, Clone)]
pub struct PickerList {
    entries: Vec<FileSelection>,
    provenance: Provenance,
}

impl PickerList {
    /// Empty list for a new entity
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            provenance: Provenance::Untouched,
        }
    }

    /// List for an edit session, holding the persisted asset if there is one
    pub fn seeded(existing_reference: Option<&str>) -> Self {
        Self {
            entries: existing_reference
                .map(|reference| vec![FileSelection::persisted(reference)])
                .unwrap_or_default(),
            provenance: Provenance::Untouched,
        }
    }

    /// Apply one picker interaction. Any event, even one that leaves the
    /// entries as they were, marks the list touched.
    pub fn apply(&mut self, event: PickerEvent) -> Option<OverflowWarning> {
        let normalized = normalize(&self.entries, event);
        self.entries = normalized.list;
        self.provenance = Provenance::Touched;
        normalized.warning
    }

    pub fn entries(&self) -> &[FileSelection] {
        &self.entries
    }

    pub fn selected(&self) -> Option<&FileSelection> {
        self.entries.last()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn is_touched(&self) -> bool {
        self.provenance == Provenance::Touched
    }

    pub(crate) fn set_status(&mut self, identity: Uuid, status: SelectionStatus) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.identity == identity) {
            entry.status = status;
        }
    }
}

impl Default for PickerList {
    fn default() -> Self {
        Self::new()
    }
}
