//! Single-file list normalizer
//!
//! The picker widget is a multi-file control; every editor allows one file.
//! Each picker interaction goes through `normalize` before the list is shown
//! again, so an overflowing list is never visible.

use log::warn;
use uuid::Uuid;

use super::selection::FileSelection;
use crate::error::OverflowWarning;

/// Raw interaction coming from the picker
#[derive(Debug, Clone)]
pub enum PickerEvent {
    /// One file picked, or a bulk multi-select in pick order
    Add(Vec<FileSelection>),
    /// Swap whatever is there for this entry
    Replace(FileSelection),
    /// User removed the entry with this identity
    Remove(Uuid),
    Clear,
}

impl PickerEvent {
    pub fn add(selection: FileSelection) -> Self {
        PickerEvent::Add(vec![selection])
    }
}

/// Result of applying one event
#[derive(Debug, Clone)]
pub struct Normalized {
    /// Never longer than one entry
    pub list: Vec<FileSelection>,
    pub warning: Option<OverflowWarning>,
}

pub fn normalize(current: &[FileSelection], event: PickerEvent) -> Normalized {
    let mut list: Vec<FileSelection> = match event {
        PickerEvent::Add(incoming) => current.iter().cloned().chain(incoming).collect(),
        PickerEvent::Replace(selection) => vec![selection],
        PickerEvent::Remove(identity) => {
            if current.iter().any(|s| s.identity == identity) {
                Vec::new()
            } else {
                current.to_vec()
            }
        }
        PickerEvent::Clear => Vec::new(),
    };

    let mut warning = None;
    if list.len() > 1 {
        // Most recently added entry wins
        let kept = list.split_off(list.len() - 1);
        warn!(
            "{} file(s) dropped from picker: {}",
            list.len(),
            OverflowWarning::MESSAGE
        );
        list = kept;
        warning = Some(OverflowWarning);
    }

    Normalized { list, warning }
}
