//! Items of the file picker's current list

use std::path::Path;

use uuid::Uuid;

use crate::error::Result;
use crate::media::RawHandle;

/// Upload status shown next to a picker entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStatus {
    /// Picked locally, not encoded yet
    Pending,
    /// Persisted, or encoded successfully
    Done,
    /// Encoding failed; the user may retry or pick another file
    Error,
}

/// Where an entry's content comes from. Exactly one of the two, so an
/// entry with neither cannot be built.
#[derive(Debug, Clone)]
pub enum SelectionSource {
    /// Already-persisted asset: a remote URL or an earlier data string,
    /// carried as an opaque value
    Persisted(String),
    /// Newly chosen local file
    Local(RawHandle),
}

/// One entry of the picker list
#[derive(Debug, Clone)]
pub struct FileSelection {
    /// Stable id, unique within a list
    pub identity: Uuid,
    pub display_name: String,
    pub status: SelectionStatus,
    pub source: SelectionSource,
}

impl FileSelection {
    /// Entry standing for the entity's persisted asset (edit sessions)
    pub fn persisted(reference: impl Into<String>) -> Self {
        let reference = reference.into();
        Self {
            identity: Uuid::new_v4(),
            display_name: display_name_for_reference(&reference),
            status: SelectionStatus::Done,
            source: SelectionSource::Persisted(reference),
        }
    }

    pub fn local(handle: RawHandle) -> Self {
        Self {
            identity: Uuid::new_v4(),
            display_name: handle.name().to_string(),
            status: SelectionStatus::Pending,
            source: SelectionSource::Local(handle),
        }
    }

    /// Entry for a file on disk; its content is read on save
    pub async fn local_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::local(RawHandle::from_path(path).await?))
    }

    pub fn existing_reference(&self) -> Option<&str> {
        match &self.source {
            SelectionSource::Persisted(reference) => Some(reference),
            SelectionSource::Local(_) => None,
        }
    }

    pub fn raw_handle(&self) -> Option<&RawHandle> {
        match &self.source {
            SelectionSource::Local(handle) => Some(handle),
            SelectionSource::Persisted(_) => None,
        }
    }
}

/// Last path segment of a URL; inline data has no name of its own
fn display_name_for_reference(reference: &str) -> String {
    if reference.starts_with("data:") {
        return "current file".to_string();
    }
    let path = reference.split(['?', '#']).next().unwrap_or(reference);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("current file")
        .to_string()
}
