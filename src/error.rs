//! Error taxonomy for asset processing and record saving.
//!
//! `Read`, `Decode` and `Encode` are local file-processing failures: they abort
//! the save attempt before any record is emitted and are reported to the user
//! as recoverable. The remaining variants cover the surrounding surfaces
//! (form validation, the record catalog, configuration files).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssetError>;

#[derive(Error, Debug)]
pub enum AssetError {
    /// Raw bytes of a selected file could not be read
    #[error("could not read {name}: {reason}")]
    Read { name: String, reason: String },

    /// Bytes were expected to be a raster image but are not
    #[error("could not decode {name} as an image: {reason}")]
    Decode { name: String, reason: String },

    /// Re-encoding (or the background encode task) failed
    #[error("could not encode {name}: {reason}")]
    Encode { name: String, reason: String },

    /// Required-field rules evaluated by the form layer
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("record {kind} #{id} not found")]
    NotFound { kind: String, id: i64 },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssetError {
    pub fn read(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Read {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn encode(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Encode {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// File-processing failures the user can retry with the same or
    /// another file.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Read { .. } | Self::Decode { .. } | Self::Encode { .. }
        )
    }

    /// Message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        if self.is_recoverable() {
            "could not process the file, try again".to_string()
        } else {
            self.to_string()
        }
    }
}

/// Non-fatal notice that the picker auto-corrected an overflowing list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowWarning;

impl OverflowWarning {
    pub const MESSAGE: &'static str = "multiple files not allowed, most recent kept";
}

impl std::fmt::Display for OverflowWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(Self::MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_errors_are_recoverable() {
        assert!(AssetError::read("a.png", "gone").is_recoverable());
        assert!(AssetError::decode("a.png", "garbage").is_recoverable());
        assert!(AssetError::encode("a.png", "panic").is_recoverable());
        assert!(!AssetError::Validation("photo is required".into()).is_recoverable());
    }

    #[test]
    fn test_user_message() {
        let err = AssetError::decode("a.png", "garbage");
        assert_eq!(err.user_message(), "could not process the file, try again");
        assert_eq!(
            OverflowWarning.to_string(),
            "multiple files not allowed, most recent kept"
        );
    }
}
