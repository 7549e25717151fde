use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the folder, storage and permission boundaries.
///
/// None of these are fatal: callers degrade to asking the user for a folder
/// or leave the playlist as it was.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("read access to {} was not granted", path.display())]
    PermissionDenied { path: PathBuf },
    #[error("handle store unavailable: {reason}")]
    StorageUnavailable { reason: String },
    #[error("folder selection cancelled")]
    UserCancel,
    #[error("failed to read folder {}: {reason}", path.display())]
    FolderUnreadable { path: PathBuf, reason: String },
}

impl PlayerError {
    pub fn storage(reason: impl std::fmt::Display) -> Self {
        Self::StorageUnavailable {
            reason: reason.to_string(),
        }
    }

    pub fn unreadable(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::FolderUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type PlayerResult<T> = Result<T, PlayerError>;
