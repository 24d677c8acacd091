use ulid::Ulid;

use crate::layout::LayoutError;

#[derive(Debug)]
pub enum StoreError {
    NotFound(Ulid),
    AlreadyExists(Ulid),
    /// Resource still owns events and cannot be deleted.
    HasEvents(Ulid),
    InvalidEvent(&'static str),
    LimitExceeded(&'static str),
    Layout(LayoutError),
    WalError(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "not found: {id}"),
            StoreError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            StoreError::HasEvents(id) => {
                write!(f, "cannot delete resource {id}: it still has events")
            }
            StoreError::InvalidEvent(msg) => write!(f, "invalid event: {msg}"),
            StoreError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            StoreError::Layout(e) => write!(f, "layout error: {e}"),
            StoreError::WalError(e) => write!(f, "change log error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Layout(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LayoutError> for StoreError {
    fn from(e: LayoutError) -> Self {
        StoreError::Layout(e)
    }
}
