use crate::model::Px;

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// Height, spacing, padding or minimum row height out of range.
    InvalidConfig(&'static str),
    /// An existing slot offset that is negative or not finite.
    InvalidOffset(Px),
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::InvalidConfig(msg) => write!(f, "invalid layout configuration: {msg}"),
            LayoutError::InvalidOffset(top) => write!(f, "invalid slot offset: {top}"),
        }
    }
}

impl std::error::Error for LayoutError {}
