use docmerge_model::RegionKind;
use thiserror::Error;

/// Coarse failure taxonomy shared by every layer that reports to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    NotFound,
    Arithmetic,
    Storage,
}

impl ErrorClass {
    /// HTTP-style status code for responses.
    pub fn status(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::Arithmetic => 422,
            Self::Storage => 500,
        }
    }
}

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("placeholder '{pattern}' not found")]
    PlaceholderNotFound { pattern: String },

    #[error("image has degenerate natural size {width}x{height}")]
    DegenerateImage { height: f64, width: f64 },

    #[error("image bounds must be positive (received {width}x{height})")]
    InvalidBounds { height: f64, width: f64 },

    #[error("invalid image payload: {0}")]
    InvalidImage(String),

    #[error("search pattern cannot be empty")]
    EmptySearchPattern,

    #[error("{region} has no element at index {index} (length {len})")]
    IndexOutOfRange {
        region: RegionKind,
        index: usize,
        len: usize,
    },

    #[error("{region} element {index} is a table without rows")]
    EmptyTable { region: RegionKind, index: usize },

    #[error("template has no {0}")]
    MissingRegion(RegionKind),
}

impl ComposeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::PlaceholderNotFound { .. } => ErrorClass::NotFound,
            Self::DegenerateImage { .. } => ErrorClass::Arithmetic,
            Self::InvalidBounds { .. }
            | Self::InvalidImage(_)
            | Self::EmptySearchPattern
            | Self::IndexOutOfRange { .. }
            | Self::EmptyTable { .. }
            | Self::MissingRegion(_) => ErrorClass::Validation,
        }
    }
}

pub type ComposeResult<T> = Result<T, ComposeError>;
