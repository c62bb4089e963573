use docmerge_engine::{ComposeError, ErrorClass};
use docmerge_format::FormatError;
use docmerge_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("invalid placeholder pattern: {0}")]
    InvalidPattern(String),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Compose(err) => err.class(),
            Self::Store(err) if err.is_not_found() => ErrorClass::NotFound,
            Self::Store(StoreError::InvalidId(_)) => ErrorClass::Validation,
            Self::Store(_) => ErrorClass::Storage,
            Self::Format(err) if err.is_client_error() => ErrorClass::Validation,
            Self::Format(_) | Self::InvalidPattern(_) | Self::Encode(_) => ErrorClass::Storage,
        }
    }

    pub fn status(&self) -> u16 {
        self.class().status()
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
