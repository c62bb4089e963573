//! Wire format for docmerge requests and responses, plus PDF export.

pub mod pdf;
pub mod request;
pub mod response;

use thiserror::Error;

pub use pdf::{pdf_base64, render_pdf};
pub use request::{
    template_doc_id, CreateDocRequest, DocType, MergeDocRequest, Operation, Request,
};
pub use response::{HttpResponse, Response, ResponseBody, ResponseType, JSON_CONTENT_TYPE};

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Bad JSON format")]
    InvalidJson,

    #[error("Bad type format")]
    UnknownType,

    #[error("Bad templateDocId")]
    BadTemplateDocId,

    #[error("Bad request format: {0}")]
    InvalidField(String),

    #[error("PDF export failed: {0}")]
    Export(String),
}

impl FormatError {
    /// Rejections of the incoming request, as opposed to export failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Export(_))
    }
}

pub type FormatResult<T> = Result<T, FormatError>;
