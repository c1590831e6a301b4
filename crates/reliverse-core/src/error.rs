//! Error taxonomy for the scaffolding pipeline
//!
//! Only the failures that callers need to tell apart get their own variant.
//! Everything else travels as `anyhow::Error` inside [`Error::Other`].

use thiserror::Error;

/// Errors surfaced by the acquisition pipeline and the interactive layer
#[derive(Debug, Error)]
pub enum Error {
    /// The requested template identifier is not in the registry
    #[error("Template '{0}' not found in templates list")]
    TemplateNotFound(String),

    /// A template identifier did not split into `<author>/<name>`
    #[error("Invalid template id '{0}': expected <author>/<name>")]
    InvalidTemplateId(String),

    /// Fetching a fresh copy of the template failed
    #[error("Failed to download template '{template}': {source}")]
    Download {
        template: String,
        #[source]
        source: anyhow::Error,
    },

    /// The user chose to exit or interrupted a prompt
    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns true when the error chain contains a user cancellation
pub fn is_cancelled(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|e| matches!(e.downcast_ref::<Error>(), Some(Error::Cancelled)))
}
