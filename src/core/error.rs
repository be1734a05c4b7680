use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or extracting an invoice document.
///
/// Field coercion never produces an error: non-numeric or missing values
/// read as zero or "not found". Structural, I/O, and arithmetic overflow
/// failures surface here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ComprobanteError {
    /// XML could not be read into a document tree.
    #[error("XML error: {0}")]
    Xml(String),

    /// The document tree lacks the shape extraction needs.
    #[error("structure error: {0}")]
    Structure(String),

    /// An amount or sum left the representable decimal range.
    #[error("arithmetic overflow in {0}")]
    Overflow(String),

    /// A file or directory could not be read.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being read when the error occurred.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ComprobanteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn overflow(what: impl Into<String>) -> Self {
        Self::Overflow(what.into())
    }
}
