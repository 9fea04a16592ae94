//! Error types for paux-raster

use std::io;
use std::path::PathBuf;

/// Result type for paux-raster operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading or writing PCI .aux datasets
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A file could not be opened or created
    #[error("Cannot open {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The sidecar is missing or does not carry the AuxilaryTarget tag
    #[error("Not a PCI .aux dataset: {0}")]
    FormatMismatch(String),

    /// A required sidecar key is absent or too short
    #[error("Missing metadata: {0}")]
    MissingMetadata(String),

    /// Illegal dimensions, band count, layout or data type
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unsupported feature
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Mutation attempted on a dataset opened read-only
    #[error("Read-only dataset: {0}")]
    ReadOnly(String),

    /// Out of bounds access
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    /// Projection error
    #[error("Projection error: {0}")]
    Projection(String),

    /// One or more close steps failed
    #[error("Close failed: {0}")]
    Close(String),
}
