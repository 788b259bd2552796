//! Error types of the document core

use cv_cad::CadError;

use crate::document::{DocumentId, ItemId};

/// Errors that can occur during import or export
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IoError {
    #[error("Unknown file format")]
    UnknownFormat,

    #[error("Reader failed: {0}")]
    ReaderFailed(String),

    #[error("Writer failed: {0}")]
    WriterFailed(String),

    #[error("This writer only supports a single shape or mesh per file")]
    UnsupportedMultiSolid,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Nothing to export")]
    NothingToExport,

    #[error("Kernel executor has stopped")]
    ExecutorStopped,
}

impl IoError {
    /// Map a kernel error raised while reading
    pub fn from_read(err: CadError) -> Self {
        match err {
            CadError::Aborted => IoError::Cancelled,
            CadError::FileIo(msg) => IoError::Io(msg),
            other => IoError::ReaderFailed(other.to_string()),
        }
    }

    /// Map a kernel error raised while writing
    pub fn from_write(err: CadError) -> Self {
        match err {
            CadError::Aborted => IoError::Cancelled,
            CadError::FileIo(msg) => IoError::Io(msg),
            other => IoError::WriterFailed(other.to_string()),
        }
    }
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        IoError::Io(err.to_string())
    }
}

/// Terminal outcome of an import or export
pub type IoResult<T = ()> = Result<T, IoError>;

/// Application-level errors (configuration, worker pool)
#[derive(Debug, Clone, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(String),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_error_mapping() {
        assert_eq!(IoError::from_read(CadError::Aborted), IoError::Cancelled);
        assert_eq!(
            IoError::from_read(CadError::ReadFailed("bad header".into())),
            IoError::ReaderFailed("Read failed: bad header".into())
        );
        assert_eq!(
            IoError::from_write(CadError::KernelNotAvailable("x".into())),
            IoError::WriterFailed("Kernel not available: x".into())
        );
        assert_eq!(
            IoError::from_write(CadError::FileIo("denied".into())),
            IoError::Io("denied".into())
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(IoError::UnknownFormat.to_string(), "Unknown file format");
        assert_eq!(
            IoError::ReaderFailed("truncated".into()).to_string(),
            "Reader failed: truncated"
        );
    }
}
