use thiserror::Error;

/// Failures reported by the persistence layer. The `Display` output is the message shown to
/// the user.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error(
        "Invalid page name {0:?}. Names can't be empty, start with a period or contain any of / \\ : * ? \" < > |"
    )]
    InvalidPageName(String),

    #[error("Page {0:?} was not found")]
    PageNotFound(String),

    #[error("Page {0:?} already exists")]
    PageAlreadyExists(String),

    #[error("Invalid import file: {0}")]
    InvalidImport(String),

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to process json: {0}")]
    Json(#[from] serde_json::Error),
}
