//! Persistence of the application data. Checklist, history and dismissed alerts live together in
//! a single json document that is always read and written whole. Wiki pages are plain markdown
//! files in their own directory. [transfer] bundles both into a single backup file.

pub mod entities;
pub mod error;
pub mod file_storage;
pub mod transfer;
pub mod wiki;

pub use error::StorageError;
pub use file_storage::{FileStorage, Storage};
