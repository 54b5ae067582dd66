use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::{
    fs::operations::{read_locked, write_atomically},
    utils::dir::{DOCUMENT_FILE_NAME, WIKI_DIR_NAME},
};

use super::{
    entities::Document,
    error::StorageError,
    wiki::{PageEntry, WikiDirectory},
};

/// Interface for abstracting storage of the application document and wiki pages. Every call is
/// a complete request: the document is always read and written whole, so the last save wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    /// Never fails. Missing or unreadable data results in an empty document.
    async fn load_document(&self) -> Document;

    async fn save_document(&self, document: &Document) -> Result<(), StorageError>;

    async fn list_pages(&self) -> Result<Vec<PageEntry>, StorageError>;

    async fn read_page(&self, id: &str) -> Result<String, StorageError>;

    async fn write_page(&self, id: &str, content: &str) -> Result<(), StorageError>;

    async fn delete_page(&self, id: &str) -> Result<(), StorageError>;

    async fn rename_page(&self, old_id: &str, new_id: &str) -> Result<(), StorageError>;

    /// Removes every wiki page.
    async fn clear_pages(&self) -> Result<(), StorageError>;
}

/// The main realization of [Storage]: a json file plus a directory of markdown files.
pub struct FileStorage {
    document_path: PathBuf,
    wiki: WikiDirectory,
}

impl FileStorage {
    /// Uses the standard layout inside of the application directory.
    pub fn new(app_dir: &Path) -> Result<Self, std::io::Error> {
        Self::with_paths(app_dir.join(DOCUMENT_FILE_NAME), app_dir.join(WIKI_DIR_NAME))
    }

    pub fn with_paths(document_path: PathBuf, wiki_dir: PathBuf) -> Result<Self, std::io::Error> {
        if let Some(parent) = document_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            document_path,
            wiki: WikiDirectory::new(wiki_dir)?,
        })
    }

    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    async fn try_load(&self) -> Result<Option<Document>, StorageError> {
        let Some(text) = read_locked(&self.document_path).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str::<Document>(&text)?))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn load_document(&self) -> Document {
        match self.try_load().await {
            Ok(Some(document)) => {
                debug!(
                    "Loaded document with {} history entries",
                    document.history.len()
                );
                document
            }
            Ok(None) => {
                info!("No document at {:?}, starting empty", self.document_path);
                Document::default()
            }
            Err(e) => {
                error!("Failed to load app data from {:?}: {e}", self.document_path);
                Document::default()
            }
        }
    }

    async fn save_document(&self, document: &Document) -> Result<(), StorageError> {
        let data = serde_json::to_vec_pretty(document)?;
        write_atomically(&self.document_path, &data)
            .await
            .inspect_err(|e| error!("Failed to save app data to {:?}: {e}", self.document_path))?;
        debug!("Saved document to {:?}", self.document_path);
        Ok(())
    }

    async fn list_pages(&self) -> Result<Vec<PageEntry>, StorageError> {
        self.wiki
            .list()
            .await
            .inspect_err(|e| error!("Failed to list wiki pages: {e}"))
    }

    async fn read_page(&self, id: &str) -> Result<String, StorageError> {
        self.wiki
            .read(id)
            .await
            .inspect_err(|e| error!("Failed to read wiki page {id}: {e}"))
    }

    async fn write_page(&self, id: &str, content: &str) -> Result<(), StorageError> {
        self.wiki
            .write(id, content)
            .await
            .inspect_err(|e| error!("Failed to write wiki page {id}: {e}"))
    }

    async fn delete_page(&self, id: &str) -> Result<(), StorageError> {
        self.wiki
            .delete(id)
            .await
            .inspect_err(|e| error!("Failed to delete wiki page {id}: {e}"))
    }

    async fn rename_page(&self, old_id: &str, new_id: &str) -> Result<(), StorageError> {
        self.wiki
            .rename(old_id, new_id)
            .await
            .inspect_err(|e| error!("Failed to rename wiki page {old_id} to {new_id}: {e}"))
    }

    async fn clear_pages(&self) -> Result<(), StorageError> {
        self.wiki
            .clear()
            .await
            .inspect_err(|e| error!("Failed to clear wiki pages: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use anyhow::Result;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use crate::{
        storage::entities::{AnswerSubmission, AnswerValue, Checklist, Document},
        utils::logging::TEST_LOGGING,
    };

    use super::{FileStorage, Storage};

    fn test_document() -> Document {
        Document {
            checklist: Some(Checklist {
                id: "c1".into(),
                title: "Evening".into(),
                ..Default::default()
            }),
            history: vec![AnswerSubmission {
                checklist_id: "c1".into(),
                checklist_title: "Evening".into(),
                submitted_at: Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap(),
                answers: BTreeMap::from([("q1".to_string(), AnswerValue::Text("yes".into()))]),
                duration: Some(5300),
            }],
            dismissed_alerts: vec!["q1-2024-01-01".into()],
        }
    }

    #[tokio::test]
    async fn test_missing_document_is_empty() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let storage = FileStorage::new(dir.path())?;
        assert_eq!(storage.load_document().await, Document::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupted_document_is_empty() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let storage = FileStorage::new(dir.path())?;
        std::fs::write(storage.document_path(), "{ not json")?;
        assert_eq!(storage.load_document().await, Document::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_null_lists_keep_the_checklist() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let storage = FileStorage::new(dir.path())?;
        std::fs::write(
            storage.document_path(),
            r#"{"checklist":{"id":"c1","title":"Morning","questions":null},"history":null,"dismissedAlerts":null}"#,
        )?;

        let document = storage.load_document().await;
        let checklist = document.checklist.as_ref().map(|c| (c.id.as_str(), c.title.as_str()));
        assert_eq!(checklist, Some(("c1", "Morning")));
        assert!(document.history.is_empty());
        assert!(document.dismissed_alerts.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_saved_document_is_visible_to_next_load() -> Result<()> {
        let dir = tempdir()?;
        let storage = FileStorage::new(dir.path())?;

        storage.save_document(&test_document()).await?;
        assert_eq!(storage.load_document().await, test_document());

        let empty = Document::default();
        storage.save_document(&empty).await?;
        assert_eq!(storage.load_document().await, empty);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(storage.document_path())?)?;
        assert!(raw.get("checklist").is_some());
        assert!(raw["history"].is_array());
        assert!(raw["dismissedAlerts"].is_array());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_failure_is_reported() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let document_dir = dir.path().join("gone");
        let storage =
            FileStorage::with_paths(document_dir.join("data.json"), dir.path().join("wiki"))?;
        std::fs::remove_dir_all(&document_dir)?;

        assert!(storage.save_document(&test_document()).await.is_err());
        Ok(())
    }
}
