use std::{
    fmt::Display,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tokio::fs;
use tracing::{debug, warn};

use crate::fs::operations::{read_locked, write_atomically};

use super::error::StorageError;

pub const PAGE_EXTENSION: &str = "md";

const FORBIDDEN_CHARACTERS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Name of a wiki page. It doubles as the file stem, so it has to be a valid file name on
/// every platform.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PageName(String);

impl PageName {
    pub fn parse(value: &str) -> Result<Self, StorageError> {
        if value.trim().is_empty()
            || value.starts_with('.')
            || value.contains(FORBIDDEN_CHARACTERS)
        {
            return Err(StorageError::InvalidPageName(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn file_name(&self) -> String {
        format!("{}.{PAGE_EXTENSION}", self.0)
    }
}

impl Display for PageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Listing entry. `id` and `name` are both the file stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageEntry {
    pub id: String,
    pub name: String,
}

/// Directory with one markdown file per page.
pub struct WikiDirectory {
    dir: PathBuf,
}

impl WikiDirectory {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn page_path(&self, name: &PageName) -> PathBuf {
        self.dir.join(name.file_name())
    }

    pub async fn list(&self) -> Result<Vec<PageEntry>, StorageError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut pages = vec![];
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|v| v.to_str()) != Some(PAGE_EXTENSION) {
                continue;
            }
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match path.file_stem().and_then(|v| v.to_str()) {
                Some(stem) => pages.push(PageEntry {
                    id: stem.to_string(),
                    name: stem.to_string(),
                }),
                None => warn!("Skipping wiki file with a non utf-8 name {path:?}"),
            }
        }
        pages.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(pages)
    }

    pub async fn read(&self, id: &str) -> Result<String, StorageError> {
        let name = PageName::parse(id)?;
        read_locked(&self.page_path(&name))
            .await?
            .ok_or_else(|| StorageError::PageNotFound(id.to_string()))
    }

    pub async fn write(&self, id: &str, content: &str) -> Result<(), StorageError> {
        let name = PageName::parse(id)?;
        write_atomically(&self.page_path(&name), content.as_bytes()).await?;
        debug!("Saved wiki page {name}");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let name = PageName::parse(id)?;
        match fs::remove_file(self.page_path(&name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::PageNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn rename(&self, old_id: &str, new_id: &str) -> Result<(), StorageError> {
        let old = PageName::parse(old_id)?;
        let new = PageName::parse(new_id)?;
        if old == new {
            return Ok(());
        }

        let old_path = self.page_path(&old);
        let new_path = self.page_path(&new);
        if !fs::try_exists(&old_path).await? {
            return Err(StorageError::PageNotFound(old_id.to_string()));
        }
        if fs::try_exists(&new_path).await? {
            return Err(StorageError::PageAlreadyExists(new_id.to_string()));
        }
        fs::rename(old_path, new_path).await?;
        Ok(())
    }

    /// Removes every page, leaving an empty directory behind.
    pub async fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::storage::error::StorageError;

    use super::{PageEntry, PageName, WikiDirectory};

    #[test]
    fn test_page_name_rules() {
        for invalid in ["", "  ", "a/b", "a\\b", "a:b", "a*b", "what?", "\"q\"", "<a>", "a|b", ".hidden"] {
            assert!(
                matches!(PageName::parse(invalid), Err(StorageError::InvalidPageName(_))),
                "{invalid:?} should be rejected"
            );
        }
        for valid in ["テスト", "daily notes", "a.b", "2024-01-01"] {
            assert_eq!(PageName::parse(valid).unwrap().as_str(), valid);
        }
    }

    #[tokio::test]
    async fn test_write_list_read() -> Result<()> {
        let dir = tempdir()?;
        let wiki = WikiDirectory::new(dir.path().join("wiki"))?;

        wiki.write("テスト", "# こんにちは").await?;
        wiki.write("alpha", "first").await?;
        std::fs::write(wiki.path().join("notes.txt"), "ignored")?;

        assert_eq!(
            wiki.list().await?,
            vec![
                PageEntry { id: "alpha".into(), name: "alpha".into() },
                PageEntry { id: "テスト".into(), name: "テスト".into() },
            ]
        );
        assert_eq!(wiki.read("テスト").await?, "# こんにちは");
        Ok(())
    }

    #[tokio::test]
    async fn test_write_rejects_separator() -> Result<()> {
        let dir = tempdir()?;
        let wiki = WikiDirectory::new(dir.path().to_path_buf())?;

        let result = wiki.write("a/b", "content").await;
        assert!(matches!(result, Err(StorageError::InvalidPageName(_))));
        assert!(wiki.list().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_pages_are_failures() -> Result<()> {
        let dir = tempdir()?;
        let wiki = WikiDirectory::new(dir.path().to_path_buf())?;

        assert!(matches!(wiki.read("nope").await, Err(StorageError::PageNotFound(_))));
        assert!(matches!(wiki.delete("nope").await, Err(StorageError::PageNotFound(_))));
        assert!(matches!(
            wiki.rename("nope", "other").await,
            Err(StorageError::PageNotFound(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_rename() -> Result<()> {
        let dir = tempdir()?;
        let wiki = WikiDirectory::new(dir.path().to_path_buf())?;
        wiki.write("old", "content").await?;
        wiki.write("taken", "other").await?;

        assert!(matches!(
            wiki.rename("old", "taken").await,
            Err(StorageError::PageAlreadyExists(_))
        ));
        assert!(matches!(
            wiki.rename("old", ".bad").await,
            Err(StorageError::InvalidPageName(_))
        ));

        wiki.rename("old", "old").await?;
        wiki.rename("old", "new").await?;
        assert_eq!(wiki.read("new").await?, "content");
        assert!(matches!(wiki.read("old").await, Err(StorageError::PageNotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_and_clear() -> Result<()> {
        let dir = tempdir()?;
        let wiki = WikiDirectory::new(dir.path().join("wiki"))?;
        wiki.write("a", "1").await?;
        wiki.write("b", "2").await?;

        wiki.delete("a").await?;
        assert_eq!(wiki.list().await?.len(), 1);

        wiki.clear().await?;
        assert!(wiki.list().await?.is_empty());
        assert!(wiki.path().exists());
        Ok(())
    }
}
