use std::{collections::BTreeMap, path::Path};

use base64::prelude::*;
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use super::{
    entities::{null_as_default, AnswerSubmission, Checklist, Document},
    error::StorageError,
    file_storage::Storage,
    wiki::PageName,
};

/// Single-file backup of everything the application stores. Wiki page contents are base64
/// encoded and keyed by page name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub checklist: Option<Checklist>,
    pub history: Vec<AnswerSubmission>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dismissed_alerts: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wiki: BTreeMap<String, String>,
}

impl ExportBundle {
    pub fn document(&self) -> Document {
        Document {
            checklist: self.checklist.clone(),
            history: self.history.clone(),
            dismissed_alerts: self.dismissed_alerts.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub pages_written: usize,
    pub pages_skipped: usize,
}

/// Collects the document and every readable wiki page. Pages that fail to read are left out of
/// the bundle.
#[instrument(skip_all)]
pub async fn export_bundle(storage: &impl Storage) -> Result<ExportBundle, StorageError> {
    let document = storage.load_document().await;
    let pages = storage.list_pages().await?;

    let wiki = stream::iter(pages)
        .map(|page| async move {
            let content = storage.read_page(&page.id).await;
            (page.id, content)
        })
        .buffered(4)
        .filter_map(|(id, content)| async move {
            match content {
                Ok(content) => Some((id, BASE64_STANDARD.encode(content))),
                Err(e) => {
                    error!("Leaving page {id} out of the export: {e}");
                    None
                }
            }
        })
        .collect::<BTreeMap<_, _>>()
        .await;

    Ok(ExportBundle {
        checklist: document.checklist,
        history: document.history,
        dismissed_alerts: document.dismissed_alerts,
        wiki,
    })
}

pub async fn export_to_file(storage: &impl Storage, path: &Path) -> Result<(), StorageError> {
    let bundle = export_bundle(storage).await?;
    let data = serde_json::to_vec_pretty(&bundle)?;
    tokio::fs::write(path, data)
        .await
        .inspect_err(|e| error!("Failed to write export to {path:?}: {e}"))?;
    info!(
        "Exported {} history entries and {} pages to {path:?}",
        bundle.history.len(),
        bundle.wiki.len()
    );
    Ok(())
}

/// Checks the overall shape before decoding, so that a wrong file is rejected with a readable
/// message instead of a serde path.
pub fn parse_bundle(text: &str) -> Result<ExportBundle, StorageError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| StorageError::InvalidImport(format!("not a json file ({e})")))?;

    let Some(object) = value.as_object() else {
        return Err(StorageError::InvalidImport("expected a json object".into()));
    };
    if !object.contains_key("checklist") {
        return Err(StorageError::InvalidImport("missing checklist".into()));
    }
    if !object.get("history").is_some_and(|v| v.is_array()) {
        return Err(StorageError::InvalidImport("history must be a list".into()));
    }

    serde_json::from_value(value).map_err(|e| StorageError::InvalidImport(e.to_string()))
}

fn decode_page(id: &str, encoded: &str) -> Option<String> {
    if let Err(e) = PageName::parse(id) {
        warn!("Skipping imported page: {e}");
        return None;
    }
    let bytes = match BASE64_STANDARD.decode(encoded) {
        Ok(v) => v,
        Err(e) => {
            warn!("Skipping imported page {id}, content is not base64: {e}");
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Skipping imported page {id}, content is not utf-8");
            None
        }
    }
}

/// Replaces the document and the whole wiki with the bundle's content. Invalid pages are
/// skipped, the rest of the import goes on.
#[instrument(skip_all)]
pub async fn import_bundle(
    storage: &impl Storage,
    bundle: ExportBundle,
) -> Result<ImportSummary, StorageError> {
    let mut summary = ImportSummary::default();
    let mut pages = vec![];
    for (id, encoded) in &bundle.wiki {
        match decode_page(id, encoded) {
            Some(content) => pages.push((id.as_str(), content)),
            None => summary.pages_skipped += 1,
        }
    }

    storage.save_document(&bundle.document()).await?;
    storage.clear_pages().await?;

    for (id, content) in pages {
        match storage.write_page(id, &content).await {
            Ok(()) => summary.pages_written += 1,
            Err(e) => {
                error!("Failed to import page {id}: {e}");
                summary.pages_skipped += 1;
            }
        }
    }

    info!(
        "Imported {} history entries, {} pages written, {} skipped",
        bundle.history.len(),
        summary.pages_written,
        summary.pages_skipped
    );
    Ok(summary)
}

pub async fn import_from_file(
    storage: &impl Storage,
    path: &Path,
) -> Result<ImportSummary, StorageError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .inspect_err(|e| error!("Failed to read import file {path:?}: {e}"))?;
    let bundle = parse_bundle(&text)?;
    import_bundle(storage, bundle).await
}
