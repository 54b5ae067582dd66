//! Application state shared by every command. The in-memory document only changes after the
//! storage accepted the new version.

use std::path::Path;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::{
    alerts::{self, Alert},
    checklist::{ChecklistDraft, EditorError},
    stats::{compute_series, Series, StatsConfig},
    storage::{
        entities::{AnswerSubmission, Checklist, Document},
        transfer::{self, ImportSummary},
        Storage, StorageError,
    },
    utils::clock::Clock,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("No checklist has been created yet. Start from `checklist template` and save it with `checklist edit`")]
    NoChecklist,
    #[error("No submission was made at {0}")]
    SubmissionNotFound(DateTime<Utc>),
}

pub struct AppState<S: Storage> {
    storage: S,
    document: Document,
}

impl<S: Storage> AppState<S> {
    pub async fn load(storage: S) -> Self {
        let document = storage.load_document().await;
        Self { storage, document }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn checklist(&self) -> Option<&Checklist> {
        self.document.checklist.as_ref()
    }

    pub fn history(&self) -> &[AnswerSubmission] {
        &self.document.history
    }

    pub fn dismissed_alerts(&self) -> &[String] {
        &self.document.dismissed_alerts
    }

    async fn commit(&mut self, next: Document) -> Result<(), StorageError> {
        self.storage.save_document(&next).await?;
        self.document = next;
        Ok(())
    }

    pub async fn reload(&mut self) {
        self.document = self.storage.load_document().await;
    }

    #[instrument(skip_all)]
    pub async fn add_answer(&mut self, submission: AnswerSubmission) -> Result<(), AppError> {
        let mut next = self.document.clone();
        next.history.push(submission);
        self.commit(next).await?;
        info!("Recorded submission, {} in history", self.document.history.len());
        Ok(())
    }

    pub async fn update_checklist(&mut self, checklist: Checklist) -> Result<(), AppError> {
        let next = Document {
            checklist: Some(checklist),
            ..self.document.clone()
        };
        self.commit(next).await?;
        Ok(())
    }

    /// Validates the draft and replaces the live checklist with it.
    pub async fn save_draft(
        &mut self,
        draft: ChecklistDraft,
        clock: &dyn Clock,
    ) -> Result<&Checklist, AppError> {
        let checklist = draft.finish(clock)?;
        self.update_checklist(checklist).await?;
        self.checklist().ok_or(AppError::NoChecklist)
    }

    /// Removes the submission made at `submitted_at`.
    pub async fn delete_answer(&mut self, submitted_at: DateTime<Utc>) -> Result<(), AppError> {
        let mut next = self.document.clone();
        let Some(i) = next
            .history
            .iter()
            .position(|e| e.submitted_at == submitted_at)
        else {
            return Err(AppError::SubmissionNotFound(submitted_at));
        };
        next.history.remove(i);
        self.commit(next).await?;
        debug!("Deleted submission from {submitted_at}");
        Ok(())
    }

    /// Hides an alert for good. Dismissing twice only stores it once.
    pub async fn dismiss_alert(&mut self, id: &str) -> Result<(), AppError> {
        let mut next = self.document.clone();
        if !alerts::dismiss(&mut next.dismissed_alerts, id) {
            debug!("Alert {id} already dismissed");
            return Ok(());
        }
        self.commit(next).await?;
        Ok(())
    }

    pub fn series<Tz: TimeZone>(&self, today: NaiveDate, tz: &Tz, config: &StatsConfig) -> Series {
        match self.checklist() {
            Some(checklist) => compute_series(checklist, self.history(), today, tz, config),
            None => Series::new(),
        }
    }

    pub fn active_alerts(&self, series: &Series) -> Vec<Alert> {
        match self.checklist() {
            Some(checklist) => alerts::active_alerts(checklist, series, self.dismissed_alerts()),
            None => vec![],
        }
    }

    pub async fn export_to(&self, path: &Path) -> Result<(), AppError> {
        transfer::export_to_file(&self.storage, path).await?;
        Ok(())
    }

    /// Replaces all data with the file's content and reloads it.
    pub async fn import_from(&mut self, path: &Path) -> Result<ImportSummary, AppError> {
        let summary = transfer::import_from_file(&self.storage, path).await?;
        self.reload().await;
        Ok(summary)
    }
}
