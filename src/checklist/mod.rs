//! Editing and saving of the checklist definition.

pub mod draft;
pub mod validation;

use thiserror::Error;

pub use draft::{ChecklistDraft, Direction};
pub use validation::validate;

/// Problems that block saving a checklist or applying an edit. Positions are 1-based and follow
/// the displayed order.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditorError {
    #[error("Please enter a checklist title")]
    MissingTitle,
    #[error("Question {position} has the same id as an earlier question")]
    DuplicateQuestionId { position: usize },
    #[error("Question {position} has no text")]
    EmptyQuestionText { position: usize },
    #[error("Question {position} needs at least one option")]
    MissingOptions { position: usize },
    #[error("Question {position} has a blank option")]
    BlankOption { position: usize },
    #[error("Question {position} has a threshold but no alert condition")]
    MissingAlertCondition { position: usize },
    #[error("Question {position} has a threshold but no option it applies to")]
    MissingThresholdOption { position: usize },
    #[error("Only one question can be shown last")]
    MultipleLastQuestions,
    #[error("Question {position} has an invalid position range")]
    InvalidRange { position: usize },
    #[error("There is no question with id {0:?}")]
    UnknownQuestion(String),
    #[error("A checklist needs at least one question")]
    LastRemainingQuestion,
}
