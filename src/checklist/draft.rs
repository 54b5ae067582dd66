use clap::ValueEnum;
use tracing::debug;
use uuid::Uuid;

use crate::{
    storage::entities::{
        Checklist, GraphConfig, NumberValidation, Question, QuestionType, DEFAULT_ROLLING_WINDOW,
    },
    utils::clock::Clock,
};

use super::{validation::validate, EditorError};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn new_question(order_index: i64) -> Question {
    Question {
        id: new_id(),
        text: String::new(),
        kind: QuestionType::YesNo,
        options: vec![],
        validation: NumberValidation::default(),
        is_last: false,
        graph_config: GraphConfig {
            enabled: Some(true),
            rolling_window_size: Some(DEFAULT_ROLLING_WINDOW),
            ..Default::default()
        },
        order_index: Some(order_index),
        random_order: None,
    }
}

/// Checklist being edited. Questions are kept in display order, which always matches their
/// order indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistDraft {
    id: Option<String>,
    pub title: String,
    pub description: String,
    questions: Vec<Question>,
}

impl Default for ChecklistDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl ChecklistDraft {
    /// Empty checklist with a single blank question.
    pub fn new() -> Self {
        Self {
            id: None,
            title: String::new(),
            description: String::new(),
            questions: vec![new_question(0)],
        }
    }

    /// Starts editing a saved checklist, filling in anything older versions didn't store.
    pub fn from_checklist(checklist: &Checklist) -> Self {
        let mut questions = checklist
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let mut q = q.clone();
                if q.id.is_empty() {
                    q.id = new_id();
                }
                if q.order_index.is_none() {
                    q.order_index = Some(i as i64);
                }
                if matches!(q.graph_config.rolling_window_size, None | Some(0)) {
                    q.graph_config.rolling_window_size = Some(DEFAULT_ROLLING_WINDOW);
                }
                q.graph_config.enabled.get_or_insert(q.kind.is_graphable());
                q
            })
            .collect::<Vec<_>>();
        questions.sort_by_key(|q| q.order_index);
        if questions.is_empty() {
            questions.push(new_question(0));
        }

        Self {
            id: (!checklist.id.is_empty()).then(|| checklist.id.clone()),
            title: checklist.title.clone(),
            description: checklist.description.clone(),
            questions,
        }
    }

    pub fn from_optional(checklist: Option<&Checklist>) -> Self {
        checklist.map(Self::from_checklist).unwrap_or_default()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    fn index_of(&self, id: &str) -> Result<usize, EditorError> {
        self.questions
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| EditorError::UnknownQuestion(id.to_string()))
    }

    pub fn question_mut(&mut self, id: &str) -> Result<&mut Question, EditorError> {
        let i = self.index_of(id)?;
        Ok(&mut self.questions[i])
    }

    /// Appends a blank yes/no question and returns it.
    pub fn add_question(&mut self) -> &mut Question {
        let order_index = self
            .questions
            .iter()
            .filter_map(|q| q.order_index)
            .max()
            .map_or(0, |v| v + 1);
        self.questions.push(new_question(order_index));
        let last = self.questions.len() - 1;
        &mut self.questions[last]
    }

    pub fn remove_question(&mut self, id: &str) -> Result<Question, EditorError> {
        let i = self.index_of(id)?;
        if self.questions.len() <= 1 {
            return Err(EditorError::LastRemainingQuestion);
        }
        Ok(self.questions.remove(i))
    }

    /// Swaps the question at `index` with its neighbour. Returns false when there is no
    /// neighbour in that direction.
    pub fn move_question(&mut self, index: usize, direction: Direction) -> bool {
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1),
        };
        let Some(target) = target.filter(|t| *t < self.questions.len()) else {
            return false;
        };
        if index >= self.questions.len() {
            return false;
        }

        let order_index = self.questions[index].order_index;
        self.questions[index].order_index = self.questions[target].order_index;
        self.questions[target].order_index = order_index;
        self.questions.swap(index, target);
        true
    }

    /// Marking a question as last unmarks every other one.
    pub fn set_last(&mut self, id: &str, is_last: bool) -> Result<(), EditorError> {
        let i = self.index_of(id)?;
        if is_last {
            for q in &mut self.questions {
                q.is_last = false;
            }
        }
        self.questions[i].is_last = is_last;
        Ok(())
    }

    /// Changes the type and drops settings the new type doesn't use.
    pub fn set_type(&mut self, id: &str, kind: QuestionType) -> Result<(), EditorError> {
        let q = self.question_mut(id)?;
        let graphable = kind.is_graphable();
        if kind != QuestionType::MultipleChoice {
            q.options.clear();
            q.graph_config.threshold_option = None;
        }
        if kind != QuestionType::Number {
            q.validation = NumberValidation::default();
        }
        if !graphable {
            q.graph_config.threshold_value = None;
            q.graph_config.alert_condition = None;
        }
        q.graph_config.enabled = Some(graphable);
        q.kind = kind;
        Ok(())
    }

    /// Disabling the graph also drops the alert configuration.
    pub fn set_graph_enabled(&mut self, id: &str, enabled: bool) -> Result<(), EditorError> {
        let q = self.question_mut(id)?;
        q.graph_config.enabled = Some(enabled);
        if !enabled {
            q.graph_config.threshold_value = None;
            q.graph_config.threshold_option = None;
            q.graph_config.alert_condition = None;
        }
        Ok(())
    }

    /// Clearing the threshold also clears its condition.
    pub fn set_threshold(&mut self, id: &str, threshold: Option<f64>) -> Result<(), EditorError> {
        let q = self.question_mut(id)?;
        q.graph_config.threshold_value = threshold;
        if threshold.is_none() {
            q.graph_config.alert_condition = None;
        }
        Ok(())
    }

    pub fn set_rolling_window(&mut self, id: &str, size: u32) -> Result<(), EditorError> {
        self.question_mut(id)?.graph_config.rolling_window_size = Some(size.max(1));
        Ok(())
    }

    /// Validates and produces the checklist to persist.
    pub fn finish(self, clock: &dyn Clock) -> Result<Checklist, EditorError> {
        validate(&self.title, &self.questions)?;

        let mut questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, mut q)| {
                q.graph_config.custom_name = None;
                let graphed = q.graph_config.is_enabled() && q.kind.is_graphable();
                q.graph_config.enabled = Some(graphed);
                q.order_index.get_or_insert(i as i64);
                q
            })
            .collect::<Vec<_>>();
        questions.sort_by_key(|q| q.order_index);

        let checklist = Checklist {
            id: self.id.unwrap_or_else(new_id),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            questions,
            updated_at: Some(clock.time()),
        };
        debug!(
            "Checklist {} ready with {} questions",
            checklist.id,
            checklist.questions.len()
        );
        Ok(checklist)
    }
}
