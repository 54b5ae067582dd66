use std::collections::HashSet;

use crate::storage::entities::{Question, QuestionType};

use super::EditorError;

/// Checks the rules a checklist must satisfy before it's saved. Stops at the first problem.
pub fn validate(title: &str, questions: &[Question]) -> Result<(), EditorError> {
    if title.trim().is_empty() {
        return Err(EditorError::MissingTitle);
    }

    let mut ids = HashSet::new();
    for (i, question) in questions.iter().enumerate() {
        let position = i + 1;
        if !ids.insert(question.id.as_str()) {
            return Err(EditorError::DuplicateQuestionId { position });
        }
        if question.text.trim().is_empty() {
            return Err(EditorError::EmptyQuestionText { position });
        }
        if question.kind == QuestionType::MultipleChoice {
            if question.options.is_empty() {
                return Err(EditorError::MissingOptions { position });
            }
            if question.options.iter().any(|v| v.trim().is_empty()) {
                return Err(EditorError::BlankOption { position });
            }
        }

        let graph = &question.graph_config;
        if graph.threshold_value.is_some() {
            if graph.alert_condition.is_none() {
                return Err(EditorError::MissingAlertCondition { position });
            }
            if question.kind == QuestionType::MultipleChoice && graph.threshold_option.is_none() {
                return Err(EditorError::MissingThresholdOption { position });
            }
        }

        let range = question
            .random_order
            .as_ref()
            .filter(|v| v.enabled)
            .and_then(|v| v.range);
        if let Some(range) = range {
            if range.start == 0 || range.end < range.start {
                return Err(EditorError::InvalidRange { position });
            }
        }
    }

    if questions.iter().filter(|q| q.is_last).count() > 1 {
        return Err(EditorError::MultipleLastQuestions);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        checklist::EditorError,
        test_support::question,
        storage::entities::{AlertCondition, PositionRange, QuestionType, RandomOrder},
    };

    use super::validate;

    #[test]
    fn test_title_and_text() {
        let questions = vec![question("q1", QuestionType::YesNo)];
        assert_eq!(validate(" ", &questions), Err(EditorError::MissingTitle));

        let mut blank = question("q2", QuestionType::YesNo);
        blank.text = "  ".into();
        assert_eq!(
            validate("Daily", &[question("q1", QuestionType::YesNo), blank]),
            Err(EditorError::EmptyQuestionText { position: 2 })
        );
        assert_eq!(validate("Daily", &questions), Ok(()));
    }

    #[test]
    fn test_question_ids_are_unique() {
        let mut notes = question("q1", QuestionType::FreeText);
        notes.text = "Notes".into();
        assert_eq!(
            validate(
                "Daily",
                &[
                    question("q1", QuestionType::YesNo),
                    question("q2", QuestionType::YesNo),
                    notes
                ]
            ),
            Err(EditorError::DuplicateQuestionId { position: 3 })
        );
    }

    #[test]
    fn test_multiple_choice_options() {
        let mut q = question("q1", QuestionType::MultipleChoice);
        assert_eq!(
            validate("Daily", &[q.clone()]),
            Err(EditorError::MissingOptions { position: 1 })
        );
        q.options = vec!["a".into(), " ".into()];
        assert_eq!(
            validate("Daily", &[q.clone()]),
            Err(EditorError::BlankOption { position: 1 })
        );
        q.options = vec!["a".into(), "b".into()];
        assert_eq!(validate("Daily", &[q]), Ok(()));
    }

    #[test]
    fn test_threshold_requirements() {
        let mut q = question("q1", QuestionType::MultipleChoice);
        q.options = vec!["a".into()];
        q.graph_config.threshold_value = Some(40.);
        assert_eq!(
            validate("Daily", &[q.clone()]),
            Err(EditorError::MissingAlertCondition { position: 1 })
        );
        q.graph_config.alert_condition = Some(AlertCondition::Above);
        assert_eq!(
            validate("Daily", &[q.clone()]),
            Err(EditorError::MissingThresholdOption { position: 1 })
        );
        q.graph_config.threshold_option = Some("a".into());
        assert_eq!(validate("Daily", &[q]), Ok(()));
    }

    #[test]
    fn test_single_last_question() {
        let mut a = question("a", QuestionType::YesNo);
        let mut b = question("b", QuestionType::YesNo);
        a.is_last = true;
        b.is_last = true;
        assert_eq!(
            validate("Daily", &[a.clone(), b]),
            Err(EditorError::MultipleLastQuestions)
        );
        assert_eq!(validate("Daily", &[a]), Ok(()));
    }

    #[test]
    fn test_ranges() {
        let mut q = question("a", QuestionType::YesNo);
        q.random_order = Some(RandomOrder {
            enabled: true,
            range: Some(PositionRange { start: 3, end: 2 }),
            position: None,
        });
        assert_eq!(
            validate("Daily", &[q.clone()]),
            Err(EditorError::InvalidRange { position: 1 })
        );
        q.random_order.as_mut().unwrap().enabled = false;
        assert_eq!(validate("Daily", &[q]), Ok(()));
    }
}
