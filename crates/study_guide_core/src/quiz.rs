//! crates/study_guide_core/src/quiz.rs
//!
//! Scores a user's answers against a session's quiz.

use serde::Serialize;

use crate::domain::{QuizItem, QuizKind};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("{given} answers were given for a quiz of {questions} questions")]
    TooManyAnswers { given: usize, questions: usize },
}

/// The outcome for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedAnswer {
    pub question: String,
    /// `None` when the question was skipped.
    pub given: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
    pub answers: Vec<GradedAnswer>,
}

/// Grades `answers` position by position.
///
/// Missing or blank answers count as unanswered and wrong. An answer matches
/// when it equals the expected option after trimming; true/false answers
/// ignore case as well.
pub fn grade(quiz: &[QuizItem], answers: &[Option<String>]) -> Result<QuizScore, QuizError> {
    if answers.len() > quiz.len() {
        return Err(QuizError::TooManyAnswers {
            given: answers.len(),
            questions: quiz.len(),
        });
    }

    let graded: Vec<GradedAnswer> = quiz
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let given = answers
                .get(index)
                .and_then(|answer| answer.as_deref())
                .map(str::trim)
                .filter(|answer| !answer.is_empty());
            GradedAnswer {
                question: item.question.clone(),
                is_correct: given.is_some_and(|answer| matches(item, answer)),
                given: given.map(str::to_string),
                correct_answer: item.answer.clone(),
            }
        })
        .collect();

    Ok(QuizScore {
        correct: graded.iter().filter(|answer| answer.is_correct).count(),
        total: quiz.len(),
        answers: graded,
    })
}

fn matches(item: &QuizItem, given: &str) -> bool {
    let expected = item.answer.trim();
    match item.kind {
        QuizKind::MultipleChoice => given == expected,
        QuizKind::TrueFalse => given.eq_ignore_ascii_case(expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz() -> Vec<QuizItem> {
        vec![
            QuizItem {
                question: "2+2?".into(),
                kind: QuizKind::MultipleChoice,
                options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
                answer: "4".into(),
            },
            QuizItem {
                question: "The sky is blue.".into(),
                kind: QuizKind::TrueFalse,
                options: vec![],
                answer: "True".into(),
            },
            QuizItem {
                question: "Capital of France?".into(),
                kind: QuizKind::MultipleChoice,
                options: vec!["Paris".into(), "paris".into()],
                answer: "Paris".into(),
            },
        ]
    }

    #[test]
    fn counts_matching_answers() {
        let answers = vec![Some("4".to_string()), Some("true".to_string()), Some("paris".to_string())];
        let score = grade(&quiz(), &answers).unwrap();

        assert_eq!(score.correct, 2);
        assert_eq!(score.total, 3);
        assert!(score.answers[0].is_correct);
        assert!(score.answers[1].is_correct);
        // Options can differ only by case, so multiple choice compares exactly.
        assert!(!score.answers[2].is_correct);
        assert_eq!(score.answers[2].correct_answer, "Paris");
    }

    #[test]
    fn skipped_questions_are_unanswered() {
        let score = grade(&quiz(), &[None, Some("  ".to_string())]).unwrap();

        assert_eq!(score.correct, 0);
        assert_eq!(score.total, 3);
        assert!(score.answers.iter().all(|answer| answer.given.is_none()));
        assert!(score.answers.iter().all(|answer| !answer.is_correct));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let score = grade(&quiz(), &[Some(" 4 ".to_string())]).unwrap();
        assert_eq!(score.answers[0].given.as_deref(), Some("4"));
        assert!(score.answers[0].is_correct);
    }

    #[test]
    fn more_answers_than_questions_is_an_error() {
        let answers: Vec<Option<String>> = vec![None; 4];
        assert_eq!(
            grade(&quiz(), &answers),
            Err(QuizError::TooManyAnswers { given: 4, questions: 3 })
        );
    }
}
