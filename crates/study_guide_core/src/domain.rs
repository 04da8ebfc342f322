//! crates/study_guide_core/src/domain.rs
//!
//! Defines the core data structures for the application: the generated study
//! content, the history sessions built from it, and the slices of content that
//! can be shared through a link.
//!
//! The JSON field names match the persisted history layout and the share link
//! payloads, so these types are serialized directly.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::ports::GenerationError;

//=========================================================================================
// Study Content
//=========================================================================================

/// One important concept extracted from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyConcept {
    pub concept: String,
    pub explanation: String,
}

/// A single flashcard: term on the front, definition on the back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub term: String,
    pub definition: String,
}

/// The two kinds of quiz question the generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizKind {
    #[serde(rename = "MCQ")]
    MultipleChoice,
    #[serde(rename = "T/F")]
    TrueFalse,
}

/// A quiz question. `options` is only populated for multiple-choice items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuizKind,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub options: Vec<String>,
    pub answer: String,
}

// LLMs routinely send `"options": null` for true/false questions.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// The generated study payload for one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyContent {
    pub summary: String,
    pub key_concepts: Vec<KeyConcept>,
    pub flashcards: Vec<Flashcard>,
    pub quiz: Vec<QuizItem>,
}

const REQUIRED_FIELDS: [&str; 4] = ["summary", "keyConcepts", "flashcards", "quiz"];

impl StudyContent {
    /// Parses the raw JSON text returned by a content generator.
    ///
    /// A response missing any of the four sections, or carrying one as `null`,
    /// is a generation failure rather than a partially usable result.
    pub fn parse_generated(json: &str) -> Result<Self, GenerationError> {
        let value: serde_json::Value = serde_json::from_str(json.trim())
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let object = value.as_object().ok_or_else(|| {
            GenerationError::MalformedResponse("response is not a JSON object".to_string())
        })?;

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|field| object.get(**field).map_or(true, serde_json::Value::is_null))
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(GenerationError::MissingFields(missing));
        }

        let content: StudyContent = serde_json::from_value(value)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
        content.validated()
    }

    /// Checks the quiz invariants and normalizes true/false items.
    ///
    /// Multiple-choice answers must be one of the options. True/false items
    /// carry no options and answer with exactly `True` or `False`.
    pub fn validated(mut self) -> Result<Self, GenerationError> {
        for (index, item) in self.quiz.iter_mut().enumerate() {
            let number = index + 1;
            match item.kind {
                QuizKind::MultipleChoice => {
                    if item.options.is_empty() {
                        return Err(GenerationError::InvalidContent(format!(
                            "quiz question {number} is multiple choice but has no options"
                        )));
                    }
                    if !item.options.iter().any(|option| option == &item.answer) {
                        return Err(GenerationError::InvalidContent(format!(
                            "the answer to quiz question {number} is not one of its options"
                        )));
                    }
                }
                QuizKind::TrueFalse => {
                    item.options.clear();
                    item.answer = match item.answer.trim().to_lowercase().as_str() {
                        "true" => "True".to_string(),
                        "false" => "False".to_string(),
                        _ => {
                            return Err(GenerationError::InvalidContent(format!(
                                "quiz question {number} is true/false but answers '{}'",
                                item.answer
                            )))
                        }
                    };
                }
            }
        }
        Ok(self)
    }
}

//=========================================================================================
// History Sessions
//=========================================================================================

/// Identifies a history session. Derived from the creation timestamp, so
/// lexicographic order is chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Formats `timestamp` as an ISO-8601 UTC string with millisecond precision.
    pub fn from_timestamp(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One completed document → study content result, as stored in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySession {
    pub id: SessionId,
    pub source_name: String,
    /// Missing on entries saved before the source text was kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    pub content: StudyContent,
    pub created_at: DateTime<Utc>,
}

impl HistorySession {
    /// The source text to chat against, if this session kept it.
    pub fn chat_context(&self) -> Option<&str> {
        self.original_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

//=========================================================================================
// Share Payloads
//=========================================================================================

/// The section of a study guide a share link carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareView {
    Summary,
    Concepts,
    Flashcards,
    Quiz,
}

impl ShareView {
    pub fn as_str(self) -> &'static str {
        match self {
            ShareView::Summary => "summary",
            ShareView::Concepts => "concepts",
            ShareView::Flashcards => "flashcards",
            ShareView::Quiz => "quiz",
        }
    }
}

/// The slice of a `StudyContent` matching a `ShareView`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareData {
    Summary(String),
    Concepts(Vec<KeyConcept>),
    Flashcards(Vec<Flashcard>),
    Quiz(Vec<QuizItem>),
}

impl ShareData {
    pub fn view(&self) -> ShareView {
        match self {
            ShareData::Summary(_) => ShareView::Summary,
            ShareData::Concepts(_) => ShareView::Concepts,
            ShareData::Flashcards(_) => ShareView::Flashcards,
            ShareData::Quiz(_) => ShareView::Quiz,
        }
    }
}

/// A single view's worth of content, prepared for sharing without any
/// history state on the receiving side.
///
/// Serialized as `{ "sourceName", "view", "data" }`. Deserialization rejects
/// a payload whose `data` does not have the shape `view` calls for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSharePayload", into = "RawSharePayload")]
pub struct SharePayload {
    pub source_name: String,
    pub data: ShareData,
}

impl SharePayload {
    /// Slices `view` out of a session's content.
    pub fn from_session(session: &HistorySession, view: ShareView) -> Self {
        let content = &session.content;
        let data = match view {
            ShareView::Summary => ShareData::Summary(content.summary.clone()),
            ShareView::Concepts => ShareData::Concepts(content.key_concepts.clone()),
            ShareView::Flashcards => ShareData::Flashcards(content.flashcards.clone()),
            ShareView::Quiz => ShareData::Quiz(content.quiz.clone()),
        };
        Self {
            source_name: session.source_name.clone(),
            data,
        }
    }

    pub fn view(&self) -> ShareView {
        self.data.view()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSharePayload {
    source_name: String,
    view: ShareView,
    data: serde_json::Value,
}

impl TryFrom<RawSharePayload> for SharePayload {
    type Error = String;

    fn try_from(raw: RawSharePayload) -> Result<Self, Self::Error> {
        let view = raw.view;
        let mismatch =
            |e: serde_json::Error| format!("data does not match view '{}': {e}", view.as_str());
        let data = match view {
            ShareView::Summary => {
                ShareData::Summary(serde_json::from_value(raw.data).map_err(mismatch)?)
            }
            ShareView::Concepts => {
                ShareData::Concepts(serde_json::from_value(raw.data).map_err(mismatch)?)
            }
            ShareView::Flashcards => {
                ShareData::Flashcards(serde_json::from_value(raw.data).map_err(mismatch)?)
            }
            ShareView::Quiz => {
                ShareData::Quiz(serde_json::from_value(raw.data).map_err(mismatch)?)
            }
        };
        Ok(Self {
            source_name: raw.source_name,
            data,
        })
    }
}

impl From<SharePayload> for RawSharePayload {
    fn from(payload: SharePayload) -> Self {
        let view = payload.view();
        let data = match payload.data {
            ShareData::Summary(summary) => serde_json::Value::String(summary),
            ShareData::Concepts(concepts) => serde_json::to_value(concepts).unwrap_or_default(),
            ShareData::Flashcards(cards) => serde_json::to_value(cards).unwrap_or_default(),
            ShareData::Quiz(items) => serde_json::to_value(items).unwrap_or_default(),
        };
        Self {
            source_name: payload.source_name,
            view,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn mcq(question: &str, options: &[&str], answer: &str) -> QuizItem {
        QuizItem {
            question: question.to_string(),
            kind: QuizKind::MultipleChoice,
            options: options.iter().map(|o| o.to_string()).collect(),
            answer: answer.to_string(),
        }
    }

    #[test]
    fn parses_a_complete_generated_response() {
        let json = r#"{
            "summary": "Cells are small.",
            "keyConcepts": [{"concept": "Cell", "explanation": "Unit of life"}],
            "flashcards": [{"term": "Nucleus", "definition": "Holds DNA"}],
            "quiz": [
                {"question": "2+2?", "type": "MCQ", "options": ["3","4","5","6"], "answer": "4"},
                {"question": "Cells exist?", "type": "T/F", "options": null, "answer": "true"}
            ]
        }"#;

        let content = StudyContent::parse_generated(json).unwrap();
        assert_eq!(content.key_concepts.len(), 1);
        assert_eq!(content.quiz[0].options.len(), 4);
        assert_eq!(content.quiz[1].kind, QuizKind::TrueFalse);
        assert!(content.quiz[1].options.is_empty());
        assert_eq!(content.quiz[1].answer, "True");
    }

    #[test]
    fn missing_or_null_sections_are_reported() {
        let json = r#"{"summary": "x", "keyConcepts": null, "quiz": []}"#;
        match StudyContent::parse_generated(json) {
            Err(GenerationError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["keyConcepts".to_string(), "flashcards".to_string()]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn non_json_responses_are_malformed() {
        assert!(matches!(
            StudyContent::parse_generated("Sorry, I can't help with that."),
            Err(GenerationError::MalformedResponse(_))
        ));
        assert!(matches!(
            StudyContent::parse_generated("[1, 2, 3]"),
            Err(GenerationError::MalformedResponse(_))
        ));
    }

    #[test]
    fn multiple_choice_answer_must_be_an_option() {
        let content = StudyContent {
            summary: String::new(),
            key_concepts: vec![],
            flashcards: vec![],
            quiz: vec![mcq("2+2?", &["3", "5"], "4")],
        };
        assert!(matches!(
            content.validated(),
            Err(GenerationError::InvalidContent(_))
        ));
    }

    #[test]
    fn session_id_formats_like_an_iso_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            SessionId::from_timestamp(ts).as_str(),
            "2024-03-09T14:05:07.000Z"
        );
    }

    #[test]
    fn legacy_sessions_load_without_original_text() {
        let json = r#"{
            "id": "2023-01-01T00:00:00.000Z",
            "sourceName": "old.pdf",
            "content": {"summary": "s", "keyConcepts": [], "flashcards": [], "quiz": []},
            "createdAt": "2023-01-01T00:00:00.000Z"
        }"#;
        let session: HistorySession = serde_json::from_str(json).unwrap();
        assert_eq!(session.original_text, None);
        assert_eq!(session.chat_context(), None);
    }

    #[test]
    fn share_payload_rejects_data_that_does_not_match_view() {
        let json = r#"{"sourceName": "a.pdf", "view": "flashcards", "data": "just text"}"#;
        assert!(serde_json::from_str::<SharePayload>(json).is_err());

        let json = r#"{"sourceName": "a.pdf", "view": "summary", "data": "just text"}"#;
        let payload: SharePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.data, ShareData::Summary("just text".to_string()));
    }

    #[test]
    fn share_payload_serializes_view_and_data_side_by_side() {
        let payload = SharePayload {
            source_name: "notes.pdf".to_string(),
            data: ShareData::Flashcards(vec![Flashcard {
                term: "A".to_string(),
                definition: "1".to_string(),
            }]),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["sourceName"], "notes.pdf");
        assert_eq!(value["view"], "flashcards");
        assert_eq!(value["data"][0]["term"], "A");
    }
}
