//! services/api/src/web/protocol.rs
//!
//! Request and response payloads of the REST API.
//!
//! Core domain types carry no OpenAPI metadata, so fields holding them are
//! documented as plain objects or strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use study_guide_core::{
    ChatMessage, ExportSection, GradedAnswer, HistorySession, PipelineState, QuizScore,
    SharePayload, ShareView, Theme,
};
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Sessions and Selection
//=========================================================================================

/// A document or video link to build a study guide from.
#[derive(Deserialize, ToSchema)]
pub struct UrlRequest {
    pub url: String,
}

/// One row of the history list.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub source_name: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl SessionSummary {
    pub fn new(session: &HistorySession, active: bool) -> Self {
        Self {
            id: session.id.to_string(),
            source_name: session.source_name.clone(),
            created_at: session.created_at,
            active,
        }
    }
}

/// A stored session with its full study content.
#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    #[schema(value_type = Object)]
    pub session: HistorySession,
    pub active: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct SelectRequest {
    pub id: String,
}

/// The active session, if any.
#[derive(Serialize, ToSchema)]
pub struct ActiveResponse {
    #[schema(value_type = Option<Object>)]
    pub session: Option<HistorySession>,
}

/// The pipeline state as shown to the user.
#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    /// One of `idle`, `extracting`, `generating` or `error`.
    pub state: String,
    pub busy: bool,
    /// Progress text while busy, the error text in the error state.
    pub message: Option<String>,
    pub active_id: Option<String>,
}

impl StatusResponse {
    pub fn new(state: &PipelineState, active_id: Option<String>) -> Self {
        let (label, message) = match state {
            PipelineState::Idle => ("idle", None),
            PipelineState::Extracting(_) => ("extracting", state.progress_message().map(String::from)),
            PipelineState::Generating => ("generating", state.progress_message().map(String::from)),
            PipelineState::Error(message) => ("error", Some(message.clone())),
        };
        Self {
            state: label.to_string(),
            busy: state.is_busy(),
            message,
            active_id,
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct ExportQuery {
    /// `summary`, `concepts`, `flashcards`, `quiz` or `all` (the default).
    #[param(value_type = Option<String>)]
    pub section: Option<ExportSection>,
}

//=========================================================================================
// Sharing
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ShareRequest {
    /// `summary`, `concepts`, `flashcards` or `quiz`.
    #[schema(value_type = String)]
    pub view: ShareView,
}

#[derive(Serialize, ToSchema)]
pub struct ShareResponse {
    pub url: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ResolveRequest {
    /// A full URL or just its fragment.
    pub location: String,
}

/// What a location resolves to.
#[derive(Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveResponse {
    Shared {
        #[schema(value_type = Object)]
        payload: SharePayload,
    },
    InvalidLink {
        message: String,
    },
    Route {
        route: String,
    },
}

#[derive(Deserialize, IntoParams)]
pub struct ShareExportQuery {
    /// The share link or its `#share/...` fragment.
    pub fragment: String,
}

//=========================================================================================
// Quiz
//=========================================================================================

/// The user's answers, one per question in quiz order. `null` skips a question.
#[derive(Deserialize, ToSchema)]
pub struct QuizAnswersRequest {
    pub answers: Vec<Option<String>>,
}

#[derive(Serialize, ToSchema)]
pub struct QuizScoreResponse {
    pub correct: usize,
    pub total: usize,
    /// Per question: `question`, `given`, `correctAnswer` and `isCorrect`.
    #[schema(value_type = Vec<Object>)]
    pub answers: Vec<GradedAnswer>,
}

impl From<QuizScore> for QuizScoreResponse {
    fn from(score: QuizScore) -> Self {
        Self {
            correct: score.correct,
            total: score.total,
            answers: score.answers,
        }
    }
}

//=========================================================================================
// Chat
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    /// Earlier turns of this conversation, oldest first.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub history: Vec<ChatMessage>,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub answer: String,
}

//=========================================================================================
// Preferences
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ThemeBody {
    /// `light` or `dark`.
    #[schema(value_type = String)]
    pub theme: Theme,
}
