//! crates/study_guide_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like PDF parsers,
//! transcript services, LLM APIs or the storage medium.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::domain::StudyContent;

//=========================================================================================
// Error and Result Types
//=========================================================================================

/// Failure to turn a raw source (file, URL, video) into plain text.
///
/// The `Display` text of every variant is shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("Failed to read file: {0}")]
    Unreadable(String),
    #[error("Could not parse the PDF file. It might be corrupted or in an unsupported format.")]
    CorruptPdf,
    #[error("The linked file is not a valid or supported PDF document. Please check that the URL points directly to a PDF file.")]
    NotPdf,
    #[error("Invalid URL or file not found. The server responded with an error ({0}).")]
    HttpStatus(String),
    #[error("Could not download the document. This is likely due to a network issue or a server restriction. Please check the link and your internet connection.")]
    Network(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid YouTube URL. Please make sure you are using a valid YouTube video link.")]
    InvalidVideoUrl,
    #[error("Could not fetch transcript for this video. It may not have English captions available, or they might be disabled by the creator.")]
    NoCaptions,
    #[error("The transcript service is currently unavailable or the video is inaccessible. Please try again later.")]
    TranscriptUnavailable,
    #[error("No text could be extracted from {0}.")]
    EmptyDocument(String),
}

/// Failure to turn plain text into structured study content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("Content generation request failed: {0}")]
    Upstream(String),
    #[error("Generated content was not valid JSON: {0}")]
    MalformedResponse(String),
    #[error("Generated content is missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("Generated content is invalid: {0}")]
    InvalidContent(String),
}

/// Persistence read/write failure. Never surfaced to the user.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage read failed for key '{key}': {message}")]
    Read { key: String, message: String },
    #[error("Storage write failed for key '{key}': {message}")]
    Write { key: String, message: String },
}

/// A generic error type for the remaining port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;
pub type GenerationResult<T> = Result<T, GenerationError>;
pub type StorageResult<T> = Result<T, StorageError>;
/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait TextExtractionService: Send + Sync {
    /// Extracts the plain text of an uploaded PDF.
    async fn extract_pdf(&self, pdf_bytes: &[u8]) -> ExtractionResult<String>;

    /// Downloads the PDF at `url` and extracts its plain text.
    async fn fetch_document(&self, url: &str) -> ExtractionResult<String>;
}

#[async_trait]
pub trait TranscriptService: Send + Sync {
    /// Fetches the caption text of a video, concatenated into one string.
    async fn fetch_transcript(&self, video_url: &str) -> ExtractionResult<String>;
}

#[async_trait]
pub trait ContentGenerationService: Send + Sync {
    /// Generates summary, key concepts, flashcards and quiz for `text`.
    async fn generate_study_content(&self, text: &str) -> GenerationResult<StudyContent>;
}

/// Who wrote a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of a conversation about a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

pub type TextStream = Pin<Box<dyn Stream<Item = PortResult<String>> + Send>>;

#[async_trait]
pub trait DocumentChatService: Send + Sync {
    /// Answers `message` using only `document_text`, continuing `history`.
    async fn answer(
        &self,
        document_text: &str,
        history: &[ChatMessage],
        message: &str,
    ) -> PortResult<String>;

    /// Same as `answer`, yielding the reply as it is generated.
    async fn answer_streaming(
        &self,
        document_text: &str,
        history: &[ChatMessage],
        message: &str,
    ) -> PortResult<TextStream>;
}

/// A general assistant that is not tied to any document.
#[async_trait]
pub trait AssistantChatService: Send + Sync {
    /// Answers `message`, continuing `history`.
    async fn reply(&self, history: &[ChatMessage], message: &str) -> PortResult<String>;

    /// Same as `reply`, yielding the text as it is generated.
    async fn reply_streaming(&self, history: &[ChatMessage], message: &str)
        -> PortResult<TextStream>;
}

/// A synchronous key-value store scoped to one installation.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}
