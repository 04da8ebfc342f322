pub mod codec;
pub mod controller;
pub mod domain;
pub mod history;
pub mod markdown;
pub mod memory;
pub mod ports;
pub mod preferences;
pub mod quiz;
pub mod share;

pub use controller::{
    ControllerError, InputSource, PipelineState, SessionController, SourceKind,
    DEFAULT_MAX_INPUT_CHARS, GENERATION_FAILED_MESSAGE, INTERRUPTED_MESSAGE,
};
pub use domain::{
    Flashcard, HistorySession, KeyConcept, QuizItem, QuizKind, SessionId, ShareData,
    SharePayload, ShareView, StudyContent,
};
pub use history::{HistoryError, HistoryStore};
pub use markdown::{ExportSection, MarkdownDocument};
pub use memory::MemoryStore;
pub use ports::{
    AssistantChatService, ChatMessage, ChatRole, ContentGenerationService, DocumentChatService,
    ExtractionError, GenerationError, KeyValueStore, PortError, PortResult, StorageError,
    TextExtractionService, TranscriptService,
};
pub use preferences::{Theme, ThemePreference};
pub use quiz::{GradedAnswer, QuizError, QuizScore};
pub use share::{Resolution, ShareError, ShareLinkBuilder, ShareResolver};
