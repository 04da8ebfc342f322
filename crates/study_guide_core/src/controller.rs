//! crates/study_guide_core/src/controller.rs
//!
//! Drives one source document through extraction and generation into a new
//! history session, and owns the active selection.
//!
//! Only one pipeline may be in flight. A second submission while extracting
//! or generating is refused rather than queued, and nothing is retried. A
//! submitted pipeline always ends in success or error, including when its
//! future is dropped part way through.

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};

use crate::domain::{HistorySession, SessionId, StudyContent};
use crate::history::{HistoryError, HistoryStore};
use crate::ports::{
    ContentGenerationService, ExtractionError, GenerationError, TextExtractionService,
    TranscriptService,
};

/// Shown for every generation failure; the detailed cause is only logged.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate educational content. The AI model may be overloaded or the content could not be processed. Please try again.";

/// Left behind when a running pipeline is dropped before it finishes.
pub const INTERRUPTED_MESSAGE: &str =
    "Processing was interrupted before it finished. Please try again.";

/// Longest prefix of the extracted text sent to the generator, in characters.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 30_000;

//=========================================================================================
// Inputs and States
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    File,
    DocumentUrl,
    VideoUrl,
}

/// A raw source submitted by the user.
#[derive(Debug, Clone)]
pub enum InputSource {
    File { name: String, bytes: Bytes },
    DocumentUrl(String),
    VideoUrl(String),
}

impl InputSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            InputSource::File { .. } => SourceKind::File,
            InputSource::DocumentUrl(_) => SourceKind::DocumentUrl,
            InputSource::VideoUrl(_) => SourceKind::VideoUrl,
        }
    }

    /// The human-readable label stored with the session.
    pub fn source_name(&self) -> String {
        match self {
            InputSource::File { name, .. } => name.clone(),
            InputSource::DocumentUrl(url) => {
                let url = url.trim();
                let last_segment = url.rsplit('/').next().unwrap_or_default();
                let name = last_segment.split('?').next().unwrap_or_default();
                if name.is_empty() {
                    url.to_string()
                } else {
                    name.to_string()
                }
            }
            InputSource::VideoUrl(url) => url.trim().to_string(),
        }
    }
}

/// Where the controller is in the extraction → generation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Extracting(SourceKind),
    Generating,
    /// Holds the message shown to the user until they start over.
    Error(String),
}

impl PipelineState {
    pub fn is_busy(&self) -> bool {
        matches!(self, PipelineState::Extracting(_) | PipelineState::Generating)
    }

    /// Progress text for the in-flight stages.
    pub fn progress_message(&self) -> Option<&'static str> {
        match self {
            PipelineState::Extracting(SourceKind::File) => Some("Parsing your document..."),
            PipelineState::Extracting(SourceKind::DocumentUrl) => {
                Some("Downloading and parsing document...")
            }
            PipelineState::Extracting(SourceKind::VideoUrl) => Some("Fetching YouTube transcript..."),
            PipelineState::Generating => Some("Generating insights with AI..."),
            PipelineState::Idle | PipelineState::Error(_) => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("A document is already being processed")]
    Busy,
    #[error("The last attempt failed; start a new session before submitting again")]
    PendingError,
    #[error("Session {0} not found")]
    NotFound(SessionId),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

//=========================================================================================
// The Controller
//=========================================================================================

struct Inner {
    history: HistoryStore,
    active: Option<SessionId>,
    state: PipelineState,
}

pub struct SessionController {
    inner: Mutex<Inner>,
    extraction: Arc<dyn TextExtractionService>,
    transcripts: Arc<dyn TranscriptService>,
    generation: Arc<dyn ContentGenerationService>,
    max_input_chars: usize,
}

impl SessionController {
    /// The most recent session in `history` starts out active.
    pub fn new(
        history: HistoryStore,
        extraction: Arc<dyn TextExtractionService>,
        transcripts: Arc<dyn TranscriptService>,
        generation: Arc<dyn ContentGenerationService>,
        max_input_chars: usize,
    ) -> Self {
        let active = history.latest().map(|session| session.id.clone());
        Self {
            inner: Mutex::new(Inner {
                history,
                active,
                state: PipelineState::Idle,
            }),
            extraction,
            transcripts,
            generation,
            max_input_chars,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> PipelineState {
        self.lock().state.clone()
    }

    pub fn active(&self) -> Option<HistorySession> {
        let inner = self.lock();
        let id = inner.active.as_ref()?;
        inner.history.find_by_id(id).cloned()
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.lock().active.clone()
    }

    pub fn sessions(&self) -> Vec<HistorySession> {
        self.lock().history.all().to_vec()
    }

    pub fn find(&self, id: &SessionId) -> Option<HistorySession> {
        self.lock().history.find_by_id(id).cloned()
    }

    /// Runs `source` through extraction and generation.
    ///
    /// On success the new session is appended to history and becomes active.
    /// On failure history is untouched, the active selection is cleared and
    /// the controller stays in `Error` until `start_new` is called.
    pub async fn submit(&self, source: InputSource) -> Result<HistorySession, ControllerError> {
        let kind = source.kind();
        let source_name = source.source_name();
        self.begin(kind)?;
        let _running = RunningPipeline { controller: self };
        info!("Processing {:?} source '{}'", kind, source_name);

        let text = match self.extract(&source, &source_name).await {
            Ok(text) => text,
            Err(e) => {
                error!("Extraction failed for '{}': {}", source_name, e);
                self.fail(e.to_string());
                return Err(e.into());
            }
        };

        self.lock().state = PipelineState::Generating;
        let prompt_text = truncate_chars(&text, self.max_input_chars);
        let generated = self
            .generation
            .generate_study_content(prompt_text)
            .await
            .and_then(StudyContent::validated);
        let content = match generated {
            Ok(content) => content,
            Err(e) => {
                error!("Generation failed for '{}': {}", source_name, e);
                self.fail(GENERATION_FAILED_MESSAGE.to_string());
                return Err(e.into());
            }
        };

        self.complete(source_name, text, content)
    }

    /// Returns to the input view: no active selection, error cleared.
    pub fn start_new(&self) -> Result<(), ControllerError> {
        let mut inner = self.lock();
        if inner.state.is_busy() {
            return Err(ControllerError::Busy);
        }
        inner.state = PipelineState::Idle;
        inner.active = None;
        Ok(())
    }

    pub fn select(&self, id: &SessionId) -> Result<HistorySession, ControllerError> {
        let mut inner = self.lock();
        match &inner.state {
            PipelineState::Idle => {}
            PipelineState::Error(_) => return Err(ControllerError::PendingError),
            PipelineState::Extracting(_) | PipelineState::Generating => {
                return Err(ControllerError::Busy)
            }
        }
        let session = inner
            .history
            .find_by_id(id)
            .cloned()
            .ok_or_else(|| ControllerError::NotFound(id.clone()))?;
        inner.active = Some(session.id.clone());
        Ok(session)
    }

    /// Deletes the whole history.
    pub fn clear_history(&self) -> Result<(), ControllerError> {
        let mut inner = self.lock();
        if inner.state.is_busy() {
            return Err(ControllerError::Busy);
        }
        inner.history.clear();
        inner.active = None;
        info!("History cleared");
        Ok(())
    }

    fn begin(&self, kind: SourceKind) -> Result<(), ControllerError> {
        let mut inner = self.lock();
        match &inner.state {
            PipelineState::Idle => {}
            PipelineState::Error(_) => return Err(ControllerError::PendingError),
            PipelineState::Extracting(_) | PipelineState::Generating => {
                return Err(ControllerError::Busy)
            }
        }
        inner.state = PipelineState::Extracting(kind);
        Ok(())
    }

    async fn extract(&self, source: &InputSource, source_name: &str) -> Result<String, ExtractionError> {
        let text = match source {
            InputSource::File { bytes, .. } => self.extraction.extract_pdf(bytes).await?,
            InputSource::DocumentUrl(url) => {
                self.extraction.fetch_document(non_empty_url(url)?).await?
            }
            InputSource::VideoUrl(url) => {
                self.transcripts.fetch_transcript(non_empty_url(url)?).await?
            }
        };
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyDocument(source_name.to_string()));
        }
        Ok(text)
    }

    fn fail(&self, message: String) {
        let mut inner = self.lock();
        inner.state = PipelineState::Error(message);
        inner.active = None;
    }

    fn complete(
        &self,
        source_name: String,
        original_text: String,
        content: StudyContent,
    ) -> Result<HistorySession, ControllerError> {
        let mut inner = self.lock();
        let (id, created_at) = inner.history.next_id(Utc::now());
        let session = HistorySession {
            id,
            source_name,
            original_text: Some(original_text),
            content,
            created_at,
        };
        if let Err(e) = inner.history.append(session.clone()) {
            inner.state = PipelineState::Error(GENERATION_FAILED_MESSAGE.to_string());
            inner.active = None;
            return Err(e.into());
        }
        inner.active = Some(session.id.clone());
        inner.state = PipelineState::Idle;
        info!("Created session {} for '{}'", session.id, session.source_name);
        Ok(session)
    }
}

/// Held for the length of `submit`. If the future is dropped while a stage
/// is still in flight, the controller moves to `Error` instead of staying busy.
struct RunningPipeline<'a> {
    controller: &'a SessionController,
}

impl Drop for RunningPipeline<'_> {
    fn drop(&mut self) {
        let mut inner = self.controller.lock();
        if inner.state.is_busy() {
            warn!("Pipeline dropped while {:?}", inner.state);
            inner.state = PipelineState::Error(INTERRUPTED_MESSAGE.to_string());
            inner.active = None;
        }
    }
}

fn non_empty_url(url: &str) -> Result<&str, ExtractionError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ExtractionError::InvalidUrl("no URL was given".to_string()));
    }
    Ok(url)
}

/// The first `max_chars` characters of `text`, cut on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Flashcard, KeyConcept, QuizItem, QuizKind};
    use crate::memory::MemoryStore;
    use crate::ports::{ExtractionResult, GenerationResult};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    struct FakeExtraction {
        result: ExtractionResult<String>,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl TextExtractionService for FakeExtraction {
        async fn extract_pdf(&self, _pdf_bytes: &[u8]) -> ExtractionResult<String> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.result.clone()
        }

        async fn fetch_document(&self, _url: &str) -> ExtractionResult<String> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.result.clone()
        }
    }

    struct FakeTranscripts;

    #[async_trait]
    impl TranscriptService for FakeTranscripts {
        async fn fetch_transcript(&self, _video_url: &str) -> ExtractionResult<String> {
            Err(ExtractionError::NoCaptions)
        }
    }

    struct FakeGeneration {
        result: GenerationResult<StudyContent>,
        received: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ContentGenerationService for FakeGeneration {
        async fn generate_study_content(&self, text: &str) -> GenerationResult<StudyContent> {
            self.received.lock().unwrap().push(text.to_string());
            self.result.clone()
        }
    }

    fn sample_content() -> StudyContent {
        StudyContent {
            summary: "A summary".into(),
            key_concepts: vec![KeyConcept { concept: "C".into(), explanation: "E".into() }],
            flashcards: vec![Flashcard { term: "T".into(), definition: "D".into() }],
            quiz: vec![QuizItem {
                question: "Q".into(),
                kind: QuizKind::TrueFalse,
                options: vec![],
                answer: "false".into(),
            }],
        }
    }

    struct Harness {
        controller: SessionController,
        generation: Arc<FakeGeneration>,
        storage: Arc<MemoryStore>,
    }

    fn harness(
        extraction: ExtractionResult<String>,
        generation: GenerationResult<StudyContent>,
        gate: Option<Arc<Notify>>,
        max_input_chars: usize,
    ) -> Harness {
        let storage = Arc::new(MemoryStore::new());
        let generation = Arc::new(FakeGeneration {
            result: generation,
            received: Mutex::new(Vec::new()),
        });
        let controller = SessionController::new(
            HistoryStore::load(storage.clone()),
            Arc::new(FakeExtraction { result: extraction, gate }),
            Arc::new(FakeTranscripts),
            generation.clone(),
            max_input_chars,
        );
        Harness { controller, generation, storage }
    }

    fn pdf(name: &str) -> InputSource {
        InputSource::File {
            name: name.to_string(),
            bytes: Bytes::from_static(b"%PDF-1.4"),
        }
    }

    #[tokio::test]
    async fn successful_pipeline_appends_and_activates_a_session() {
        let h = harness(Ok("document text".into()), Ok(sample_content()), None, 100);

        let first = h.controller.submit(pdf("a.pdf")).await.unwrap();
        let second = h.controller.submit(pdf("b.pdf")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(h.controller.active_id(), Some(second.id.clone()));
        assert_eq!(h.controller.state(), PipelineState::Idle);
        assert_eq!(second.original_text.as_deref(), Some("document text"));
        // True/false answers come back normalized.
        assert_eq!(second.content.quiz[0].answer, "False");

        let reloaded = HistoryStore::load(h.storage.clone());
        assert_eq!(reloaded.len(), 2);
    }

    #[tokio::test]
    async fn extraction_failure_leaves_history_untouched() {
        let h = harness(Ok("text".into()), Ok(sample_content()), None, 100);
        h.controller.submit(pdf("a.pdf")).await.unwrap();

        let failing = SessionController::new(
            HistoryStore::load(h.storage.clone()),
            Arc::new(FakeExtraction { result: Err(ExtractionError::CorruptPdf), gate: None }),
            Arc::new(FakeTranscripts),
            h.generation.clone(),
            100,
        );
        assert!(failing.active_id().is_some());

        let err = failing.submit(pdf("broken.pdf")).await.unwrap_err();
        assert!(matches!(err, ControllerError::Extraction(ExtractionError::CorruptPdf)));
        assert_eq!(
            failing.state(),
            PipelineState::Error(ExtractionError::CorruptPdf.to_string())
        );
        assert_eq!(failing.active_id(), None);
        assert_eq!(failing.sessions().len(), 1);
    }

    #[tokio::test]
    async fn generation_failure_surfaces_the_generic_message() {
        let h = harness(
            Ok("text".into()),
            Err(GenerationError::MissingFields(vec!["quiz".into()])),
            None,
            100,
        );

        let err = h.controller.submit(pdf("a.pdf")).await.unwrap_err();
        assert!(matches!(err, ControllerError::Generation(_)));
        assert_eq!(
            h.controller.state(),
            PipelineState::Error(GENERATION_FAILED_MESSAGE.to_string())
        );
        assert!(h.controller.sessions().is_empty());
        assert!(h.controller.active().is_none());
    }

    #[tokio::test]
    async fn error_state_requires_starting_over() {
        let h = harness(Ok("   ".into()), Ok(sample_content()), None, 100);

        let err = h.controller.submit(pdf("blank.pdf")).await.unwrap_err();
        assert!(matches!(err, ControllerError::Extraction(ExtractionError::EmptyDocument(_))));

        assert!(matches!(
            h.controller.submit(pdf("again.pdf")).await,
            Err(ControllerError::PendingError)
        ));

        h.controller.start_new().unwrap();
        assert_eq!(h.controller.state(), PipelineState::Idle);
        assert!(h.controller.active().is_none());
    }

    #[tokio::test]
    async fn video_failures_come_from_the_transcript_service() {
        let h = harness(Ok("text".into()), Ok(sample_content()), None, 100);
        let err = h
            .controller
            .submit(InputSource::VideoUrl("https://youtu.be/abcdefghijk".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Extraction(ExtractionError::NoCaptions)));
    }

    #[tokio::test]
    async fn empty_urls_are_rejected_before_fetching() {
        let h = harness(Ok("text".into()), Ok(sample_content()), None, 100);
        let err = h
            .controller
            .submit(InputSource::DocumentUrl("   ".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Extraction(ExtractionError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn generator_receives_a_bounded_prefix() {
        let h = harness(Ok("ééééé-tail".into()), Ok(sample_content()), None, 5);
        let session = h.controller.submit(pdf("a.pdf")).await.unwrap();

        assert_eq!(h.generation.received.lock().unwrap().as_slice(), ["ééééé"]);
        assert_eq!(session.original_text.as_deref(), Some("ééééé-tail"));
    }

    #[tokio::test]
    async fn second_submission_while_busy_is_refused() {
        let gate = Arc::new(Notify::new());
        let h = harness(Ok("text".into()), Ok(sample_content()), Some(gate.clone()), 100);
        let controller = Arc::new(h.controller);

        let running = {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller
                    .submit(InputSource::DocumentUrl("https://example.com/doc.pdf".into()))
                    .await
            })
        };
        while controller.state() == PipelineState::Idle {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            controller.state(),
            PipelineState::Extracting(SourceKind::DocumentUrl)
        );
        assert!(matches!(
            controller.submit(pdf("b.pdf")).await,
            Err(ControllerError::Busy)
        ));
        assert!(matches!(controller.start_new(), Err(ControllerError::Busy)));

        gate.notify_one();
        let session = running.await.unwrap().unwrap();
        assert_eq!(session.source_name, "doc.pdf");
        assert_eq!(controller.sessions().len(), 1);
    }

    #[tokio::test]
    async fn dropping_a_running_submission_releases_the_controller() {
        let gate = Arc::new(Notify::new());
        let h = harness(Ok("text".into()), Ok(sample_content()), Some(gate.clone()), 100);

        let dropped = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            h.controller.submit(pdf("a.pdf")),
        )
        .await;
        assert!(dropped.is_err());

        assert_eq!(
            h.controller.state(),
            PipelineState::Error(INTERRUPTED_MESSAGE.to_string())
        );
        assert!(h.controller.active().is_none());
        assert!(h.controller.sessions().is_empty());

        h.controller.start_new().unwrap();
        assert_eq!(h.controller.state(), PipelineState::Idle);

        gate.notify_one();
        let session = h.controller.submit(pdf("b.pdf")).await.unwrap();
        assert_eq!(session.source_name, "b.pdf");
    }

    #[tokio::test]
    async fn select_switches_between_stored_sessions() {
        let h = harness(Ok("text".into()), Ok(sample_content()), None, 100);
        let first = h.controller.submit(pdf("a.pdf")).await.unwrap();
        h.controller.submit(pdf("b.pdf")).await.unwrap();

        let selected = h.controller.select(&first.id).unwrap();
        assert_eq!(selected.source_name, "a.pdf");
        assert_eq!(h.controller.active_id(), Some(first.id));

        assert!(matches!(
            h.controller.select(&SessionId::from("missing")),
            Err(ControllerError::NotFound(_))
        ));
    }

    #[test]
    fn document_url_source_names_use_the_last_path_segment() {
        let name = |url: &str| InputSource::DocumentUrl(url.to_string()).source_name();
        assert_eq!(name("https://example.com/papers/intro.pdf?dl=1"), "intro.pdf");
        assert_eq!(name("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn progress_messages_follow_the_source_kind() {
        assert_eq!(
            PipelineState::Extracting(SourceKind::VideoUrl).progress_message(),
            Some("Fetching YouTube transcript...")
        );
        assert_eq!(PipelineState::Idle.progress_message(), None);
    }
}
