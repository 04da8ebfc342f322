//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use study_guide_core::{
    ports::{
        AssistantChatService, ContentGenerationService, DocumentChatService, KeyValueStore,
        TextExtractionService, TranscriptService,
    },
    HistoryStore, SessionController, ShareLinkBuilder, ThemePreference,
};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub controller: Arc<SessionController>,
    pub chat_adapter: Arc<dyn DocumentChatService>,
    pub assistant_adapter: Arc<dyn AssistantChatService>,
    pub share_links: ShareLinkBuilder,
    theme: Mutex<ThemePreference>,
}

/// The adapters the state is assembled from.
pub struct Adapters {
    pub storage: Arc<dyn KeyValueStore>,
    pub extraction: Arc<dyn TextExtractionService>,
    pub transcripts: Arc<dyn TranscriptService>,
    pub generation: Arc<dyn ContentGenerationService>,
    pub chat: Arc<dyn DocumentChatService>,
    pub assistant: Arc<dyn AssistantChatService>,
}

impl AppState {
    /// Loads the persisted history and theme from `adapters.storage` and builds the controller.
    pub fn new(config: Arc<Config>, adapters: Adapters) -> Self {
        let history = HistoryStore::load(adapters.storage.clone());
        let controller = SessionController::new(
            history,
            adapters.extraction,
            adapters.transcripts,
            adapters.generation,
            config.max_input_chars,
        );
        let share_links =
            ShareLinkBuilder::new(&config.public_base_url, config.share_max_encoded_len);

        Self {
            controller: Arc::new(controller),
            chat_adapter: adapters.chat,
            assistant_adapter: adapters.assistant,
            share_links,
            theme: Mutex::new(ThemePreference::load(adapters.storage)),
            config,
        }
    }

    pub fn theme(&self) -> MutexGuard<'_, ThemePreference> {
        self.theme.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
