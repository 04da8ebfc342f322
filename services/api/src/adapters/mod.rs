pub mod chat_llm;
pub mod generation_llm;
pub mod pdf;
pub mod storage;
pub mod transcript;

pub use chat_llm::OpenAiChatAdapter;
pub use generation_llm::OpenAiGenerationAdapter;
pub use pdf::PdfExtractionAdapter;
pub use storage::FileStore;
pub use transcript::YoutubeTranscriptAdapter;
