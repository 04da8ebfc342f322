//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the chat adapter. It implements both the
//! `DocumentChatService` port (answers grounded in one stored document) and the
//! `AssistantChatService` port (a general assistant) from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use futures::StreamExt;
use study_guide_core::ports::{
    AssistantChatService, ChatMessage, ChatRole, DocumentChatService, PortError, PortResult,
    TextStream,
};

/// The reply the model is told to give when the document does not cover a question.
pub const OUT_OF_SCOPE_REPLY: &str = "I cannot answer that based on the provided document.";

fn system_instructions(document_text: &str) -> String {
    format!(
        "You are a helpful study assistant. Answer the user's questions based ONLY on the \
         following document. Do not use any external knowledge. If the answer cannot be found \
         in the document, say \"{}\"\n\nDOCUMENT:\n---\n{}\n---",
        OUT_OF_SCOPE_REPLY, document_text
    )
}

const ASSISTANT_INSTRUCTIONS: &str = "You are a friendly and helpful AI assistant named Neo. Your goal is to provide accurate and helpful information to users' general questions.";

fn unexpected(e: OpenAIError) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `DocumentChatService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the system prompt, the earlier turns and the new question into one request.
    fn build_request(
        &self,
        system_prompt: String,
        history: &[ChatMessage],
        message: &str,
    ) -> PortResult<CreateChatCompletionRequest> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 2);
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(unexpected)?
                .into(),
        );

        for turn in history {
            let turn_message = match turn.role {
                ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.text.as_str())
                    .build()
                    .map_err(unexpected)?
                    .into(),
                ChatRole::Model => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.text.as_str())
                    .build()
                    .map_err(unexpected)?
                    .into(),
            };
            messages.push(turn_message);
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(message)
                .build()
                .map_err(unexpected)?
                .into(),
        );

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(unexpected)
    }

    async fn complete(&self, request: CreateChatCompletionRequest) -> PortResult<String> {
        let response = self.client.chat().create(request).await.map_err(unexpected)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Chat LLM response contained no text content.".to_string())
            })
    }

    async fn complete_streaming(&self, request: CreateChatCompletionRequest) -> PortResult<TextStream> {
        let stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(unexpected)?;

        // Each chunk carries at most one delta; empty deltas are dropped.
        let chunks = stream.filter_map(|chunk| async move {
            match chunk {
                Ok(response) => response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                    .filter(|text| !text.is_empty())
                    .map(Ok),
                Err(e) => Some(Err(unexpected(e))),
            }
        });

        Ok(Box::pin(chunks))
    }
}

//=========================================================================================
// `DocumentChatService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentChatService for OpenAiChatAdapter {
    async fn answer(
        &self,
        document_text: &str,
        history: &[ChatMessage],
        message: &str,
    ) -> PortResult<String> {
        let request = self.build_request(system_instructions(document_text), history, message)?;
        self.complete(request).await
    }

    async fn answer_streaming(
        &self,
        document_text: &str,
        history: &[ChatMessage],
        message: &str,
    ) -> PortResult<TextStream> {
        let request = self.build_request(system_instructions(document_text), history, message)?;
        self.complete_streaming(request).await
    }
}

//=========================================================================================
// `AssistantChatService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AssistantChatService for OpenAiChatAdapter {
    async fn reply(&self, history: &[ChatMessage], message: &str) -> PortResult<String> {
        let request = self.build_request(ASSISTANT_INSTRUCTIONS.to_string(), history, message)?;
        self.complete(request).await
    }

    async fn reply_streaming(
        &self,
        history: &[ChatMessage],
        message: &str,
    ) -> PortResult<TextStream> {
        let request = self.build_request(ASSISTANT_INSTRUCTIONS.to_string(), history, message)?;
        self.complete_streaming(request).await
    }
}
