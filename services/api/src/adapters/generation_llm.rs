//! services/api/src/adapters/generation_llm.rs
//!
//! This module contains the adapter for the study-content LLM.
//! It implements the `ContentGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::json;
use study_guide_core::{
    domain::StudyContent,
    ports::{ContentGenerationService, GenerationError, GenerationResult},
};

const SYSTEM_INSTRUCTIONS: &str = "You are an expert tutor who turns source material into study aids. Always answer with a single JSON object that follows the provided schema and nothing else.";

const USER_INPUT_TEMPLATE: &str = r#"Based on the following text, please generate a comprehensive educational module. The output must be a single JSON object. The text is:

---

{text}

---

Please generate the following content based on the text provided:
1.  **Summary**: A concise summary.
2.  **Key Concepts**: A list of at least 5 key concepts with brief explanations.
3.  **Flashcards**: At least 5 flashcards with a term and a definition.
4.  **Quiz**: A quiz with 5 questions, including a mix of Multiple Choice (MCQ) and True/False (T/F) types. For MCQs, provide 4 options and make the answer exactly one of them. For T/F questions, leave options empty and answer "True" or "False"."#;

/// The structured-output schema sent with every request.
fn study_content_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "summary": {
                "type": "string",
                "description": "A concise summary of the entire document, capturing the main ideas and arguments."
            },
            "keyConcepts": {
                "type": "array",
                "description": "A list of the most important concepts, terms, or ideas from the text.",
                "items": {
                    "type": "object",
                    "properties": {
                        "concept": { "type": "string", "description": "The name of the key concept." },
                        "explanation": { "type": "string", "description": "A brief, clear explanation of the concept." }
                    },
                    "required": ["concept", "explanation"]
                }
            },
            "flashcards": {
                "type": "array",
                "description": "A set of flashcards for studying, with a term and a definition.",
                "items": {
                    "type": "object",
                    "properties": {
                        "term": { "type": "string", "description": "The term or question for the front of the flashcard." },
                        "definition": { "type": "string", "description": "The definition or answer for the back of the flashcard." }
                    },
                    "required": ["term", "definition"]
                }
            },
            "quiz": {
                "type": "array",
                "description": "A short quiz to test understanding of the material.",
                "items": {
                    "type": "object",
                    "properties": {
                        "question": { "type": "string", "description": "The quiz question." },
                        "type": {
                            "type": "string",
                            "enum": ["MCQ", "T/F"],
                            "description": "The type of question: Multiple Choice (MCQ) or True/False (T/F)."
                        },
                        "options": {
                            "type": "array",
                            "description": "An array of possible answers for MCQ questions. Should be empty for T/F questions.",
                            "items": { "type": "string" }
                        },
                        "answer": { "type": "string", "description": "The correct answer to the question." }
                    },
                    "required": ["question", "type", "answer"]
                }
            }
        },
        "required": ["summary", "keyConcepts", "flashcards", "quiz"]
    })
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ContentGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiGenerationAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGenerationAdapter {
    /// Creates a new `OpenAiGenerationAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `ContentGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentGenerationService for OpenAiGenerationAdapter {
    /// Asks the model for the four study sections and validates what comes back.
    async fn generate_study_content(&self, text: &str) -> GenerationResult<StudyContent> {
        let upstream = |e: OpenAIError| GenerationError::Upstream(e.to_string());

        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(upstream)?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(USER_INPUT_TEMPLATE.replace("{text}", text))
                .build()
                .map_err(upstream)?
                .into(),
        ];

        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: Some("Summary, key concepts, flashcards and quiz for a document.".to_string()),
                name: "educational_content".to_string(),
                schema: Some(study_content_schema()),
                strict: Some(false),
            },
        };

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(response_format)
            .temperature(0.7)
            .n(1)
            .build()
            .map_err(upstream)?;

        let response = self.client.chat().create(request).await.map_err(upstream)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                GenerationError::MalformedResponse(
                    "Generation LLM response contained no text content.".to_string(),
                )
            })?;

        StudyContent::parse_generated(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_requires_every_section() {
        let schema = study_content_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, vec!["summary", "keyConcepts", "flashcards", "quiz"]);
        assert_eq!(
            schema["properties"]["quiz"]["items"]["properties"]["type"]["enum"],
            json!(["MCQ", "T/F"])
        );
    }

    #[test]
    fn prompt_embeds_the_document_text() {
        let prompt = USER_INPUT_TEMPLATE.replace("{text}", "Mitochondria make ATP.");
        assert!(prompt.contains("---\n\nMitochondria make ATP.\n\n---"));
    }
}
