//! Encodes share payloads into a text blob that can sit in a URL fragment.
//!
//! The blob is the compact JSON form of the payload, as UTF-8, in the
//! URL-safe base64 alphabet without padding. Decoding also accepts the
//! standard padded alphabet and Latin-1 text, so links produced by older
//! clients keep working.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde_json::error::Category;

use crate::domain::SharePayload;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("share data is empty")]
    Empty,
    #[error("share data is not valid base64: {0}")]
    Base64(String),
    #[error("share data is not valid JSON: {0}")]
    Json(String),
    #[error("share data does not describe shareable content: {0}")]
    Shape(String),
}

pub fn encode(payload: &SharePayload) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(payload)?;
    Ok(URL_SAFE_NO_PAD.encode(json.as_bytes()))
}

pub fn decode(text: &str) -> Result<SharePayload, DecodeError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DecodeError::Empty);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(text)
        .or_else(|_| STANDARD.decode(text))
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    let json = payload_text(bytes);

    serde_json::from_str(&json).map_err(|e| match e.classify() {
        Category::Data => DecodeError::Shape(e.to_string()),
        Category::Io | Category::Syntax | Category::Eof => DecodeError::Json(e.to_string()),
    })
}

/// Older links were made with `btoa`, which writes one byte per character
/// (Latin-1), and may happen to be valid in either alphabet. Bytes that are
/// not valid UTF-8 are read as Latin-1.
fn payload_text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| e.into_bytes().into_iter().map(char::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Flashcard, KeyConcept, QuizItem, QuizKind, ShareData};

    fn payloads() -> Vec<SharePayload> {
        vec![
            SharePayload {
                source_name: "lecture.pdf".to_string(),
                data: ShareData::Summary("Photosynthesis → glucose; 光合作用 ✓\nline two".to_string()),
            },
            SharePayload {
                source_name: "https://example.com/doc.pdf".to_string(),
                data: ShareData::Concepts(vec![KeyConcept {
                    concept: "Entropy".to_string(),
                    explanation: "Disorder \"grows\" over time".to_string(),
                }]),
            },
            SharePayload {
                source_name: "cards".to_string(),
                data: ShareData::Flashcards(vec![]),
            },
            SharePayload {
                source_name: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
                data: ShareData::Quiz(vec![
                    QuizItem {
                        question: "2+2?".to_string(),
                        kind: QuizKind::MultipleChoice,
                        options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
                        answer: "4".to_string(),
                    },
                    QuizItem {
                        question: "The sky is blue.".to_string(),
                        kind: QuizKind::TrueFalse,
                        options: vec![],
                        answer: "True".to_string(),
                    },
                ]),
            },
        ]
    }

    #[test]
    fn decode_inverts_encode() {
        for payload in payloads() {
            let encoded = encode(&payload).unwrap();
            assert!(encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            assert_eq!(decode(&encoded).unwrap(), payload);
        }
    }

    #[test]
    fn flashcards_round_trip_keeps_order() {
        let payload = SharePayload {
            source_name: "bio.pdf".to_string(),
            data: ShareData::Flashcards(vec![
                Flashcard { term: "A".into(), definition: "1".into() },
                Flashcard { term: "B".into(), definition: "2".into() },
            ]),
        };
        let decoded = decode(&encode(&payload).unwrap()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn legacy_padded_standard_base64_is_accepted() {
        let json = r#"{"sourceName":"a.pdf","view":"summary","data":"Hi?"}"#;
        let legacy = STANDARD.encode(json);
        let payload = decode(&legacy).unwrap();
        assert_eq!(payload.data, ShareData::Summary("Hi?".to_string()));
    }

    #[test]
    fn legacy_latin1_links_are_accepted() {
        let json = r#"{"sourceName":"café.pdf","view":"summary","data":"résumé"}"#;
        let latin1: Vec<u8> = json.chars().map(|c| c as u8).collect();
        assert!(std::str::from_utf8(&latin1).is_err());

        for encoded in [STANDARD.encode(&latin1), URL_SAFE_NO_PAD.encode(&latin1)] {
            let payload = decode(&encoded).unwrap();
            assert_eq!(payload.source_name, "café.pdf");
            assert_eq!(payload.data, ShareData::Summary("résumé".to_string()));
        }
    }

    #[test]
    fn malformed_input_is_a_decode_error() {
        assert_eq!(decode("   "), Err(DecodeError::Empty));
        assert!(matches!(decode("%%%not base64%%%"), Err(DecodeError::Base64(_))));
        assert!(matches!(
            decode(&URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd])),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            decode(&URL_SAFE_NO_PAD.encode("{\"sourceName\": ")),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            decode(&URL_SAFE_NO_PAD.encode(r#"{"sourceName":"a","view":"quiz","data":"nope"}"#)),
            Err(DecodeError::Shape(_))
        ));
        assert!(matches!(
            decode(&URL_SAFE_NO_PAD.encode(r#"{"sourceName":"a","view":"chat","data":[]}"#)),
            Err(DecodeError::Shape(_))
        ));
    }
}
