//! services/api/src/adapters/transcript.rs
//!
//! This module contains the adapter for fetching video captions.
//! It implements the `TranscriptService` port from the `core` crate on top of
//! a public transcript proxy that answers `GET /?server_vid=<id>` with a JSON
//! array of caption lines.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use study_guide_core::ports::{ExtractionError, ExtractionResult, TranscriptService};
use tracing::{error, warn};

const VIDEO_ID_PATTERN: &str =
    r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#;

#[derive(Debug, Deserialize)]
struct TranscriptLine {
    text: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct YoutubeTranscriptAdapter {
    http: reqwest::Client,
    base_url: String,
    video_id_pattern: Regex,
}

impl YoutubeTranscriptAdapter {
    /// Creates a new adapter talking to the transcript proxy at `base_url`.
    pub fn new(http: reqwest::Client, base_url: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            video_id_pattern: Regex::new(VIDEO_ID_PATTERN)?,
        })
    }

    /// The 11-character video id in a watch, embed or short link.
    pub fn video_id<'a>(&self, url: &'a str) -> Option<&'a str> {
        self.video_id_pattern
            .captures(url)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
    }
}

fn join_lines(lines: Vec<TranscriptLine>) -> ExtractionResult<String> {
    if lines.is_empty() {
        return Err(ExtractionError::NoCaptions);
    }
    Ok(lines
        .into_iter()
        .map(|line| line.text)
        .collect::<Vec<_>>()
        .join(" "))
}

//=========================================================================================
// `TranscriptService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TranscriptService for YoutubeTranscriptAdapter {
    async fn fetch_transcript(&self, video_url: &str) -> ExtractionResult<String> {
        let video_id = self
            .video_id(video_url)
            .ok_or(ExtractionError::InvalidVideoUrl)?;

        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .query(&[("server_vid", video_id)])
            .send()
            .await
            .map_err(|e| {
                error!("YouTube transcript fetch error: {:?}", e);
                ExtractionError::TranscriptUnavailable
            })?;

        if !response.status().is_success() {
            warn!(
                "Transcript service answered {} for video {}",
                response.status(),
                video_id
            );
            return Err(ExtractionError::TranscriptUnavailable);
        }

        let lines: Vec<TranscriptLine> = response.json().await.map_err(|e| {
            error!("Transcript response for video {} was not readable: {:?}", video_id, e);
            ExtractionError::TranscriptUnavailable
        })?;

        join_lines(lines)
    }
}
