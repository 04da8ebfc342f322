//! services/api/src/adapters/pdf.rs
//!
//! This module contains the adapter for PDF text extraction.
//! It implements the `TextExtractionService` port from the `core` crate,
//! parsing uploaded bytes with `pdf-extract` and downloading linked documents
//! with `reqwest`.

use async_trait::async_trait;
use bytes::Bytes;
use study_guide_core::ports::{ExtractionError, ExtractionResult, TextExtractionService};
use tracing::error;

/// Page separator `pdf-extract` leaves between pages.
const PAGE_BREAK: char = '\x0C';

/// Normalizes raw extracted text into pages separated by a blank line.
fn join_pages(raw: &str) -> String {
    raw.split(PAGE_BREAK)
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Parses `bytes` on the blocking pool; `pdf-extract` is CPU bound.
async fn parse_pdf(bytes: Bytes) -> Result<String, String> {
    tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| e.to_string())?
    .map(|raw| join_pages(&raw))
}

fn validate_url(url: &str) -> ExtractionResult<reqwest::Url> {
    let parsed =
        reqwest::Url::parse(url).map_err(|e| ExtractionError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ExtractionError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            other
        ))),
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct PdfExtractionAdapter {
    http: reqwest::Client,
}

impl PdfExtractionAdapter {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

//=========================================================================================
// `TextExtractionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextExtractionService for PdfExtractionAdapter {
    async fn extract_pdf(&self, pdf_bytes: &[u8]) -> ExtractionResult<String> {
        parse_pdf(Bytes::copy_from_slice(pdf_bytes))
            .await
            .map_err(|e| {
                error!("Error parsing PDF: {}", e);
                ExtractionError::CorruptPdf
            })
    }

    async fn fetch_document(&self, url: &str) -> ExtractionResult<String> {
        let url = validate_url(url)?;

        let response = self.http.get(url).send().await.map_err(|e| {
            error!("Error fetching PDF from URL: {:?}", e);
            ExtractionError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::HttpStatus(status.to_string()));
        }

        let body = response.bytes().await.map_err(|e| {
            error!("Error reading PDF body: {:?}", e);
            ExtractionError::Network(e.to_string())
        })?;

        parse_pdf(body).await.map_err(|e| {
            error!("PDF parsing error from URL: {}", e);
            ExtractionError::NotPdf
        })
    }
}
