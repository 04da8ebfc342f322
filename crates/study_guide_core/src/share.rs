//! crates/study_guide_core/src/share.rs
//!
//! Builds share links and resolves incoming locations.
//!
//! A share link is `<origin+path>#share/<encoded payload>`. Receiving a link
//! needs no history state: everything shown is inside the fragment.

use tracing::warn;

use crate::codec;
use crate::domain::SharePayload;

pub const SHARE_FRAGMENT_PREFIX: &str = "#share/";

/// Default cap on the encoded payload length. Longer links are truncated by
/// some browsers and chat clients.
pub const DEFAULT_MAX_ENCODED_LEN: usize = 16_000;

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("This section is too large to share as a link ({len} characters, limit {max})")]
    TooLarge { len: usize, max: usize },
    #[error("Could not encode the share payload: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ShareLinkBuilder {
    base_url: String,
    max_encoded_len: usize,
}

impl ShareLinkBuilder {
    /// `base_url` is the origin and path links point at; any fragment on it
    /// is dropped.
    pub fn new(base_url: &str, max_encoded_len: usize) -> Self {
        let base_url = base_url.split('#').next().unwrap_or_default().to_string();
        Self {
            base_url,
            max_encoded_len,
        }
    }

    pub fn build(&self, payload: &SharePayload) -> Result<String, ShareError> {
        let encoded = codec::encode(payload)?;
        if encoded.len() > self.max_encoded_len {
            return Err(ShareError::TooLarge {
                len: encoded.len(),
                max: self.max_encoded_len,
            });
        }
        Ok(format!("{}{}{}", self.base_url, SHARE_FRAGMENT_PREFIX, encoded))
    }
}

/// What the application should show for a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A valid share link: show the read-only shared view.
    Shared(SharePayload),
    /// A share link whose payload could not be decoded.
    InvalidLink,
    /// Not a share link: defer to normal routing with this fragment (without `#`).
    Route(String),
}

pub const INVALID_LINK_MESSAGE: &str =
    "The share link is invalid or corrupted. Please check the URL and try again.";

pub struct ShareResolver;

impl ShareResolver {
    /// Resolves a full URL or a bare fragment. The share check comes before
    /// any other routing.
    pub fn resolve(location: &str) -> Resolution {
        let fragment = fragment_of(location.trim());
        match fragment.strip_prefix(SHARE_FRAGMENT_PREFIX) {
            Some(encoded) => match codec::decode(encoded) {
                Ok(payload) => Resolution::Shared(payload),
                Err(e) => {
                    warn!("Failed to parse share data: {}", e);
                    Resolution::InvalidLink
                }
            },
            None => Resolution::Route(fragment.trim_start_matches('#').to_string()),
        }
    }
}

fn fragment_of(location: &str) -> &str {
    match location.find('#') {
        Some(index) => &location[index..],
        None => "",
    }
}
