#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items
)]

//! Nuance dictation (speech-to-text) and TTS (text-to-speech) client.
//!
//! ```rust,no_run
//! use nuance_ox::{DictationRequest, Nuance, TtsRequest};
//!
//! # async fn example() -> Result<(), nuance_ox::NuanceError> {
//! let nuance = Nuance::new("app-id", "app-key");
//!
//! let speech = TtsRequest::builder()
//!     .identifier("user-1")
//!     .text("hello world")
//!     .output("hello.wav")
//!     .output_format("wav")
//!     .voice("Tom")
//!     .build();
//! nuance.send_tts_request(&speech).await?;
//!
//! let dictation = DictationRequest::builder()
//!     .identifier("user-1")
//!     .language("en-US")
//!     .path("audio.amr")
//!     .build();
//! let lines = nuance.send_dictation_request(&dictation).await?;
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod dictation;
pub mod error;
pub mod headers;
mod internal;
pub mod tts;

pub use dictation::{DictationRequest, Topic};
pub use error::NuanceError;
pub use headers::{HeaderSet, merge};
pub use tts::{TtsOutput, TtsRequest};

use bon::Builder;
use bytes::Bytes;
use core::fmt;
#[cfg(feature = "leaky-bucket")]
use leaky_bucket::RateLimiter;
#[cfg(feature = "leaky-bucket")]
use std::sync::Arc;
use std::time::Duration;

use crate::internal::NuanceRequestHelper;

pub const DICTATION_URL: &str =
    "https://dictation.nuancemobility.net:443/NMDPAsrCmdServlet/dictation";
pub const TTS_URL: &str = "https://tts.nuancemobility.net/NMDPTTSCmdServlet/tts";

/// Client for the Nuance HTTP speech services.
///
/// Request methods take `&self` and work on a per-call copy of the default
/// headers and payload, so the setters (which need `&mut self`) can never
/// change a request that is already in flight.
#[derive(Clone, Builder)]
pub struct Nuance {
    #[builder(into)]
    pub(crate) app_id: String,
    #[builder(into)]
    pub(crate) app_key: String,
    #[builder(default)]
    pub(crate) client: reqwest::Client,
    #[cfg(feature = "leaky-bucket")]
    pub(crate) leaky_bucket: Option<Arc<RateLimiter>>,
    #[builder(default = DICTATION_URL.to_string(), into)]
    pub(crate) dictation_url: String,
    #[builder(default = TTS_URL.to_string(), into)]
    pub(crate) tts_url: String,
    #[builder(default = HeaderSet::dictation_defaults())]
    pub(crate) dictation_headers: HeaderSet,
    #[builder(skip)]
    pub(crate) payload: Option<Bytes>,
}

impl Nuance {
    /// Create a new client for the given application id and key.
    pub fn new(app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self::builder().app_id(app_id).app_key(app_key).build()
    }

    pub fn load_from_env() -> Result<Self, std::env::VarError> {
        let app_id = std::env::var("NUANCE_APP_ID")?;
        let app_key = std::env::var("NUANCE_APP_KEY")?;
        Ok(Self::new(app_id, app_key))
    }

    /// Replace the HTTP client with one that gives up after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, NuanceError> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    #[cfg(feature = "leaky-bucket")]
    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.leaky_bucket = Some(rate_limiter);
        self
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn dictation_url(&self) -> &str {
        &self.dictation_url
    }

    pub fn tts_url(&self) -> &str {
        &self.tts_url
    }

    /// Default headers every dictation request starts from.
    pub fn dictation_headers(&self) -> &HeaderSet {
        &self.dictation_headers
    }

    /// Replace the default dictation headers wholesale.
    pub fn set_dictation_headers(&mut self, headers: HeaderSet) {
        self.dictation_headers = headers;
    }

    fn ensure_credentials(&self) -> Result<(), NuanceError> {
        if self.app_id.is_empty() || self.app_key.is_empty() {
            return Err(NuanceError::InvalidCredentials);
        }
        Ok(())
    }

    /// Create request helper for internal use
    fn request_helper(&self) -> NuanceRequestHelper {
        NuanceRequestHelper::new(self.client.clone(), &self.app_id, &self.app_key)
    }
}

impl fmt::Debug for Nuance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nuance")
            .field("app_id", &self.app_id)
            .field("app_key", &"[REDACTED]")
            .field("dictation_url", &self.dictation_url)
            .field("tts_url", &self.tts_url)
            .field("dictation_headers", &self.dictation_headers)
            .field("payload_len", &self.payload.as_ref().map(Bytes::len))
            .finish_non_exhaustive()
    }
}
