use std::path::{Path, PathBuf};

use bon::Builder;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{
    HeaderSet, NuanceError,
    headers::{ACCEPT_LANGUAGE, ACCEPT_TOPIC, CONTENT_LANGUAGE, CONTENT_LENGTH},
};

/// Value of the `Accept-Topic` header
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Topic {
    #[default]
    Dictation,
    WebSearch,
    #[serde(rename = "DTV-Search")]
    #[strum(serialize = "DTV-Search")]
    DtvSearch,
}

/// A single dictation (speech-to-text) request
#[derive(Debug, Clone, Builder)]
pub struct DictationRequest {
    /// A unique identifier for the user who sent the audio
    #[builder(into)]
    pub identifier: String,

    /// The language the audio was recorded in (for example `en-US`)
    #[builder(into)]
    pub language: String,

    /// Audio file to upload; falls back to the client's payload when unset
    #[builder(into)]
    pub path: Option<PathBuf>,

    /// Headers merged over the client's defaults, winning on conflict
    pub additional_headers: Option<HeaderSet>,

    /// Overrides the default `Accept-Topic`
    pub topic: Option<Topic>,
}

impl DictationRequest {
    fn audio_path(&self) -> Option<&Path> {
        self.path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    fn validate(&self, has_payload: bool) -> Result<(), NuanceError> {
        if self.language.is_empty() {
            return Err(NuanceError::invalid_options("`language` is required"));
        }
        if self.identifier.is_empty() {
            return Err(NuanceError::invalid_options("`identifier` is required"));
        }
        if self.audio_path().is_none() && !has_payload {
            return Err(NuanceError::invalid_options(
                "either `path` or previously set file content is required",
            ));
        }
        Ok(())
    }

    /// Headers for this call: defaults, then language and topic, then the
    /// caller's overrides, then the payload length.
    fn headers(&self, defaults: &HeaderSet, payload_len: usize) -> HeaderSet {
        let mut headers = defaults
            .clone()
            .with(ACCEPT_LANGUAGE, self.language.as_str())
            .with(CONTENT_LANGUAGE, self.language.as_str());

        if let Some(topic) = self.topic {
            headers.insert(ACCEPT_TOPIC, topic.to_string());
        }
        if let Some(overrides) = &self.additional_headers {
            headers = headers.merge(overrides);
        }

        headers.with(CONTENT_LENGTH, payload_len.to_string())
    }
}

/// Split a transcript body into its newline-delimited segments.
pub(crate) fn split_lines(body: &str) -> Vec<String> {
    body.split('\n').map(str::to_owned).collect()
}

impl crate::Nuance {
    /// Upload audio to the dictation service and return the transcript lines.
    ///
    /// Audio comes from `request.path` when set, otherwise from the payload
    /// set with [`set_file_content`](Self::set_file_content) or
    /// [`load_file`](Self::load_file). Nothing is sent if validation fails.
    pub async fn send_dictation_request(
        &self,
        request: &DictationRequest,
    ) -> Result<Vec<String>, NuanceError> {
        self.ensure_credentials()?;
        request.validate(self.payload.is_some())?;

        let payload: Bytes = match request.audio_path() {
            Some(path) => crate::audio::load_file(path).await?,
            None => self.payload.clone().ok_or_else(|| {
                NuanceError::invalid_options("no file content has been set")
            })?,
        };

        let headers = request
            .headers(&self.dictation_headers, payload.len())
            .to_header_map()?;
        let url = self
            .request_helper()
            .endpoint(&self.dictation_url, &request.identifier)?;

        #[cfg(feature = "leaky-bucket")]
        if let Some(ref limiter) = self.leaky_bucket {
            limiter.acquire_one().await;
        }

        let body = self
            .request_helper()
            .post_audio(url, headers, payload)
            .await?;

        Ok(split_lines(&body))
    }

    /// Callback flavour of [`send_dictation_request`](Self::send_dictation_request).
    /// Exactly one of the two callbacks runs.
    pub async fn send_dictation_request_with<S, E>(
        &self,
        request: &DictationRequest,
        on_success: S,
        on_error: E,
    ) where
        S: FnOnce(Vec<String>),
        E: FnOnce(NuanceError),
    {
        match self.send_dictation_request(request).await {
            Ok(lines) => on_success(lines),
            Err(err) => on_error(err),
        }
    }

    /// Dictate the client's payload.
    #[deprecated(note = "use `send_dictation_request` instead")]
    pub async fn send_request(
        &self,
        language: &str,
        identifier: &str,
        additional_headers: Option<&HeaderSet>,
    ) -> Result<Vec<String>, NuanceError> {
        let request = DictationRequest::builder()
            .language(language)
            .identifier(identifier)
            .maybe_additional_headers(additional_headers.cloned())
            .build();

        self.send_dictation_request(&request).await
    }
}
