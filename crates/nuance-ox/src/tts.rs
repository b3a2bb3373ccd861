use std::path::{Path, PathBuf};

use bon::Builder;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::{
    fs::File,
    io::{AsyncWrite, AsyncWriteExt},
};
use tracing::{debug, warn};
use url::Url;

use crate::NuanceError;

/// A single text-to-speech request
#[derive(Debug, Clone, Builder)]
pub struct TtsRequest {
    /// A unique identifier for the user who sent the request
    #[builder(into)]
    pub identifier: String,

    /// The text to synthesize
    #[builder(into)]
    pub text: String,

    /// Where the audio is written
    #[builder(into)]
    pub output: PathBuf,

    /// The codec to synthesize into (for example `wav`)
    #[builder(into)]
    pub output_format: String,

    /// Synthesis language, used when no voice is given (for example `en_US`)
    #[builder(into)]
    pub language: Option<String>,

    /// Named voice (for example `Tom`); takes precedence over `language`
    #[builder(into)]
    pub voice: Option<String>,
}

/// Outcome of a completed TTS download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtsOutput {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub content_type: Option<String>,
}

impl TtsRequest {
    /// `("voice", ..)` when a voice is set, otherwise `("ttsLang", ..)`.
    fn voice_or_language(&self) -> Option<(&'static str, &str)> {
        non_empty(self.voice.as_deref())
            .map(|voice| ("voice", voice))
            .or_else(|| non_empty(self.language.as_deref()).map(|lang| ("ttsLang", lang)))
    }

    fn validate(&self) -> Result<(), NuanceError> {
        if self.text.is_empty() {
            return Err(NuanceError::invalid_options("`text` is required"));
        }
        if self.identifier.is_empty() {
            return Err(NuanceError::invalid_options("`identifier` is required"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(NuanceError::invalid_options("`output` is required"));
        }
        if self.output_format.is_empty() {
            return Err(NuanceError::invalid_options("`output_format` is required"));
        }
        if self.voice_or_language().is_none() {
            return Err(NuanceError::invalid_options(
                "either `voice` or `language` is required",
            ));
        }
        Ok(())
    }
}

impl crate::Nuance {
    fn tts_endpoint(&self, request: &TtsRequest) -> Result<Url, NuanceError> {
        let (key, value) = request.voice_or_language().ok_or_else(|| {
            NuanceError::invalid_options("either `voice` or `language` is required")
        })?;

        let mut url = self
            .request_helper()
            .endpoint(&self.tts_url, &request.identifier)?;
        url.query_pairs_mut()
            .append_pair(key, value)
            .append_pair("text", &request.text)
            .append_pair("codec", &request.output_format);
        Ok(url)
    }

    /// Synthesize `request.text` and write the audio to `request.output`.
    ///
    /// The output file is only created once the service has answered with
    /// HTTP 200, and the call resolves only after every byte has been
    /// flushed to disk. A partially written file is removed on failure.
    pub async fn send_tts_request(&self, request: &TtsRequest) -> Result<TtsOutput, NuanceError> {
        self.ensure_credentials()?;
        request.validate()?;

        let url = self.tts_endpoint(request)?;

        #[cfg(feature = "leaky-bucket")]
        if let Some(ref limiter) = self.leaky_bucket {
            limiter.acquire_one().await;
        }

        let response = self.request_helper().get_audio(url).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(str::to_owned);

        // A failed create leaves whatever already sits at `output` alone.
        let file = File::create(&request.output)
            .await
            .map_err(|source| output_error(&request.output, source))?;

        match stream_to_file(response.bytes_stream(), file, &request.output).await {
            Ok(bytes_written) => {
                debug!(
                    path = %request.output.display(),
                    bytes_written,
                    "tts audio written"
                );
                Ok(TtsOutput {
                    path: request.output.clone(),
                    bytes_written,
                    content_type,
                })
            }
            Err(err) => {
                discard_partial(&request.output).await;
                Err(err)
            }
        }
    }

    /// Callback flavour of [`send_tts_request`](Self::send_tts_request).
    /// Exactly one of the two callbacks runs.
    pub async fn send_tts_request_with<S, E>(
        &self,
        request: &TtsRequest,
        on_success: S,
        on_error: E,
    ) where
        S: FnOnce(TtsOutput),
        E: FnOnce(NuanceError),
    {
        match self.send_tts_request(request).await {
            Ok(output) => on_success(output),
            Err(err) => on_error(err),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn output_error(path: &Path, source: std::io::Error) -> NuanceError {
    NuanceError::OutputUnavailable {
        path: path.to_path_buf(),
        source,
    }
}

async fn stream_to_file<S>(body: S, mut file: File, path: &Path) -> Result<u64, NuanceError>
where
    S: Stream<Item = reqwest::Result<Bytes>>,
{
    let written = write_body(body, &mut file, path).await?;
    file.sync_all()
        .await
        .map_err(|source| output_error(path, source))?;
    Ok(written)
}

/// Copy every chunk of `body` into `writer` and flush it.
async fn write_body<S, W>(body: S, writer: &mut W, path: &Path) -> Result<u64, NuanceError>
where
    S: Stream<Item = reqwest::Result<Bytes>>,
    W: AsyncWrite + Unpin,
{
    let mut body = std::pin::pin!(body);
    let mut written = 0_u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|source| output_error(path, source))?;
        written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|source| output_error(path, source))?;
    Ok(written)
}

async fn discard_partial(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "failed to remove partial tts output");
        }
    }
}
