use bytes::Bytes;
use reqwest::{Response, StatusCode, header::HeaderMap};
use tracing::{debug, warn};
use url::Url;

use crate::NuanceError;

/// Builds per-call endpoint URLs and performs the two request shapes the service knows.
pub(crate) struct NuanceRequestHelper {
    client: reqwest::Client,
    app_id: String,
    app_key: String,
}

impl NuanceRequestHelper {
    pub(crate) fn new(client: reqwest::Client, app_id: &str, app_key: &str) -> Self {
        Self {
            client,
            app_id: app_id.to_string(),
            app_key: app_key.to_string(),
        }
    }

    /// `<base_url>?appId=..&appKey=..&id=..`, built fresh from the base on every call.
    pub(crate) fn endpoint(&self, base_url: &str, identifier: &str) -> Result<Url, NuanceError> {
        let mut url = Url::parse(base_url)?;
        url.query_pairs_mut()
            .append_pair("appId", &self.app_id)
            .append_pair("appKey", &self.app_key)
            .append_pair("id", identifier);
        Ok(url)
    }

    /// POST raw audio and return the text body of a 200 response.
    pub(crate) async fn post_audio(
        &self,
        url: Url,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<String, NuanceError> {
        debug!(
            host = url.host_str().unwrap_or_default(),
            path = url.path(),
            bytes = body.len(),
            "sending dictation request"
        );

        let res = self
            .client
            .post(url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        Ok(ensure_ok(res).await?.text().await?)
    }

    /// GET an audio stream; the body is left unread for the caller to stream.
    pub(crate) async fn get_audio(&self, url: Url) -> Result<Response, NuanceError> {
        debug!(
            host = url.host_str().unwrap_or_default(),
            path = url.path(),
            "sending tts request"
        );

        let res = self.client.get(url).send().await?;
        ensure_ok(res).await
    }
}

/// Anything but 200 is a remote failure carrying the status and body.
async fn ensure_ok(res: Response) -> Result<Response, NuanceError> {
    let status = res.status();
    if status == StatusCode::OK {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "nuance request failed");
    Err(NuanceError::RemoteFailure {
        status: status.as_u16(),
        body,
    })
}
