use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::{NuanceError, headers::CONTENT_LENGTH};

/// Read a whole audio file into memory.
pub async fn load_file(path: impl AsRef<Path>) -> Result<Bytes, NuanceError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(NuanceError::invalid_options("`path` is empty"));
    }

    let data = tokio::fs::read(path)
        .await
        .map_err(|source| NuanceError::FileUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(path = %path.display(), bytes = data.len(), "loaded audio file");
    Ok(Bytes::from(data))
}

impl crate::Nuance {
    /// Load an audio file and keep it as this client's payload.
    /// Returns the number of bytes loaded.
    pub async fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize, NuanceError> {
        let content = load_file(path).await?;
        let len = content.len();
        self.set_file_content(content);
        Ok(len)
    }

    /// Use already-loaded audio as this client's payload.
    pub fn set_file_content(&mut self, content: impl Into<Bytes>) {
        let content = content.into();
        self.dictation_headers
            .insert(CONTENT_LENGTH, content.len().to_string());
        self.payload = Some(content);
    }

    /// The payload a dictation request without a `path` will upload.
    pub fn file_content(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }
}
