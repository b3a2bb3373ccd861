use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when talking to the Nuance speech services
#[derive(Debug, Error)]
pub enum NuanceError {
    /// The application id or key is empty
    #[error("Invalid appID or appKey")]
    InvalidCredentials,

    /// A required request option is missing or unusable
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// A configured endpoint URL could not be parsed
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The source audio file could not be read
    #[error("Failed to read audio file {}: {source}", path.display())]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TTS destination could not be created or written
    #[error("Failed to write output file {}: {source}", path.display())]
    OutputUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The service answered with something other than HTTP 200
    #[error("Remote failure (HTTP {status}): {body}")]
    RemoteFailure { status: u16, body: String },

    /// The request never completed (connection, TLS, timeout, body read)
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl NuanceError {
    /// `true` when the caller supplied something unusable and no request was sent.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::InvalidOptions(_)
                | Self::InvalidUrl(_)
                | Self::FileUnavailable { .. }
        )
    }

    /// `true` when the failure happened on the wire or on the service side.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteFailure { .. } | Self::Transport(_))
    }

    /// HTTP status of a remote failure, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteFailure { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn invalid_options(reason: impl Into<String>) -> Self {
        Self::InvalidOptions(reason.into())
    }
}
