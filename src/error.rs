use reqwest::StatusCode;
use thiserror::Error;

/// Failures that abort a whole download session.
#[derive(Debug, Error)]
pub enum DownloaderError {
    #[error("Failed to fetch application token: {0}")]
    Auth(String),

    #[error("Could not find a Twitch user with the login `{0}`")]
    UserNotFound(String),

    #[error("Failed to look up user `{login}`: {source}")]
    Lookup {
        login: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Why a clip's direct media URL could not be resolved.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("response is missing `{0}`")]
    Missing(&'static str),

    #[error("invalid source url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("payload of {bytes} bytes is below the {floor} byte floor")]
    TooSmall { bytes: u64, floor: u64 },
}
