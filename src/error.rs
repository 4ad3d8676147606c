use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Failed to parse URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch content: {0}")]
    FetchError(String),

    #[error("Request timeout: {0}")]
    TimeoutError(String),

    #[error("Connection failed: {0}")]
    ConnectionError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Client error {status}: {message}")]
    ClientError { status: u16, message: String },

    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Content size {size} exceeds limit of {limit} bytes")]
    ContentSizeExceeded { size: usize, limit: usize },

    #[error("Did not receive a valid response: {0}")]
    InvalidContent(String),

    #[error("Failed to extract metadata: {0}")]
    ExtractError(String),

    #[error("Failed to generate thumbnail: {0}")]
    ImageError(String),

    #[error("Media upload failed: {0}")]
    UploadError(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuildError(String),
}

impl PreviewError {
    /// Whether this error only says the fetched content has nothing to preview.
    ///
    /// Such errors resolve to "no preview"; everything else (DNS failures,
    /// timeouts, resets, bad statuses) must reach the caller.
    pub fn is_unpreviewable(&self) -> bool {
        matches!(self, PreviewError::InvalidContent(_))
    }

    /// Classify a transport error from reqwest.
    pub(crate) fn from_reqwest(e: reqwest::Error, url: &str) -> Self {
        if e.is_timeout() {
            PreviewError::TimeoutError(format!("{url}: {e}"))
        } else if e.is_connect() {
            PreviewError::ConnectionError(format!("{url}: {e}"))
        } else {
            PreviewError::FetchError(format!("{url}: {e}"))
        }
    }

    pub(crate) fn from_status(status: reqwest::StatusCode, url: &str) -> Self {
        let message = status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string();

        match status.as_u16() {
            404 => PreviewError::NotFound(format!("{url} not found")),
            code @ 400..=499 => PreviewError::ClientError {
                status: code,
                message,
            },
            code @ 500..=599 => PreviewError::ServerError {
                status: code,
                message,
            },
            code => PreviewError::FetchError(format!("{url}: unexpected status {code}")),
        }
    }

    pub fn log(&self) {
        match self {
            PreviewError::UrlParseError(e) => {
                warn!(error = %e, "URL parsing failed");
            }
            PreviewError::InvalidUrl(e) => {
                warn!(error = %e, "Invalid URL");
            }
            PreviewError::FetchError(e) => {
                error!(error = %e, "Content fetch failed");
            }
            PreviewError::TimeoutError(e) => {
                warn!(error = %e, "Request timed out");
            }
            PreviewError::ConnectionError(e) => {
                error!(error = %e, "Connection failed");
            }
            PreviewError::NotFound(e) => {
                warn!(error = %e, "Resource not found");
            }
            PreviewError::ClientError { status, message } => {
                warn!(status = %status, error = %message, "Client error response");
            }
            PreviewError::ServerError { status, message } => {
                error!(status = %status, error = %message, "Server error response");
            }
            PreviewError::ContentSizeExceeded { size, limit } => {
                warn!(size = %size, limit = %limit, "Content too large");
            }
            PreviewError::InvalidContent(e) => {
                debug!(error = %e, "Nothing to preview");
            }
            PreviewError::ExtractError(e) => {
                error!(error = %e, "Metadata extraction failed");
            }
            PreviewError::ImageError(e) => {
                debug!(error = %e, "Thumbnail generation failed");
            }
            PreviewError::UploadError(e) => {
                error!(error = %e, "Media upload failed");
            }
            PreviewError::ClientBuildError(e) => {
                error!(error = %e, "HTTP client construction failed");
            }
        }
    }
}
