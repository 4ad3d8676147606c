use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod detector;
mod error;
mod extractor;
mod fetcher;
#[cfg(feature = "logging")]
mod logging;
mod media;
mod preview_generator;
mod thumbnail;
mod utils;

pub use detector::{detect_url, is_valid_url, DEFAULT_SCHEME_PREFIX};
pub use error::PreviewError;
pub use extractor::{
    ExtractorChain, GenericExtractor, HtmlScraper, MetadataExtractor, RawPreviewMetadata,
};
pub use fetcher::{
    normalize_headers, FetchOptions, FetchedContent, Fetcher, RedirectMode, DEFAULT_MAX_BODY_SIZE,
    DEFAULT_TIMEOUT,
};
#[cfg(feature = "logging")]
pub use logging::{
    log_preview_failure, log_url_info, scoped_logging, setup_logging, LogConfig, LogFormat,
};
pub use media::{ImageMessage, MediaTypeOverride, MediaUploadRequest, MediaUploader};
pub use preview_generator::{get_url_info, LinkPreviewGenerator, UrlGenerationOptions};
pub use thumbnail::{
    compressed_jpeg_thumbnail, extract_image_thumb, Thumbnail, THUMBNAIL_WIDTH_PX,
};

/// The preview card attached to an outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlInfo {
    #[serde(rename = "canonical-url")]
    pub canonical_url: String,
    /// The message text the URL was found in, as the user typed it.
    #[serde(rename = "matched-text")]
    pub matched_text: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "originalThumbnailUrl", skip_serializing_if = "Option::is_none")]
    pub original_thumbnail_url: Option<String>,
    #[serde(rename = "jpegThumbnail", skip_serializing_if = "Option::is_none")]
    pub jpeg_thumbnail: Option<Vec<u8>>,
    /// Uploaded media reference; only set when an uploader was configured.
    #[serde(rename = "highQualityThumbnail", skip_serializing_if = "Option::is_none")]
    pub high_quality_thumbnail: Option<ImageMessage>,
}

#[async_trait]
pub trait PreviewGenerator {
    async fn get_url_info(&self, text: &str) -> Result<Option<UrlInfo>, PreviewError>;
}
