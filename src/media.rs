use crate::fetcher::FetchOptions;
use crate::PreviewError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Media type the upload pipeline should treat the image as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaTypeOverride {
    #[serde(rename = "thumbnail-link")]
    ThumbnailLink,
}

/// What the preview asks the host's media pipeline to prepare.
#[derive(Debug, Clone)]
pub struct MediaUploadRequest {
    pub image_url: String,
    pub media_type_override: MediaTypeOverride,
    pub fetch_opts: FetchOptions,
}

/// An uploaded image as the messaging layer references it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMessage {
    pub url: Option<String>,
    pub direct_path: Option<String>,
    pub mimetype: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub file_length: Option<u64>,
    pub jpeg_thumbnail: Option<Vec<u8>>,
}

/// Host-supplied media preparation and upload.
///
/// When present, previews embed the uploaded media instead of compressing
/// a thumbnail locally.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn prepare_media(
        &self,
        request: MediaUploadRequest,
    ) -> Result<Option<ImageMessage>, PreviewError>;
}
