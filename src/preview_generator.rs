use crate::detector::detect_url;
use crate::extractor::{GenericExtractor, MetadataExtractor};
use crate::fetcher::FetchOptions;
use crate::media::{MediaTypeOverride, MediaUploadRequest, MediaUploader};
use crate::thumbnail::{compressed_jpeg_thumbnail, THUMBNAIL_WIDTH_PX};
use crate::{Fetcher, PreviewError, PreviewGenerator, UrlInfo};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, Instrument, Span};

/// Options for one link preview resolution.
#[derive(Clone)]
pub struct UrlGenerationOptions {
    pub thumbnail_width: u32,
    pub fetch_opts: FetchOptions,
    /// When set, thumbnails come from the host's media pipeline instead of
    /// local compression.
    pub upload_image: Option<Arc<dyn MediaUploader>>,
    /// Span every event of the resolution is recorded under.
    pub log_span: Option<Span>,
}

impl Default for UrlGenerationOptions {
    fn default() -> Self {
        Self {
            thumbnail_width: THUMBNAIL_WIDTH_PX,
            fetch_opts: FetchOptions::default(),
            upload_image: None,
            log_span: None,
        }
    }
}

impl fmt::Debug for UrlGenerationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlGenerationOptions")
            .field("thumbnail_width", &self.thumbnail_width)
            .field("fetch_opts", &self.fetch_opts)
            .field("upload_image", &self.upload_image.is_some())
            .field("log_span", &self.log_span)
            .finish()
    }
}

impl UrlGenerationOptions {
    pub fn with_thumbnail_width(mut self, thumbnail_width: u32) -> Self {
        self.thumbnail_width = thumbnail_width;
        self
    }

    pub fn with_fetch_opts(mut self, fetch_opts: FetchOptions) -> Self {
        self.fetch_opts = fetch_opts;
        self
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn MediaUploader>) -> Self {
        self.upload_image = Some(uploader);
        self
    }

    pub fn with_log_span(mut self, span: Span) -> Self {
        self.log_span = Some(span);
        self
    }
}

/// Resolves link previews for message text.
///
/// Holds no state between calls, so one generator can serve any number of
/// concurrent resolutions.
#[derive(Clone)]
pub struct LinkPreviewGenerator {
    opts: UrlGenerationOptions,
    extractor: Arc<dyn MetadataExtractor>,
}

impl Default for LinkPreviewGenerator {
    fn default() -> Self {
        Self::new(UrlGenerationOptions::default())
    }
}

impl LinkPreviewGenerator {
    pub fn new(opts: UrlGenerationOptions) -> Self {
        Self::with_extractor(opts, Arc::new(GenericExtractor::new()))
    }

    pub fn with_extractor(opts: UrlGenerationOptions, extractor: Arc<dyn MetadataExtractor>) -> Self {
        Self { opts, extractor }
    }

    /// Builds the preview for an already detected URL.
    ///
    /// `matched_text` is reported back verbatim as the preview's matched text.
    #[instrument(level = "debug", skip(self, matched_text))]
    pub async fn preview_for_url(
        &self,
        matched_text: &str,
        url: &str,
    ) -> Result<Option<UrlInfo>, PreviewError> {
        match self.assemble(matched_text, url).await {
            Err(e) if e.is_unpreviewable() => {
                debug!(error = %e, url = %url, "No valid content to preview");
                Ok(None)
            }
            Err(e) => {
                e.log();
                Err(e)
            }
            result => result,
        }
    }

    /// Resolves several independent texts concurrently, one result per text.
    pub async fn get_url_info_batch(
        &self,
        texts: &[&str],
    ) -> Vec<Result<Option<UrlInfo>, PreviewError>> {
        let futures: Vec<_> = texts.iter().map(|text| self.get_url_info(text)).collect();
        futures::future::join_all(futures).await
    }

    async fn assemble(
        &self,
        matched_text: &str,
        url: &str,
    ) -> Result<Option<UrlInfo>, PreviewError> {
        let fetcher = Fetcher::new(&self.opts.fetch_opts)?;
        let content = fetcher.fetch(url).await?;

        let Some(metadata) = self
            .extractor
            .extract(&content.body, &content.headers, url)?
            .filter(|metadata| !metadata.title.trim().is_empty())
        else {
            debug!(url = %url, "No title, nothing to preview");
            return Ok(None);
        };

        let mut info = UrlInfo {
            canonical_url: metadata.url,
            matched_text: matched_text.to_string(),
            title: metadata.title,
            description: metadata.description,
            original_thumbnail_url: metadata.image.clone(),
            jpeg_thumbnail: None,
            high_quality_thumbnail: None,
        };

        let Some(image) = metadata.image else {
            return Ok(Some(info));
        };

        if let Some(uploader) = &self.opts.upload_image {
            let media = uploader
                .prepare_media(MediaUploadRequest {
                    image_url: image,
                    media_type_override: MediaTypeOverride::ThumbnailLink,
                    fetch_opts: self.opts.fetch_opts.clone(),
                })
                .await?;

            info.jpeg_thumbnail = media.as_ref().and_then(|m| m.jpeg_thumbnail.clone());
            info.high_quality_thumbnail = media;
        } else {
            match compressed_jpeg_thumbnail(&fetcher, &image, self.opts.thumbnail_width).await {
                Ok(thumbnail) => info.jpeg_thumbnail = Some(thumbnail.buffer),
                Err(e) => {
                    debug!(err = %e, url = %url, image = %image, "error in generating thumbnail");
                }
            }
        }

        Ok(Some(info))
    }
}

#[async_trait]
impl PreviewGenerator for LinkPreviewGenerator {
    async fn get_url_info(&self, text: &str) -> Result<Option<UrlInfo>, PreviewError> {
        let span = self.opts.log_span.clone().unwrap_or_else(Span::current);

        async {
            let Some(url) = detect_url(text) else {
                debug!("No URL in text");
                return Ok(None);
            };
            self.preview_for_url(text, &url).await
        }
        .instrument(span)
        .await
    }
}

/// Given a piece of text, finds the first URL in it and generates its link preview.
///
/// Returns `Ok(None)` when no URL was found or the page has nothing to preview.
pub async fn get_url_info(
    text: &str,
    opts: &UrlGenerationOptions,
) -> Result<Option<UrlInfo>, PreviewError> {
    LinkPreviewGenerator::new(opts.clone()).get_url_info(text).await
}
