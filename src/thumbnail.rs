use crate::{Fetcher, PreviewError};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::{debug, instrument};

pub const THUMBNAIL_WIDTH_PX: u32 = 192;
pub const JPEG_QUALITY: u8 = 50;

/// A re-encoded JPEG thumbnail and the size of the image it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub buffer: Vec<u8>,
    pub original_width: u32,
    pub original_height: u32,
}

/// Fetches an image and generates a thumbnail for it
#[instrument(level = "debug", skip(fetcher), err)]
pub async fn compressed_jpeg_thumbnail(
    fetcher: &Fetcher,
    url: &str,
    width: u32,
) -> Result<Thumbnail, PreviewError> {
    let image = fetcher.fetch(url).await?;
    debug!(url = %url, bytes = image.body.len(), "Fetched image for thumbnail");

    tokio::task::spawn_blocking(move || extract_image_thumb(&image.body, width))
        .await
        .map_err(|e| PreviewError::ImageError(format!("thumbnail task failed: {e}")))?
}

/// Decodes `bytes` and scales the image to `width`, keeping the aspect ratio.
pub fn extract_image_thumb(bytes: &[u8], width: u32) -> Result<Thumbnail, PreviewError> {
    if width == 0 {
        return Err(PreviewError::ImageError("thumbnail width must be positive".into()));
    }

    let image = image::load_from_memory(bytes)
        .map_err(|e| PreviewError::ImageError(format!("failed to decode image: {e}")))?;

    let (original_width, original_height) = (image.width(), image.height());
    if original_width == 0 || original_height == 0 {
        return Err(PreviewError::ImageError("image has no pixels".into()));
    }

    let height = (u64::from(original_height) * u64::from(width) + u64::from(original_width) / 2)
        / u64::from(original_width);
    let height = u32::try_from(height.max(1))
        .map_err(|_| PreviewError::ImageError("thumbnail height overflow".into()))?;

    let resized = image.resize_exact(width, height, FilterType::Triangle).to_rgb8();

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
        .encode_image(&resized)
        .map_err(|e| PreviewError::ImageError(format!("failed to encode JPEG: {e}")))?;

    Ok(Thumbnail {
        buffer,
        original_width,
        original_height,
    })
}
