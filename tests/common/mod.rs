#![allow(dead_code)]

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use link_preview::{ImageMessage, MediaUploadRequest, MediaUploader, PreviewError};
use std::io::Cursor;
use std::sync::Mutex;

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([20, 120, 220]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn og_page(title: &str, description: &str, image_url: &str, canonical: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Document Title</title>
    <meta property="og:title" content="{title}">
    <meta property="og:description" content="{description}">
    <meta property="og:image" content="{image_url}">
    <meta property="og:url" content="{canonical}">
</head>
<body><h1>Content</h1></body>
</html>"#
    )
}

/// Uploader double that records requests and answers with a fixed message.
pub struct RecordingUploader {
    pub response: Option<ImageMessage>,
    pub requests: Mutex<Vec<MediaUploadRequest>>,
}

impl RecordingUploader {
    pub fn new(response: Option<ImageMessage>) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MediaUploader for RecordingUploader {
    async fn prepare_media(
        &self,
        request: MediaUploadRequest,
    ) -> Result<Option<ImageMessage>, PreviewError> {
        self.requests.lock().unwrap().push(request);
        Ok(self.response.clone())
    }
}

pub struct FailingUploader;

#[async_trait]
impl MediaUploader for FailingUploader {
    async fn prepare_media(
        &self,
        _request: MediaUploadRequest,
    ) -> Result<Option<ImageMessage>, PreviewError> {
        Err(PreviewError::UploadError("media server unavailable".into()))
    }
}
