use crate::utils::{mime_essence, resolve_url};
use crate::PreviewError;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Normalized metadata produced by every extraction strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPreviewMetadata {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub favicon: Option<String>,
    pub site_name: Option<String>,
    pub media_type: Option<String>,
}

/// Turns a fetched document into preview metadata.
///
/// `Ok(None)` means "nothing to preview" and is not an error. Implementations
/// must never return metadata with an empty title.
pub trait MetadataExtractor: Send + Sync {
    fn extract(
        &self,
        body: &[u8],
        headers: &HashMap<String, String>,
        url: &str,
    ) -> Result<Option<RawPreviewMetadata>, PreviewError>;
}

/// Content-type aware best-effort extraction.
#[derive(Debug, Clone, Default)]
pub struct GenericExtractor;

impl GenericExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataExtractor for GenericExtractor {
    fn extract(
        &self,
        body: &[u8],
        headers: &HashMap<String, String>,
        url: &str,
    ) -> Result<Option<RawPreviewMetadata>, PreviewError> {
        if url.trim().is_empty() {
            return Err(PreviewError::InvalidContent("missing response URL".into()));
        }

        let mime = headers
            .get("content-type")
            .map(|ct| mime_essence(ct))
            .unwrap_or_default();

        let is_document = mime.is_empty()
            || mime == "application/xhtml+xml"
            || mime.starts_with("text/");
        if !is_document {
            debug!(url = %url, content_type = %mime, "Content is not a document, no preview");
            return Ok(None);
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(PreviewError::InvalidContent(format!(
                "empty document body from {url}"
            )));
        }

        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);

        let Some(title) = meta_property(&document, "og:title")
            .or_else(|| meta_name(&document, "twitter:title"))
            .or_else(|| element_text(&document, "title"))
            .or_else(|| element_text(&document, "h1"))
        else {
            debug!(url = %url, "No title found");
            return Ok(None);
        };

        let description = meta_property(&document, "og:description")
            .or_else(|| meta_name(&document, "twitter:description"))
            .or_else(|| meta_name(&document, "description"))
            .or_else(|| first_attr(&document, "meta[itemprop='description']", "content"));

        let image = meta_property(&document, "og:image")
            .or_else(|| meta_name(&document, "twitter:image"))
            .or_else(|| first_attr(&document, "link[rel='image_src']", "href"))
            .or_else(|| first_attr(&document, "img[src]", "src"))
            .and_then(|image| resolve_url(url, &image));

        Ok(Some(RawPreviewMetadata {
            url: canonical_url(&document, url),
            title,
            description,
            image,
            favicon: favicon(&document, url),
            site_name: meta_property(&document, "og:site_name"),
            media_type: meta_property(&document, "og:type").or_else(|| Some("website".into())),
        }))
    }
}

/// Direct Open Graph scraping of an HTML document.
#[derive(Debug, Clone, Default)]
pub struct HtmlScraper;

impl HtmlScraper {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataExtractor for HtmlScraper {
    fn extract(
        &self,
        body: &[u8],
        _headers: &HashMap<String, String>,
        url: &str,
    ) -> Result<Option<RawPreviewMetadata>, PreviewError> {
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);

        let Some(title) =
            meta_property(&document, "og:title").or_else(|| element_text(&document, "title"))
        else {
            debug!(url = %url, "No og:title or <title>, nothing to preview");
            return Ok(None);
        };

        let description =
            meta_property(&document, "og:description").or_else(|| meta_name(&document, "description"));

        let image =
            meta_property(&document, "og:image").and_then(|image| resolve_url(url, &image));

        debug!(title = %title, image = ?image, "Scraped Open Graph metadata");

        Ok(Some(RawPreviewMetadata {
            url: canonical_url(&document, url),
            title,
            description,
            image,
            favicon: favicon(&document, url),
            site_name: meta_property(&document, "og:site_name"),
            media_type: meta_property(&document, "og:type"),
        }))
    }
}

/// Tries each extractor in turn; the first `Some` wins and the first error stops the chain.
pub struct ExtractorChain {
    extractors: Vec<Box<dyn MetadataExtractor>>,
}

impl ExtractorChain {
    pub fn new(extractors: Vec<Box<dyn MetadataExtractor>>) -> Self {
        Self { extractors }
    }
}

impl Default for ExtractorChain {
    fn default() -> Self {
        Self::new(vec![Box::new(HtmlScraper), Box::new(GenericExtractor)])
    }
}

impl MetadataExtractor for ExtractorChain {
    fn extract(
        &self,
        body: &[u8],
        headers: &HashMap<String, String>,
        url: &str,
    ) -> Result<Option<RawPreviewMetadata>, PreviewError> {
        for extractor in &self.extractors {
            if let Some(metadata) = extractor.extract(body, headers, url)? {
                return Ok(Some(metadata));
            }
        }
        Ok(None)
    }
}

fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
}

fn meta_property(document: &Html, property: &str) -> Option<String> {
    first_attr(document, &format!("meta[property='{property}']"), "content")
}

fn meta_name(document: &Html, name: &str) -> Option<String> {
    first_attr(document, &format!("meta[name='{name}']"), "content")
}

fn element_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `og:url`, then `<link rel=canonical>`, then the requested URL.
fn canonical_url(document: &Html, url: &str) -> String {
    meta_property(document, "og:url")
        .or_else(|| first_attr(document, "link[rel='canonical']", "href"))
        .unwrap_or_else(|| url.to_string())
}

fn favicon(document: &Html, url: &str) -> Option<String> {
    let rel = first_attr(document, "link[rel='icon']", "href")
        .or_else(|| first_attr(document, "link[rel='shortcut icon']", "href"))
        .or_else(|| first_attr(document, "link[rel='apple-touch-icon']", "href"))
        .unwrap_or_else(|| "/favicon.ico".to_string());

    resolve_url(url, &rel)
}
