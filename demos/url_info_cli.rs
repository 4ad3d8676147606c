use clap::Parser;
use link_preview::{
    FetchOptions, HtmlScraper, LinkPreviewGenerator, PreviewGenerator, UrlGenerationOptions,
};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

/// Resolve the link preview for a chat message.
#[derive(Parser, Debug)]
struct Args {
    /// Message text; the first URL in it is previewed
    text: String,

    /// Thumbnail width in pixels
    #[arg(long, default_value_t = link_preview::THUMBNAIL_WIDTH_PX)]
    width: u32,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 3000)]
    timeout_ms: u64,

    /// Proxy every request through this URL
    #[arg(long)]
    proxy: Option<String>,

    /// Scrape Open Graph tags directly instead of the generic extractor
    #[arg(long)]
    scrape: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    #[cfg(feature = "logging")]
    let _log_guard = link_preview::setup_logging(&link_preview::LogConfig::default())?;

    let mut fetch_opts = FetchOptions::default().with_timeout(Duration::from_millis(args.timeout_ms));
    if let Some(proxy) = args.proxy {
        fetch_opts = fetch_opts.with_proxy(proxy);
    }
    let opts = UrlGenerationOptions::default()
        .with_thumbnail_width(args.width)
        .with_fetch_opts(fetch_opts);

    let generator = if args.scrape {
        LinkPreviewGenerator::with_extractor(opts, Arc::new(HtmlScraper::new()))
    } else {
        LinkPreviewGenerator::new(opts)
    };

    let result = generator.get_url_info(&args.text).await;
    #[cfg(feature = "logging")]
    match &result {
        Ok(Some(info)) => link_preview::log_url_info(info),
        Ok(None) => {}
        Err(e) => link_preview::log_preview_failure(&args.text, e),
    }

    match result? {
        Some(info) => {
            println!("Title:      {}", info.title);
            println!("Canonical:  {}", info.canonical_url);
            if let Some(description) = &info.description {
                println!("Description: {description}");
            }
            if let Some(image) = &info.original_thumbnail_url {
                println!("Image:      {image}");
            }
            match &info.jpeg_thumbnail {
                Some(thumbnail) => println!("Thumbnail:  {} bytes of JPEG", thumbnail.len()),
                None => println!("Thumbnail:  none"),
            }
        }
        None => println!("No preview for this message"),
    }

    Ok(())
}
