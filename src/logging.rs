use crate::utils::truncate_str;
use crate::{PreviewError, UrlInfo};
use std::error::Error;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt as subscriber_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Matched text is cut to this display width in log lines.
const TEXT_PREVIEW_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line output for local runs.
    Pretty,
    #[default]
    Compact,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is not set.
    pub filter: String,
    pub format: LogFormat,
    /// Directory for a daily-rotated `link-preview.log`; no file output when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "link_preview=info".into(),
            format: LogFormat::default(),
            log_dir: None,
        }
    }
}

/// Installs the global subscriber.
///
/// When file output is configured the returned guard must be held for as
/// long as logs should be flushed to disk.
pub fn setup_logging(config: &LogConfig) -> io::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let mut layers = Vec::new();

    layers.push(match config.format {
        LogFormat::Pretty => subscriber_fmt::layer().pretty().boxed(),
        LogFormat::Compact => subscriber_fmt::layer().compact().with_target(true).boxed(),
    });

    let mut guard = None;
    if let Some(dir) = &config.log_dir {
        std::fs::create_dir_all(dir)?;
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, "link-preview.log");
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        layers.push(
            subscriber_fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
        guard = Some(worker_guard);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(io::Error::other)?;

    debug!(?config, "Logging initialized");
    Ok(guard)
}

/// Subscriber for the current thread only, dropped with the guard.
pub fn scoped_logging(filter: &str) -> tracing::subscriber::DefaultGuard {
    let subscriber = tracing_subscriber::registry()
        .with(subscriber_fmt::layer().with_test_writer())
        .with(EnvFilter::new(filter));
    tracing::subscriber::set_default(subscriber)
}

/// One structured event summarizing a resolved preview.
pub fn log_url_info(info: &UrlInfo) {
    let thumbnail = match (&info.high_quality_thumbnail, &info.jpeg_thumbnail) {
        (Some(_), _) => "uploaded",
        (None, Some(_)) => "local",
        (None, None) => "none",
    };

    info!(
        canonical_url = %info.canonical_url,
        title = %info.title,
        has_description = info.description.is_some(),
        image = info.original_thumbnail_url.as_deref().unwrap_or("-"),
        thumbnail,
        thumbnail_bytes = info.jpeg_thumbnail.as_ref().map_or(0, Vec::len),
        text = %truncate_str(&info.matched_text, TEXT_PREVIEW_WIDTH),
        "Link preview resolved"
    );
}

/// Records why a text produced no preview, including the error's source chain.
pub fn log_preview_failure(text: &str, error: &PreviewError) {
    let mut cause = String::new();
    let mut source = error.source();
    while let Some(err) = source {
        if !cause.is_empty() {
            cause.push_str(": ");
        }
        cause.push_str(&err.to_string());
        source = err.source();
    }

    warn!(
        error = %error,
        cause = %cause,
        unpreviewable = error.is_unpreviewable(),
        text = %truncate_str(text, TEXT_PREVIEW_WIDTH),
        "Link preview failed"
    );
}
