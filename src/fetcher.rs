use crate::PreviewError;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    redirect, Client, Proxy, Response,
};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_USER_AGENT: &str = concat!("link-preview/", env!("CARGO_PKG_VERSION"));

/// Redirect handling for both the page fetch and the image fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RedirectMode {
    /// reqwest's own policy (up to 10 hops, any host).
    #[default]
    Default,
    /// Only follow redirects to the same host or its `www.` twin, at most
    /// `max_redirects` times.
    SameHost { max_redirects: usize },
    /// Never follow redirects.
    None,
}

/// Network options shared by every request of one resolution.
///
/// ```ignore
/// let opts = FetchOptions::default()
///     .with_timeout(Duration::from_secs(5))
///     .with_proxy("http://proxy.internal:3128")
///     .with_header("Accept-Language", "en-US,en;q=0.9");
/// ```
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub proxy_url: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub user_agent: String,
    pub max_body_size: usize,
    pub redirect: RedirectMode,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            proxy_url: None,
            headers: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            redirect: RedirectMode::Default,
        }
    }
}

impl FetchOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn with_redirect(mut self, redirect: RedirectMode) -> Self {
        self.redirect = redirect;
        self
    }
}

/// Body and normalized headers of a successful GET.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    /// URL after redirects.
    pub url: String,
    pub body: Vec<u8>,
    pub headers: HashMap<String, String>,
}

impl FetchedContent {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    max_body_size: usize,
}

impl Fetcher {
    pub fn new(opts: &FetchOptions) -> Result<Self, PreviewError> {
        let mut client_builder = Client::builder()
            .user_agent(opts.user_agent.as_str())
            .timeout(opts.timeout)
            .redirect(redirect_policy(&opts.redirect));

        if let Some(headers) = &opts.headers {
            client_builder = client_builder.default_headers(to_header_map(headers)?);
        }

        if let Some(proxy_url) = &opts.proxy_url {
            let proxy = Proxy::all(proxy_url.as_str()).map_err(|e| {
                error!(error = %e, proxy = %proxy_url, "Invalid proxy URL");
                PreviewError::ClientBuildError(e.to_string())
            })?;
            client_builder = client_builder.proxy(proxy);
        }

        let client = client_builder.build().map_err(|e| {
            error!(error = %e, "Failed to create HTTP client");
            PreviewError::ClientBuildError(e.to_string())
        })?;

        Ok(Self {
            client,
            max_body_size: opts.max_body_size,
        })
    }

    /// Sends the GET and checks the status; the body is left unread.
    #[instrument(level = "debug", skip(self), err)]
    pub async fn open(&self, url: &str) -> Result<Response, PreviewError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            error!(error = %e, url = %url, "Failed to send request");
            PreviewError::from_reqwest(e, url)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url = %url, "Request returned non-success status");
            return Err(PreviewError::from_status(status, url));
        }

        if let Some(length) = response.content_length() {
            check_declared_length(length, self.max_body_size)?;
        }

        Ok(response)
    }

    #[instrument(level = "debug", skip(self), err)]
    pub async fn fetch(&self, url: &str) -> Result<FetchedContent, PreviewError> {
        debug!(url = %url, "Starting fetch request");

        let response = self.open(url).await?;
        let final_url = response.url().to_string();
        let headers = normalize_headers(response.headers());
        let body = read_body(response, url, self.max_body_size).await?;

        debug!(url = %url, content_length = body.len(), "Successfully fetched content");
        Ok(FetchedContent {
            url: final_url,
            body,
            headers,
        })
    }
}

fn check_declared_length(length: u64, limit: usize) -> Result<(), PreviewError> {
    if length > limit as u64 {
        return Err(PreviewError::ContentSizeExceeded {
            size: usize::try_from(length).unwrap_or(usize::MAX),
            limit,
        });
    }
    Ok(())
}

/// Drains a response chunk by chunk, failing once `limit` is passed.
async fn read_body(
    mut response: Response,
    url: &str,
    limit: usize,
) -> Result<Vec<u8>, PreviewError> {
    let mut body = Vec::new();

    while let Some(chunk) = response.chunk().await.map_err(|e| {
        error!(error = %e, url = %url, "Failed to read response body");
        PreviewError::from_reqwest(e, url)
    })? {
        if body.len() + chunk.len() > limit {
            return Err(PreviewError::ContentSizeExceeded {
                size: body.len() + chunk.len(),
                limit,
            });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

/// Lower-cases header names and joins repeated values with `,`.
pub fn normalize_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut normalized: HashMap<String, String> = HashMap::new();

    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        normalized
            .entry(name.as_str().to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    normalized
}

fn to_header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, PreviewError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| PreviewError::ClientBuildError(format!("header {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| PreviewError::ClientBuildError(format!("header {name}: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn redirect_policy(mode: &RedirectMode) -> redirect::Policy {
    match mode {
        RedirectMode::Default => redirect::Policy::default(),
        RedirectMode::None => redirect::Policy::none(),
        RedirectMode::SameHost { max_redirects } => {
            let max_redirects = *max_redirects;
            redirect::Policy::custom(move |attempt| {
                if attempt.previous().len() > max_redirects {
                    return attempt.stop();
                }
                let origin = attempt.previous().first().and_then(|u| u.host_str());
                let target = attempt.url().host_str();
                match (origin, target) {
                    (Some(origin), Some(target)) if is_same_site(origin, target) => {
                        attempt.follow()
                    }
                    _ => attempt.stop(),
                }
            })
        }
    }
}

/// Same host, or the same host with a `www.` prefix on either side.
pub fn is_same_site(origin: &str, target: &str) -> bool {
    origin == target
        || target.strip_prefix("www.") == Some(origin)
        || origin.strip_prefix("www.") == Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{CONTENT_TYPE, SET_COOKIE};

    #[test]
    fn test_normalize_headers_joins_repeated_values() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));

        let normalized = normalize_headers(&headers);
        assert_eq!(normalized.get("content-type").unwrap(), "text/html");
        assert_eq!(normalized.get("set-cookie").unwrap(), "a=1,b=2");
    }

    #[test]
    fn test_normalize_headers_lossy_bytes() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-raw"),
            HeaderValue::from_bytes(b"caf\xe9").unwrap(),
        );

        let normalized = normalize_headers(&headers);
        assert!(normalized.get("x-raw").unwrap().starts_with("caf"));
    }

    #[test]
    fn test_same_site() {
        assert!(is_same_site("example.com", "example.com"));
        assert!(is_same_site("example.com", "www.example.com"));
        assert!(is_same_site("www.example.com", "example.com"));
        assert!(!is_same_site("example.com", "evil.com"));
        assert!(!is_same_site("example.com", "www.www.example.com"));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let opts = FetchOptions::default().with_header("bad header", "x");
        assert!(matches!(
            Fetcher::new(&opts),
            Err(PreviewError::ClientBuildError(_))
        ));
    }

    #[test]
    fn test_declared_length_against_limit() {
        assert!(check_declared_length(1024, 1024).is_ok());
        assert!(matches!(
            check_declared_length(1025, 1024),
            Err(PreviewError::ContentSizeExceeded { size: 1025, limit: 1024 })
        ));
        // larger than any 32-bit usize
        assert!(matches!(
            check_declared_length(u64::MAX, DEFAULT_MAX_BODY_SIZE),
            Err(PreviewError::ContentSizeExceeded { limit: DEFAULT_MAX_BODY_SIZE, .. })
        ));
    }

    #[test]
    fn test_default_options() {
        let opts = FetchOptions::default();
        assert_eq!(opts.timeout, Duration::from_millis(3000));
        assert!(opts.proxy_url.is_none());
        assert_eq!(opts.redirect, RedirectMode::Default);
    }
}
