use fancy_regex::{Regex, RegexBuilder};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Scheme assumed when the text does not start with one.
pub const DEFAULT_SCHEME_PREFIX: &str = "https://";

// Matching stays linear in token length, so this only trips on input far
// beyond any realistic message.
const BACKTRACK_LIMIT: usize = 10_000_000;

// Host is either a public dotted IPv4 address or a domain name with a
// letter-only TLD. Private, loopback and link-local ranges never match.
static VALID_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(concat!(
        "(?i)^",
        // protocol identifier
        r"(?:(?:https?|ftp)://)",
        // user:pass authentication, `\S` already covers the colon
        r"(?:\S+@)?",
        "(?:",
        // private & local networks
        r"(?!(?:10|127)(?:\.[0-9]{1,3}){3})",
        r"(?!(?:169\.254|192\.168)(?:\.[0-9]{1,3}){2})",
        r"(?!172\.(?:1[6-9]|2[0-9]|3[0-1])(?:\.[0-9]{1,3}){2})",
        // dotted octets, no 0.0.0.0, no >= 224.0.0.0, no network/broadcast
        r"(?:[1-9][0-9]?|1[0-9][0-9]|2[01][0-9]|22[0-3])",
        r"(?:\.(?:1?[0-9]{1,2}|2[0-4][0-9]|25[0-5])){2}",
        r"(?:\.(?:[1-9][0-9]?|1[0-9][0-9]|2[0-4][0-9]|25[0-4]))",
        "|",
        // host name, labels may not start or end with a dash
        r"(?:[a-z\x{00a1}-\x{10ffff}0-9]+(?:-+[a-z\x{00a1}-\x{10ffff}0-9]+)*)",
        // domain name
        r"(?:\.[a-z\x{00a1}-\x{10ffff}0-9]+(?:-+[a-z\x{00a1}-\x{10ffff}0-9]+)*)*",
        // TLD
        r"(?:\.(?:[a-z\x{00a1}-\x{10ffff}]{2,}))",
        r"\.?",
        ")",
        // port
        r"(?::[0-9]{2,5})?",
        // resource path
        r"(?:[/?#]\S*)?",
        "$",
    ))
    .backtrack_limit(BACKTRACK_LIMIT)
    .build()
    .expect("valid URL regex")
});

/// Whether a single token satisfies the URL grammar.
pub fn is_valid_url(token: &str) -> bool {
    match VALID_URL_REGEX.is_match(token) {
        Ok(matched) => matched,
        Err(e) => {
            // backtrack limit on pathological input
            warn!(error = %e, "URL grammar evaluation aborted");
            false
        }
    }
}

/// Finds the first URL in free text.
///
/// Text that does not begin with `http://` or `https://` is treated as if
/// it did begin with `https://`, so a bare `example.com/page` resolves to
/// `https://example.com/page`. Only the first matching token is returned.
pub fn detect_url(text: &str) -> Option<String> {
    let prefixed;
    let text = if text.starts_with("https://") || text.starts_with("http://") {
        text
    } else {
        prefixed = format!("{DEFAULT_SCHEME_PREFIX}{text}");
        prefixed.as_str()
    };

    let detected = text
        .replace('\n', " ")
        .split_whitespace()
        .find(|token| is_valid_url(token))
        .map(String::from);

    debug!(url = ?detected, "URL detection finished");
    detected
}
