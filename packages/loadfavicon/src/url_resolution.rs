//! # URL Resolution
//!
//! Turns user provided website addresses and `href` values found in pages into
//! absolute, fetchable http(s) URLs

use thiserror::Error;
use url::{ParseError, Url};

const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Errors that can occur when resolving a URL
#[derive(Debug, Error)]
pub enum UrlError {
    /// Nothing was provided to resolve
    #[error("url is empty")]
    Empty,

    /// Value could not be parsed as a URL
    #[error("failed to parse url: {0}")]
    Parse(#[from] ParseError),

    /// URL uses a scheme other than http or https
    #[error("url scheme {0:?} is not http or https")]
    UnsupportedScheme(String),

    /// URL is missing a host and no base was available to inherit one from
    #[error("url has no host")]
    MissingHost,
}

/// Resolves `raw` into an absolute http(s) URL
///
/// Relative values are resolved against `base` when one is provided. Without a
/// base, values missing a scheme (`example.com`, `//example.com/x`) are treated
/// as `http` URLs. The fragment is removed, the query is kept as some sites use
/// it for cache busting their icons.
pub fn resolve_url(raw: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    // Replace & encoding for query params
    let raw = raw.trim().replace("&amp;", "&");
    if raw.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut url = match Url::parse(&raw) {
        Ok(url) if url.has_host() => url,

        // "example.com:8080" parses as a URL with the scheme "example.com"
        Ok(_) if base.is_none() && !raw.contains("://") && looks_like_host(&raw) => {
            Url::parse(&format!("http://{raw}"))?
        }

        Ok(url) => url,

        Err(ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base.join(&raw)?,

            // Absolute paths can't be used without something to take the host from
            None if !raw.starts_with("//") && raw.starts_with('/') => {
                return Err(UrlError::MissingHost);
            }

            None => Url::parse(&format!("http://{}", raw.trim_start_matches('/')))?,
        },

        Err(err) => return Err(err.into()),
    };

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    Ok(url)
}

/// Checks if a scheme-less value such as `localhost:3000` or `example.com:80`
/// is actually a host with a port
fn looks_like_host(raw: &str) -> bool {
    match raw.split_once(':') {
        Some((head, tail)) => {
            head.contains('.')
                || head.eq_ignore_ascii_case("localhost")
                || tail.starts_with(|c: char| c.is_ascii_digit())
        }
        None => true,
    }
}

/// Creates the identity key for a page URL, stripping the user info, query
/// and fragment
pub fn page_identity(url: &Url) -> Url {
    let mut url = url.clone();
    _ = url.set_username("");
    _ = url.set_password(None);
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Creates the URL for the root of the host serving `url`
pub fn bare_host(url: &Url) -> Url {
    let mut url = page_identity(url);
    url.set_path("/");
    url
}

/// Whether the `url` already points at the root of its host
pub fn is_bare_host(url: &Url) -> bool {
    url.path() == "/" && url.query().is_none()
}

/// Last segment of the URL path, [None] when the path ends with a slash
pub fn path_basename(url: &Url) -> Option<&str> {
    url.path_segments()?
        .next_back()
        .filter(|segment| !segment.is_empty())
}

/// Extension of the last URL path segment including its leading dot
pub fn path_extension(url: &Url) -> Option<&str> {
    let basename = path_basename(url)?;
    let index = basename.rfind('.')?;
    Some(&basename[index..])
}
