//! # Request
//!
//! Browser-like GET requests, some websites only serve their pages and icons
//! to clients that look like a browser

use reqwest::{
    Client, RequestBuilder, Url,
    header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA, USER_AGENT},
};

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

/// Headers sent along with every request
const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "sec-ch-ua",
        r#""Not A;Brand";v="99", "Brave";v="115", "Chromium";v="115""#,
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("upgrade-insecure-requests", "1"),
    ("sec-fetch-site", "none"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-user", "?1"),
    ("sec-fetch-dest", "document"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
];

/// Creates a GET request for `url` with browser-like headers
pub fn browser_get(client: &Client, url: Url, user_agent: &str) -> RequestBuilder {
    client.get(url).headers(browser_headers(user_agent))
}

fn browser_headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(BROWSER_HEADERS.len() + 5);
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    let user_agent = HeaderValue::from_str(user_agent)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers.insert(USER_AGENT, user_agent);

    for (name, value) in BROWSER_HEADERS {
        headers.insert(*name, HeaderValue::from_static(*value));
    }

    headers
}
