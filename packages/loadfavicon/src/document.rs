//! # Document
//!
//! Loading of website pages and extraction of the favicon links declared in
//! their `<link/>` elements

use mime::Mime;
use reqwest::header::CONTENT_TYPE;
use tl::HTMLTag;
use tracing::debug;
use url::Url;

use crate::{
    FaviconError, favicon::Favicon, request::browser_get, url_resolution::path_extension,
    url_resolution::resolve_url,
};

/// `rel` values of `<link/>` elements that declare favicons
pub const FAVICON_RELS: &[&str] = &[
    "icon",
    "shortcut icon",
    "apple-touch-icon",
    "apple-touch-icon-precomposed",
    "mask-icon",
];

/// Extensions a favicon `href` may have, links without an extension are
/// kept and checked once downloaded
pub const FAVICON_EXTENSIONS: &[&str] = &[".ico", ".png", ".svg", ".jpg", ".jpeg"];

/// Page loaded from a website
#[derive(Debug)]
pub enum PageResponse {
    /// Page served textual content
    Html {
        /// Final URL of the page after following redirects
        url: Url,
        /// Page content
        html: String,
    },

    /// Page served something other than text (an image, a PDF...)
    NotText {
        /// Final URL of the page after following redirects
        url: Url,
        /// Content type the page was served with
        content_type: Option<String>,
    },
}

/// Requests the page at `url` reading its content when it is textual
pub async fn load_favicon_page(
    client: &reqwest::Client,
    url: &Url,
    user_agent: &str,
) -> Result<PageResponse, FaviconError> {
    let unreachable = |source| FaviconError::UnreachableWebsite {
        url: url.clone(),
        source,
    };

    let response = browser_get(client, url.clone(), user_agent)
        .send()
        .await
        .map_err(unreachable)?
        .error_for_status()
        .map_err(unreachable)?;

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    if !content_type.as_deref().is_some_and(is_text_content_type) {
        return Ok(PageResponse::NotText {
            url: final_url,
            content_type,
        });
    }

    let html = response.text().await.map_err(unreachable)?;

    Ok(PageResponse::Html {
        url: final_url,
        html,
    })
}

/// Whether the content type is any `text/*` type
fn is_text_content_type(content_type: &str) -> bool {
    content_type
        .parse::<Mime>()
        .is_ok_and(|mime| mime.type_() == mime::TEXT)
}

/// Extracts the favicon links of an HTML page
///
/// * `html` - Content of the page
/// * `page_url` - Final URL of the page, relative links are resolved against it
/// * `website_url` - URL identifying the website the favicons belong to
///
/// Links are returned in document order without duplicate icon URLs
pub fn parse_favicon_links(html: &str, page_url: &Url, website_url: &Url) -> Vec<Favicon> {
    let dom = match tl::parse(html, tl::ParserOptions::default()) {
        Ok(value) => value,
        Err(error) => {
            debug!(?error, %page_url, "failed to parse page html");
            return Vec::new();
        }
    };

    let parser = dom.parser();
    let mut favicons: Vec<Favicon> = Vec::new();

    let Some(links) = dom.query_selector("link") else {
        return favicons;
    };

    for handle in links {
        let Some(tag) = handle.get(parser).and_then(|node| node.as_tag()) else {
            continue;
        };

        let Some(favicon) = visit_link_tag(tag, page_url, website_url) else {
            continue;
        };

        // Same icon declared more than once
        if favicons
            .iter()
            .any(|existing| existing.icon_url == favicon.icon_url)
        {
            continue;
        }

        favicons.push(favicon);
    }

    favicons
}

/// Visit a link tag attempt to find a favicon image file link:
///
/// <link rel="icon" type="image/x-icon" href="/images/favicon.ico">
/// <link rel="apple-touch-icon" sizes="180x180" href="/apple-touch-icon.png">
/// <link rel="mask-icon" href="/safari-pinned-tab.svg" color="#5bbad5">
fn visit_link_tag(tag: &HTMLTag<'_>, page_url: &Url, website_url: &Url) -> Option<Favicon> {
    let attributes = tag.attributes();

    let attribute = |name: &str| {
        attributes
            .get(name)
            .flatten()
            .map(|value| value.as_utf8_str().trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let rel = normalize_rel(&attribute("rel")?);
    if !FAVICON_RELS.contains(&rel.as_str()) {
        return None;
    }

    let href = attribute("href")?;
    let icon_url = match resolve_url(&href, Some(page_url)) {
        Ok(value) => value,
        Err(error) => {
            debug!(%error, %href, "ignoring favicon link with unusable href");
            return None;
        }
    };

    if let Some(extension) = path_extension(&icon_url)
        && !FAVICON_EXTENSIONS
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    {
        debug!(%rel, %extension, "ignoring favicon link with unmanaged extension");
        return None;
    }

    let mut favicon = Favicon::new(website_url.clone(), icon_url);
    favicon.rel = Some(rel);
    favicon.declared_size = attribute("sizes");
    favicon.color = attribute("color");

    Some(favicon)
}

/// Lowercases the rel collapsing any run of whitespace into a single space
fn normalize_rel(rel: &str) -> String {
    rel.split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
