//! # Favicon
//!
//! Favicon candidate found on a website, filled in as it is downloaded,
//! validated and measured

use std::fmt;

use bytes::Bytes;
use mime::Mime;
use url::Url;

use crate::{
    dimensions::Dimensions,
    filename::favicon_file_name,
    ranking::{SVG_PIXELS, UNKNOWN_PIXELS, raster_pixels},
    url_resolution::{bare_host, path_basename, path_extension},
};

/// Size of a favicon determined from its content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSize {
    /// Vector image, ranks above any raster size
    Svg,
    /// Raster image with dimensions read from its header
    Raster(Dimensions),
}

impl IconSize {
    /// Number of pixels used when ranking icons
    pub fn pixels(&self) -> i64 {
        match self {
            IconSize::Svg => SVG_PIXELS,
            IconSize::Raster(dimensions) => raster_pixels(dimensions.width, dimensions.height),
        }
    }
}

impl fmt::Display for IconSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IconSize::Svg => f.write_str("svg"),
            IconSize::Raster(dimensions) => write!(f, "{dimensions}"),
        }
    }
}

/// Favicon referenced by a website
#[derive(Debug, Clone)]
pub struct Favicon {
    /// Page the favicon belongs to, without user info, query or fragment
    pub website_url: Url,
    /// Absolute URL of the icon file
    pub icon_url: Url,
    /// `rel` attribute of the `<link/>` element the icon was found in
    pub rel: Option<String>,
    /// `sizes` attribute of the `<link/>` element
    pub declared_size: Option<String>,
    /// `color` attribute of the `<link/>` element
    pub color: Option<String>,
    /// Mime type detected from the downloaded content
    pub mime_type: Option<Mime>,
    /// Downloaded image content
    pub image: Option<Bytes>,
    /// Size determined from the downloaded content
    pub resolved_size: Option<IconSize>,
}

impl Favicon {
    /// Creates a favicon that has not been loaded yet
    pub fn new(website_url: Url, icon_url: Url) -> Self {
        Self {
            website_url,
            icon_url,
            rel: None,
            declared_size: None,
            color: None,
            mime_type: None,
            image: None,
            resolved_size: None,
        }
    }

    /// Creates the conventional `/favicon.ico` candidate for the host serving
    /// `page_url`
    pub fn favicon_ico(website_url: Url, page_url: &Url) -> Option<Self> {
        page_url.host_str()?;

        let mut icon_url = bare_host(page_url);
        icon_url.set_path("/favicon.ico");

        Some(Self::new(website_url, icon_url))
    }

    /// Whether the image has been downloaded
    pub fn is_loaded(&self) -> bool {
        self.image.as_ref().is_some_and(|image| !image.is_empty())
    }

    /// Whether the icon URL points to a `.svg` file
    pub fn has_svg_extension(&self) -> bool {
        path_extension(&self.icon_url).is_some_and(|ext| ext.eq_ignore_ascii_case(".svg"))
    }

    /// Whether the icon URL points to a file named `favicon.ico`
    pub fn is_favicon_ico(&self) -> bool {
        path_basename(&self.icon_url).is_some_and(|name| name.eq_ignore_ascii_case("favicon.ico"))
    }

    /// Whether the loaded content was a vector image
    pub fn is_svg(&self) -> bool {
        matches!(self.resolved_size, Some(IconSize::Svg))
    }

    /// Number of pixels of the loaded icon, `-1` when unknown
    pub fn pixels(&self) -> i64 {
        self.resolved_size
            .map_or(UNKNOWN_PIXELS, |size| size.pixels())
    }

    /// Size used for naming, the resolved size when known otherwise the size
    /// declared by the page
    pub fn size_label(&self) -> Option<String> {
        self.resolved_size
            .map(|size| size.to_string())
            .or_else(|| self.declared_size.clone())
    }

    /// Name of the file this favicon is stored under, when `suffix` is
    /// set the name ends with the icon file name
    pub fn file_name(&self, suffix: bool) -> String {
        let host = website_host(&self.website_url);
        let size = self.size_label();

        favicon_file_name(
            &host,
            size.as_deref(),
            path_basename(&self.icon_url),
            path_extension(&self.icon_url),
            suffix,
        )
    }
}

impl fmt::Display for Favicon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, Color:{:?}, Size:{:?}, MimeType:{} Loaded:{}",
            self.icon_url,
            self.color.as_deref().unwrap_or_default(),
            self.size_label().unwrap_or_default(),
            self.mime_type
                .as_ref()
                .map(|mime| mime.essence_str())
                .unwrap_or_default(),
            self.is_loaded()
        )
    }
}

/// Host of the website including any non default port
fn website_host(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}
