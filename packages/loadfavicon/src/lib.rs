#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Load Favicon
//!
//! Discovers the favicons declared by a website, downloads and validates
//! them, ranks them by resolution and writes the selected ones to disk
//!
//! ## Environment Variables
//!
//! * `LOADFAVICON_HTTP_PROXY` - Proxy server address to use for HTTP requests
//! * `LOADFAVICON_HTTPS_PROXY` - Proxy server address to use for HTTPS requests
//! * `LOADFAVICON_USER_AGENT` - User agent to send with requests
//! * `LOADFAVICON_CONNECT_TIMEOUT` - Timeout in seconds when connecting
//! * `LOADFAVICON_READ_TIMEOUT` - Timeout in seconds between reads of a response
//! * `LOADFAVICON_TIMEOUT` - Timeout in seconds for a whole request
//! * `LOADFAVICON_DENY_PRIVATE_NETWORKS` - Refuse pages and icons on non-global addresses
//! * `LOADFAVICON_MAX_ICON_SIZE` - Maximum size in bytes of a favicon image

use std::{num::ParseIntError, sync::Arc, time::Duration};

use reqwest::Proxy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod dimensions;
mod document;
mod download;
mod download_image;
mod favicon;
mod filename;
mod observer;
mod ranking;
mod request;
mod storage;
mod svg;
mod url_resolution;
mod url_validation;
mod validation;

pub use dimensions::{
    Dimensions, HeaderDecoder, HeaderDecoderRegistry, ProbeError, probe_dimensions,
};
pub use document::{FAVICON_EXTENSIONS, FAVICON_RELS, parse_favicon_links};
pub use download::{DownloadError, DownloadOptions};
pub use download_image::{DEFAULT_MAX_ICON_SIZE, FetchIconError};
pub use favicon::{Favicon, IconSize};
pub use filename::{favicon_file_name, slugify};
pub use observer::{
    FaviconEvent, FaviconObserver, MpscObserver, NoopObserver, SkipReason, TracingObserver,
};
pub use ranking::{SizeRequest, UNKNOWN_PIXELS, SVG_PIXELS, pixels, rank, select};
pub use request::DEFAULT_USER_AGENT;
pub use reqwest::Url;
pub use svg::is_valid_svg;
pub use url_resolution::{UrlError, resolve_url};
pub use url_validation::DisallowedUrlReason;
pub use validation::{ACCEPTED_IMAGE_TYPES, ValidatedImage, ValidationError, validate_image};

use document::{PageResponse, load_favicon_page};
use download_image::download_favicon_image;
use url_resolution::{bare_host, is_bare_host, page_identity, path_extension};
use url_validation::{TokioDomainResolver, check_allowed_url};

/// Configuration for the favicon loader
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FaviconLoaderConfig {
    /// HTTP proxy to use when making HTTP requests
    pub http_proxy: Option<String>,
    /// HTTPS proxy to use when making HTTPS requests
    pub https_proxy: Option<String>,
    /// User agent sent with every request
    ///
    /// Default: [DEFAULT_USER_AGENT]
    pub user_agent: String,
    /// Time to wait when attempting to connect before timing out
    ///
    /// This option is ignored if you manually provide a [`reqwest::Client`]
    ///
    /// Default: 5s
    pub connect_timeout: Duration,
    /// Time to wait while downloading a resource before timing out (between each read of data)
    ///
    /// This option is ignored if you manually provide a [`reqwest::Client`]
    ///
    /// Default: 10s
    pub read_timeout: Duration,
    /// Time allowed for a whole request
    ///
    /// This option is ignored if you manually provide a [`reqwest::Client`]
    ///
    /// Default: 5s
    pub timeout: Duration,
    /// Refuse to fetch pages and icons whose host is an IP address or resolves
    /// to an address that is not globally reachable
    ///
    /// Default: false
    pub deny_private_networks: bool,
    /// Maximum size in bytes of a favicon image
    ///
    /// Default: [DEFAULT_MAX_ICON_SIZE]
    pub max_icon_size: u64,
}

/// Errors that could occur when loading the configuration
#[derive(Debug, Error)]
pub enum FaviconLoaderConfigError {
    /// Provided connect timeout was an invalid number
    #[error("LOADFAVICON_CONNECT_TIMEOUT must be a number in seconds: {0}")]
    InvalidConnectTimeout(ParseIntError),
    /// Provided read timeout was an invalid number
    #[error("LOADFAVICON_READ_TIMEOUT must be a number in seconds: {0}")]
    InvalidReadTimeout(ParseIntError),
    /// Provided request timeout was an invalid number
    #[error("LOADFAVICON_TIMEOUT must be a number in seconds: {0}")]
    InvalidTimeout(ParseIntError),
    /// Provided private network setting was not a boolean
    #[error("LOADFAVICON_DENY_PRIVATE_NETWORKS must be true or false, got {0:?}")]
    InvalidDenyPrivateNetworks(String),
    /// Provided maximum icon size was an invalid number
    #[error("LOADFAVICON_MAX_ICON_SIZE must be a number of bytes: {0}")]
    InvalidMaxIconSize(ParseIntError),
}

impl Default for FaviconLoaderConfig {
    fn default() -> Self {
        Self {
            http_proxy: None,
            https_proxy: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(5),
            deny_private_networks: false,
            max_icon_size: DEFAULT_MAX_ICON_SIZE,
        }
    }
}

impl FaviconLoaderConfig {
    /// Load a favicon loader config from its environment variables
    pub fn from_env() -> Result<FaviconLoaderConfig, FaviconLoaderConfigError> {
        let mut config = FaviconLoaderConfig {
            http_proxy: std::env::var("LOADFAVICON_HTTP_PROXY").ok(),
            https_proxy: std::env::var("LOADFAVICON_HTTPS_PROXY").ok(),
            ..Default::default()
        };

        if let Ok(user_agent) = std::env::var("LOADFAVICON_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Ok(connect_timeout) = std::env::var("LOADFAVICON_CONNECT_TIMEOUT") {
            let connect_timeout = connect_timeout
                .parse::<u64>()
                .map_err(FaviconLoaderConfigError::InvalidConnectTimeout)?;

            config.connect_timeout = Duration::from_secs(connect_timeout);
        }

        if let Ok(read_timeout) = std::env::var("LOADFAVICON_READ_TIMEOUT") {
            let read_timeout = read_timeout
                .parse::<u64>()
                .map_err(FaviconLoaderConfigError::InvalidReadTimeout)?;

            config.read_timeout = Duration::from_secs(read_timeout);
        }

        if let Ok(timeout) = std::env::var("LOADFAVICON_TIMEOUT") {
            let timeout = timeout
                .parse::<u64>()
                .map_err(FaviconLoaderConfigError::InvalidTimeout)?;

            config.timeout = Duration::from_secs(timeout);
        }

        if let Ok(deny_private_networks) = std::env::var("LOADFAVICON_DENY_PRIVATE_NETWORKS") {
            config.deny_private_networks = parse_bool(&deny_private_networks).ok_or(
                FaviconLoaderConfigError::InvalidDenyPrivateNetworks(deny_private_networks),
            )?;
        }

        if let Ok(max_icon_size) = std::env::var("LOADFAVICON_MAX_ICON_SIZE") {
            config.max_icon_size = max_icon_size
                .parse::<u64>()
                .map_err(FaviconLoaderConfigError::InvalidMaxIconSize)?;
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Errors that end the loading of a website's favicons
#[derive(Debug, Error)]
pub enum FaviconError {
    /// Website URL could not be resolved
    #[error("invalid website url: {0}")]
    InvalidUrl(#[from] UrlError),

    /// Website URL is not allowed to be fetched
    #[error("website url {url} is not allowed: {reason}")]
    DisallowedUrl {
        /// URL of the website
        url: Url,
        /// Why it is not allowed
        reason: DisallowedUrlReason,
    },

    /// Website page could not be loaded
    #[error("website {url} is unreachable: {source}")]
    UnreachableWebsite {
        /// URL of the page
        url: Url,
        /// Request failure
        source: reqwest::Error,
    },

    /// Website did not serve an HTML page, even at its bare host
    #[error("unable to find favicon for {0}")]
    NoFaviconFound(Url),
}

/// Favicon links discovered on a website
struct Discovery {
    /// Identity of the requested website
    website_url: Url,
    /// Final URL of the page the links were read from
    page_url: Url,
    /// Favicons in document order
    favicons: Vec<Favicon>,
}

/// Loader for website favicons
pub struct FaviconLoader {
    client: reqwest::Client,
    observer: Arc<dyn FaviconObserver>,
    decoders: HeaderDecoderRegistry,
    user_agent: String,
    deny_private_networks: bool,
    max_icon_size: u64,
}

impl FaviconLoader {
    /// Creates a new loader using the default configuration
    pub fn new() -> reqwest::Result<Self> {
        Self::from_config(Default::default())
    }

    /// Create a loader from the provided client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
            observer: Arc::new(NoopObserver),
            decoders: HeaderDecoderRegistry::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            deny_private_networks: false,
            max_icon_size: DEFAULT_MAX_ICON_SIZE,
        }
    }

    /// Create a loader from the provided config
    pub fn from_config(config: FaviconLoaderConfig) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(http_proxy) = config.http_proxy.clone() {
            builder = builder.proxy(Proxy::http(http_proxy)?);
        }

        if let Some(https_proxy) = config.https_proxy.clone() {
            builder = builder.proxy(Proxy::https(https_proxy)?);
        }

        let client = builder
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .timeout(config.timeout)
            .build()?;

        let mut loader = Self::from_client(client);
        loader.user_agent = config.user_agent;
        loader.deny_private_networks = config.deny_private_networks;
        loader.max_icon_size = config.max_icon_size;

        Ok(loader)
    }

    /// Reports the loader events to `observer`
    pub fn with_observer(mut self, observer: impl FaviconObserver) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Uses `decoder` to read the dimensions of images of the `mime` type
    pub fn with_header_decoder(mut self, mime: &str, decoder: HeaderDecoder) -> Self {
        self.decoders.register(mime, decoder);
        self
    }

    /// Refuses pages and icons on addresses that are not globally reachable
    pub fn with_deny_private_networks(mut self, deny: bool) -> Self {
        self.deny_private_networks = deny;
        self
    }

    /// Sets the maximum size in bytes of a favicon image
    pub fn with_max_icon_size(mut self, max_icon_size: u64) -> Self {
        self.max_icon_size = max_icon_size;
        self
    }

    fn notify(&self, event: FaviconEvent) {
        self.observer.notify(event);
    }

    /// Lists the favicons declared by the website, nothing is downloaded
    ///
    /// When the page declares no favicon the conventional `/favicon.ico` of
    /// its host is returned
    pub async fn get_favicon_links(&self, website: &str) -> Result<Vec<Favicon>, FaviconError> {
        self.discover(website).await.map(|discovery| discovery.favicons)
    }

    async fn discover(&self, website: &str) -> Result<Discovery, FaviconError> {
        let requested = resolve_url(website, None)?;
        let website_url = page_identity(&requested);

        let mut url = requested;
        let mut retried = false;

        loop {
            if self.deny_private_networks {
                check_allowed_url::<TokioDomainResolver>(&url)
                    .await
                    .map_err(|reason| FaviconError::DisallowedUrl {
                        url: url.clone(),
                        reason,
                    })?;
            }

            match load_favicon_page(&self.client, &url, &self.user_agent).await? {
                PageResponse::Html {
                    url: page_url,
                    html,
                } => {
                    if page_url != url {
                        self.notify(FaviconEvent::PageRedirected {
                            from: url.clone(),
                            to: page_url.clone(),
                        });
                    }

                    let mut favicons = parse_favicon_links(&html, &page_url, &website_url);

                    self.notify(FaviconEvent::LinksFound {
                        page: page_url.clone(),
                        count: favicons.len(),
                    });

                    if favicons.is_empty()
                        && let Some(fallback) = Favicon::favicon_ico(website_url.clone(), &page_url)
                    {
                        self.notify(FaviconEvent::FallbackCandidate {
                            icon_url: fallback.icon_url.clone(),
                        });
                        favicons.push(fallback);
                    }

                    return Ok(Discovery {
                        website_url,
                        page_url,
                        favicons,
                    });
                }

                PageResponse::NotText {
                    url: page_url,
                    content_type,
                } => {
                    // Only one attempt at the bare host
                    let retry = (!retried && !is_bare_host(&url)).then(|| bare_host(&url));

                    self.notify(FaviconEvent::PageNotHtml {
                        url: page_url,
                        content_type,
                        retry: retry.clone(),
                    });

                    match retry {
                        Some(retry) => {
                            url = retry;
                            retried = true;
                        }
                        None => return Err(FaviconError::NoFaviconFound(url)),
                    }
                }
            }
        }
    }

    /// Downloads, validates and measures the image of `favicon`
    ///
    /// Failing to read the dimensions of a valid image is not an error, the
    /// favicon is kept with an unknown size
    pub async fn load_favicon(&self, favicon: &mut Favicon) -> Result<(), FetchIconError> {
        if self.deny_private_networks {
            check_allowed_url::<TokioDomainResolver>(&favicon.icon_url)
                .await
                .map_err(FetchIconError::Disallowed)?;
        }

        let bytes = download_favicon_image(
            &self.client,
            &favicon.icon_url,
            &self.user_agent,
            self.max_icon_size,
        )
        .await?;

        let validated = validate_image(&bytes, path_extension(&favicon.icon_url))?;

        let size = if validated.is_svg {
            Some(IconSize::Svg)
        } else {
            match self.decoders.probe(&bytes, &validated.mime) {
                Ok(dimensions) => Some(IconSize::Raster(dimensions)),
                Err(error) => {
                    self.notify(FaviconEvent::ProbeFailed {
                        icon_url: favicon.icon_url.clone(),
                        reason: error.to_string(),
                    });
                    None
                }
            }
        };

        self.notify(FaviconEvent::CandidateAccepted {
            icon_url: favicon.icon_url.clone(),
            mime_type: validated.mime.clone(),
            size,
        });

        favicon.mime_type = Some(validated.mime);
        favicon.resolved_size = size;
        favicon.image = Some(bytes);

        Ok(())
    }

    /// Loads a favicon reporting any failure to the observer, returns
    /// whether the favicon was loaded
    async fn try_load_favicon(&self, favicon: &mut Favicon) -> bool {
        match self.load_favicon(favicon).await {
            Ok(()) => true,
            Err(error) => {
                self.notify(FaviconEvent::CandidateRejected {
                    icon_url: favicon.icon_url.clone(),
                    reason: error.to_string(),
                });
                false
            }
        }
    }

    /// Reads the favicons of a website, returning the loaded favicons
    /// matching `size` from the highest resolution to the lowest
    ///
    /// Favicons that fail to download or validate are left out. An empty
    /// list is returned when none could be loaded
    pub async fn read(
        &self,
        website: &str,
        size: SizeRequest,
    ) -> Result<Vec<Favicon>, FaviconError> {
        let Discovery {
            website_url,
            page_url,
            mut favicons,
        } = self.discover(website).await?;

        let mut attempted_favicon_ico = false;

        for index in fetch_order(&favicons, size) {
            let favicon = &mut favicons[index];
            attempted_favicon_ico |= favicon.is_favicon_ico();

            let loaded = self.try_load_favicon(favicon).await;

            // Nothing ranks above an SVG
            if loaded && size == SizeRequest::MaxResolution && favicon.is_svg() {
                break;
            }
        }

        if !favicons.iter().any(Favicon::is_loaded)
            && !attempted_favicon_ico
            && let Some(mut fallback) = Favicon::favicon_ico(website_url, &page_url)
        {
            self.notify(FaviconEvent::FallbackCandidate {
                icon_url: fallback.icon_url.clone(),
            });

            if self.try_load_favicon(&mut fallback).await {
                favicons.push(fallback);
            }
        }

        Ok(select(favicons, size))
    }
}

/// Order the favicons are fetched in, SVG links go first when only the
/// highest resolution is wanted
fn fetch_order(favicons: &[Favicon], size: SizeRequest) -> Vec<usize> {
    let mut order: Vec<usize> = (0..favicons.len()).collect();

    if size == SizeRequest::MaxResolution {
        order.sort_by_key(|index| !favicons[*index].has_svg_extension());
    }

    order
}
