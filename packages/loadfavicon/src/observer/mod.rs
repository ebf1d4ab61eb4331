//! # Observer
//!
//! Reporting of what happens while favicons are discovered, fetched and
//! written
//!
//! - [NoopObserver] Discards events, the default
//! - [TracingObserver] Emits events as `tracing` log records
//! - [MpscObserver] Sends events over an in-memory channel, used in tests

use std::path::PathBuf;

use mime::Mime;
use url::Url;

use crate::favicon::IconSize;

mod logging;
mod mpsc;
mod noop;

pub use logging::TracingObserver;
pub use mpsc::MpscObserver;
pub use noop::NoopObserver;

/// Receives the events emitted by a [FaviconLoader](crate::FaviconLoader)
pub trait FaviconObserver: Send + Sync + 'static {
    /// Handle an event
    fn notify(&self, event: FaviconEvent);
}

/// Reason an existing file was not written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// File already exists on disk
    Exists,
    /// Another favicon from the same run was already written under the name
    DuplicateName,
}

/// Events emitted while loading favicons
#[derive(Debug, Clone)]
pub enum FaviconEvent {
    /// Page request was redirected
    PageRedirected {
        /// Requested URL
        from: Url,
        /// Final URL
        to: Url,
    },

    /// Page did not serve textual content
    PageNotHtml {
        /// URL of the page
        url: Url,
        /// Content type the page was served with
        content_type: Option<String>,
        /// Bare host URL that will be tried instead, [None] when giving up
        retry: Option<Url>,
    },

    /// Favicon links were extracted from a page
    LinksFound {
        /// URL of the page
        page: Url,
        /// Number of favicon links found
        count: usize,
    },

    /// No links were found, the conventional `/favicon.ico` will be tried
    FallbackCandidate {
        /// URL of the fallback icon
        icon_url: Url,
    },

    /// Favicon was downloaded and validated
    CandidateAccepted {
        /// URL of the icon
        icon_url: Url,
        /// Detected mime type
        mime_type: Mime,
        /// Size of the icon if it could be determined
        size: Option<IconSize>,
    },

    /// Favicon could not be downloaded or was not an acceptable image
    CandidateRejected {
        /// URL of the icon
        icon_url: Url,
        /// Description of the failure
        reason: String,
    },

    /// Dimensions of a raster favicon could not be read, it is kept with an
    /// unknown size
    ProbeFailed {
        /// URL of the icon
        icon_url: Url,
        /// Description of the failure
        reason: String,
    },

    /// Favicon was written to disk
    FileWritten {
        /// Path of the written file
        path: PathBuf,
        /// URL of the icon
        icon_url: Url,
    },

    /// Favicon was not written to disk
    FileSkipped {
        /// Path of the file
        path: PathBuf,
        /// Why it was skipped
        reason: SkipReason,
    },

    /// Nothing was written for the website
    NothingDownloaded {
        /// URL of the website
        website: Url,
    },
}
