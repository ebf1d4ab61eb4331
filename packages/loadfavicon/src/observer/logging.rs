use tracing::{debug, info, warn};

use super::{FaviconEvent, FaviconObserver, SkipReason};

/// Observer reporting events through `tracing`, progress is logged at info
/// level and soft failures as warnings
#[derive(Debug, Default, Clone)]
pub struct TracingObserver;

impl FaviconObserver for TracingObserver {
    fn notify(&self, event: FaviconEvent) {
        match event {
            FaviconEvent::PageRedirected { from, to } => {
                info!(%from, %to, "website redirected");
            }
            FaviconEvent::PageNotHtml {
                url,
                content_type,
                retry: Some(retry),
            } => {
                info!(%url, ?content_type, %retry, "not an html page, trying the bare host");
            }
            FaviconEvent::PageNotHtml {
                url,
                content_type,
                retry: None,
            } => {
                warn!(%url, ?content_type, "not an html page, unable to find favicon");
            }
            FaviconEvent::LinksFound { page, count } => {
                info!(%page, count, "favicon links found");
            }
            FaviconEvent::FallbackCandidate { icon_url } => {
                info!(%icon_url, "no favicon links, trying favicon.ico");
            }
            FaviconEvent::CandidateAccepted {
                icon_url,
                mime_type,
                size,
            } => {
                let size = size.map(|size| size.to_string());
                debug!(%icon_url, %mime_type, ?size, "favicon loaded");
            }
            FaviconEvent::CandidateRejected { icon_url, reason } => {
                warn!(%icon_url, %reason, "favicon rejected");
            }
            FaviconEvent::ProbeFailed { icon_url, reason } => {
                warn!(%icon_url, %reason, "unable to read favicon dimensions");
            }
            FaviconEvent::FileWritten { path, icon_url } => {
                info!(path = %path.display(), %icon_url, "favicon written");
            }
            FaviconEvent::FileSkipped { path, reason } => match reason {
                SkipReason::Exists => {
                    debug!(path = %path.display(), "favicon already exists, skipped");
                }
                SkipReason::DuplicateName => {
                    warn!(path = %path.display(), "favicon file name already written in this run, skipped");
                }
            },
            FaviconEvent::NothingDownloaded { website } => {
                warn!(%website, "no favicon downloaded");
            }
        }
    }
}
