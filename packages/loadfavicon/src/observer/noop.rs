use super::{FaviconEvent, FaviconObserver};

/// No-op observer that doesn't report the event anywhere
#[derive(Debug, Default, Clone)]
pub struct NoopObserver;

impl FaviconObserver for NoopObserver {
    fn notify(&self, event: FaviconEvent) {
        tracing::trace!(?event, "no-op favicon event");
    }
}
