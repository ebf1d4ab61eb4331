use tokio::sync::mpsc;

use super::{FaviconEvent, FaviconObserver};

/// In memory multi-producer single-consumer event channel, used for
/// event handling in tests
#[derive(Debug, Clone)]
pub struct MpscObserver {
    tx: mpsc::UnboundedSender<FaviconEvent>,
}

impl MpscObserver {
    /// Creates the observer along with the receiver for its events
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FaviconEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl FaviconObserver for MpscObserver {
    fn notify(&self, event: FaviconEvent) {
        tracing::debug!(?event, "mpsc favicon event");
        _ = self.tx.send(event);
    }
}
