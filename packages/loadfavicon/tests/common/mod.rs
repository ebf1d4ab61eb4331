#![allow(dead_code)]

use loadfavicon::{FaviconEvent, FaviconLoader, MpscObserver};
use tokio::sync::mpsc::UnboundedReceiver;

pub mod images;
pub mod pages;

/// Loader with the default configuration
pub fn create_test_loader() -> FaviconLoader {
    FaviconLoader::new().unwrap()
}

/// Loader reporting its events over a channel
pub fn create_test_loader_with_events() -> (FaviconLoader, UnboundedReceiver<FaviconEvent>) {
    let (observer, rx) = MpscObserver::new();
    let loader = create_test_loader().with_observer(observer);
    (loader, rx)
}

/// Drains the events reported so far
pub fn collect_events(rx: &mut UnboundedReceiver<FaviconEvent>) -> Vec<FaviconEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Host segment of the file names for favicons of the mock server
pub fn server_host_slug(server: &httpmock::MockServer) -> String {
    format!("127-0-0-1-{}", server.port())
}
