use std::path::Path;

use crate::common::{
    collect_events, create_test_loader, create_test_loader_with_events,
    images::{SVG, icon, png, unreadable_icon},
    pages::{HTML, html_page, icon_link},
    server_host_slug,
};
use httpmock::prelude::*;
use loadfavicon::{DownloadError, DownloadOptions, FaviconEvent, SizeRequest, SkipReason};

mod common;

/// Names of the files in `dir`, sorted
fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Mocks a page declaring a 32x32 PNG, a 16x16 icon and an SVG
async fn mock_website(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).header("content-type", HTML).body(html_page(&[
                icon_link("icon", "/favicon.ico", None),
                icon_link("icon", "/favicon-32x32.png", Some("32x32")),
                icon_link("mask-icon", "/safari-pinned-tab.svg", None),
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/favicon.ico");
            then.status(200).body(icon(&[(16, 16)]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/favicon-32x32.png");
            then.status(200).body(png(32, 32));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/safari-pinned-tab.svg");
            then.status(200).body(SVG);
        })
        .await;
}

/// A single favicon.ico link whose header can't be read is written without
/// a size in its name
#[tokio::test]
async fn test_single_unmeasured_favicon() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200)
                .header("content-type", HTML)
                .body(html_page(&[icon_link("icon", "favicon.ico", None)]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/favicon.ico");
            then.status(200).body(unreadable_icon());
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let favicons = create_test_loader()
        .download(&server.url("/"), dir.path(), DownloadOptions::default())
        .await
        .unwrap();

    let expected = format!("{}+.ico", server_host_slug(&server));

    assert_eq!(favicons.len(), 1);
    assert_eq!(favicons[0].file_name(false), expected);
    assert_eq!(file_names(dir.path()), [expected.clone()]);
    assert_eq!(
        std::fs::read(dir.path().join(&expected)).unwrap(),
        unreadable_icon()
    );
}

/// Every favicon is written named after its size
#[tokio::test]
async fn test_download_all_sizes() {
    let server = MockServer::start_async().await;
    mock_website(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let favicons = create_test_loader()
        .download(&server.url("/"), dir.path(), DownloadOptions::default())
        .await
        .unwrap();

    let host = server_host_slug(&server);
    assert_eq!(favicons.len(), 3);
    assert_eq!(
        file_names(dir.path()),
        [
            format!("{host}+16x16.ico"),
            format!("{host}+32x32.png"),
            format!("{host}+svg.svg"),
        ]
    );
    assert_eq!(
        std::fs::read(dir.path().join(format!("{host}+32x32.png"))).unwrap(),
        png(32, 32)
    );
}

/// Names are suffixed with the icon file name
#[tokio::test]
async fn test_download_all_with_suffix() {
    let server = MockServer::start_async().await;
    mock_website(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let count = create_test_loader()
        .download_all(&server.url("/"), dir.path(), false)
        .await
        .unwrap();

    let host = server_host_slug(&server);
    assert_eq!(count, 3);
    assert_eq!(
        file_names(dir.path()),
        [
            format!("{host}+16x16+favicon.ico"),
            format!("{host}+32x32+favicon-32x32.png"),
            format!("{host}+svg+safari-pinned-tab.svg"),
        ]
    );
}

/// The single best favicon is the SVG
#[tokio::test]
async fn test_download_one() {
    let server = MockServer::start_async().await;
    mock_website(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let name = create_test_loader()
        .download_one(&server.url("/"), dir.path(), false)
        .await
        .unwrap();

    let expected = format!("{}+svg.svg", server_host_slug(&server));
    assert_eq!(name, Some(expected.clone()));
    assert_eq!(file_names(dir.path()), [expected]);
}

/// Requesting a size writes the closest favicon
#[tokio::test]
async fn test_download_closest() {
    let server = MockServer::start_async().await;
    mock_website(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let options = DownloadOptions {
        size: SizeRequest::Closest {
            width: 20,
            height: 20,
        },
        ..Default::default()
    };
    create_test_loader()
        .download(&server.url("/"), dir.path(), options)
        .await
        .unwrap();

    assert_eq!(
        file_names(dir.path()),
        [format!("{}+32x32.png", server_host_slug(&server))]
    );
}

/// Downloading again while skipping existing files writes nothing
#[tokio::test]
async fn test_skip_existing_is_idempotent() {
    let server = MockServer::start_async().await;
    mock_website(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let (loader, mut rx) = create_test_loader_with_events();
    let options = DownloadOptions {
        skip_existing: true,
        ..Default::default()
    };

    let first = loader
        .download(&server.url("/"), dir.path(), options)
        .await
        .unwrap();
    assert_eq!(first.len(), 3);
    let names = file_names(dir.path());

    collect_events(&mut rx);

    let second = loader
        .download(&server.url("/"), dir.path(), options)
        .await
        .unwrap();
    assert!(second.is_empty());
    assert_eq!(file_names(dir.path()), names);

    let skipped = collect_events(&mut rx)
        .into_iter()
        .filter(|event| {
            matches!(
                event,
                FaviconEvent::FileSkipped {
                    reason: SkipReason::Exists,
                    ..
                }
            )
        })
        .count();
    assert_eq!(skipped, 3);
}

/// Without skipping, existing files are replaced
#[tokio::test]
async fn test_existing_files_replaced() {
    let server = MockServer::start_async().await;
    mock_website(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let name = format!("{}+32x32.png", server_host_slug(&server));
    std::fs::write(dir.path().join(&name), b"stale").unwrap();

    let favicons = create_test_loader()
        .download(&server.url("/"), dir.path(), DownloadOptions::default())
        .await
        .unwrap();

    assert_eq!(favicons.len(), 3);
    assert_eq!(std::fs::read(dir.path().join(&name)).unwrap(), png(32, 32));
}

/// Favicons mapping to the same file name are only written once, the
/// highest ranked wins
#[tokio::test]
async fn test_duplicate_file_names() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).header("content-type", HTML).body(html_page(&[
                icon_link("icon", "/small/icon.png", None),
                icon_link("icon", "/large/icon.png", None),
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/small/icon.png");
            then.status(200).body(png(16, 16));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/large/icon.png");
            then.status(200).body(png(16, 16));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (loader, mut rx) = create_test_loader_with_events();
    let favicons = loader
        .download(&server.url("/"), dir.path(), DownloadOptions::default())
        .await
        .unwrap();

    assert_eq!(favicons.len(), 1);
    assert_eq!(favicons[0].icon_url.path(), "/small/icon.png");
    assert_eq!(
        file_names(dir.path()),
        [format!("{}+16x16.png", server_host_slug(&server))]
    );

    let events = collect_events(&mut rx);
    assert!(events.iter().any(|event| matches!(
        event,
        FaviconEvent::FileSkipped {
            reason: SkipReason::DuplicateName,
            ..
        }
    )));
}

/// Runs writing the same website into one directory at once all succeed
/// and leave only complete files behind
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_downloads_same_directory() {
    let server = MockServer::start_async().await;
    mock_website(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let loader = std::sync::Arc::new(create_test_loader());
    let url = server.url("/");

    let runs: Vec<_> = (0..4)
        .map(|_| {
            let loader = loader.clone();
            let url = url.clone();
            let directory = dir.path().to_path_buf();
            tokio::spawn(async move {
                loader
                    .download(&url, directory, DownloadOptions::default())
                    .await
            })
        })
        .collect();

    for run in runs {
        assert_eq!(run.await.unwrap().unwrap().len(), 3);
    }

    let host = server_host_slug(&server);
    assert_eq!(
        file_names(dir.path()),
        [
            format!("{host}+16x16.ico"),
            format!("{host}+32x32.png"),
            format!("{host}+svg.svg"),
        ]
    );
    assert_eq!(
        std::fs::read(dir.path().join(format!("{host}+32x32.png"))).unwrap(),
        png(32, 32)
    );
}

/// The destination directory is created when missing
#[tokio::test]
async fn test_creates_directory() {
    let server = MockServer::start_async().await;
    mock_website(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested").join("icons");

    let count = create_test_loader()
        .download_all(&server.url("/"), &target, false)
        .await
        .unwrap();

    assert_eq!(count, 3);
    assert_eq!(file_names(&target).len(), 3);
}

/// Nothing to download is an empty result, the directory is still created
#[tokio::test]
async fn test_nothing_downloaded() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200)
                .header("content-type", HTML)
                .body(html_page::<&str>(&[]));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("icons");
    let (loader, mut rx) = create_test_loader_with_events();

    let name = loader
        .download_one(&server.url("/"), &target, false)
        .await
        .unwrap();

    assert_eq!(name, None);
    assert!(target.is_dir());
    assert!(file_names(&target).is_empty());

    let events = collect_events(&mut rx);
    assert!(
        events
            .iter()
            .any(|event| matches!(event, FaviconEvent::NothingDownloaded { .. }))
    );
}

#[tokio::test]
async fn test_invalid_directory() {
    let server = MockServer::start_async().await;
    let page = server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).header("content-type", HTML).body(html_page::<&str>(&[]));
        })
        .await;

    let result = create_test_loader()
        .download(&server.url("/"), "", DownloadOptions::default())
        .await;

    assert!(matches!(result, Err(DownloadError::InvalidDirectory)));
    assert_eq!(page.hits_async().await, 0);
}

/// Failures reading the website are reported as download errors
#[tokio::test]
async fn test_unreachable_website() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(404);
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let result = create_test_loader()
        .download(&server.url("/"), dir.path(), DownloadOptions::default())
        .await;

    assert!(matches!(
        result,
        Err(DownloadError::Favicon(
            loadfavicon::FaviconError::UnreachableWebsite { .. }
        ))
    ));
}
