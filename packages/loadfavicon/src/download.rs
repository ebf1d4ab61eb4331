//! # Download
//!
//! Reading a website's favicons and writing the selected ones to a
//! directory

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    FaviconError, FaviconLoader,
    favicon::Favicon,
    observer::{FaviconEvent, SkipReason},
    ranking::SizeRequest,
    storage::{file_exists, write_atomic},
    url_resolution::{page_identity, resolve_url},
};

/// Options controlling which favicons are written and how they are named
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Which favicons to write
    pub size: SizeRequest,
    /// Keep existing files, favicons whose file already exists are skipped
    pub skip_existing: bool,
    /// Suffix the file names with the icon file name
    pub suffix: bool,
}

/// Errors that can occur when downloading favicons
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Favicons could not be read from the website
    #[error(transparent)]
    Favicon(#[from] FaviconError),

    /// Destination directory was empty
    #[error("destination directory is empty")]
    InvalidDirectory,

    /// Destination directory could not be created
    #[error("failed to create destination directory {path}: {source}")]
    CreateDirectory {
        /// Path of the directory
        path: PathBuf,
        /// Underlying failure
        source: std::io::Error,
    },

    /// Favicon file could not be checked or written
    #[error("failed to write {path} after writing {written} favicons: {source}")]
    Filesystem {
        /// Path of the file that failed
        path: PathBuf,
        /// Number of favicons written before the failure
        written: usize,
        /// Underlying failure
        source: std::io::Error,
    },
}

impl FaviconLoader {
    /// Downloads the favicons of a website into `directory`, creating it when
    /// missing
    ///
    /// Returns the favicons that were written, an empty list when the website
    /// has none that could be loaded
    pub async fn download(
        &self,
        website: &str,
        directory: impl AsRef<Path>,
        options: DownloadOptions,
    ) -> Result<Vec<Favicon>, DownloadError> {
        let website_url =
            page_identity(&resolve_url(website, None).map_err(FaviconError::from)?);

        let directory = directory.as_ref();
        if directory.as_os_str().is_empty() || directory.to_string_lossy().trim().is_empty() {
            return Err(DownloadError::InvalidDirectory);
        }

        tokio::fs::create_dir_all(directory)
            .await
            .map_err(|source| DownloadError::CreateDirectory {
                path: directory.to_path_buf(),
                source,
            })?;

        let favicons = self.read(website, options.size).await?;

        let mut written: Vec<Favicon> = Vec::new();
        let mut names: HashSet<String> = HashSet::new();

        for favicon in favicons {
            let name = favicon.file_name(options.suffix);
            let path = directory.join(&name);

            // Lower ranked favicon mapping to an already written name
            if names.contains(&name) {
                self.notify(FaviconEvent::FileSkipped {
                    path,
                    reason: SkipReason::DuplicateName,
                });
                continue;
            }

            if options.skip_existing {
                let exists = match file_exists(&path).await {
                    Ok(exists) => exists,
                    Err(source) => {
                        return Err(DownloadError::Filesystem {
                            path,
                            written: written.len(),
                            source,
                        });
                    }
                };

                if exists {
                    self.notify(FaviconEvent::FileSkipped {
                        path,
                        reason: SkipReason::Exists,
                    });
                    continue;
                }
            }

            let Some(image) = favicon.image.clone() else {
                continue;
            };

            if let Err(source) = write_atomic(&path, image).await {
                return Err(DownloadError::Filesystem {
                    path,
                    written: written.len(),
                    source,
                });
            }

            self.notify(FaviconEvent::FileWritten {
                path,
                icon_url: favicon.icon_url.clone(),
            });

            names.insert(name);
            written.push(favicon);
        }

        if written.is_empty() {
            self.notify(FaviconEvent::NothingDownloaded {
                website: website_url,
            });
        }

        Ok(written)
    }

    /// Downloads every favicon of a website into `directory`, names are
    /// suffixed with the icon file name
    ///
    /// Returns the number of favicons written
    pub async fn download_all(
        &self,
        website: &str,
        directory: impl AsRef<Path>,
        only_missing: bool,
    ) -> Result<usize, DownloadError> {
        let options = DownloadOptions {
            size: SizeRequest::All,
            skip_existing: only_missing,
            suffix: true,
        };

        let written = self.download(website, directory, options).await?;
        Ok(written.len())
    }

    /// Downloads the highest resolution favicon of a website into `directory`,
    /// preferring SVG
    ///
    /// Returns the name of the written file, [None] when nothing was written
    pub async fn download_one(
        &self,
        website: &str,
        directory: impl AsRef<Path>,
        only_missing: bool,
    ) -> Result<Option<String>, DownloadError> {
        let options = DownloadOptions {
            size: SizeRequest::MaxResolution,
            skip_existing: only_missing,
            suffix: false,
        };

        let written = self.download(website, directory, options).await?;
        Ok(written.first().map(|favicon| favicon.file_name(false)))
    }
}
