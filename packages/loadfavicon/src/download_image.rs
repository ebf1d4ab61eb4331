//! # Download Image
//!
//! Downloading of favicon images, bodies are streamed into memory up to a
//! size limit

use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use reqwest::Url;
use thiserror::Error;
use tracing::debug;

use crate::{
    request::browser_get, url_validation::DisallowedUrlReason, validation::ValidationError,
};

/// Default limit on the size of a favicon image (5MB)
pub const DEFAULT_MAX_ICON_SIZE: u64 = 5 * 1024 * 1024;

/// Error's that can occur when downloading a favicon
#[derive(Debug, Error)]
pub enum FetchIconError {
    /// Icon URL is not allowed to be fetched
    #[error("icon url is not allowed: {0}")]
    Disallowed(DisallowedUrlReason),

    /// Error making the request
    #[error(transparent)]
    Request(reqwest::Error),

    /// Error as the response status
    #[error(transparent)]
    Status(reqwest::Error),

    /// Error when downloading the response
    #[error(transparent)]
    ResponseDownload(reqwest::Error),

    /// Image is larger than the allowed size
    #[error("icon is larger than the {limit} byte limit")]
    TooLarge {
        /// Maximum allowed size in bytes
        limit: u64,
    },

    /// Downloaded content is not an acceptable image
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Downloads the image at `url` into memory, failing if the response is
/// not successful or the body exceeds `max_size` bytes
pub async fn download_favicon_image(
    client: &reqwest::Client,
    url: &Url,
    user_agent: &str,
    max_size: u64,
) -> Result<Bytes, FetchIconError> {
    debug!(%url, "requesting favicon image");

    let response = browser_get(client, url.clone(), user_agent)
        .send()
        .await
        .map_err(FetchIconError::Request)?
        .error_for_status()
        .map_err(FetchIconError::Status)?;

    if response
        .content_length()
        .is_some_and(|length| length > max_size)
    {
        return Err(FetchIconError::TooLarge { limit: max_size });
    }

    let mut stream = response.bytes_stream();
    let mut buffer = BytesMut::new();

    while let Some(chunk) = stream
        .try_next()
        .await
        .map_err(FetchIconError::ResponseDownload)?
    {
        if (buffer.len() + chunk.len()) as u64 > max_size {
            return Err(FetchIconError::TooLarge { limit: max_size });
        }

        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.freeze())
}
