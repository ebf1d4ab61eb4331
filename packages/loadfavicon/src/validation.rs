//! # Validation
//!
//! Checks downloaded favicon content is an image type that is accepted,
//! detecting the type from the content rather than the response headers

use image::ImageFormat;
use mime::Mime;
use thiserror::Error;

use crate::svg::is_valid_svg;

/// Image types accepted as favicons
pub const ACCEPTED_IMAGE_TYPES: &[&str] = &[
    "image/x-icon",
    "image/png",
    "image/svg+xml",
    "image/jpeg",
    "image/webp",
    "image/vnd.microsoft.icon",
];

/// Signature of the CUR cursor format, a variant of ICO
const CURSOR_SIGNATURE: &[u8] = &[0x00, 0x00, 0x02, 0x00];

/// Errors that can occur when validating favicon content
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Response body was empty
    #[error("image content is empty")]
    EmptyBody,

    /// Content was detected as a type that is not accepted
    #[error("content type {0} is not an accepted favicon type")]
    UnacceptableContentType(String),

    /// Content was expected to be an SVG document but was not
    #[error("content is not a valid svg document")]
    InvalidSvg,
}

/// Outcome of a successful validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedImage {
    /// Detected mime type of the content
    pub mime: Mime,
    /// Whether the content is a vector image
    pub is_svg: bool,
}

impl ValidatedImage {
    fn svg() -> Self {
        Self {
            mime: mime::IMAGE_SVG,
            is_svg: true,
        }
    }
}

/// Validates the downloaded `bytes` of an icon whose URL path ends with
/// `extension`
///
/// Icons with a `.svg` extension must be valid SVG documents. Other icons
/// must sniff as one of the [ACCEPTED_IMAGE_TYPES], SVG content served under
/// another extension is accepted as SVG
pub fn validate_image(
    bytes: &[u8],
    extension: Option<&str>,
) -> Result<ValidatedImage, ValidationError> {
    if bytes.is_empty() {
        return Err(ValidationError::EmptyBody);
    }

    if extension.is_some_and(|ext| ext.eq_ignore_ascii_case(".svg")) {
        return if is_valid_svg(bytes) {
            Ok(ValidatedImage::svg())
        } else {
            Err(ValidationError::InvalidSvg)
        };
    }

    if let Some(mime) = sniff_image_type(bytes) {
        if !is_accepted(&mime) {
            return Err(ValidationError::UnacceptableContentType(mime.to_string()));
        }

        return Ok(ValidatedImage {
            mime,
            is_svg: false,
        });
    }

    if is_valid_svg(bytes) {
        return Ok(ValidatedImage::svg());
    }

    Err(ValidationError::UnacceptableContentType(
        describe_unknown_content(bytes).to_string(),
    ))
}

/// Whether the mime type is one of the [ACCEPTED_IMAGE_TYPES]
pub fn is_accepted(mime: &Mime) -> bool {
    let essence = mime.essence_str();
    ACCEPTED_IMAGE_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(essence))
}

/// Detects the image type from the magic bytes at the start of the content
pub fn sniff_image_type(bytes: &[u8]) -> Option<Mime> {
    if bytes.starts_with(CURSOR_SIGNATURE) {
        return "image/x-icon".parse().ok();
    }

    let format = image::guess_format(bytes).ok()?;
    format_mime(format).parse().ok()
}

fn format_mime(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Ico => "image/x-icon",
        format => format.to_mime_type(),
    }
}

/// Rough description of content that is not an image, used for reporting
fn describe_unknown_content(bytes: &[u8]) -> &'static str {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return "application/octet-stream";
    };

    let text = text.trim_start().to_ascii_lowercase();
    if text.starts_with("<!doctype html") || text.starts_with("<html") || text.contains("<body")
    {
        "text/html"
    } else {
        "text/plain"
    }
}
