//! # Dimensions
//!
//! Reads the pixel dimensions of favicon images from their headers without
//! decoding any pixel data. Header decoders are looked up by mime type from a
//! [HeaderDecoderRegistry]

use std::{fmt, io::Cursor};

use image::{ImageError, ImageFormat, ImageReader};
use mime::Mime;
use thiserror::Error;

/// Width and height of a raster image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Creates dimensions rejecting empty images
    pub fn new(width: u32, height: u32) -> Result<Self, ProbeError> {
        if width == 0 || height == 0 {
            return Err(ProbeError::ZeroDimensions);
        }

        Ok(Self { width, height })
    }

    /// Total number of pixels
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Errors that can occur when probing the dimensions of an image
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No decoder is registered for the mime type
    #[error("no header decoder registered for {0}")]
    Unsupported(String),

    /// Image header could not be decoded
    #[error(transparent)]
    Decode(#[from] ImageError),

    /// ICO/CUR directory was truncated or invalid
    #[error("malformed icon directory header")]
    MalformedIcon,

    /// Header reported a zero width or height
    #[error("image header reported zero dimensions")]
    ZeroDimensions,
}

/// Function decoding the dimensions from an image header
pub type HeaderDecoder = fn(&[u8]) -> Result<Dimensions, ProbeError>;

/// Mapping of mime types to the decoder able to read their header
#[derive(Debug, Clone)]
pub struct HeaderDecoderRegistry {
    decoders: Vec<(String, HeaderDecoder)>,
}

impl Default for HeaderDecoderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("image/png", decode_png_header);
        registry.register("image/jpeg", decode_jpeg_header);
        registry.register("image/webp", decode_webp_header);
        registry.register("image/x-icon", decode_icon_header);
        registry.register("image/vnd.microsoft.icon", decode_icon_header);
        registry
    }
}

impl HeaderDecoderRegistry {
    /// Registry without any decoders
    pub fn empty() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    /// Registers `decoder` for the `mime` essence (i.e image/png), replacing
    /// any existing decoder for that type
    pub fn register(&mut self, mime: &str, decoder: HeaderDecoder) {
        let mime = mime.to_ascii_lowercase();

        match self.decoders.iter_mut().find(|(key, _)| *key == mime) {
            Some(entry) => entry.1 = decoder,
            None => self.decoders.push((mime, decoder)),
        }
    }

    /// Finds the decoder for a mime type
    pub fn get(&self, mime: &Mime) -> Option<HeaderDecoder> {
        let essence = mime.essence_str();
        self.decoders
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(essence))
            .map(|(_, decoder)| *decoder)
    }

    /// Probes the dimensions of `bytes` using the decoder for `mime`
    pub fn probe(&self, bytes: &[u8], mime: &Mime) -> Result<Dimensions, ProbeError> {
        let decoder = self
            .get(mime)
            .ok_or_else(|| ProbeError::Unsupported(mime.essence_str().to_string()))?;

        decoder(bytes)
    }
}

/// Probes the dimensions of `bytes` using the default decoders
pub fn probe_dimensions(bytes: &[u8], mime: &Mime) -> Result<Dimensions, ProbeError> {
    HeaderDecoderRegistry::default().probe(bytes, mime)
}

fn decode_png_header(bytes: &[u8]) -> Result<Dimensions, ProbeError> {
    decode_header_with_format(bytes, ImageFormat::Png)
}

fn decode_jpeg_header(bytes: &[u8]) -> Result<Dimensions, ProbeError> {
    decode_header_with_format(bytes, ImageFormat::Jpeg)
}

fn decode_webp_header(bytes: &[u8]) -> Result<Dimensions, ProbeError> {
    decode_header_with_format(bytes, ImageFormat::WebP)
}

/// Reads only the dimensions through the image decoder for `format`
fn decode_header_with_format(bytes: &[u8], format: ImageFormat) -> Result<Dimensions, ProbeError> {
    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format).into_dimensions()?;
    Dimensions::new(width, height)
}

/// Length of the ICONDIR header
const ICON_DIR_LEN: usize = 6;

/// Length of each ICONDIRENTRY
const ICON_DIR_ENTRY_LEN: usize = 16;

/// Decodes the ICO/CUR directory choosing the largest image it contains
///
/// ```text
/// ICONDIR      reserved:u16 (0) type:u16 (1 = ico, 2 = cur) count:u16
/// ICONDIRENTRY width:u8 height:u8 ...14 bytes (0 means 256)
/// ```
fn decode_icon_header(bytes: &[u8]) -> Result<Dimensions, ProbeError> {
    let header = bytes.get(..ICON_DIR_LEN).ok_or(ProbeError::MalformedIcon)?;

    let reserved = u16::from_le_bytes([header[0], header[1]]);
    let kind = u16::from_le_bytes([header[2], header[3]]);
    let count = usize::from(u16::from_le_bytes([header[4], header[5]]));

    if reserved != 0 || !matches!(kind, 1 | 2) || count == 0 {
        return Err(ProbeError::MalformedIcon);
    }

    let entries = bytes
        .get(ICON_DIR_LEN..ICON_DIR_LEN + count * ICON_DIR_ENTRY_LEN)
        .ok_or(ProbeError::MalformedIcon)?;

    entries
        .chunks_exact(ICON_DIR_ENTRY_LEN)
        .map(|entry| Dimensions {
            width: icon_dimension(entry[0]),
            height: icon_dimension(entry[1]),
        })
        .max_by_key(Dimensions::area)
        .ok_or(ProbeError::MalformedIcon)
}

fn icon_dimension(value: u8) -> u32 {
    match value {
        0 => 256,
        value => u32::from(value),
    }
}
