use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

pub fn webp(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::WebP)
}

/// ICO directory listing images of the provided sizes, image data is not
/// included as only the directory is read
pub fn icon(sizes: &[(u8, u8)]) -> Vec<u8> {
    let mut bytes = vec![0, 0, 1, 0, sizes.len() as u8, 0];
    for (width, height) in sizes {
        bytes.extend_from_slice(&[*width, *height, 0, 0, 1, 0, 32, 0]);
        bytes.extend_from_slice(&[0; 8]);
    }
    bytes
}

/// ICO header announcing no images, detected as an icon but its
/// dimensions can't be read
pub fn unreadable_icon() -> Vec<u8> {
    vec![0, 0, 1, 0, 0, 0]
}

pub const SVG: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 16 16">
  <!-- favicon -->
  <circle cx="8" cy="8" r="8" fill="#336699"/>
</svg>
"##;
