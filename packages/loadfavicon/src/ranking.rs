//! # Ranking
//!
//! Ordering of loaded favicons by resolution and selection of the favicons
//! matching a [SizeRequest]

use std::{convert::Infallible, fmt, str::FromStr};

use crate::favicon::Favicon;

/// Pixel count of vector images, larger than any raster image
pub const SVG_PIXELS: i64 = i64::MAX;

/// Pixel count of images with an unknown size
pub const UNKNOWN_PIXELS: i64 = -1;

/// Converts a `{width}x{height}` or `svg` size into a number of pixels
///
/// Returns [SVG_PIXELS] for `svg` and [UNKNOWN_PIXELS] for anything that
/// is not a pair of positive integers
pub fn pixels(size: &str) -> i64 {
    let size = size.trim();
    if size.eq_ignore_ascii_case("svg") {
        return SVG_PIXELS;
    }

    parse_dimensions(size).map_or(UNKNOWN_PIXELS, |(width, height)| {
        raster_pixels(width, height)
    })
}

/// Parses a `{width}x{height}` size, the separator is case insensitive
pub fn parse_dimensions(size: &str) -> Option<(u32, u32)> {
    let (width, height) = size.trim().split_once(['x', 'X'])?;
    let width: u32 = width.parse().ok()?;
    let height: u32 = height.parse().ok()?;

    (width > 0 && height > 0).then_some((width, height))
}

/// Pixel count of a raster image, always below [SVG_PIXELS]
pub fn raster_pixels(width: u32, height: u32) -> i64 {
    let area = u64::from(width) * u64::from(height);
    i64::try_from(area).map_or(SVG_PIXELS - 1, |area| area.min(SVG_PIXELS - 1))
}

/// Which favicons to keep from the ones found on a website
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SizeRequest {
    /// Every favicon, largest first
    #[default]
    All,
    /// The SVG favicon if there is one, otherwise the largest raster favicon
    MaxResolution,
    /// The smallest favicon at least as large as the requested size, or the
    /// largest one when none is big enough
    Closest {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },
}

impl SizeRequest {
    /// Parses a size request, empty means [SizeRequest::All], `maxres` and `svg`
    /// mean [SizeRequest::MaxResolution]. Values that are not understood fall
    /// back to [SizeRequest::MaxResolution]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return SizeRequest::All;
        }

        match parse_dimensions(value) {
            Some((width, height)) => SizeRequest::Closest { width, height },
            None => SizeRequest::MaxResolution,
        }
    }
}

impl FromStr for SizeRequest {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(SizeRequest::parse(value))
    }
}

impl fmt::Display for SizeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeRequest::All => Ok(()),
            SizeRequest::MaxResolution => f.write_str("maxres"),
            SizeRequest::Closest { width, height } => write!(f, "{width}x{height}"),
        }
    }
}

/// Orders favicons from the highest resolution to the lowest, SVG first and
/// unknown sizes last. Favicons of equal size keep their discovery order
pub fn rank(mut favicons: Vec<Favicon>) -> Vec<Favicon> {
    favicons.sort_by_key(|favicon| std::cmp::Reverse(favicon.pixels()));
    favicons
}

/// Ranks the loaded favicons and keeps the ones matching `request`
pub fn select(favicons: Vec<Favicon>, request: SizeRequest) -> Vec<Favicon> {
    let loaded = favicons.into_iter().filter(Favicon::is_loaded).collect();
    let mut ranked = rank(loaded);

    let index = match request {
        SizeRequest::All => return ranked,
        SizeRequest::MaxResolution => 0,
        SizeRequest::Closest { width, height } => {
            let requested = raster_pixels(width, height);

            // Lowest resolution that satisfies the request, otherwise the largest
            ranked
                .iter()
                .rposition(|favicon| favicon.pixels() >= requested)
                .unwrap_or(0)
        }
    };

    if index >= ranked.len() {
        return Vec::new();
    }

    vec![ranked.swap_remove(index)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dimensions::Dimensions, favicon::IconSize};
    use bytes::Bytes;
    use url::Url;

    fn loaded(name: &str, size: Option<IconSize>) -> Favicon {
        let website = Url::parse("https://example.com/").unwrap();
        let icon = website.join(name).unwrap();
        let mut favicon = Favicon::new(website, icon);
        favicon.image = Some(Bytes::from_static(b"image"));
        favicon.resolved_size = size;
        favicon
    }

    fn raster(width: u32, height: u32) -> Option<IconSize> {
        Some(IconSize::Raster(Dimensions { width, height }))
    }

    fn names(favicons: &[Favicon]) -> Vec<&str> {
        favicons
            .iter()
            .map(|favicon| favicon.icon_url.path())
            .collect()
    }

    #[test]
    fn test_pixels() {
        assert_eq!(pixels("16x16"), 256);
        assert_eq!(pixels("32X16"), 512);
        assert_eq!(pixels(" 180x180 "), 32400);
        assert_eq!(pixels("svg"), SVG_PIXELS);
        assert_eq!(pixels("SVG"), SVG_PIXELS);
    }

    #[test]
    fn test_pixels_is_order_independent() {
        for (width, height) in [(1, 2), (16, 32), (57, 114), (300, 7)] {
            assert_eq!(
                pixels(&format!("{width}x{height}")),
                pixels(&format!("{height}x{width}"))
            );
            assert_eq!(pixels(&format!("{width}x{height}")), width * height);
        }
    }

    #[test]
    fn test_pixels_malformed() {
        for size in [
            "", "any", "16", "16x", "x16", "16x16x16", "0x16", "-1x5", "abcxdef", "16 x 16",
        ] {
            assert_eq!(pixels(size), UNKNOWN_PIXELS, "{size}");
        }
    }

    #[test]
    fn test_raster_pixels_stays_below_svg() {
        assert!(raster_pixels(u32::MAX, u32::MAX) < SVG_PIXELS);
    }

    #[test]
    fn test_size_request_parse() {
        assert_eq!(SizeRequest::parse(""), SizeRequest::All);
        assert_eq!(SizeRequest::parse("  "), SizeRequest::All);
        assert_eq!(SizeRequest::parse("maxres"), SizeRequest::MaxResolution);
        assert_eq!(SizeRequest::parse("svg"), SizeRequest::MaxResolution);
        assert_eq!(SizeRequest::parse("large"), SizeRequest::MaxResolution);
        assert_eq!(
            SizeRequest::parse("64X64"),
            SizeRequest::Closest {
                width: 64,
                height: 64
            }
        );
        assert_eq!("32x32".parse::<SizeRequest>().unwrap().to_string(), "32x32");
    }

    #[test]
    fn test_rank_svg_first_unknown_last() {
        let ranked = rank(vec![
            loaded("unknown.ico", None),
            loaded("small.png", raster(16, 16)),
            loaded("huge.png", raster(4096, 4096)),
            loaded("logo.svg", Some(IconSize::Svg)),
        ]);

        assert_eq!(
            names(&ranked),
            ["/logo.svg", "/huge.png", "/small.png", "/unknown.ico"]
        );
    }

    #[test]
    fn test_rank_is_stable() {
        let ranked = rank(vec![
            loaded("a.png", raster(32, 32)),
            loaded("b.png", raster(64, 64)),
            loaded("c.png", raster(32, 32)),
            loaded("d.png", raster(16, 64)),
        ]);

        assert_eq!(names(&ranked), ["/b.png", "/a.png", "/c.png", "/d.png"]);
    }

    #[test]
    fn test_select_all() {
        let selected = select(
            vec![
                loaded("a.png", raster(16, 16)),
                loaded("b.png", raster(32, 32)),
            ],
            SizeRequest::All,
        );

        assert_eq!(names(&selected), ["/b.png", "/a.png"]);
    }

    #[test]
    fn test_select_max_resolution_prefers_svg() {
        let selected = select(
            vec![
                loaded("big.png", raster(512, 512)),
                loaded("logo.svg", Some(IconSize::Svg)),
            ],
            SizeRequest::MaxResolution,
        );

        assert_eq!(names(&selected), ["/logo.svg"]);
    }

    #[test]
    fn test_select_max_resolution_raster() {
        let selected = select(
            vec![
                loaded("a.png", raster(16, 16)),
                loaded("b.png", raster(180, 180)),
                loaded("c.ico", None),
            ],
            SizeRequest::MaxResolution,
        );

        assert_eq!(names(&selected), ["/b.png"]);
    }

    #[test]
    fn test_select_closest() {
        let favicons = vec![
            loaded("16.png", raster(16, 16)),
            loaded("64.png", raster(64, 64)),
            loaded("32.png", raster(32, 32)),
        ];

        let request = SizeRequest::Closest {
            width: 20,
            height: 20,
        };
        assert_eq!(names(&select(favicons.clone(), request)), ["/32.png"]);

        let request = SizeRequest::Closest {
            width: 32,
            height: 32,
        };
        assert_eq!(names(&select(favicons.clone(), request)), ["/32.png"]);

        // Nothing is large enough, the largest is used
        let request = SizeRequest::Closest {
            width: 128,
            height: 128,
        };
        assert_eq!(names(&select(favicons, request)), ["/64.png"]);
    }

    #[test]
    fn test_select_skips_unloaded() {
        let mut unloaded = loaded("big.png", raster(256, 256));
        unloaded.image = None;

        let selected = select(
            vec![unloaded, loaded("small.png", raster(16, 16))],
            SizeRequest::MaxResolution,
        );

        assert_eq!(names(&selected), ["/small.png"]);
    }

    #[test]
    fn test_select_empty() {
        assert!(select(Vec::new(), SizeRequest::MaxResolution).is_empty());
        assert!(select(Vec::new(), SizeRequest::Closest { width: 16, height: 16 }).is_empty());
    }
}
