//! # Filename
//!
//! Deterministic file names for downloaded favicons
//!
//! Names follow the pattern `{host}+{size}[+{basename}]{extension}` where the
//! host, size and basename are slugified and the extension is kept verbatim

/// Converts `value` into a lowercase slug of ASCII letters, digits and single
/// hyphens. Non-ASCII characters are dropped
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut separator = false;

    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if separator && !slug.is_empty() {
                slug.push('-');
            }

            separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_ascii() {
            separator = true;
        }
    }

    slug
}

/// Creates the file name for a favicon
///
/// * `host` - Host (and port) of the website the favicon belongs to
/// * `size` - Size of the icon (`32x32`, `svg`, ...)
/// * `basename` - Last path segment of the icon URL
/// * `extension` - Extension of the icon URL including the dot
/// * `suffix` - Whether to suffix the name with the slugified `basename`
pub fn favicon_file_name(
    host: &str,
    size: Option<&str>,
    basename: Option<&str>,
    extension: Option<&str>,
    suffix: bool,
) -> String {
    let mut name = slugify(host);
    name.push('+');

    if let Some(size) = size {
        name.push_str(&slugify(size));
    }

    if suffix && let Some(basename) = basename {
        let stem = extension
            .and_then(|extension| basename.strip_suffix(extension))
            .unwrap_or(basename);
        let stem = slugify(stem);

        if !stem.is_empty() {
            name.push('+');
            name.push_str(&stem);
        }
    }

    if let Some(extension) = extension {
        name.push_str(extension);
    }

    name
}
