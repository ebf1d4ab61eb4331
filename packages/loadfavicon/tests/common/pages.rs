pub const HTML: &str = "text/html; charset=utf-8";

/// HTML page with the provided elements in its head
pub fn html_page<S: AsRef<str>>(head: &[S]) -> String {
    let head: Vec<&str> = head.iter().map(AsRef::as_ref).collect();
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>Test</title>\n{}\n</head>\n<body><p>Hello</p></body>\n</html>\n",
        head.join("\n")
    )
}

/// `<link/>` element declaring an icon
pub fn icon_link(rel: &str, href: &str, sizes: Option<&str>) -> String {
    match sizes {
        Some(sizes) => format!(r#"<link rel="{rel}" sizes="{sizes}" href="{href}">"#),
        None => format!(r#"<link rel="{rel}" href="{href}">"#),
    }
}
