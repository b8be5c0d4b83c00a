use url::Url;

/// Directory of the target document, as an absolute URL with a trailing slash.
///
/// A last path segment containing a dot is treated as a file name and dropped:
/// `https://host/en_US/slug/index.html` → `https://host/en_US/slug/`.
pub fn base_href(target: &Url) -> String {
    let path = target.path();
    let dir = match path.rsplit_once('/') {
        Some((head, last)) if last.contains('.') => format!("{}/", head),
        _ if path.ends_with('/') => path.to_string(),
        _ => format!("{}/", path),
    };

    let host = target.host_str().unwrap_or_default();
    match target.port() {
        Some(port) => format!("{}://{}:{}{}", target.scheme(), host, port, dir),
        None => format!("{}://{}{}", target.scheme(), host, dir),
    }
}

/// Insert `<base href="...">` so relative asset URLs resolve against the
/// original host instead of the relay.
///
/// Placement: right after the opening `<head>` tag; else a new head block
/// right after `<html>`; else prepended.
pub fn inject_base_tag(html: &str, href: &str) -> String {
    let tag = format!(r#"<base href="{}">"#, escape_attr(href));
    let lower = html.to_ascii_lowercase();

    if let Some(end) = open_tag_end(&lower, "head") {
        let mut out = String::with_capacity(html.len() + tag.len());
        out.push_str(&html[..end]);
        out.push_str(&tag);
        out.push_str(&html[end..]);
        return out;
    }

    if let Some(end) = open_tag_end(&lower, "html") {
        let mut out = String::with_capacity(html.len() + tag.len() + 16);
        out.push_str(&html[..end]);
        out.push_str("\n<head>");
        out.push_str(&tag);
        out.push_str("</head>");
        out.push_str(&html[end..]);
        return out;
    }

    format!("{}\n{}", tag, html)
}

/// Byte offset just past the `>` of the first `<name>` / `<name ...>` tag.
/// `lower` must be ASCII-lowercased so offsets match the original text.
fn open_tag_end(lower: &str, name: &str) -> Option<usize> {
    let needle = format!("<{}", name);
    let mut from = 0;
    while let Some(rel) = lower[from..].find(&needle) {
        let after = from + rel + needle.len();
        match lower.as_bytes().get(after) {
            Some(b'>') => return Some(after + 1),
            Some(c) if c.is_ascii_whitespace() || *c == b'/' => {
                return lower[after..].find('>').map(|gt| after + gt + 1);
            }
            // `<header>`, `<html5-...>` and friends.
            _ => from = after,
        }
    }
    None
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn href(raw: &str) -> String {
        base_href(&Url::parse(raw).unwrap())
    }

    #[test]
    fn base_href_strips_file_name() {
        assert_eq!(href("https://host/en_US/slug/index.html"), "https://host/en_US/slug/");
        assert_eq!(href("https://host/index.html?x=1#f"), "https://host/");
    }

    #[test]
    fn base_href_keeps_directories() {
        assert_eq!(href("https://host/en_US/slug"), "https://host/en_US/slug/");
        assert_eq!(href("https://host/en_US/slug/"), "https://host/en_US/slug/");
        assert_eq!(href("https://host"), "https://host/");
        assert_eq!(href("http://host:8080/a/b.js"), "http://host:8080/a/");
    }

    #[test]
    fn injects_immediately_after_head() {
        let out = inject_base_tag(
            "<html><head><title>t</title></head><body></body></html>",
            "https://host/en_US/slug/",
        );
        assert!(out.contains(r#"<head><base href="https://host/en_US/slug/"><title>"#));
    }

    #[test]
    fn head_with_attributes_and_uppercase() {
        let out = inject_base_tag(r#"<HTML><HEAD profile="x"><title>t</title>"#, "https://h/");
        assert_eq!(out, r#"<HTML><HEAD profile="x"><base href="https://h/"><title>t</title>"#);
    }

    #[test]
    fn header_element_is_not_head() {
        let out = inject_base_tag("<html><body><header>h</header></body></html>", "https://h/");
        assert_eq!(
            out,
            "<html>\n<head><base href=\"https://h/\"></head><body><header>h</header></body></html>"
        );
    }

    #[test]
    fn prepends_when_no_structure() {
        assert_eq!(inject_base_tag("<p>hi</p>", "https://h/"), "<base href=\"https://h/\">\n<p>hi</p>");
    }

    #[test]
    fn href_is_attribute_escaped() {
        let out = inject_base_tag("<head>", "https://h/?a=1&b=\"2\"");
        assert_eq!(out, "<head><base href=\"https://h/?a=1&amp;b=&quot;2&quot;\">");
    }
}
