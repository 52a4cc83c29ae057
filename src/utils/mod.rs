//! Utility functions and helpers.

pub mod date;
pub mod http;
pub mod retry;
pub mod text;

use url::Url;

/// Resolve a potentially relative link against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    base.join(href.trim()).ok()
}

/// Resolve a link and drop its fragment, giving the key used to tell
/// crawled pages apart.
pub fn normalize_link(base: &Url, href: &str) -> Option<Url> {
    let mut url = resolve_url(base, href)?;
    url.set_fragment(None);
    Some(url)
}

/// Whether two URLs point at the same host and port.
pub fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str().is_some()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/path/").unwrap();
        assert_eq!(
            resolve_url(&base, "page.html").unwrap().as_str(),
            "https://example.com/path/page.html"
        );
        assert_eq!(
            resolve_url(&base, "/root.html").unwrap().as_str(),
            "https://example.com/root.html"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x").unwrap().as_str(),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_normalize_link_drops_fragment() {
        let base = Url::parse("http://forum.onion/index.php").unwrap();
        assert_eq!(
            normalize_link(&base, "viewtopic.php?t=4#p17").unwrap().as_str(),
            "http://forum.onion/viewtopic.php?t=4"
        );
    }

    #[test]
    fn test_same_host() {
        let a = Url::parse("http://forum.onion/a").unwrap();
        let b = Url::parse("http://forum.onion:80/b").unwrap();
        let c = Url::parse("http://forum.onion:8080/b").unwrap();
        let d = Url::parse("http://mirror.onion/a").unwrap();
        let js = Url::parse("javascript:void(0)").unwrap();

        assert!(same_host(&a, &b));
        assert!(!same_host(&a, &c));
        assert!(!same_host(&a, &d));
        assert!(!same_host(&js, &js));
    }
}
