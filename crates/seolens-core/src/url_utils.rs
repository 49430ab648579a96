use url::Url;

/// Prefix a bare domain or path with `https://`.
///
/// Inputs that already carry an http(s) scheme are returned untouched.
pub fn ensure_scheme(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Extract the host of a URL, defaulting the scheme to `https://` first.
pub fn domain_of(input: &str) -> Option<String> {
    let formatted = ensure_scheme(input);
    let parsed = Url::parse(&formatted).ok()?;
    parsed.host_str().map(|h| h.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_https_to_bare_domain() {
        assert_eq!(ensure_scheme("example.com"), "https://example.com");
    }

    #[test]
    fn keeps_existing_scheme() {
        assert_eq!(ensure_scheme("http://example.com"), "http://example.com");
        assert_eq!(
            ensure_scheme("https://example.com/page"),
            "https://example.com/page"
        );
    }

    #[test]
    fn extracts_domain() {
        assert_eq!(
            domain_of("example.com/sitemap.xml"),
            Some("example.com".to_string())
        );
        assert_eq!(
            domain_of("https://sub.example.com:8443/x"),
            Some("sub.example.com".to_string())
        );
    }

    #[test]
    fn rejects_unparseable_input() {
        assert_eq!(domain_of("http://"), None);
    }
}
