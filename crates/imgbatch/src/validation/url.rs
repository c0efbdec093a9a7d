/// Returns true if `candidate` parses as a URL with both a scheme and a host.
///
/// Purely syntactic: no DNS lookup, no request.
pub fn is_valid_url(candidate: &str) -> bool {
    match ::url::Url::parse(candidate) {
        Ok(url) => !url.scheme().is_empty() && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_urls() {
        assert!(is_valid_url("http://a/x.jpg"));
        assert!(is_valid_url("https://cdn.example.com/img/1.png?w=200"));
    }

    #[test]
    fn test_rejects_bare_words() {
        assert!(!is_valid_url("not-a-url"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("   "));
    }

    #[test]
    fn test_rejects_urls_without_host() {
        assert!(!is_valid_url("mailto:someone@example.com"));
        assert!(!is_valid_url("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_relative_paths_rejected() {
        assert!(!is_valid_url("/images/x.jpg"));
        assert!(!is_valid_url("images/x.jpg"));
    }
}
