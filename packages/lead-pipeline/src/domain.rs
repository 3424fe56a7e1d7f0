//! Dedup keys for advertisers.
//!
//! The key is the lower-cased host with a leading `www.` removed, collapsed to
//! its last two labels. Multi-part public suffixes (`co.uk`, `github.io`) collapse
//! too far; this is a known limitation, there is no public-suffix list here.

use url::Url;

/// Canonical domain used to deduplicate candidates.
///
/// Malformed URLs fall back to the input string unchanged so every candidate
/// still gets a stable key.
pub fn normalize_domain(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return url.to_string(),
    };

    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() > 2 {
        labels[labels.len() - 2..].join(".")
    } else {
        host.to_string()
    }
}

/// Whether `url` points at the social platform whose profiles we enrich from.
pub fn is_profile_url(url: &str, profile_domain: &str) -> bool {
    let expected = profile_domain.trim().to_lowercase();
    let expected = expected.strip_prefix("www.").unwrap_or(&expected);
    if expected.is_empty() {
        return false;
    }

    Url::parse(url).is_ok() && normalize_domain(url) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_www_and_lowercases() {
        assert_eq!(normalize_domain("https://WWW.Example.com/path?q=1"), "example.com");
        assert_eq!(normalize_domain("http://example.com:8080"), "example.com");
    }

    #[test]
    fn test_collapses_to_last_two_labels() {
        assert_eq!(normalize_domain("https://shop.brand.com/x"), "brand.com");
        assert_eq!(normalize_domain("https://a.b.c.brand.io"), "brand.io");
    }

    #[test]
    fn test_multi_part_suffix_collapses_too_far() {
        assert_eq!(normalize_domain("https://shop.example.co.uk"), "co.uk");
        assert_eq!(normalize_domain("https://someone.github.io"), "github.io");
    }

    #[test]
    fn test_malformed_url_falls_back_to_raw_string() {
        assert_eq!(normalize_domain("not a url"), "not a url");
        assert_eq!(normalize_domain("example.com/landing"), "example.com/landing");
    }

    #[test]
    fn test_profile_url_detection() {
        assert!(is_profile_url("https://www.facebook.com/brand", "facebook.com"));
        assert!(is_profile_url("https://m.facebook.com/brand", "facebook.com"));
        assert!(!is_profile_url("https://notfacebook.com/brand", "facebook.com"));
        assert!(!is_profile_url("facebook.com/brand", "facebook.com"));
        assert!(!is_profile_url("https://www.facebook.com/brand", ""));
    }
}
