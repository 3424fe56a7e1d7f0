//! Cleanup of scraped ad links before they become candidates.
//!
//! Ads in the library link out through redirect wrappers and mix in links
//! back to the social platforms themselves; only external landing pages are
//! worth analyzing.

use url::Url;

use crate::types::AdCandidate;

/// Base for relative profile links.
pub const PROFILE_BASE: &str = "https://www.facebook.com";

const SOCIAL_HOSTS: [&str; 3] = ["facebook.com", "instagram.com", "whatsapp.com"];

/// True when `url` can be a landing page: not a social platform link and not a script URL.
pub fn is_landing_url(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty()
        && !url.starts_with("javascript:")
        && !SOCIAL_HOSTS.iter().any(|host| url.contains(host))
}

/// Resolve a scraped href to the external landing page it leads to.
///
/// Redirect wrappers (`l.facebook.com/l.php?u=..`, `facebook.com/tr?url=..`)
/// are unwrapped through their `u` or `url` parameter, and the target must
/// pass the same [`is_landing_url`] check as a direct link. Returns `None`
/// for anything that does not end up outside the social platforms.
pub fn resolve_ad_link(href: &str) -> Option<String> {
    let href = href.trim();

    if href.contains("l.facebook.com") || href.contains("www.facebook.com/tr") {
        let parsed = Url::parse(href).ok()?;
        let target = parsed
            .query_pairs()
            .find(|(key, _)| key == "u")
            .or_else(|| parsed.query_pairs().find(|(key, _)| key == "url"))
            .map(|(_, value)| value.into_owned())?;

        return is_landing_url(&target).then_some(target);
    }

    is_landing_url(href).then(|| href.to_string())
}

/// Canonical form of a profile link: absolute, no query, no trailing slash.
pub fn clean_profile_link(href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }

    let absolute = if href.starts_with('/') {
        format!("{PROFILE_BASE}{href}")
    } else {
        href.to_string()
    };

    let without_query = absolute.split('?').next().unwrap_or_default();
    without_query
        .strip_suffix('/')
        .unwrap_or(without_query)
        .to_string()
}

/// Single-line advertiser name; "Unknown" when blank.
pub fn clean_name(raw: &str) -> String {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name
    }
}

/// Apply all of the above to a raw scraped ad; `None` when it has no usable landing page.
pub fn sanitize_candidate(raw: AdCandidate) -> Option<AdCandidate> {
    let url = resolve_ad_link(&raw.url)?;
    let profile = raw
        .profile_url()
        .map(clean_profile_link)
        .unwrap_or_default();

    Some(AdCandidate {
        url,
        name: clean_name(&raw.name),
        social_profile_url: Some(profile),
    })
}
