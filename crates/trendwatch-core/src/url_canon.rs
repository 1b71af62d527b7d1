//! URL canonicalization for identity comparisons.
//!
//! Volatile query parameters change between crawls without changing the
//! item they point at, so they are stripped before URLs are compared.

use url::Url;

/// Per-source parameters that change on every crawl.
pub const SOURCE_VOLATILE_PARAMS: &[(&str, &[&str])] =
    &[("weibo", &["band_rank", "Refer", "t"])];

/// Tracking parameters stripped from every URL. Names are case-sensitive.
pub const COMMON_TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "ref",
    "source",
    "timestamp",
];

fn volatile_params_for(source_id: Option<&str>) -> &'static [&'static str] {
    source_id
        .and_then(|id| {
            SOURCE_VOLATILE_PARAMS
                .iter()
                .find(|(source, _)| *source == id)
                .map(|(_, params)| *params)
        })
        .unwrap_or(&[])
}

/// Normalize a URL for comparison.
///
/// Drops the fragment, the common tracking parameters and any volatile
/// parameters registered for `source_id`, then re-encodes the remaining
/// parameters sorted by name and value. Input that does not parse as an
/// absolute URL is returned unchanged.
#[must_use]
pub fn normalize_url(raw: &str, source_id: Option<&str>) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return raw.to_string();
    }

    let Ok(mut parsed) = Url::parse(trimmed) else {
        return raw.to_string();
    };

    parsed.set_fragment(None);

    let volatile = volatile_params_for(source_id);
    let mut kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| {
            !COMMON_TRACKING_PARAMS
                .iter()
                .chain(volatile)
                .any(|param| *param == &**key)
        })
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    kept.sort();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }

    parsed.to_string()
}

/// Identity key for deduplicating items by URL.
#[must_use]
pub fn url_signature(raw: &str, source_id: Option<&str>) -> String {
    normalize_url(raw, source_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_unchanged() {
        assert_eq!(normalize_url("", None), "");
    }

    #[test]
    fn url_without_query_is_unchanged() {
        assert_eq!(
            normalize_url("https://example.com/page", None),
            "https://example.com/page"
        );
    }

    #[test]
    fn strips_source_volatile_params() {
        let url = "https://s.weibo.com/weibo?q=test&t=31&band_rank=1&Refer=top";
        assert_eq!(
            normalize_url(url, Some("weibo")),
            "https://s.weibo.com/weibo?q=test"
        );
    }

    #[test]
    fn source_params_kept_without_source_id() {
        let url = "https://s.weibo.com/weibo?q=test&band_rank=6&Refer=top";
        let result = normalize_url(url, None);
        assert!(result.contains("band_rank=6"));
        assert!(result.contains("Refer=top"));
    }

    #[test]
    fn strips_tracking_params() {
        let url = "https://example.com/page?id=1&utm_source=twitter&utm_medium=social&ref=home&source=feed";
        assert_eq!(normalize_url(url, None), "https://example.com/page?id=1");
    }

    #[test]
    fn sorts_remaining_params() {
        assert_eq!(
            normalize_url("https://example.com/page?z=1&a=2&m=3", None),
            "https://example.com/page?a=2&m=3&z=1"
        );
    }

    #[test]
    fn removes_fragment() {
        assert_eq!(
            normalize_url("https://example.com/page?id=1#section", None),
            "https://example.com/page?id=1"
        );
    }

    #[test]
    fn drops_question_mark_when_all_params_removed() {
        assert_eq!(
            normalize_url("https://example.com/page?utm_source=twitter&ref=home", None),
            "https://example.com/page"
        );
    }

    #[test]
    fn invalid_url_is_returned_unchanged() {
        assert_eq!(normalize_url("not-a-valid-url", None), "not-a-valid-url");
    }

    #[test]
    fn param_names_are_case_sensitive() {
        let result = normalize_url("https://example.com/page?ID=1&UTM_SOURCE=x", None);
        assert_eq!(result, "https://example.com/page?ID=1&UTM_SOURCE=x");
    }

    #[test]
    fn plus_encoded_spaces_survive() {
        assert_eq!(
            normalize_url("https://example.com/search?q=python+tutorial&utm_campaign=x", None),
            "https://example.com/search?q=python+tutorial"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        for url in [
            "https://example.com/a?b=2&a=1#frag",
            "https://s.weibo.com/weibo?q=%E6%B5%8B%E8%AF%95&t=1",
            "https://example.com/search?q=a+b&q=c",
            "https://example.com",
        ] {
            let once = normalize_url(url, Some("weibo"));
            assert_eq!(normalize_url(&once, Some("weibo")), once, "input: {url}");
        }
    }

    #[test]
    fn signature_ignores_param_order_and_tracking() {
        assert_eq!(
            url_signature("https://example.com/page?utm_source=twitter&id=1", None),
            url_signature("https://example.com/page?id=1&utm_source=news", None)
        );
        assert_eq!(
            url_signature("https://example.com/p?b=2&a=1", None),
            url_signature("https://example.com/p?a=1&b=2", None)
        );
    }
}
