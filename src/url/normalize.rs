use crate::url::NormalizedUrl;
use crate::UrlError;
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "msclkid", "mc_eid", "mc_cid", "_ga", "ref", "source",
];

/// How query strings are treated during normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryPolicy {
    /// Remove tracking parameters, sort the rest
    #[default]
    StripTracking,
    /// Remove the whole query string
    StripAll,
}

/// Normalizes a URL using the default query policy
///
/// See [`normalize_with`] for the exact rules.
///
/// # Examples
///
/// ```
/// use siteharvest::url::normalize;
///
/// let url = normalize("HTTP://Example.COM:80/a/../page/?utm_source=x#top", None).unwrap();
/// assert_eq!(url.as_str(), "http://example.com/page");
/// ```
pub fn normalize(raw_url: &str, base_url: Option<&Url>) -> Result<NormalizedUrl, UrlError> {
    normalize_with(raw_url, base_url, QueryPolicy::default())
}

/// Normalizes a URL according to SiteHarvest's canonicalization rules
///
/// # Normalization Steps
///
/// 1. Resolve against `base_url` when given; reject if malformed
/// 2. Accept only `http` and `https`
/// 3. Lowercase scheme and host, drop default ports (done by the parser)
/// 4. Normalize path:
///    - Remove dot segments and repeated slashes
///    - Remove trailing slash (except for root /)
/// 5. Remove fragment
/// 6. Apply the query policy; sort remaining parameters by key
/// 7. Remove empty query string
///
/// The `www.` prefix is kept so the URL stays fetchable as written; domain
/// membership handles `www.` tolerance instead. Applying the function to its own
/// output returns the same URL.
pub fn normalize_with(
    raw_url: &str,
    base_url: Option<&Url>,
    query_policy: QueryPolicy,
) -> Result<NormalizedUrl, UrlError> {
    let raw_url = raw_url.trim();

    // Step 1: Parse (or resolve) the URL
    let mut url = match base_url {
        Some(base) => base.join(raw_url),
        None => Url::parse(raw_url),
    }
    .map_err(|e| UrlError::Parse(format!("{}: {}", raw_url, e)))?;

    // Step 2: Validate scheme
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    // Step 3: Lowercase the host (the parser already does this for domains)
    match url.host_str() {
        Some(host) if !host.is_empty() => {
            let lowered = host.to_lowercase();
            if lowered != host {
                url.set_host(Some(&lowered))
                    .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
            }
        }
        _ => return Err(UrlError::MissingDomain),
    }

    // Step 4: Normalize path
    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    // Step 5: Remove fragment
    url.set_fragment(None);

    // Step 6 & 7: Filter and sort query parameters
    if url.query().is_some() {
        let params = match query_policy {
            QueryPolicy::StripAll => Vec::new(),
            QueryPolicy::StripTracking => filter_and_sort_query_params(&url),
        };

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(NormalizedUrl::from_url_unchecked(url))
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Skip empty segments (from multiple slashes) and current directory markers
            "" | "." => continue,
            // Parent directory - pop the last segment if possible
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    // Stable sort keeps repeated keys in their original order
    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> String {
        normalize(raw, None).unwrap().as_str().to_string()
    }

    #[test]
    fn test_keeps_scheme() {
        assert_eq!(norm("http://example.com/page"), "http://example.com/page");
        assert_eq!(norm("https://example.com/page"), "https://example.com/page");
    }

    #[test]
    fn test_keeps_www() {
        assert_eq!(norm("https://www.example.com/"), "https://www.example.com/");
    }

    #[test]
    fn test_remove_trailing_slash() {
        assert_eq!(norm("https://example.com/page/"), "https://example.com/page");
    }

    #[test]
    fn test_keep_root_slash() {
        assert_eq!(norm("https://example.com/"), "https://example.com/");
        assert_eq!(norm("https://example.com"), "https://example.com/");
    }

    #[test]
    fn test_remove_fragment() {
        assert_eq!(norm("https://example.com/page#section"), "https://example.com/page");
    }

    #[test]
    fn test_strip_default_port() {
        assert_eq!(norm("https://example.com:443/a"), "https://example.com/a");
        assert_eq!(norm("http://example.com:80/a"), "http://example.com/a");
        assert_eq!(norm("http://example.com:8080/a"), "http://example.com:8080/a");
    }

    #[test]
    fn test_remove_tracking_params() {
        assert_eq!(
            norm("https://example.com/page?utm_source=twitter&UTM_Medium=x&gclid=1"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_sort_query_params() {
        assert_eq!(
            norm("https://example.com/page?b=2&a=1"),
            "https://example.com/page?a=1&b=2"
        );
    }

    #[test]
    fn test_query_order_insensitive() {
        assert_eq!(
            norm("https://example.com/p?x=1&y=2"),
            norm("https://example.com/p?y=2&x=1")
        );
    }

    #[test]
    fn test_strip_all_queries() {
        let url = normalize_with(
            "https://example.com/page?id=7&utm_source=x",
            None,
            QueryPolicy::StripAll,
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_normalize_path_with_dots() {
        assert_eq!(norm("https://example.com/a/../b/./c"), "https://example.com/b/c");
    }

    #[test]
    fn test_lowercase_domain_keeps_path_case() {
        assert_eq!(norm("HTTPS://EXAMPLE.COM/Page"), "https://example.com/Page");
    }

    #[test]
    fn test_multiple_slashes() {
        assert_eq!(
            norm("https://example.com///path//to///page"),
            "https://example.com/path/to/page"
        );
    }

    #[test]
    fn test_resolve_relative_against_base() {
        let base = Url::parse("https://example.com/docs/intro").unwrap();
        let url = normalize("../about/", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "https://example.com/about");

        let url = normalize("guide#part-2", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "https://example.com/docs/guide");

        let url = normalize("//cdn.example.com/x", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/x");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize("ftp://example.com/page", None);
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));

        let base = Url::parse("https://example.com/").unwrap();
        assert!(normalize("mailto:someone@example.com", Some(&base)).is_err());
        assert!(normalize("javascript:void(0)", Some(&base)).is_err());
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(
            normalize("not a url", None).unwrap_err(),
            UrlError::Parse(_)
        ));
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "HTTP://WWW.Example.com:80//a/./b/../c/?z=1&a=hello world&utm_campaign=x#frag",
            "https://example.com/search?q=a%26b&page=2",
            "https://example.com/?flag",
            "https://example.com/caf%C3%A9/menu/",
            "https://example.com/p?q=a+b",
        ];

        for input in inputs {
            let once = normalize(input, None).unwrap();
            let twice = normalize(once.as_str(), None).unwrap();
            assert_eq!(once, twice, "not idempotent for {}", input);
        }
    }

    #[test]
    fn test_encoded_ampersand_survives() {
        let url = normalize("https://example.com/search?q=a%26b", None).unwrap();
        let pairs: Vec<_> = url.as_url().query_pairs().collect();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].1, "a&b");
    }
}
