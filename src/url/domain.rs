use url::{Host, Url};

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use siteharvest::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Removes a leading `www.` label
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Returns the registrable domain of a URL's host
///
/// The public suffix plus one label, resolved against the Public Suffix List
/// including its private section, so `alice.github.io` and `bob.github.io` are
/// different sites. Hosts that are themselves a suffix, single-label hosts and
/// IP addresses are returned as-is.
///
/// ```
/// use url::Url;
/// use siteharvest::url::registrable_domain;
///
/// let url = Url::parse("https://shop.example.co.uk/").unwrap();
/// assert_eq!(registrable_domain(&url).as_deref(), Some("example.co.uk"));
/// ```
pub fn registrable_domain(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
        Host::Domain(domain) => Some(registrable_from_host(&domain.to_lowercase())),
    }
}

fn registrable_from_host(host: &str) -> String {
    let host = host.trim_end_matches('.');
    psl::domain_str(host).unwrap_or(host).to_string()
}
