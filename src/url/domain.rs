use url::Url;

/// Extracts the domain from a URL
///
/// Returns the lowercase host, or `None` when the URL has no host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use rivalscope::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether two URLs belong to the same site
///
/// Hosts are compared case-insensitively with any leading `www.` removed, and
/// ports must match. Schemes are ignored so an HTTP start page may link to its
/// HTTPS twin.
pub fn same_site(a: &Url, b: &Url) -> bool {
    fn bare_host(url: &Url) -> Option<String> {
        extract_domain(url).map(|h| h.strip_prefix("www.").map(str::to_string).unwrap_or(h))
    }

    match (bare_host(a), bare_host(b)) {
        (Some(ha), Some(hb)) => ha == hb && a.port() == b.port(),
        _ => false,
    }
}
