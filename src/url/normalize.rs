use crate::{UrlError, UrlResult};
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
];

/// Normalizes a site URL supplied by a caller
///
/// # Normalization Steps
///
/// 1. Prefix `https://` when the input carries no scheme (`example.com`)
/// 2. Parse the URL; reject if malformed
/// 3. Only HTTP and HTTPS are accepted
/// 4. Lowercase the host
/// 5. Normalize path:
///    - Remove dot segments (. and ..)
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 6. Remove fragment (everything after #)
/// 7. Remove tracking query parameters and sort the rest
///
/// The scheme is kept as given so the site can still be audited over plain
/// HTTP; identity comparisons go through [`site_key`], which ignores it.
///
/// # Examples
///
/// ```
/// use rivalscope::url::normalize_site_url;
///
/// let url = normalize_site_url("EXAMPLE.com/pricing/").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/pricing");
/// ```
pub fn normalize_site_url(input: &str) -> UrlResult<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    // Step 1: Bare hosts are audited over HTTPS
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    // Step 2: Parse the URL
    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    // Step 3: Validate scheme
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    // Step 4: Lowercase the host
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlError::MissingDomain)?
        .to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    // Step 5: Normalize path
    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    // Step 6: Remove fragment
    url.set_fragment(None);

    // Step 7: Filter and sort query parameters
    if url.query().is_some() {
        let filtered_params = filter_and_sort_query_params(&url);

        if filtered_params.is_empty() {
            url.set_query(None);
        } else {
            let query_string = filtered_params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query_string));
        }
    }

    Ok(url)
}

/// Returns the scheme-insensitive identity of a normalized site URL
///
/// The key is the host (without a leading `www.`), the port when it is not the
/// scheme default, the path and the query. `http://www.Example.com/` and
/// `https://example.com` share the key `example.com/`.
pub fn site_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let mut key = host.to_string();
    if let Some(port) = url.port() {
        key.push_str(&format!(":{}", port));
    }
    key.push_str(&url.path().to_lowercase());
    if let Some(query) = url.query() {
        key.push('?');
        key.push_str(query);
    }
    key
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
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
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_gets_https() {
        let result = normalize_site_url("example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_http_scheme_is_kept() {
        let result = normalize_site_url("http://example.com/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_lowercase_host_keeps_path_case() {
        let result = normalize_site_url("https://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_remove_trailing_slash_and_fragment() {
        let result = normalize_site_url("https://example.com/blog/#top").unwrap();
        assert_eq!(result.as_str(), "https://example.com/blog");
    }

    #[test]
    fn test_remove_tracking_params() {
        let result =
            normalize_site_url("https://example.com/?utm_source=x&b=2&a=1&fbclid=9").unwrap();
        assert_eq!(result.as_str(), "https://example.com/?a=1&b=2");
    }

    #[test]
    fn test_dot_segments() {
        let result = normalize_site_url("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_site_url("ftp://example.com/");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize_site_url("   ").is_err());
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize_site_url("https://exa mple.com").is_err());
    }

    #[test]
    fn test_site_key_ignores_scheme_case_and_www() {
        let a = normalize_site_url("http://www.Example.com/").unwrap();
        let b = normalize_site_url("https://example.COM").unwrap();
        assert_eq!(site_key(&a), site_key(&b));
        assert_eq!(site_key(&a), "example.com/");
    }

    #[test]
    fn test_site_key_keeps_port_and_path() {
        let a = normalize_site_url("http://127.0.0.1:8080/shop").unwrap();
        let b = normalize_site_url("http://127.0.0.1:9090/shop").unwrap();
        assert_ne!(site_key(&a), site_key(&b));
        assert_eq!(site_key(&a), "127.0.0.1:8080/shop");
    }

    #[test]
    fn test_site_key_distinguishes_hosts() {
        let a = normalize_site_url("a.com").unwrap();
        let b = normalize_site_url("b.com").unwrap();
        assert_ne!(site_key(&a), site_key(&b));
    }
}
