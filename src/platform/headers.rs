//! Default request headers for the booking platform

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

/// Build the headers sent with every platform request
///
/// The user agent is set on the client builder instead, where an invalid
/// value surfaces as a build error rather than a panic.
///
/// # Examples
///
/// ```
/// use classhold::platform::headers::build_platform_headers;
///
/// let headers = build_platform_headers();
/// assert!(headers.contains_key(reqwest::header::ACCEPT));
/// ```
pub fn build_platform_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/html;q=0.9, */*;q=0.8"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_platform_headers() {
        let headers = build_platform_headers();
        assert_eq!(headers.len(), 2);
        assert!(headers
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json")));
    }
}
