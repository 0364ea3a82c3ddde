//! Bearer-token authentication headers.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

/// Build the header set used by every request: an `Authorization` entry of
/// the form `Bearer <token>`.
///
/// Pure function of its input. An empty token still produces a
/// syntactically valid header; the provider rejects it on the first call,
/// which is where a missing credential surfaces.
pub fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {}", token))
        .unwrap_or_else(|_| HeaderValue::from_static("Bearer"));
    headers.insert(AUTHORIZATION, value);
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bearer_header_format() {
        let headers = bearer_headers("abc123");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc123");
    }

    #[test]
    fn test_bearer_header_single_entry() {
        let headers = bearer_headers("tok");
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_empty_token_still_builds_header() {
        let headers = bearer_headers("");
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer ");
    }

    proptest! {
        #[test]
        fn test_bearer_header_is_prefix_plus_token(token in "[A-Za-z0-9%_-]{0,64}") {
            let headers = bearer_headers(&token);
            let value = headers.get(AUTHORIZATION).unwrap().to_str().unwrap();
            prop_assert_eq!(value, format!("Bearer {}", token));
        }
    }
}
