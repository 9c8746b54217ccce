//! Per-request options carried in the query string.
//!
//! Parsing is pure: it reads the query once, fails on the first malformed
//! field, and hands back a fully-populated [`Options`]. Applying the options
//! is left to the header builders.

use axum::http::{HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use url::{form_urlencoded, Url};

use crate::error::ProxyError;

pub const PARAM_URL: &str = "url";
pub const PARAM_IGNORE_REQ_HEADERS: &str = "ignoreReqHeaders";
pub const PARAM_FOLLOW_REDIRECT: &str = "followRedirect";
pub const PARAM_REDIRECT_WITH_PROXY: &str = "redirectWithProxy";
pub const PARAM_DECOMPRESS: &str = "decompress";
pub const PARAM_APPEND_REQ_HEADERS: &str = "appendReqHeaders";
pub const PARAM_APPEND_RES_HEADERS: &str = "appendResHeaders";
pub const PARAM_DELETE_REQ_HEADERS: &str = "deleteReqHeaders";
pub const PARAM_DELETE_RES_HEADERS: &str = "deleteResHeaders";

/// Request-shaping options for one forwarding call.
#[derive(Debug, Clone)]
pub struct Options {
    /// Upstream target.
    pub target: Url,
    /// Do not copy the caller's headers onto the outbound request.
    pub ignore_req_headers: bool,
    /// Let the client follow upstream redirects.
    pub follow_redirect: bool,
    /// Answer with a redirect to upstream's `location` instead of its body.
    pub redirect_with_proxy: bool,
    /// Buffer and decode the upstream body.
    pub decompress: bool,
    pub append_req_headers: Vec<(HeaderName, HeaderValue)>,
    pub append_res_headers: Vec<(HeaderName, HeaderValue)>,
    pub delete_req_headers: Vec<HeaderName>,
    pub delete_res_headers: Vec<HeaderName>,
}

impl Options {
    /// Options with every field at its default for the given target.
    pub fn new(target: Url) -> Self {
        Self {
            target,
            ignore_req_headers: false,
            follow_redirect: true,
            redirect_with_proxy: true,
            decompress: false,
            append_req_headers: Vec::new(),
            append_res_headers: Vec::new(),
            delete_req_headers: Vec::new(),
            delete_res_headers: Vec::new(),
        }
    }

    /// Parse options from a raw (still percent-encoded) query string.
    pub fn from_query(query: Option<&str>) -> Result<Self, ProxyError> {
        let params = QueryParams::parse(query.unwrap_or_default());

        let raw_url = params.get(PARAM_URL).ok_or(ProxyError::MissingTargetUrl)?;
        let mut options = Self::new(parse_target(raw_url)?);

        if let Some(v) = params.get(PARAM_IGNORE_REQ_HEADERS) {
            options.ignore_req_headers = is_true(v);
        }
        if let Some(v) = params.get(PARAM_FOLLOW_REDIRECT) {
            options.follow_redirect = is_true(v);
        }
        if let Some(v) = params.get(PARAM_REDIRECT_WITH_PROXY) {
            options.redirect_with_proxy = is_true(v);
        }
        if let Some(v) = params.get(PARAM_DECOMPRESS) {
            options.decompress = is_true(v);
        }

        if let Some(v) = params.get(PARAM_APPEND_REQ_HEADERS) {
            options.append_req_headers = parse_pairs(PARAM_APPEND_REQ_HEADERS, v)?;
        }
        if let Some(v) = params.get(PARAM_APPEND_RES_HEADERS) {
            options.append_res_headers = parse_pairs(PARAM_APPEND_RES_HEADERS, v)?;
        }
        if let Some(v) = params.get(PARAM_DELETE_REQ_HEADERS) {
            options.delete_req_headers = parse_names(PARAM_DELETE_REQ_HEADERS, v)?;
        }
        if let Some(v) = params.get(PARAM_DELETE_RES_HEADERS) {
            options.delete_res_headers = parse_names(PARAM_DELETE_RES_HEADERS, v)?;
        }

        Ok(options)
    }
}

/// Decoded query pairs. Lookups see the first occurrence; an empty value is absent.
struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    fn parse(query: &str) -> Self {
        Self(form_urlencoded::parse(query.as_bytes()).into_owned().collect())
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }
}

/// Equality, not a boolean parse: `"TRUE"` and `"1"` are false.
fn is_true(value: &str) -> bool {
    value == "true"
}

fn parse_target(raw: &str) -> Result<Url, ProxyError> {
    let invalid = |reason: String| ProxyError::InvalidTargetUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

fn parse_json<T: DeserializeOwned>(param: &'static str, raw: &str) -> Result<T, ProxyError> {
    serde_json::from_str(raw).map_err(|e| ProxyError::MalformedOptions {
        param,
        reason: e.to_string(),
    })
}

fn header_name(param: &'static str, raw: &str) -> Result<HeaderName, ProxyError> {
    HeaderName::from_bytes(raw.as_bytes()).map_err(|_| ProxyError::MalformedOptions {
        param,
        reason: format!("invalid header name {:?}", raw),
    })
}

fn parse_pairs(
    param: &'static str,
    raw: &str,
) -> Result<Vec<(HeaderName, HeaderValue)>, ProxyError> {
    let pairs: Vec<(String, String)> = parse_json(param, raw)?;
    pairs
        .into_iter()
        .map(|(name, value)| {
            let name = header_name(param, &name)?;
            let value = HeaderValue::from_str(&value).map_err(|_| ProxyError::MalformedOptions {
                param,
                reason: format!("invalid value for header {}", name),
            })?;
            Ok((name, value))
        })
        .collect()
}

fn parse_names(param: &'static str, raw: &str) -> Result<Vec<HeaderName>, ProxyError> {
    let names: Vec<String> = parse_json(param, raw)?;
    names.iter().map(|n| header_name(param, n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(query: &str) -> Result<Options, ProxyError> {
        Options::from_query(Some(query))
    }

    #[test]
    fn test_defaults() {
        let opts = parse("url=https://example.com/a").unwrap();
        assert_eq!(opts.target.as_str(), "https://example.com/a");
        assert!(!opts.ignore_req_headers);
        assert!(opts.follow_redirect);
        assert!(opts.redirect_with_proxy);
        assert!(!opts.decompress);
        assert!(opts.append_req_headers.is_empty());
        assert!(opts.delete_res_headers.is_empty());
    }

    #[test]
    fn test_only_literal_true_is_true() {
        let opts = parse("url=http://a.test/&decompress=true&followRedirect=false&redirectWithProxy=TRUE&ignoreReqHeaders=1").unwrap();
        assert!(opts.decompress);
        assert!(!opts.follow_redirect);
        assert!(!opts.redirect_with_proxy);
        assert!(!opts.ignore_req_headers);
    }

    #[test]
    fn test_empty_value_keeps_default() {
        let opts = parse("url=http://a.test/&followRedirect=&appendReqHeaders=").unwrap();
        assert!(opts.follow_redirect);
        assert!(opts.append_req_headers.is_empty());
    }

    #[test]
    fn test_missing_url() {
        assert!(matches!(parse("decompress=true"), Err(ProxyError::MissingTargetUrl)));
        assert!(matches!(parse("url="), Err(ProxyError::MissingTargetUrl)));
        assert!(matches!(Options::from_query(None), Err(ProxyError::MissingTargetUrl)));
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(parse("url=/relative/path"), Err(ProxyError::InvalidTargetUrl { .. })));
        assert!(matches!(parse("url=ftp://a.test/x"), Err(ProxyError::InvalidTargetUrl { .. })));
    }

    #[test]
    fn test_url_is_percent_decoded() {
        let opts = parse("url=https%3A%2F%2Fexample.com%2Fa%3Fq%3D1").unwrap();
        assert_eq!(opts.target.as_str(), "https://example.com/a?q=1");
    }

    #[test]
    fn test_header_lists_are_lowercased() {
        let opts = parse(r#"url=http://a.test/&appendReqHeaders=[["X-Foo","1"]]&deleteResHeaders=["X-Bar"]"#).unwrap();
        assert_eq!(opts.append_req_headers[0].0.as_str(), "x-foo");
        assert_eq!(opts.append_req_headers[0].1, "1");
        assert_eq!(opts.delete_res_headers[0].as_str(), "x-bar");
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = parse("url=http://a.test/&appendResHeaders=[[\"x\"").unwrap_err();
        assert!(matches!(err, ProxyError::MalformedOptions { param: PARAM_APPEND_RES_HEADERS, .. }));

        let err = parse(r#"url=http://a.test/&deleteReqHeaders=[["x","y"]]"#).unwrap_err();
        assert!(matches!(err, ProxyError::MalformedOptions { param: PARAM_DELETE_REQ_HEADERS, .. }));
    }

    #[test]
    fn test_illegal_header_name_is_rejected() {
        let err = parse(r#"url=http://a.test/&appendReqHeaders=[["bad name","v"]]"#).unwrap_err();
        assert!(matches!(err, ProxyError::MalformedOptions { .. }));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let opts = parse("url=http://first.test/&url=http://second.test/").unwrap();
        assert_eq!(opts.target.host_str(), Some("first.test"));
    }
}
