//! Recovery of the origin download URL from the proxy's own request query.
//!
//! Clients call `/?url=https://host/v0/b/bkt/o/a%2Fb.png?alt=media&token=t`
//! without encoding the nested URL, so a query parser sees
//! `url=https://host/...?alt=media` and a separate `token=t`. The origin needs
//! the whole thing back byte for byte: everything after `url=` is that URL.

use crate::error::AppError;
use percent_encoding::percent_decode_str;
use url::Url;

const URL_PARAM: &str = "url=";

/// Recover the download URL to forward to the origin.
///
/// `raw_query` is the incoming request's raw query string (with or without the
/// leading `?`). The value of the `url` parameter runs to the end of the query
/// string; parameters before it are dropped. When the client percent-encoded
/// the whole URL as a single parameter it is decoded once.
pub fn download_url(raw_query: &str) -> Result<Url, AppError> {
    let raw_query = raw_query.strip_prefix('?').unwrap_or(raw_query);

    let remainder = url_param_remainder(raw_query)
        .ok_or_else(|| AppError::MalformedUrl("Missing url query parameter".to_string()))?;
    if remainder.is_empty() {
        return Err(AppError::MalformedUrl(
            "Empty url query parameter".to_string(),
        ));
    }

    if let Some(url) = parse_http_url(remainder) {
        return Ok(url);
    }

    let decoded = percent_decode_str(remainder)
        .decode_utf8()
        .map_err(|_| AppError::MalformedUrl("url parameter is not valid UTF-8".to_string()))?;
    parse_http_url(&decoded).ok_or_else(|| {
        AppError::MalformedUrl(format!("url parameter is not an absolute URL: {}", remainder))
    })
}

/// Slice of `query` starting right after the first `url=` pair name.
fn url_param_remainder(query: &str) -> Option<&str> {
    let mut offset = 0;
    for pair in query.split('&') {
        if pair.starts_with(URL_PARAM) {
            return Some(&query[offset + URL_PARAM.len()..]);
        }
        offset += pair.len() + 1;
    }
    None
}

fn parse_http_url(candidate: &str) -> Option<Url> {
    Url::parse(candidate)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}
