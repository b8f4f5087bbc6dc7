//! Authorization request URLs and redirect callbacks
//!
//! The user opens the authorization URL, logs in, and is sent back to the
//! registered redirect URI with either `code` or `error` in the query,
//! together with the `state` we generated. The state is checked before
//! anything else in the callback is trusted.

use std::collections::HashMap;

use percent_encoding::utf8_percent_encode;
use reqwest::Url;

use crate::error::{Error, Result};
use crate::scope::QUERY_VALUE;

/// Build the authorization URL from `endpoint` and query `params`.
///
/// Every value is percent-encoded exactly once, so a scope value renders the
/// same as [`Scope::quoted`](crate::Scope::quoted).
pub fn build_authorize_url(endpoint: &Url, params: &[(&str, &str)]) -> Url {
    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, QUERY_VALUE)))
        .collect::<Vec<_>>()
        .join("&");
    let mut url = endpoint.clone();
    url.set_query(Some(&query));
    url
}

/// Validate a redirect URL against the `state` we sent and extract the code.
///
/// Order matters: a state mismatch is reported even if the callback also
/// carries an error or a code. A repeated `state` or `code` is rejected
/// rather than resolved in favour of either copy.
pub fn parse_redirect(redirect_url: &str, expected_state: &str) -> Result<String> {
    let url = Url::parse(redirect_url.trim())
        .map_err(|e| Error::InvalidRedirect(format!("{e}")))?;
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in url.query_pairs().into_owned() {
        params.entry(key).or_default().push(value);
    }

    match params.get("state").map(Vec::as_slice) {
        Some([state]) if state == expected_state => {}
        _ => return Err(Error::StateMismatch),
    }

    if let Some(error) = params.remove("error").and_then(|mut errors| errors.pop()) {
        return Err(Error::UserDenied(error));
    }

    match params.remove("code").as_deref() {
        Some([code]) if !code.is_empty() => Ok(code.clone()),
        Some([_, _, ..]) => Err(Error::InvalidRedirect(
            "more than one code in redirect URL".into(),
        )),
        _ => Err(Error::InvalidRedirect("no code in redirect URL".into())),
    }
}
