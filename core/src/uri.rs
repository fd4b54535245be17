//! Payment URI parsing (BIP21 query parameters, BIP72 `r` payment request).
//!
//! A payment URI looks like `bitcoin:<address>[?key=value[&key=value...]]`.
//! Only the schemes in [`KNOWN_SCHEMES`] are accepted. Parameters are split
//! on `&`, then on the first `=`; both halves must be non-empty and keys may
//! not repeat. Later `=` characters belong to the value, so `a=b=c` gives
//! `a` the value `b=c` and `a==` gives `a` the value `=`; a parser that
//! splits on every `=` would reject both as unbalanced.
//!
//! ```
//! use walletname_core::uri::parse_payment_uri;
//!
//! let uri = parse_payment_uri("bitcoin:1Zjk?amount=1.2&label=coffee", false).unwrap();
//! assert_eq!(uri.address, "1Zjk");
//! assert_eq!(uri.param("amount"), Some("1.2"));
//! assert_eq!(uri.r(), None);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::UriError;

pub const KNOWN_SCHEMES: &[&str] = &["bitcoin", "litecoin", "dogecoin"];

/// BIP72 payment-request URL parameter.
pub const PAYMENT_REQUEST_PARAM: &str = "r";

/// Scheme for a directory currency code (`btc`, `ltc`, `dgc`/`doge`).
pub fn scheme_for_currency(currency: &str) -> Option<&'static str> {
    match currency.to_ascii_lowercase().as_str() {
        "btc" | "tbtc" => Some("bitcoin"),
        "ltc" => Some("litecoin"),
        "dgc" | "doge" => Some("dogecoin"),
        _ => None,
    }
}

/// A payment URI split into scheme, address and query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPaymentUri {
    pub scheme: String,
    pub address: String,
    pub params: BTreeMap<String, String>,
}

impl ParsedPaymentUri {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The BIP72 payment-request URL, if the URI carried one.
    pub fn r(&self) -> Option<&str> {
        self.param(PAYMENT_REQUEST_PARAM)
    }
}

impl fmt::Display for ParsedPaymentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.address)?;
        let mut separator = '?';
        for (key, value) in &self.params {
            write!(f, "{separator}{key}={value}")?;
            separator = '&';
        }
        Ok(())
    }
}

/// Strict parse; any parameter error is returned.
impl FromStr for ParsedPaymentUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_payment_uri(s, false)
    }
}

/// Parse a scheme-prefixed payment URI.
///
/// With `tolerate_param_errors` set, an unbalanced or duplicate parameter
/// does not fail the parse; the result keeps the address and drops every
/// parameter. An unknown scheme always fails.
pub fn parse_payment_uri(
    uri: &str,
    tolerate_param_errors: bool,
) -> Result<ParsedPaymentUri, UriError> {
    let Some((scheme, rest)) = uri.split_once(':') else {
        return Err(UriError::UnknownScheme {
            scheme: uri.to_string(),
        });
    };
    if !KNOWN_SCHEMES.contains(&scheme) {
        return Err(UriError::UnknownScheme {
            scheme: scheme.to_string(),
        });
    }

    let (address, query) = match rest.split_once('?') {
        Some((address, query)) => (address, Some(query)),
        None => (rest, None),
    };

    let params = match query.map(parse_query).transpose() {
        Ok(params) => params.unwrap_or_default(),
        Err(_) if tolerate_param_errors => BTreeMap::new(),
        Err(e) => return Err(e),
    };

    Ok(ParsedPaymentUri {
        scheme: scheme.to_string(),
        address: address.to_string(),
        params,
    })
}

fn parse_query(query: &str) -> Result<BTreeMap<String, String>, UriError> {
    let mut params = BTreeMap::new();
    // `bitcoin:addr?` carries no parameters rather than one empty pair.
    if query.is_empty() {
        return Ok(params);
    }
    for pair in query.split('&') {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() && !value.is_empty() => (key, value),
            _ => {
                return Err(UriError::UnbalancedParameter {
                    pair: pair.to_string(),
                })
            }
        };
        if params.contains_key(key) {
            return Err(UriError::DuplicateParameter {
                key: key.to_string(),
            });
        }
        params.insert(key.to_string(), value.to_string());
    }
    Ok(params)
}
