//! Partner client for the wallet-name directory service.
//!
//! # Design
//! `DirectoryClient` holds the parsed base URL, the partner credentials and
//! a `Transport`. It carries no mutable state between calls. Every
//! operation builds a path, runs one envelope round-trip through
//! [`envelope::execute`], and reshapes the decoded document. Field
//! extraction is explicit: a missing or mistyped field is an
//! `ApiError::UnexpectedShape`, never a silent default.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::envelope::{self, Credentials, Document};
use crate::error::{ApiError, UriError};
use crate::http::{HttpMethod, Transport};
use crate::types::{
    CreateDomain, Domain, Partner, WalletName, WalletNameRecord, WalletNameRef, WalletNamesBody,
};
use crate::uri::{parse_payment_uri, scheme_for_currency, ParsedPaymentUri};

const WALLET_NAME_PATH: &[&str] = &["v1", "partner", "walletname"];
const PARTNER_PATH: &[&str] = &["v1", "admin", "partner"];
const DOMAIN_PATH: &[&str] = &["v1", "partner", "domain"];

#[derive(Debug, Clone)]
pub struct DirectoryClient<T> {
    api_url: Url,
    credentials: Credentials,
    transport: T,
}

impl<T: Transport> DirectoryClient<T> {
    pub fn new(config: &ClientConfig, transport: T) -> Result<Self, ApiError> {
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", config.api_url)))?;
        if api_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.api_url.clone()));
        }
        Ok(Self {
            api_url,
            credentials: config.credentials(),
            transport,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    // -----------------------------------------------------------------------
    // Wallet names
    // -----------------------------------------------------------------------

    /// Resolve a wallet name to its address for `currency`.
    ///
    /// `wallet_name` may be a bare name (`wallet.domain.com`) or an absolute
    /// URL, in which case only its host is used. The lookup is anonymous.
    pub fn wallet_lookup(&self, wallet_name: &str, currency: &str) -> Result<String, ApiError> {
        let name = Url::parse(wallet_name)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| wallet_name.to_string());
        let currency = currency.to_lowercase();
        let url = self.endpoint(&["api", "wallet_lookup", name.as_str(), currency.as_str()]);

        let doc = self.call(&Credentials::anonymous(), HttpMethod::Get, url, None)?;
        match doc.get("wallet_address") {
            Some(Value::String(address)) if !address.is_empty() => Ok(address.clone()),
            None | Some(Value::Null) | Some(Value::String(_)) => Err(ApiError::NoAddressFound {
                wallet_name: name,
                currency,
            }),
            Some(_) => Err(ApiError::shape("wallet_address", "expected a string")),
        }
    }

    /// Look up a wallet name and interpret the address as a payment URI.
    ///
    /// A bare address is wrapped in the scheme matching `currency`.
    /// Malformed query parameters are dropped rather than failing the
    /// lookup.
    pub fn resolve_payment_uri(
        &self,
        wallet_name: &str,
        currency: &str,
    ) -> Result<ParsedPaymentUri, ApiError> {
        let address = self.wallet_lookup(wallet_name, currency)?;
        if address.contains(':') {
            return Ok(parse_payment_uri(&address, true)?);
        }
        let scheme = scheme_for_currency(currency).ok_or_else(|| UriError::UnknownScheme {
            scheme: currency.to_lowercase(),
        })?;
        Ok(parse_payment_uri(&format!("{scheme}:{address}"), true)?)
    }

    /// Build a wallet name locally. Nothing is sent until `save_wallet_name`.
    pub fn new_wallet_name<I, C, A>(
        &self,
        domain_name: &str,
        name: &str,
        wallets: I,
        external_id: Option<String>,
    ) -> WalletName
    where
        I: IntoIterator<Item = (C, A)>,
        C: Into<String>,
        A: Into<String>,
    {
        WalletName::new(domain_name, name, wallets, external_id)
    }

    /// List wallet names, optionally filtered by domain and external id.
    pub fn get_wallet_names(
        &self,
        domain_name: Option<&str>,
        external_id: Option<&str>,
    ) -> Result<Vec<WalletName>, ApiError> {
        let mut url = self.endpoint(WALLET_NAME_PATH);
        let filters: Vec<(&str, &str)> = [("domain_name", domain_name), ("external_id", external_id)]
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect();
        if !filters.is_empty() {
            url.query_pairs_mut().extend_pairs(filters);
        }

        let doc = self.call(&self.credentials, HttpMethod::Get, url, None)?;
        match doc.get("wallet_name_count") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(count) => match count.as_u64() {
                Some(0) => return Ok(Vec::new()),
                Some(_) => {}
                None => {
                    return Err(ApiError::shape(
                        "wallet_name_count",
                        "expected an unsigned integer",
                    ))
                }
            },
        }
        let records: Vec<WalletNameRecord> = decode(&doc, "wallet_names")?;
        debug!(count = records.len(), "fetched wallet names");
        Ok(records.into_iter().map(WalletName::from).collect())
    }

    /// Create (no id yet) or update (id present) a wallet name.
    ///
    /// On creation the service echoes the stored names; the entry with the
    /// same domain and name supplies the new id.
    #[instrument(skip_all, fields(domain = %wallet_name.domain_name, name = %wallet_name.name))]
    pub fn save_wallet_name(&self, wallet_name: &mut WalletName) -> Result<(), ApiError> {
        let method = if wallet_name.id.is_some() {
            HttpMethod::Put
        } else {
            HttpMethod::Post
        };
        let body = to_json(&WalletNamesBody {
            wallet_names: vec![wallet_name.to_record()],
        })?;
        let doc = self.call(
            &self.credentials,
            method,
            self.endpoint(WALLET_NAME_PATH),
            Some(body),
        )?;
        if method == HttpMethod::Put {
            return Ok(());
        }

        let saved = field(&doc, "wallet_names")?
            .as_array()
            .ok_or_else(|| ApiError::shape("wallet_names", "expected an array"))?;
        let id = saved
            .iter()
            .find(|entry| {
                entry.get("domain_name").and_then(Value::as_str) == Some(wallet_name.domain_name.as_str())
                    && entry.get("name").and_then(Value::as_str) == Some(wallet_name.name.as_str())
            })
            .and_then(|entry| entry.get("id").and_then(Value::as_str))
            .ok_or(ApiError::UnmatchedResponse)?;
        debug!(id, "wallet name created");
        wallet_name.id = Some(id.to_string());
        Ok(())
    }

    #[instrument(skip_all, fields(domain = %wallet_name.domain_name, name = %wallet_name.name))]
    pub fn delete_wallet_name(&self, wallet_name: &WalletName) -> Result<(), ApiError> {
        let id = wallet_name.id.as_deref().ok_or(ApiError::MissingId)?;
        let body = to_json(&WalletNamesBody {
            wallet_names: vec![WalletNameRef {
                domain_name: &wallet_name.domain_name,
                id,
            }],
        })?;
        self.call(
            &self.credentials,
            HttpMethod::Delete,
            self.endpoint(WALLET_NAME_PATH),
            Some(body),
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Partners
    // -----------------------------------------------------------------------

    /// Create a partner and return its id.
    pub fn create_partner(&self, partner_name: &str) -> Result<String, ApiError> {
        let url = self.endpoint_under(PARTNER_PATH, &[partner_name]);
        let doc = self.call(&self.credentials, HttpMethod::Post, url, None)?;
        field(&doc, "partner")?
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::shape("partner.id", "expected a string"))
    }

    pub fn get_partners(&self) -> Result<Vec<Partner>, ApiError> {
        let doc = self.call(
            &self.credentials,
            HttpMethod::Get,
            self.endpoint(PARTNER_PATH),
            None,
        )?;
        decode(&doc, "partners")
    }

    pub fn delete_partner(&self, partner_name: &str) -> Result<(), ApiError> {
        let url = self.endpoint_under(PARTNER_PATH, &[partner_name]);
        self.call(&self.credentials, HttpMethod::Delete, url, None)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Domains
    // -----------------------------------------------------------------------

    /// Register a domain, optionally on behalf of a sub-partner.
    pub fn create_domain(
        &self,
        domain_name: &str,
        sub_partner_id: Option<&str>,
    ) -> Result<(), ApiError> {
        let body = to_json(&CreateDomain {
            partner_id: sub_partner_id,
        })?;
        let url = self.endpoint_under(DOMAIN_PATH, &[domain_name]);
        self.call(&self.credentials, HttpMethod::Post, url, Some(body))?;
        Ok(())
    }

    /// Domains visible to this partner.
    pub fn get_domains(&self) -> Result<Vec<Domain>, ApiError> {
        let doc = self.call(
            &self.credentials,
            HttpMethod::Get,
            self.endpoint(&["api", "domain"]),
            None,
        )?;
        decode(&doc, "domains")
    }

    /// Status of one domain, or of every domain when `domain_name` is `None`.
    pub fn get_domain_status(&self, domain_name: Option<&str>) -> Result<Vec<Domain>, ApiError> {
        let url = match domain_name {
            Some(domain) => self.endpoint_under(DOMAIN_PATH, &[domain]),
            None => self.endpoint(DOMAIN_PATH),
        };
        let doc = self.call(&self.credentials, HttpMethod::Get, url, None)?;
        decode(&doc, "domains")
    }

    /// DNSSEC details; the payload shape is passed through untouched.
    pub fn get_domain_dnssec(&self, domain_name: &str) -> Result<Document, ApiError> {
        let url = self.endpoint_under(DOMAIN_PATH, &["dnssec", domain_name]);
        self.call(&self.credentials, HttpMethod::Get, url, None)
    }

    pub fn delete_domain(&self, domain_name: &str) -> Result<(), ApiError> {
        let url = self.endpoint_under(DOMAIN_PATH, &[domain_name]);
        self.call(&self.credentials, HttpMethod::Delete, url, None)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn call(
        &self,
        credentials: &Credentials,
        method: HttpMethod,
        url: Url,
        body: Option<String>,
    ) -> Result<Document, ApiError> {
        let request = envelope::build_request(credentials, method, url.as_str(), body);
        Ok(envelope::execute(&self.transport, &request)?)
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn endpoint_under(&self, base: &[&str], rest: &[&str]) -> Url {
        let segments: Vec<&str> = base.iter().chain(rest).copied().collect();
        self.endpoint(&segments)
    }
}

fn field<'a>(doc: &'a Document, name: &str) -> Result<&'a Value, ApiError> {
    doc.get(name)
        .ok_or_else(|| ApiError::shape(name, "missing from response"))
}

fn decode<D: DeserializeOwned>(doc: &Document, name: &str) -> Result<D, ApiError> {
    let value = field(doc, name)?;
    D::deserialize(value).map_err(|e| ApiError::shape(name, e.to_string()))
}

fn to_json<S: Serialize>(body: &S) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))
}
