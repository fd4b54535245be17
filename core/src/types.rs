//! Domain types for the wallet-name directory.
//!
//! # Design
//! `WalletName` is the caller-facing entity: currencies map to addresses
//! in a `BTreeMap`, so iteration order is stable. `WalletNameRecord` is its
//! wire form, where wallets travel as a list of `{currency, wallet_address}`
//! objects. The conversion lives here so the client never touches raw JSON
//! for wallet names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::envelope::Document;

/// A human-readable name under a domain, mapped to one address per currency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletName {
    pub domain_name: String,
    pub name: String,
    pub external_id: Option<String>,
    /// Assigned by the service on first save.
    pub id: Option<String>,
    wallets: BTreeMap<String, String>,
}

impl WalletName {
    pub fn new<I, C, A>(
        domain_name: impl Into<String>,
        name: impl Into<String>,
        wallets: I,
        external_id: Option<String>,
    ) -> Self
    where
        I: IntoIterator<Item = (C, A)>,
        C: Into<String>,
        A: Into<String>,
    {
        Self {
            domain_name: domain_name.into(),
            name: name.into(),
            external_id,
            id: None,
            wallets: wallets
                .into_iter()
                .map(|(c, a)| (c.into(), a.into()))
                .collect(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn address(&self, currency: &str) -> Option<&str> {
        self.wallets.get(currency).map(String::as_str)
    }

    pub fn set_currency_address(&mut self, currency: impl Into<String>, address: impl Into<String>) {
        self.wallets.insert(currency.into(), address.into());
    }

    pub fn remove_currency(&mut self, currency: &str) -> Option<String> {
        self.wallets.remove(currency)
    }

    pub fn used_currencies(&self) -> impl Iterator<Item = &str> {
        self.wallets.keys().map(String::as_str)
    }

    pub fn wallets(&self) -> &BTreeMap<String, String> {
        &self.wallets
    }

    pub(crate) fn to_record(&self) -> WalletNameRecord {
        WalletNameRecord {
            domain_name: self.domain_name.clone(),
            name: self.name.clone(),
            wallets: self
                .wallets
                .iter()
                .map(|(currency, address)| WalletEntry {
                    currency: currency.clone(),
                    wallet_address: address.clone(),
                })
                .collect(),
            external_id: self.external_id.clone(),
            id: self.id.clone(),
        }
    }
}

impl From<WalletNameRecord> for WalletName {
    fn from(record: WalletNameRecord) -> Self {
        Self {
            domain_name: record.domain_name,
            name: record.name,
            external_id: record.external_id,
            id: record.id,
            wallets: record
                .wallets
                .into_iter()
                .map(|w| (w.currency, w.wallet_address))
                .collect(),
        }
    }
}

/// One currency/address pair as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    pub currency: String,
    pub wallet_address: String,
}

/// Wire form of a wallet name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletNameRecord {
    pub domain_name: String,
    pub name: String,
    #[serde(default)]
    pub wallets: Vec<WalletEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Reference used when deleting a wallet name.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct WalletNameRef<'a> {
    pub domain_name: &'a str,
    pub id: &'a str,
}

/// Request body shared by the wallet-name write endpoints.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct WalletNamesBody<T> {
    pub wallet_names: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub id: String,
    pub name: String,
}

/// A domain as reported by the domain listing and status endpoints.
///
/// Fields beyond `domain_name` and `status` vary by endpoint and are kept
/// in `details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub domain_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub details: Document,
}

/// Body for domain creation; `partner_id` assigns the domain to a sub-partner.
#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct CreateDomain<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> WalletName {
        WalletName::new(
            "domain.com",
            "name",
            [("btc", "1Zjkhglkjhgfdslkfg")],
            Some("external_id".to_string()),
        )
        .with_id("id")
    }

    #[test]
    fn object_creation() {
        let wn = sample();
        assert_eq!(wn.domain_name, "domain.com");
        assert_eq!(wn.name, "name");
        assert_eq!(wn.external_id.as_deref(), Some("external_id"));
        assert_eq!(wn.id.as_deref(), Some("id"));
        assert!(wn.used_currencies().any(|c| c == "btc"));
        assert_eq!(wn.address("btc"), Some("1Zjkhglkjhgfdslkfg"));
    }

    #[test]
    fn set_currency_address() {
        let mut wn = WalletName::new("domain.com", "name", Vec::<(String, String)>::new(), None);
        wn.set_currency_address("btc", "1Zjkhglkjhgfdslkfg");
        assert_eq!(wn.address("btc"), Some("1Zjkhglkjhgfdslkfg"));
    }

    #[test]
    fn remove_currency() {
        let mut wn = sample();
        assert_eq!(wn.remove_currency("btc").as_deref(), Some("1Zjkhglkjhgfdslkfg"));
        assert_eq!(wn.address("btc"), None);
        assert_eq!(wn.remove_currency("btc"), None);
    }

    #[test]
    fn record_serializes_wallets_as_list() {
        let wn = WalletName::new(
            "domain.com",
            "name",
            [("btc", "1Zjkhglkjhgfdslkfg")],
            Some("external_id".to_string()),
        );
        let body = WalletNamesBody {
            wallet_names: vec![wn.to_record()],
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"wallet_names":[{"domain_name":"domain.com","name":"name","wallets":[{"currency":"btc","wallet_address":"1Zjkhglkjhgfdslkfg"}],"external_id":"external_id"}]}"#
        );
    }

    #[test]
    fn record_includes_id_once_assigned() {
        let value = serde_json::to_value(sample().to_record()).unwrap();
        assert_eq!(value["id"], "id");
    }

    #[test]
    fn record_converts_back_to_entity() {
        let record: WalletNameRecord = serde_json::from_value(json!({
            "domain_name": "domain.com",
            "name": "name",
            "id": "test_id",
            "wallets": [
                {"currency": "btc", "wallet_address": "1234567890"},
                {"currency": "dgc", "wallet_address": "D1234567890"}
            ]
        }))
        .unwrap();
        let wn = WalletName::from(record);
        assert_eq!(wn.id.as_deref(), Some("test_id"));
        assert_eq!(wn.address("dgc"), Some("D1234567890"));
        assert_eq!(wn.used_currencies().collect::<Vec<_>>(), vec!["btc", "dgc"]);
        assert!(wn.external_id.is_none());
    }

    #[test]
    fn domain_keeps_unknown_fields() {
        let domain: Domain = serde_json::from_value(json!({
            "domain_name": "domain.com",
            "status": "OK",
            "delegation_status": true
        }))
        .unwrap();
        assert_eq!(domain.status.as_deref(), Some("OK"));
        assert_eq!(domain.details["delegation_status"], true);
    }

    #[test]
    fn create_domain_body() {
        assert_eq!(serde_json::to_string(&CreateDomain::default()).unwrap(), "{}");
        let body = CreateDomain {
            partner_id: Some("sub_partner_id"),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"partner_id":"sub_partner_id"}"#
        );
    }
}
