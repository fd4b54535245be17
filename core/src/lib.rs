//! Client core for a wallet-name directory service.
//!
//! # Overview
//! Resolves human-readable wallet names to cryptocurrency addresses and lets
//! an authenticated partner manage wallet names, domains and sub-partners
//! over HTTP+JSON. Two pieces carry the rules:
//!
//! - [`envelope`] validates the method, attaches the standard headers,
//!   performs one round-trip through a [`Transport`], and classifies the
//!   response into a decoded document or an [`EnvelopeError`].
//! - [`uri`] parses `bitcoin:`/`litecoin:`/`dogecoin:` payment URIs into an
//!   address plus BIP21 parameters, with the BIP72 `r` parameter promoted.
//!
//! [`DirectoryClient`] is the CRUD layer on top of the envelope.
//!
//! # Design
//! - No global state. Credentials, base URL and transport are explicit
//!   values held by the caller or by `DirectoryClient`.
//! - I/O sits behind the [`Transport`] trait. `UreqTransport` (feature
//!   `ureq-transport`, on by default) is the stock blocking implementation.
//! - Every call is synchronous and happens exactly once: no retries, no
//!   caching.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
#[cfg(feature = "ureq-transport")]
pub mod transport;
pub mod types;
pub mod uri;

pub use client::DirectoryClient;
pub use config::ClientConfig;
pub use envelope::{send, Credentials, Document};
pub use error::{ApiError, EnvelopeError, RemoteError, TransportError, UriError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
#[cfg(feature = "ureq-transport")]
pub use transport::UreqTransport;
pub use types::{Domain, Partner, WalletName};
pub use uri::{parse_payment_uri, ParsedPaymentUri};
