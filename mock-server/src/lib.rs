//! In-memory stand-in for the wallet-name directory service.
//!
//! Every JSON response uses the service envelope: `{"success": true, ...}`
//! on success, `{"success": false, "message": .., "failures": [..]}` on
//! failure. Routes under `/v1` and `/api/domain` require both an
//! `Authorization` and an `X-Partner-Id` header. Deleting wallet names
//! answers `204 No Content` with no body.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wallet {
    pub currency: String,
    pub wallet_address: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletName {
    #[serde(default)]
    pub id: Option<String>,
    pub domain_name: String,
    pub name: String,
    #[serde(default)]
    pub wallets: Vec<Wallet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

#[derive(Deserialize)]
pub struct WalletNames {
    pub wallet_names: Vec<WalletName>,
}

#[derive(Deserialize)]
pub struct WalletNameRef {
    pub domain_name: String,
    pub id: String,
}

#[derive(Deserialize)]
pub struct WalletNameRefs {
    pub wallet_names: Vec<WalletNameRef>,
}

#[derive(Deserialize, Default)]
pub struct WalletNameFilter {
    pub domain_name: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct CreateDomain {
    pub partner_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Partner {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug)]
struct DomainEntry {
    partner_id: String,
}

#[derive(Default)]
pub struct Directory {
    partners: BTreeMap<String, Partner>,
    domains: BTreeMap<String, DomainEntry>,
    wallet_names: HashMap<String, WalletName>,
}

pub type Db = Arc<RwLock<Directory>>;

/// Envelope failure; renders as `{"success": false, ...}` with its status.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: String,
    failures: Vec<String>,
}

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            failures: Vec::new(),
        }
    }

    fn with_failures(mut self, failures: Vec<String>) -> Self {
        self.failures = failures;
        self
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let failures: Vec<Value> = self
            .failures
            .iter()
            .map(|message| json!({ "message": message }))
            .collect();
        let body = json!({
            "success": false,
            "message": self.message,
            "failures": failures,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for Failure {
    fn from(rejection: JsonRejection) -> Self {
        Failure::new(rejection.status(), rejection.body_text())
    }
}

type Reply = Result<Json<Value>, Failure>;

fn success(payload: Value) -> Json<Value> {
    let mut body = json!({ "success": true });
    if let (Value::Object(envelope), Value::Object(payload)) = (&mut body, payload) {
        envelope.extend(payload);
    }
    Json(body)
}

fn authorize(headers: &HeaderMap) -> Result<String, Failure> {
    let present = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    match (present("authorization"), present("x-partner-id")) {
        (Some(_), Some(partner_id)) => Ok(partner_id),
        _ => Err(Failure::new(StatusCode::UNAUTHORIZED, "Missing API Key or Partner ID")),
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Directory::default()));
    Router::new()
        .route("/api/wallet_lookup/{name}/{currency}", get(wallet_lookup))
        .route("/api/domain", get(list_domains))
        .route("/v1/admin/partner", get(list_partners))
        .route(
            "/v1/admin/partner/{name}",
            post(create_partner).delete(delete_partner),
        )
        .route("/v1/partner/domain", get(domain_status_all))
        .route(
            "/v1/partner/domain/{domain}",
            get(domain_status).post(create_domain).delete(delete_domain),
        )
        .route("/v1/partner/domain/dnssec/{domain}", get(domain_dnssec))
        .route(
            "/v1/partner/walletname",
            get(list_wallet_names)
                .post(create_wallet_names)
                .put(update_wallet_names)
                .delete(delete_wallet_names),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

async fn wallet_lookup(
    State(db): State<Db>,
    Path((wallet_name, currency)): Path<(String, String)>,
) -> Reply {
    let directory = db.read().await;
    let address = directory
        .wallet_names
        .values()
        .find(|wn| format!("{}.{}", wn.name, wn.domain_name) == wallet_name)
        .and_then(|wn| wn.wallets.iter().find(|w| w.currency == currency))
        .map(|w| w.wallet_address.clone())
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "Wallet Name does not exist"))?;
    Ok(success(json!({
        "wallet_name": wallet_name,
        "currency": currency,
        "wallet_address": address,
    })))
}

// ---------------------------------------------------------------------------
// Partners
// ---------------------------------------------------------------------------

async fn list_partners(State(db): State<Db>, headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    let directory = db.read().await;
    let partners: Vec<&Partner> = directory.partners.values().collect();
    Ok(success(json!({ "partners": partners })))
}

async fn create_partner(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Reply {
    authorize(&headers)?;
    let mut directory = db.write().await;
    if directory.partners.contains_key(&name) {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Partner already exists"));
    }
    let partner = Partner {
        id: Uuid::new_v4().to_string(),
        name: name.clone(),
    };
    info!(partner = %name, "partner created");
    directory.partners.insert(name, partner.clone());
    Ok(success(json!({ "partner": partner })))
}

async fn delete_partner(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Reply {
    authorize(&headers)?;
    let mut directory = db.write().await;
    directory
        .partners
        .remove(&name)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "Partner does not exist"))?;
    Ok(success(json!({})))
}

// ---------------------------------------------------------------------------
// Domains
// ---------------------------------------------------------------------------

fn domain_status_json(domain_name: &str, entry: &DomainEntry) -> Value {
    json!({
        "domain_name": domain_name,
        "status": "OK",
        "partner_id": entry.partner_id,
    })
}

async fn list_domains(State(db): State<Db>, headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    let directory = db.read().await;
    let domains: Vec<Value> = directory
        .domains
        .keys()
        .map(|name| json!({ "domain_name": name }))
        .collect();
    Ok(success(json!({ "domains": domains })))
}

async fn domain_status_all(State(db): State<Db>, headers: HeaderMap) -> Reply {
    authorize(&headers)?;
    let directory = db.read().await;
    let domains: Vec<Value> = directory
        .domains
        .iter()
        .map(|(name, entry)| domain_status_json(name, entry))
        .collect();
    Ok(success(json!({ "domains": domains })))
}

async fn domain_status(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(domain): Path<String>,
) -> Reply {
    authorize(&headers)?;
    let directory = db.read().await;
    let entry = directory
        .domains
        .get(&domain)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "Domain does not exist"))?;
    Ok(success(json!({ "domains": [domain_status_json(&domain, entry)] })))
}

async fn create_domain(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(domain): Path<String>,
    payload: Result<Json<CreateDomain>, JsonRejection>,
) -> Reply {
    let caller = authorize(&headers)?;
    let Json(input) = payload?;
    let mut directory = db.write().await;
    if directory.domains.contains_key(&domain) {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Domain already exists"));
    }
    let partner_id = input.partner_id.unwrap_or(caller);
    info!(%domain, %partner_id, "domain created");
    directory
        .domains
        .insert(domain, DomainEntry { partner_id });
    Ok(success(json!({})))
}

async fn domain_dnssec(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(domain): Path<String>,
) -> Reply {
    authorize(&headers)?;
    let directory = db.read().await;
    if !directory.domains.contains_key(&domain) {
        return Err(Failure::new(StatusCode::NOT_FOUND, "Domain does not exist"));
    }
    Ok(success(json!({
        "secure": true,
        "ds_records": [format!("{domain}. IN DS 12345 8 2 ABCDEF")],
        "public_key_signing_key": format!("{domain}-ksk"),
    })))
}

async fn delete_domain(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(domain): Path<String>,
) -> Reply {
    authorize(&headers)?;
    let mut directory = db.write().await;
    directory
        .domains
        .remove(&domain)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "Domain does not exist"))?;
    directory.wallet_names.retain(|_, wn| wn.domain_name != domain);
    Ok(success(json!({})))
}

// ---------------------------------------------------------------------------
// Wallet names
// ---------------------------------------------------------------------------

async fn list_wallet_names(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(filter): Query<WalletNameFilter>,
) -> Reply {
    authorize(&headers)?;
    let directory = db.read().await;
    let mut matches: Vec<&WalletName> = directory
        .wallet_names
        .values()
        .filter(|wn| filter.domain_name.as_ref().map_or(true, |d| &wn.domain_name == d))
        .filter(|wn| {
            filter
                .external_id
                .as_ref()
                .map_or(true, |e| wn.external_id.as_ref() == Some(e))
        })
        .collect();
    matches.sort_by(|a, b| (&a.domain_name, &a.name).cmp(&(&b.domain_name, &b.name)));
    Ok(success(json!({
        "wallet_name_count": matches.len(),
        "wallet_names": matches,
    })))
}

/// Unknown domains, names already stored, and names repeated within the batch.
fn creation_failures(directory: &Directory, wallet_names: &[WalletName]) -> Vec<String> {
    let mut failures = Vec::new();
    let mut batch: HashSet<(&str, &str)> = HashSet::new();
    for wn in wallet_names {
        if !directory.domains.contains_key(&wn.domain_name) {
            failures.push(format!("Domain does not exist: {}", wn.domain_name));
        } else if !batch.insert((wn.domain_name.as_str(), wn.name.as_str()))
            || directory
                .wallet_names
                .values()
                .any(|existing| existing.domain_name == wn.domain_name && existing.name == wn.name)
        {
            failures.push(format!("Wallet Name already exists: {}.{}", wn.name, wn.domain_name));
        }
    }
    failures
}

async fn create_wallet_names(
    State(db): State<Db>,
    headers: HeaderMap,
    payload: Result<Json<WalletNames>, JsonRejection>,
) -> Reply {
    authorize(&headers)?;
    let Json(input) = payload?;
    let mut directory = db.write().await;

    let failures = creation_failures(&directory, &input.wallet_names);
    if !failures.is_empty() {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Unable to create wallet names")
            .with_failures(failures));
    }

    let mut created = Vec::new();
    for mut wn in input.wallet_names {
        let id = Uuid::new_v4().to_string();
        wn.id = Some(id.clone());
        info!(name = %wn.name, domain = %wn.domain_name, "wallet name created");
        created.push(json!({ "domain_name": wn.domain_name, "name": wn.name, "id": id }));
        directory.wallet_names.insert(id, wn);
    }
    Ok(success(json!({ "wallet_names": created })))
}

async fn update_wallet_names(
    State(db): State<Db>,
    headers: HeaderMap,
    payload: Result<Json<WalletNames>, JsonRejection>,
) -> Reply {
    authorize(&headers)?;
    let Json(input) = payload?;
    let mut directory = db.write().await;

    let failures: Vec<String> = input
        .wallet_names
        .iter()
        .filter(|wn| {
            wn.id
                .as_ref()
                .map_or(true, |id| !directory.wallet_names.contains_key(id))
        })
        .map(|wn| format!("Wallet Name does not exist: {}.{}", wn.name, wn.domain_name))
        .collect();
    if !failures.is_empty() {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Unable to update wallet names")
            .with_failures(failures));
    }

    let mut updated = Vec::new();
    for wn in input.wallet_names {
        let Some(id) = wn.id.clone() else { continue };
        updated.push(json!({ "domain_name": wn.domain_name, "name": wn.name, "id": id }));
        directory.wallet_names.insert(id, wn);
    }
    Ok(success(json!({ "wallet_names": updated })))
}

async fn delete_wallet_names(
    State(db): State<Db>,
    headers: HeaderMap,
    payload: Result<Json<WalletNameRefs>, JsonRejection>,
) -> Result<StatusCode, Failure> {
    authorize(&headers)?;
    let Json(input) = payload?;
    let mut directory = db.write().await;

    let failures: Vec<String> = input
        .wallet_names
        .iter()
        .filter(|r| {
            directory
                .wallet_names
                .get(&r.id)
                .map_or(true, |wn| wn.domain_name != r.domain_name)
        })
        .map(|r| format!("Wallet Name does not exist: {}", r.id))
        .collect();
    if !failures.is_empty() {
        return Err(Failure::new(StatusCode::NOT_FOUND, "Unable to delete wallet names")
            .with_failures(failures));
    }
    for r in input.wallet_names {
        directory.wallet_names.remove(&r.id);
    }
    Ok(StatusCode::NO_CONTENT)
}
