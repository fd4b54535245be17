use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, "api_key")
        .header("X-Partner-Id", "partner_id")
        .body(body.map(|b| b.to_string()).unwrap_or_default())
        .unwrap()
}

async fn call(app: &Router, req: Request<String>) -> axum::response::Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn with_domain(domain: &str) -> Router {
    let app = app();
    let resp = call(&app, request("POST", &format!("/v1/partner/domain/{domain}"), Some(json!({})))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    app
}

// --- auth ---

#[tokio::test]
async fn partner_routes_require_credentials() {
    let app = app();
    let resp = call(
        &app,
        Request::builder()
            .uri("/v1/partner/walletname")
            .body(String::new())
            .unwrap(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers()[http::header::CONTENT_TYPE],
        "application/json"
    );
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Missing API Key or Partner ID");
}

// --- partners ---

#[tokio::test]
async fn partner_lifecycle() {
    let app = app();

    let resp = call(&app, request("POST", "/v1/admin/partner/Test%20Partner", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["partner"]["name"], "Test Partner");
    let id = body["partner"]["id"].as_str().unwrap().to_string();

    let resp = call(&app, request("POST", "/v1/admin/partner/Test%20Partner", None)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_json(call(&app, request("GET", "/v1/admin/partner", None)).await).await;
    assert_eq!(body["partners"], json!([{"id": id, "name": "Test Partner"}]));

    let resp = call(&app, request("DELETE", "/v1/admin/partner/Test%20Partner", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = call(&app, request("DELETE", "/v1/admin/partner/Test%20Partner", None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- domains ---

#[tokio::test]
async fn domain_status_and_dnssec() {
    let app = with_domain("domain.com").await;

    let body = body_json(call(&app, request("GET", "/v1/partner/domain/domain.com", None)).await).await;
    assert_eq!(body["domains"][0]["domain_name"], "domain.com");
    assert_eq!(body["domains"][0]["status"], "OK");
    assert_eq!(body["domains"][0]["partner_id"], "partner_id");

    let body = body_json(call(&app, request("GET", "/api/domain", None)).await).await;
    assert_eq!(body["domains"], json!([{"domain_name": "domain.com"}]));

    let body =
        body_json(call(&app, request("GET", "/v1/partner/domain/dnssec/domain.com", None)).await).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["secure"], true);

    let resp = call(&app, request("GET", "/v1/partner/domain/other.com", None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn domain_for_sub_partner() {
    let app = app();
    let resp = call(
        &app,
        request(
            "POST",
            "/v1/partner/domain/domain.com",
            Some(json!({"partner_id": "sub_partner_id"})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(call(&app, request("GET", "/v1/partner/domain", None)).await).await;
    assert_eq!(body["domains"][0]["partner_id"], "sub_partner_id");
}

// --- wallet names ---

#[tokio::test]
async fn create_wallet_name_in_unknown_domain_reports_failures() {
    let app = app();
    let resp = call(
        &app,
        request(
            "POST",
            "/v1/partner/walletname",
            Some(json!({"wallet_names": [
                {"domain_name": "nope.com", "name": "a", "wallets": []},
                {"domain_name": "gone.com", "name": "b", "wallets": []}
            ]})),
        ),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Unable to create wallet names");
    assert_eq!(
        body["failures"],
        json!([
            {"message": "Domain does not exist: nope.com"},
            {"message": "Domain does not exist: gone.com"}
        ])
    );
}

#[tokio::test]
async fn duplicate_names_in_one_request_are_rejected() {
    let app = with_domain("domain.com").await;
    let entry = json!({"domain_name": "domain.com", "name": "name", "wallets": []});
    let resp = call(
        &app,
        request(
            "POST",
            "/v1/partner/walletname",
            Some(json!({"wallet_names": [entry.clone(), entry]})),
        ),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(
        body["failures"],
        json!([{"message": "Wallet Name already exists: name.domain.com"}])
    );

    // Nothing from the rejected batch was stored.
    let body = body_json(call(&app, request("GET", "/v1/partner/walletname", None)).await).await;
    assert_eq!(body["wallet_name_count"], 0);
}

#[tokio::test]
async fn malformed_body_is_an_envelope_failure() {
    let app = app();
    let resp = call(
        &app,
        request("POST", "/v1/partner/walletname", Some(json!({"not_wallet_names": 1}))),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(resp).await["success"], false);
}

#[tokio::test]
async fn wallet_name_lifecycle() {
    let app = with_domain("domain.com").await;

    // create
    let resp = call(
        &app,
        request(
            "POST",
            "/v1/partner/walletname",
            Some(json!({"wallet_names": [{
                "domain_name": "domain.com",
                "name": "name",
                "wallets": [{"currency": "btc", "wallet_address": "1Zjkhglkjhgfdslkfg"}],
                "external_id": "ext_id"
            }]})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["wallet_names"][0]["domain_name"], "domain.com");
    assert_eq!(body["wallet_names"][0]["name"], "name");
    let id = body["wallet_names"][0]["id"].as_str().unwrap().to_string();

    // lookup is anonymous
    let resp = call(
        &app,
        Request::builder()
            .uri("/api/wallet_lookup/name.domain.com/btc")
            .body(String::new())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["wallet_address"], "1Zjkhglkjhgfdslkfg");

    // list with filters
    let body = body_json(
        call(
            &app,
            request("GET", "/v1/partner/walletname?domain_name=domain.com&external_id=ext_id", None),
        )
        .await,
    )
    .await;
    assert_eq!(body["wallet_name_count"], 1);
    assert_eq!(body["wallet_names"][0]["id"], id.as_str());

    let body = body_json(
        call(&app, request("GET", "/v1/partner/walletname?external_id=other", None)).await,
    )
    .await;
    assert_eq!(body["wallet_name_count"], 0);

    // update
    let resp = call(
        &app,
        request(
            "PUT",
            "/v1/partner/walletname",
            Some(json!({"wallet_names": [{
                "id": id,
                "domain_name": "domain.com",
                "name": "name",
                "wallets": [{"currency": "ltc", "wallet_address": "LaddR"}]
            }]})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = call(
        &app,
        Request::builder()
            .uri("/api/wallet_lookup/name.domain.com/ltc")
            .body(String::new())
            .unwrap(),
    )
    .await;
    assert_eq!(body_json(resp).await["wallet_address"], "LaddR");

    // delete answers 204 with no body
    let resp = call(
        &app,
        request(
            "DELETE",
            "/v1/partner/walletname",
            Some(json!({"wallet_names": [{"domain_name": "domain.com", "id": id}]})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // lookup after delete
    let resp = call(
        &app,
        Request::builder()
            .uri("/api/wallet_lookup/name.domain.com/btc")
            .body(String::new())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_unknown_wallet_name_fails() {
    let app = with_domain("domain.com").await;
    let resp = call(
        &app,
        request(
            "PUT",
            "/v1/partner/walletname",
            Some(json!({"wallet_names": [{"id": "missing", "domain_name": "domain.com", "name": "name"}]})),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["failures"][0]["message"], "Wallet Name does not exist: name.domain.com");
}
