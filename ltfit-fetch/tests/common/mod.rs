//! Shared fixtures for the wiremock-backed client tests.

#![allow(dead_code)]

use std::sync::Arc;

use ltfit_core::Credentials;
use ltfit_fetch::{ApiClient, ApiKeyCache, Endpoints};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SUBSCRIPTION_KEY: &str = "924c03ce573d473793e184219a6a19bd";
pub const ACCOUNT_KEY: &str = "CkXadK3LkNF6sSj4jLGbtBB0amCwdWlv";
pub const MEMBER_ID: &str = "112233";
pub const VISITS_PATH: &str = "/myaccount-club-visits-gateway-api/members/112233/club-visits";
pub const RESERVATIONS_PATH: &str = "/ux/web-schedules/v2/reservations/upcoming";

/// Member portal HTML carrying both keys.
pub fn key_page() -> String {
    format!(
        r#"<html><head><script>
        window.__CONFIG__ = {{"env":"prod","apimKey": "{SUBSCRIPTION_KEY}","ltMyAccountApiKey" : "{ACCOUNT_KEY}"}};
        </script></head><body></body></html>"#
    )
}

pub fn login_success() -> Value {
    json!({
        "message": "Success",
        "status": "0",
        "token": "T",
        "ssoId": "S",
        "partyId": 998877
    })
}

pub async fn mount_key_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(key_page()))
        .mount(server)
        .await;
}

pub async fn mount_login(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/auth/v2/login"))
        .and(header("ocp-apim-subscription-key", SUBSCRIPTION_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/user-profile/profile"))
        .and(header("authorization", "Bearer T"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"memberDetails": {"memberId": MEMBER_ID, "firstName": "Pat"}})),
        )
        .mount(server)
        .await;
}

/// Key page, successful login and profile.
pub async fn mount_auth(server: &MockServer) {
    mount_key_page(server).await;
    mount_login(server, login_success()).await;
    mount_profile(server).await;
}

/// Client pointed at the mock server with its own key cache.
pub fn client(server: &MockServer) -> ApiClient {
    ApiClient::builder(Credentials::new("me@example.com", "hunter2"))
        .endpoints(Endpoints::with_base_url(&server.uri()))
        .key_cache(Arc::new(ApiKeyCache::new()))
        .build()
        .expect("failed to build test ApiClient")
}
