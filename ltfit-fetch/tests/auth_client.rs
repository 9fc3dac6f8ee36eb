//! Integration tests for login classification over HTTP.

mod common;

use chrono::NaiveDate;
use ltfit_fetch::{
    ApiError, ApiKeyCache, AuthClient, Endpoints, HttpClient, KeyFetchError, KeyFetcher,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{MEMBER_ID, client, mount_auth, mount_key_page, mount_login, mount_profile};

#[tokio::test]
async fn successful_login_stores_session_and_member() {
    let server = MockServer::start().await;
    mount_key_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/v2/login"))
        .and(body_json(json!({"username": "me@example.com", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::login_success()))
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server).await;

    let mut client = client(&server);
    client.authenticate().await.unwrap();

    let session = client.session().unwrap();
    assert_eq!(session.access_token(), Some("T"));
    assert_eq!(session.sso_id(), Some("S"));
    assert_eq!(session.party_id(), Some("998877"));
    assert_eq!(client.member_id(), Some(MEMBER_ID));
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn password_change_with_sso_id_still_logs_in() {
    let server = MockServer::start().await;
    mount_key_page(&server).await;
    mount_login(
        &server,
        json!({"message": "Password needs to be changed.", "token": "T", "ssoId": "S"}),
    )
    .await;
    mount_profile(&server).await;

    let mut client = client(&server);
    client.authenticate().await.unwrap();
    assert_eq!(client.member_id(), Some(MEMBER_ID));
}

#[tokio::test]
async fn password_change_without_sso_id_fails() {
    let server = MockServer::start().await;
    mount_key_page(&server).await;
    mount_login(&server, json!({"message": "Password needs to be changed.", "token": "T"})).await;

    let err = client(&server).authenticate().await.unwrap_err();
    assert!(matches!(err, ApiError::PasswordNeedsToBeChanged), "got {err:?}");
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let cases = [
        ("-201", "invalid"),
        ("-207", "too_many"),
        ("-208", "activation"),
        ("-209", "duplicate"),
    ];

    for (status, expected) in cases {
        let server = MockServer::start().await;
        mount_key_page(&server).await;
        mount_login(&server, json!({"status": status, "message": "Error"})).await;

        let err = client(&server).authenticate().await.unwrap_err();
        let actual = match err {
            ApiError::InvalidAuth => "invalid",
            ApiError::TooManyAuthenticationAttempts => "too_many",
            ApiError::ActivationRequired => "activation",
            ApiError::DuplicateEmail => "duplicate",
            other => panic!("unexpected {other:?} for status {status}"),
        };
        assert_eq!(actual, expected);
    }
}

#[tokio::test]
async fn http_401_on_login_is_invalid_auth() {
    let server = MockServer::start().await;
    mount_key_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/v2/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server).authenticate().await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidAuth), "got {err:?}");
}

#[tokio::test]
async fn non_json_login_body_is_unknown() {
    let server = MockServer::start().await;
    mount_key_page(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/v2/login"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = client(&server).authenticate().await.unwrap_err();
    assert!(matches!(err, ApiError::UnknownAuthError(_)), "got {err:?}");
}

#[tokio::test]
async fn success_without_token_requires_auth() {
    let server = MockServer::start().await;
    mount_key_page(&server).await;
    mount_login(&server, json!({"message": "Success", "ssoId": "S"})).await;

    let err = client(&server).authenticate().await.unwrap_err();
    assert!(matches!(err, ApiError::AuthRequired(_)), "got {err:?}");
}

#[tokio::test]
async fn key_page_failure_is_cannot_connect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server).authenticate().await.unwrap_err();
    assert!(matches!(err, ApiError::CannotConnect(_)), "got {err:?}");
}

#[tokio::test]
async fn profile_401_is_invalid_auth() {
    let server = MockServer::start().await;
    mount_key_page(&server).await;
    mount_login(&server, common::login_success()).await;
    Mock::given(method("GET"))
        .and(path("/user-profile/profile"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server).authenticate().await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidAuth), "got {err:?}");
}

#[tokio::test]
async fn unusable_profiles_are_profile_errors() {
    let responses = [
        ResponseTemplate::new(500),
        ResponseTemplate::new(200).set_body_string("not json"),
        ResponseTemplate::new(200).set_body_json(json!({"other": 1})),
        ResponseTemplate::new(200).set_body_json(json!({"memberDetails": {"name": "Pat"}})),
    ];

    for response in responses {
        let server = MockServer::start().await;
        mount_key_page(&server).await;
        mount_login(&server, common::login_success()).await;
        Mock::given(method("GET"))
            .and(path("/user-profile/profile"))
            .respond_with(response)
            .mount(&server)
            .await;

        let err = client(&server).authenticate().await.unwrap_err();
        assert!(matches!(err, ApiError::ProfileError(_)), "got {err:?}");
    }
}

#[tokio::test]
async fn relogin_replaces_previous_session() {
    let server = MockServer::start().await;
    mount_auth(&server).await;

    let mut client = client(&server);
    client.authenticate().await.unwrap();
    assert_eq!(client.session().unwrap().sso_id(), Some("S"));

    server.reset().await;
    mount_key_page(&server).await;
    mount_login(&server, json!({"message": "Success", "token": "T"})).await;
    mount_profile(&server).await;

    client.authenticate().await.unwrap();
    let session = client.session().unwrap();
    assert_eq!(session.access_token(), Some("T"));
    assert_eq!(session.sso_id(), None);
    assert_eq!(session.party_id(), None);

    // Without an SSO id the data endpoints are never called.
    let day = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    let err = client.fetch_visits(day, day).await.unwrap_err();
    assert!(matches!(err, ApiError::AuthRequired(_)), "got {err:?}");
}

#[tokio::test]
async fn direct_key_fetch_reports_key_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let auth = AuthClient::new(
        HttpClient::new().unwrap(),
        Endpoints::with_base_url(&server.uri()),
        KeyFetcher::new(
            HttpClient::new().unwrap(),
            format!("{}/", server.uri()),
            Arc::new(ApiKeyCache::new()),
        ),
    );

    let err = auth.fetch_api_keys(true).await.unwrap_err();
    assert!(
        matches!(err, ApiError::KeyFetch(KeyFetchError::HttpStatus(503))),
        "got {err:?}"
    );
    assert!(err.is_transient());
}
