//! End-to-end refresh through a real `ApiClient` against a mock server.

use std::sync::Arc;

use chrono::NaiveDate;
use ltfit_core::{Credentials, StartOfWeek};
use ltfit_fetch::{ApiClient, ApiKeyCache, Endpoints};
use ltfit_store::{Coordinator, DEFAULT_UPDATE_INTERVAL, events};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUBSCRIPTION_KEY: &str = "924c03ce573d473793e184219a6a19bd";
const ACCOUNT_KEY: &str = "CkXadK3LkNF6sSj4jLGbtBB0amCwdWlv";

async fn mount_upstream(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"apimKey":"{SUBSCRIPTION_KEY}","ltMyAccountApiKey":"{ACCOUNT_KEY}"}}"#
        )))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v2/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Success", "token": "T", "ssoId": "S"})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user-profile/profile"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"memberDetails": {"memberId": 4242}})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/myaccount-club-visits-gateway-api/members/4242/club-visits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            // 2024-06-15T12:00:00Z
            {"usageDateTime": 1_718_452_800_000_i64},
            // 2024-01-11T19:06:40Z
            {"usageDateTime": 1_705_000_000_000_i64},
            {"clubName": "missing timestamp"}
        ]})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ux/web-schedules/v2/reservations/upcoming"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [
            {"id": 2, "start": "2024-06-22T09:00:00-05:00", "end": "2024-06-22T10:00:00-05:00", "eventName": "Cycle"},
            {"id": 1, "start": "2024-06-21T09:00:00-05:00", "end": "2024-06-21T10:00:00-05:00", "eventName": "Yoga"}
        ]})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn refresh_derives_snapshot_from_api() {
    let server = MockServer::start().await;
    mount_upstream(&server).await;

    let client = ApiClient::builder(Credentials::new("me@example.com", "pw"))
        .endpoints(Endpoints::with_base_url(&server.uri()))
        .key_cache(Arc::new(ApiKeyCache::new()))
        .build()
        .unwrap();
    let coordinator = Coordinator::new(client, StartOfWeek::SUNDAY, DEFAULT_UPDATE_INTERVAL);

    let today = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
    let snapshot = coordinator.refresh_for(today).await.unwrap();

    assert_eq!(snapshot.total_visits, 3);
    assert_eq!(snapshot.visits_this_year, 2);
    assert_eq!(snapshot.visits_this_month, 1);
    // Sunday-start week of 2024-06-20 begins 2024-06-16.
    assert_eq!(snapshot.visits_this_week, 0);
    assert_eq!(snapshot.last_visit_timestamp, Some(1_718_452_800.0));

    let summaries: Vec<_> = events(&snapshot.reservations)
        .into_iter()
        .map(|e| e.summary)
        .collect();
    assert_eq!(summaries, vec!["Yoga", "Cycle"]);

    assert!(coordinator.available());
    assert_eq!(coordinator.member_id().as_deref(), Some("4242"));
    assert_eq!(coordinator.username(), "me@example.com");
}
