//! Serialization tests for core models.

use serde_json::json;

use super::*;

#[test]
fn test_start_of_week_serializes_as_index() {
    let json = serde_json::to_value(StartOfWeek::SUNDAY).unwrap();
    assert_eq!(json, json!(6));

    let parsed: StartOfWeek = serde_json::from_value(json!(2)).unwrap();
    assert_eq!(parsed.name(), "Wednesday");

    let bad: Result<StartOfWeek, _> = serde_json::from_value(json!(8));
    assert!(bad.is_err());
}

#[test]
fn test_snapshot_serializes_raw_records_verbatim() {
    let snapshot = DerivedSnapshot {
        total_visits: 1,
        visits_this_year: 1,
        visits_this_month: 1,
        visits_this_week: 0,
        last_visit_timestamp: Some(1_700_000_000.0),
        raw_visits: vec![VisitRecord::new(json!({"usageDateTime": 1_700_000_000_000_i64, "clubName": "Eden"}))],
        reservations: vec![ReservationRecord::new(json!({"id": "r1", "custom": [1, 2]}))],
    };

    let value = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(value["raw_visits"][0]["clubName"], json!("Eden"));
    assert_eq!(value["reservations"][0]["custom"], json!([1, 2]));
    assert_eq!(value["last_visit_timestamp"], json!(1_700_000_000.0));

    let back: DerivedSnapshot = serde_json::from_value(value).unwrap();
    assert_eq!(back, snapshot);
}

#[test]
fn test_empty_snapshot_has_null_last_visit() {
    let value = serde_json::to_value(DerivedSnapshot::empty(vec![])).unwrap();
    assert_eq!(value["last_visit_timestamp"], json!(null));
    assert_eq!(value["total_visits"], json!(0));
}

#[test]
fn test_session_state_ignores_unknown_fields() {
    let state: SessionState = serde_json::from_value(json!({
        "token": "T",
        "ssoId": "S",
        "somethingElse": {"deep": true}
    }))
    .unwrap();
    assert_eq!(state.access_token(), Some("T"));
    assert_eq!(state.sso_id(), Some("S"));
}
