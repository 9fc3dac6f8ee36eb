//! CLI output formatting tests.
//!
//! These tests verify that CLI output is correctly formatted for both
//! text and JSON output modes.

#[cfg(test)]
mod text_formatter_tests {
    use super::super::text::TextFormatter;
    use chrono::DateTime;
    use ltfit_core::{ApiKeys, CalendarEvent, DerivedSnapshot};
    use ltfit_fetch::ApiError;
    use ltfit_store::{CoordinatorState, RefreshFailure};
    use std::sync::Arc;

    fn snapshot() -> DerivedSnapshot {
        DerivedSnapshot {
            total_visits: 42,
            visits_this_year: 12,
            visits_this_month: 3,
            visits_this_week: 1,
            last_visit_timestamp: Some(1_718_452_800.0),
            ..DerivedSnapshot::default()
        }
    }

    fn available_state() -> CoordinatorState {
        CoordinatorState {
            data: Some(Arc::new(snapshot())),
            last_update_success: true,
            member_id: Some("4242".into()),
            refreshes: 1,
            ..CoordinatorState::default()
        }
    }

    #[test]
    fn test_visits_plain() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_visits("me@example.com", &available_state());

        assert!(output.starts_with("me@example.com (available)"));
        assert!(output.contains("Member 4242"));
        assert!(output.contains("Total visits:   42"));
        assert!(output.contains("This year:      12"));
        assert!(output.contains("This month:     3"));
        assert!(output.contains("This week:      1"));
        assert!(!output.contains("\x1b["), "No ANSI codes without colors");
    }

    #[test]
    fn test_visits_without_data() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_visits("me@example.com", &CoordinatorState::default());

        assert!(output.contains("(unavailable)"));
        assert!(output.contains("No data yet"));
    }

    #[test]
    fn test_visits_with_failure_keeps_counts() {
        let formatter = TextFormatter::new(false);
        let state = CoordinatorState {
            last_update_success: false,
            last_failure: Some(RefreshFailure::from(ApiError::InvalidAuth)),
            ..available_state()
        };

        let output = formatter.format_visits("me@example.com", &state);
        assert!(output.contains("(unavailable)"));
        assert!(output.contains("Total visits:   42"));
        assert!(output.contains("Login failed:"));
    }

    #[test]
    fn test_visits_with_reservation_error() {
        let formatter = TextFormatter::new(false);
        let state = CoordinatorState {
            reservations_error: Some(ApiError::CannotConnect("timeout".into())),
            ..available_state()
        };

        let output = formatter.format_visits("me@example.com", &state);
        assert!(output.contains("Reservations not updated"));
    }

    #[test]
    fn test_visits_with_colors() {
        let formatter = TextFormatter::new(true);
        let output = formatter.format_visits("me@example.com", &available_state());
        assert!(output.contains("\x1b[32mavailable\x1b[0m"));
        assert!(output.contains("\x1b[1mme@example.com\x1b[0m"));
    }

    #[test]
    fn test_events() {
        let formatter = TextFormatter::new(false);
        let event = CalendarEvent {
            summary: "Yoga".into(),
            start: DateTime::parse_from_rfc3339("2024-06-15T09:00:00Z").unwrap(),
            end: DateTime::parse_from_rfc3339("2024-06-15T10:00:00Z").unwrap(),
            description: None,
            location: Some("Studio 2".into()),
            uid: Some("r1".into()),
        };

        let output = formatter.format_events(&[event]);
        assert!(output.contains("Yoga"));
        assert!(output.contains("@ Studio 2"));

        assert_eq!(formatter.format_events(&[]), "No upcoming reservations");
    }

    #[test]
    fn test_keys_masked_by_default() {
        let formatter = TextFormatter::new(false);
        let keys = ApiKeys::new("0123456789abcdef0123456789abcdef", "ABCDEFGHIJKLMNOPQRSTUVWXYZ012345")
            .unwrap();

        let masked = formatter.format_keys(&keys, false);
        assert!(masked.contains("0123…"));
        assert!(!masked.contains("0123456789abcdef0123456789abcdef"));

        let revealed = formatter.format_keys(&keys, true);
        assert!(revealed.contains("ABCDEFGHIJKLMNOPQRSTUVWXYZ012345"));
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::{JsonFormatter, KeysOutput, VisitsOutput};
    use ltfit_core::{ApiKeys, DerivedSnapshot};
    use ltfit_fetch::ApiError;
    use ltfit_store::{CoordinatorState, RefreshFailure};
    use serde_json::Value;
    use std::sync::Arc;

    #[test]
    fn test_visits_fields() {
        let state = CoordinatorState {
            data: Some(Arc::new(DerivedSnapshot {
                total_visits: 5,
                visits_this_year: 4,
                visits_this_month: 2,
                visits_this_week: 1,
                last_visit_timestamp: Some(1_718_452_800.0),
                ..DerivedSnapshot::default()
            })),
            last_update_success: true,
            member_id: Some("4242".into()),
            ..CoordinatorState::default()
        };

        let json = JsonFormatter::new(false)
            .format_visits("me@example.com", &state)
            .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["username"], "me@example.com");
        assert_eq!(value["memberId"], "4242");
        assert_eq!(value["available"], true);
        assert_eq!(value["totalVisits"], 5);
        assert_eq!(value["visitsThisYear"], 4);
        assert_eq!(value["visitsThisMonth"], 2);
        assert_eq!(value["visitsThisWeek"], 1);
        assert_eq!(value["lastVisit"], "2024-06-15T12:00:00+00:00");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_visits_unavailable() {
        let state = CoordinatorState {
            last_failure: Some(RefreshFailure::from(ApiError::CannotConnect("offline".into()))),
            ..CoordinatorState::default()
        };

        let output = VisitsOutput::from_state("me@example.com", &state);
        assert!(!output.available);
        assert_eq!(output.total_visits, 0);
        assert!(output.last_visit.is_none());
        assert!(output.error.unwrap().contains("offline"));
    }

    #[test]
    fn test_pretty_output() {
        let json = JsonFormatter::new(true).format(&serde_json::json!({"a": 1})).unwrap();
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_keys_output() {
        let keys = ApiKeys::new("0123456789abcdef0123456789abcdef", "ABCDEFGHIJKLMNOPQRSTUVWXYZ012345")
            .unwrap();
        let masked = KeysOutput::new(&keys, false);
        assert!(masked.masked);
        assert_eq!(masked.account_key, "ABCD…");

        let json = JsonFormatter::new(false).format(&KeysOutput::new(&keys, true)).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["subscriptionKey"], "0123456789abcdef0123456789abcdef");
        assert_eq!(value["masked"], false);
    }
}
