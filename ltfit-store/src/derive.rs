//! Visit statistics derivation.
//!
//! A [`DerivedSnapshot`] is rebuilt from scratch after every successful
//! update: counts are never carried over between refresh cycles.

use chrono::{Datelike, Days, NaiveDate, TimeZone};
use ltfit_core::{DerivedSnapshot, ReservationRecord, StartOfWeek, VisitRecord};
use serde_json::Value;
use tracing::{debug, warn};

/// First day of the week containing `today`.
pub fn week_start(today: NaiveDate, start_of_week: StartOfWeek) -> NaiveDate {
    let today_index = today.weekday().num_days_from_monday();
    let offset = (today_index + 7 - u32::from(start_of_week.index())) % 7;
    today
        .checked_sub_days(Days::new(u64::from(offset)))
        .unwrap_or(NaiveDate::MIN)
}

/// Visit records from the `data` array of a visits payload.
pub fn visits_from_payload(payload: Option<&Value>) -> Vec<VisitRecord> {
    records(payload, "data", VisitRecord::new)
}

/// Reservation records from the `results` array of a reservations payload.
pub fn reservations_from_payload(payload: Option<&Value>) -> Vec<ReservationRecord> {
    records(payload, "results", ReservationRecord::new)
}

fn records<T>(payload: Option<&Value>, key: &str, wrap: impl Fn(Value) -> T) -> Vec<T> {
    payload
        .and_then(|p| p.get(key))
        .and_then(Value::as_array)
        .map(|items| items.iter().cloned().map(wrap).collect())
        .unwrap_or_default()
}

/// Computes visit counts for `today` in time zone `tz`.
///
/// Records without a usable `usageDateTime` are skipped for the year, month
/// and week buckets but still count toward `total_visits`. The week bucket
/// is independent of the month bucket, so a week spanning a month boundary
/// counts visits from both months.
pub fn derive_snapshot<Tz: TimeZone>(
    visits: &[VisitRecord],
    reservations: Vec<ReservationRecord>,
    today: NaiveDate,
    start_of_week: StartOfWeek,
    tz: &Tz,
) -> DerivedSnapshot {
    if visits.is_empty() {
        return DerivedSnapshot::empty(reservations);
    }

    let week_start = week_start(today, start_of_week);
    let mut snapshot = DerivedSnapshot {
        total_visits: visits.len(),
        raw_visits: visits.to_vec(),
        reservations,
        ..DerivedSnapshot::default()
    };

    for visit in visits {
        let parsed = visit
            .visited_at()
            .and_then(|at| visit.timestamp_secs().map(|secs| (at, secs)));
        let (visited_at, secs) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Skipping visit record");
                continue;
            }
        };

        let date = visited_at.with_timezone(tz).date_naive();
        if date.year() == today.year() {
            snapshot.visits_this_year += 1;
            if date.month() == today.month() {
                snapshot.visits_this_month += 1;
            }
        }
        if date >= week_start {
            snapshot.visits_this_week += 1;
        }

        snapshot.last_visit_timestamp = Some(match snapshot.last_visit_timestamp {
            Some(last) => last.max(secs),
            None => secs,
        });
    }

    debug!(
        total = snapshot.total_visits,
        year = snapshot.visits_this_year,
        month = snapshot.visits_this_month,
        week = snapshot.visits_this_week,
        "Derived visit statistics"
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, Utc};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::Level;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn visit_at(y: i32, m: u32, d: u32) -> VisitRecord {
        let at: NaiveDateTime = date(y, m, d).and_hms_opt(12, 0, 0).unwrap();
        VisitRecord::new(json!({"usageDateTime": at.and_utc().timestamp_millis()}))
    }

    #[test]
    fn test_week_start_for_every_start_day() {
        // 2024-03-14 is a Thursday
        let today = date(2024, 3, 14);
        let expected = [
            date(2024, 3, 11), // Monday
            date(2024, 3, 12), // Tuesday
            date(2024, 3, 13), // Wednesday
            date(2024, 3, 14), // Thursday
            date(2024, 3, 8),  // Friday
            date(2024, 3, 9),  // Saturday
            date(2024, 3, 10), // Sunday
        ];

        for (day, want) in StartOfWeek::all().zip(expected) {
            assert_eq!(week_start(today, day), want, "start of week {day}");
        }
    }

    #[test]
    fn test_week_bucket_for_every_start_day() {
        let today = date(2024, 3, 14);
        let visits: Vec<VisitRecord> = (8..=14).map(|d| visit_at(2024, 3, d)).collect();

        // Visits on every day Mar 8..=14; the week holds the days from
        // week_start through today.
        let expected = [4, 3, 2, 1, 7, 6, 5];
        for (day, want) in StartOfWeek::all().zip(expected) {
            let snap = derive_snapshot(&visits, vec![], today, day, &Utc);
            assert_eq!(snap.visits_this_week, want, "start of week {day}");
            assert_eq!(snap.visits_this_month, 7);
        }
    }

    #[test]
    fn test_year_month_and_total() {
        let today = date(2024, 3, 14);
        let visits = vec![
            visit_at(2024, 3, 1),
            visit_at(2024, 2, 20),
            visit_at(2023, 12, 31),
            VisitRecord::new(json!({"clubName": "no timestamp"})),
        ];

        let snap = derive_snapshot(&visits, vec![], today, StartOfWeek::MONDAY, &Utc);
        assert_eq!(snap.total_visits, 4);
        assert_eq!(snap.visits_this_year, 2);
        assert_eq!(snap.visits_this_month, 1);
        assert_eq!(snap.visits_this_week, 0);
        assert_eq!(snap.raw_visits.len(), 4);
    }

    #[test]
    fn test_week_spanning_month_boundary() {
        // 2024-04-02 is a Tuesday; the Monday-start week begins 2024-04-01,
        // the Sunday-start week on 2024-03-31.
        let today = date(2024, 4, 2);
        let visits = vec![visit_at(2024, 3, 31), visit_at(2024, 4, 1)];

        let snap = derive_snapshot(&visits, vec![], today, StartOfWeek::SUNDAY, &Utc);
        assert_eq!(snap.visits_this_week, 2);
        assert_eq!(snap.visits_this_month, 1);
    }

    #[test]
    fn test_malformed_record_skipped() {
        let t1: i64 = 1_700_000_000_000;
        let visits = vec![
            VisitRecord::new(json!({"usageDateTime": t1})),
            VisitRecord::new(json!({"usageDateTime": "yesterday"})),
            VisitRecord::new(json!({"usageDateTime": null})),
        ];

        let snap = derive_snapshot(&visits, vec![], date(2023, 11, 20), StartOfWeek::MONDAY, &Utc);
        assert_eq!(snap.total_visits, 3);
        assert_eq!(snap.visits_this_year, 1);
        #[allow(clippy::cast_precision_loss)]
        let expected = t1 as f64 / 1000.0;
        assert_eq!(snap.last_visit_timestamp, Some(expected));
    }

    #[derive(Clone, Default)]
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_record_missing_timestamp_warns_once() {
        let t0: i64 = 1_718_000_000_000;
        let t1: i64 = 1_718_452_800_000;
        let visits = vec![
            VisitRecord::new(json!({"usageDateTime": t0})),
            VisitRecord::new(json!({"badField": "x"})),
            VisitRecord::new(json!({"usageDateTime": t1})),
        ];

        let warnings = WarnCounter::default();
        let subscriber = tracing_subscriber::registry().with(warnings.clone());
        let snap = tracing::subscriber::with_default(subscriber, || {
            derive_snapshot(&visits, vec![], date(2024, 6, 20), StartOfWeek::MONDAY, &Utc)
        });

        assert_eq!(warnings.0.load(Ordering::SeqCst), 1);
        assert_eq!(snap.total_visits, 3);
        assert_eq!(snap.visits_this_year, 2);
        #[allow(clippy::cast_precision_loss)]
        let expected = t1 as f64 / 1000.0;
        assert_eq!(snap.last_visit_timestamp, Some(expected));
    }

    #[test]
    fn test_last_visit_is_max() {
        let visits = vec![visit_at(2024, 3, 10), visit_at(2024, 3, 12), visit_at(2024, 3, 11)];
        let snap = derive_snapshot(&visits, vec![], date(2024, 3, 14), StartOfWeek::MONDAY, &Utc);
        assert_eq!(snap.last_visit().unwrap().date_naive(), date(2024, 3, 12));
    }

    #[test]
    fn test_empty_visits() {
        let reservations = vec![ReservationRecord::new(json!({"id": "r1"}))];
        let snap = derive_snapshot(&[], reservations, date(2024, 3, 14), StartOfWeek::MONDAY, &Utc);
        assert_eq!(snap.total_visits, 0);
        assert_eq!(snap.visits_this_year, 0);
        assert!(snap.last_visit_timestamp.is_none());
        assert_eq!(snap.reservations.len(), 1);
    }

    #[test]
    fn test_payload_extraction() {
        let visits = json!({"data": [{"usageDateTime": 1}, {"usageDateTime": 2}], "total": 2});
        assert_eq!(visits_from_payload(Some(&visits)).len(), 2);
        assert!(visits_from_payload(Some(&json!({}))).is_empty());
        assert!(visits_from_payload(None).is_empty());

        let reservations = json!({"results": [{"id": "r1"}]});
        assert_eq!(reservations_from_payload(Some(&reservations))[0].uid().as_deref(), Some("r1"));
        assert!(reservations_from_payload(Some(&json!({"results": null}))).is_empty());
    }
}
