//! Periodic refresh coordination.
//!
//! The [`Coordinator`] owns the data client, runs it on a fixed interval or
//! on demand, derives a [`DerivedSnapshot`] after every successful update and
//! publishes the result through a watch channel.
//!
//! Failures split into two kinds. Transient failures keep the previous
//! snapshot visible and the next tick retries. Auth failures park the
//! scheduled loop until new credentials arrive and
//! [`Coordinator::request_refresh`] is called.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use ltfit_core::{DerivedSnapshot, StartOfWeek};
use ltfit_fetch::{ApiClient, ApiError, UpdateReport};
use serde_json::Value;
use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::derive::{derive_snapshot, reservations_from_payload, visits_from_payload};

/// Default time between scheduled refreshes.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(300);

// ============================================================================
// Data Source
// ============================================================================

/// Something that can pull the raw visit and reservation payloads.
#[async_trait]
pub trait ClubDataSource: Send {
    /// Runs one update cycle for `today`.
    async fn refresh(&mut self, today: NaiveDate) -> Result<UpdateReport, ApiError>;

    /// Last visits payload.
    fn visits_payload(&self) -> Option<&Value>;

    /// Last reservations payload.
    fn reservations_payload(&self) -> Option<&Value>;

    /// Account username.
    fn username(&self) -> &str;

    /// Member id, once known.
    fn member_id(&self) -> Option<&str>;
}

#[async_trait]
impl ClubDataSource for ApiClient {
    async fn refresh(&mut self, today: NaiveDate) -> Result<UpdateReport, ApiError> {
        self.update_for(today).await
    }

    fn visits_payload(&self) -> Option<&Value> {
        self.visits_json()
    }

    fn reservations_payload(&self) -> Option<&Value> {
        self.reservations_json()
    }

    fn username(&self) -> &str {
        ApiClient::username(self)
    }

    fn member_id(&self) -> Option<&str> {
        ApiClient::member_id(self)
    }
}

// ============================================================================
// State
// ============================================================================

/// What the coordinator is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPhase {
    /// Waiting for the next tick or trigger.
    #[default]
    Idle,
    /// An update is in flight.
    Refreshing,
}

/// Classified refresh failure.
#[derive(Debug, Clone)]
pub enum RefreshFailure {
    /// New credentials are needed; scheduled refreshes stop.
    Auth(ApiError),
    /// The next scheduled refresh may succeed.
    Transient(ApiError),
}

impl RefreshFailure {
    /// The underlying error.
    pub fn error(&self) -> &ApiError {
        match self {
            Self::Auth(e) | Self::Transient(e) => e,
        }
    }

    /// Returns true for auth failures.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<ApiError> for RefreshFailure {
    fn from(err: ApiError) -> Self {
        if err.is_auth_failure() {
            Self::Auth(err)
        } else {
            Self::Transient(err)
        }
    }
}

impl std::fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(e) => write!(f, "authentication failed: {e}"),
            Self::Transient(e) => write!(f, "update failed: {e}"),
        }
    }
}

/// Published coordinator state.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    /// Current phase.
    pub phase: RefreshPhase,
    /// Latest derived snapshot; kept across failed refreshes.
    pub data: Option<Arc<DerivedSnapshot>>,
    /// Whether the most recent refresh succeeded.
    pub last_update_success: bool,
    /// Failure from the most recent refresh.
    pub last_failure: Option<RefreshFailure>,
    /// Reservation error from the most recent successful refresh.
    pub reservations_error: Option<ApiError>,
    /// When the most recent refresh finished.
    pub last_refreshed_at: Option<DateTime<Utc>>,
    /// Completed refresh attempts.
    pub refreshes: u64,
    /// Member id learned at login.
    pub member_id: Option<String>,
}

impl CoordinatorState {
    /// Returns true if the last refresh succeeded and a snapshot exists.
    pub fn available(&self) -> bool {
        self.last_update_success && self.data.is_some()
    }
}

// ============================================================================
// Coordinator
// ============================================================================

/// Serializes refreshes of one data source and publishes the results.
pub struct Coordinator<S> {
    source: Mutex<S>,
    username: String,
    start_of_week: AtomicU8,
    interval: Duration,
    state: watch::Sender<CoordinatorState>,
    trigger: Notify,
    stop: Notify,
}

impl<S: ClubDataSource> Coordinator<S> {
    /// Creates a coordinator. Nothing runs until [`Coordinator::refresh`] or
    /// [`Coordinator::spawn`].
    pub fn new(source: S, start_of_week: StartOfWeek, interval: Duration) -> Self {
        let username = source.username().to_string();
        let (state, _) = watch::channel(CoordinatorState::default());
        Self {
            source: Mutex::new(source),
            username,
            start_of_week: AtomicU8::new(start_of_week.index()),
            interval,
            state,
            trigger: Notify::new(),
            stop: Notify::new(),
        }
    }

    /// Account username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Member id, once a refresh has logged in.
    pub fn member_id(&self) -> Option<String> {
        self.state.borrow().member_id.clone()
    }

    /// Scheduled refresh interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// First day of the week used by the next derivation.
    pub fn start_of_week_day(&self) -> StartOfWeek {
        StartOfWeek::from_index(self.start_of_week.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Changes the first day of the week. Takes effect on the next refresh.
    pub fn update_start_of_week_day(&self, day: StartOfWeek) {
        self.start_of_week.store(day.index(), Ordering::Relaxed);
        info!(start_of_week = %day, "Start of week updated");
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state.subscribe()
    }

    /// Copy of the current state.
    pub fn state(&self) -> CoordinatorState {
        self.state.borrow().clone()
    }

    /// Latest snapshot, if any refresh has succeeded.
    pub fn snapshot(&self) -> Option<Arc<DerivedSnapshot>> {
        self.state.borrow().data.clone()
    }

    /// Returns true if the last refresh succeeded and a snapshot exists.
    pub fn available(&self) -> bool {
        self.state.borrow().available()
    }

    /// Wakes the scheduled loop for an immediate refresh, resuming it if an
    /// auth failure parked it.
    pub fn request_refresh(&self) {
        self.trigger.notify_one();
    }

    /// Stops the scheduled loop after any refresh in flight.
    pub fn shutdown(&self) {
        self.stop.notify_one();
    }

    /// Refreshes now for the local date.
    ///
    /// # Errors
    ///
    /// Returns the classified failure; the previous snapshot stays published.
    pub async fn refresh(&self) -> Result<Arc<DerivedSnapshot>, RefreshFailure> {
        self.refresh_for(Local::now().date_naive()).await
    }

    /// Refreshes now for `today`. Waits for any refresh already in flight.
    ///
    /// # Errors
    ///
    /// Returns the classified failure; the previous snapshot stays published.
    pub async fn refresh_for(&self, today: NaiveDate) -> Result<Arc<DerivedSnapshot>, RefreshFailure> {
        let mut source = self.source.lock().await;
        self.state.send_modify(|s| s.phase = RefreshPhase::Refreshing);
        debug!(%today, "Refreshing");

        let result = source.refresh(today).await;
        let member_id = source.member_id().map(str::to_string);

        match result {
            Ok(report) => {
                let visits = visits_from_payload(source.visits_payload());
                let reservations = reservations_from_payload(source.reservations_payload());
                let snapshot = Arc::new(derive_snapshot(
                    &visits,
                    reservations,
                    today,
                    self.start_of_week_day(),
                    &Local,
                ));

                if let Some(e) = &report.reservations_error {
                    warn!(error = %e, "Reservations are stale");
                }
                info!(
                    total = snapshot.total_visits,
                    reservations = snapshot.reservations.len(),
                    "Refresh complete"
                );

                self.state.send_modify(|s| {
                    s.phase = RefreshPhase::Idle;
                    s.data = Some(Arc::clone(&snapshot));
                    s.last_update_success = true;
                    s.last_failure = None;
                    s.reservations_error = report.reservations_error;
                    s.last_refreshed_at = Some(Utc::now());
                    s.refreshes += 1;
                    s.member_id = member_id;
                });
                Ok(snapshot)
            }
            Err(e) => {
                let failure = RefreshFailure::from(e);
                if failure.is_auth() {
                    error!(error = %failure, "Refresh needs new credentials");
                } else {
                    warn!(error = %failure, "Refresh failed, will retry");
                }

                self.state.send_modify(|s| {
                    s.phase = RefreshPhase::Idle;
                    s.last_update_success = false;
                    s.last_failure = Some(failure.clone());
                    s.last_refreshed_at = Some(Utc::now());
                    s.refreshes += 1;
                    if member_id.is_some() {
                        s.member_id = member_id;
                    }
                });
                Err(failure)
            }
        }
    }
}

impl<S: ClubDataSource + 'static> Coordinator<S> {
    /// Runs refreshes on the interval until [`Coordinator::shutdown`].
    ///
    /// The first refresh runs immediately. After an auth failure only
    /// [`Coordinator::request_refresh`] wakes the loop.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut parked = false;

            loop {
                tokio::select! {
                    _ = ticker.tick(), if !parked => {}
                    () = self.trigger.notified() => {
                        parked = false;
                        ticker.reset();
                    }
                    () = self.stop.notified() => {
                        debug!("Coordinator stopped");
                        break;
                    }
                }

                if let Err(RefreshFailure::Auth(_)) = self.refresh().await {
                    parked = true;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    struct FakeSource {
        outcomes: VecDeque<Result<UpdateReport, ApiError>>,
        visits: Option<Value>,
        reservations: Option<Value>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeSource {
        fn new(outcomes: Vec<Result<UpdateReport, ApiError>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let source = Self {
                outcomes: outcomes.into(),
                visits: None,
                reservations: None,
                calls: Arc::clone(&calls),
            };
            (source, calls)
        }
    }

    #[async_trait]
    impl ClubDataSource for FakeSource {
        async fn refresh(&mut self, _today: NaiveDate) -> Result<UpdateReport, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self.outcomes.pop_front().unwrap_or(Ok(UpdateReport::default()));
            if outcome.is_ok() {
                self.visits = Some(json!({"data": [
                    {"usageDateTime": 1_718_452_800_000_i64},
                    {"usageDateTime": "bad"}
                ]}));
                self.reservations = Some(json!({"results": [{"id": "r1"}]}));
            }
            outcome
        }

        fn visits_payload(&self) -> Option<&Value> {
            self.visits.as_ref()
        }

        fn reservations_payload(&self) -> Option<&Value> {
            self.reservations.as_ref()
        }

        fn username(&self) -> &str {
            "me@example.com"
        }

        fn member_id(&self) -> Option<&str> {
            self.visits.as_ref().map(|_| "112233")
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 20).unwrap()
    }

    #[tokio::test]
    async fn test_success_publishes_snapshot() {
        let (source, _) = FakeSource::new(vec![]);
        let coordinator = Coordinator::new(source, StartOfWeek::MONDAY, DEFAULT_UPDATE_INTERVAL);
        assert!(!coordinator.available());

        let snapshot = coordinator.refresh_for(today()).await.unwrap();
        assert_eq!(snapshot.total_visits, 2);
        assert_eq!(snapshot.visits_this_year, 1);
        assert_eq!(snapshot.visits_this_month, 1);
        assert_eq!(snapshot.visits_this_week, 0);
        assert_eq!(snapshot.reservations.len(), 1);

        assert!(coordinator.available());
        assert_eq!(coordinator.username(), "me@example.com");
        assert_eq!(coordinator.member_id().as_deref(), Some("112233"));
        assert_eq!(coordinator.state().phase, RefreshPhase::Idle);
    }

    #[tokio::test]
    async fn test_transient_failure_keeps_snapshot() {
        let (source, _) = FakeSource::new(vec![
            Ok(UpdateReport::default()),
            Err(ApiError::CannotConnect("down".into())),
        ]);
        let coordinator = Coordinator::new(source, StartOfWeek::MONDAY, DEFAULT_UPDATE_INTERVAL);

        coordinator.refresh_for(today()).await.unwrap();
        let failure = coordinator.refresh_for(today()).await.unwrap_err();

        assert!(!failure.is_auth());
        let state = coordinator.state();
        assert!(state.data.is_some());
        assert!(!state.last_update_success);
        assert!(!state.available());
        assert_eq!(state.refreshes, 2);
    }

    #[tokio::test]
    async fn test_auth_failure_classification() {
        for err in [
            ApiError::InvalidAuth,
            ApiError::AuthExpired,
            ApiError::PasswordNeedsToBeChanged,
            ApiError::TooManyAuthenticationAttempts,
            ApiError::UnknownAuthError("?".into()),
        ] {
            let (source, _) = FakeSource::new(vec![Err(err)]);
            let coordinator = Coordinator::new(source, StartOfWeek::MONDAY, DEFAULT_UPDATE_INTERVAL);
            assert!(coordinator.refresh_for(today()).await.unwrap_err().is_auth());
        }

        let (source, _) = FakeSource::new(vec![Err(ApiError::ProfileError("x".into()))]);
        let coordinator = Coordinator::new(source, StartOfWeek::MONDAY, DEFAULT_UPDATE_INTERVAL);
        assert!(!coordinator.refresh_for(today()).await.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn test_start_of_week_applies_to_next_refresh() {
        let (source, _) = FakeSource::new(vec![]);
        let coordinator = Coordinator::new(source, StartOfWeek::MONDAY, DEFAULT_UPDATE_INTERVAL);

        // 2024-06-15 (Saturday) is outside the Monday week of 2024-06-20 but
        // inside the Saturday week.
        assert_eq!(coordinator.refresh_for(today()).await.unwrap().visits_this_week, 0);
        coordinator.update_start_of_week_day(StartOfWeek::from_index(5).unwrap());
        assert_eq!(coordinator.start_of_week_day().name(), "Saturday");
        assert_eq!(coordinator.refresh_for(today()).await.unwrap().visits_this_week, 1);
    }

    #[tokio::test]
    async fn test_reservation_error_is_reported() {
        let (source, _) = FakeSource::new(vec![Ok(UpdateReport {
            reservations_error: Some(ApiError::CannotConnect("down".into())),
        })]);
        let coordinator = Coordinator::new(source, StartOfWeek::MONDAY, DEFAULT_UPDATE_INTERVAL);

        coordinator.refresh_for(today()).await.unwrap();
        let state = coordinator.state();
        assert!(state.available());
        assert!(state.reservations_error.is_some());
    }
}
