//! Forecast aggregation and the state published to the consumer.
//!
//! A refresh fetches current conditions first, then the hourly and daily
//! forecasts together, and publishes a new snapshot only when all three
//! succeeded. On failure the previous snapshot stays in place next to the
//! error. Each refresh takes a generation number; when a newer refresh has
//! started, an older one's result is dropped instead of overwriting it.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    error::Result,
    model::{Coordinate, WeatherSnapshot},
    normalize::{self, NormalizeOptions},
    provider::WeatherProvider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// What the consumer renders.
#[derive(Debug, Clone, Default)]
pub struct WeatherState {
    pub status: Status,
    /// Last snapshot that was published successfully.
    pub snapshot: Option<Arc<WeatherSnapshot>>,
    pub error: Option<String>,
}

impl WeatherState {
    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Published,
    /// A later refresh started before this one finished; its result was dropped.
    Superseded,
}

pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    options: NormalizeOptions,
    state: watch::Sender<WeatherState>,
    generation: AtomicU64,
}

impl WeatherService {
    pub fn new(provider: Arc<dyn WeatherProvider>, options: NormalizeOptions) -> Self {
        let (state, _) = watch::channel(WeatherState::default());
        Self { provider, options, state, generation: AtomicU64::new(0) }
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WeatherState {
        self.state.borrow().clone()
    }

    /// Fetch and publish a fresh snapshot for `at`.
    ///
    /// Provider and normalization errors are returned and also recorded in
    /// the published state. A refresh overtaken by a newer call returns
    /// `Ok(RefreshOutcome::Superseded)` without touching the state, whether
    /// it succeeded or not.
    pub async fn refresh(&self, at: Coordinate) -> Result<RefreshOutcome> {
        let mut ticket = 0;
        self.state.send_modify(|s| {
            ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            s.status = Status::Loading;
            s.error = None;
        });
        info!(%at, ticket, "refreshing weather");

        let mut pending = PendingRefresh { service: self, ticket, settled: false };
        let fetched = self.fetch_snapshot(at).await;
        pending.settled = true;

        match fetched {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let published = self.publish_if_current(ticket, |s| {
                    s.status = Status::Ready;
                    s.snapshot = Some(Arc::clone(&snapshot));
                    s.error = None;
                });
                if !published {
                    return Ok(RefreshOutcome::Superseded);
                }
                info!(
                    ticket,
                    location = %snapshot.current.location_name,
                    hourly = snapshot.hourly.len(),
                    daily = snapshot.daily.len(),
                    "published weather snapshot"
                );
                Ok(RefreshOutcome::Published)
            }
            Err(e) => {
                let message = e.user_message();
                let published = self.publish_if_current(ticket, |s| {
                    s.status = Status::Failed;
                    s.error = Some(message);
                });
                if !published {
                    return Ok(RefreshOutcome::Superseded);
                }
                warn!(ticket, error = %e, "weather refresh failed");
                Err(e)
            }
        }
    }

    async fn fetch_snapshot(&self, at: Coordinate) -> Result<WeatherSnapshot> {
        let current = self.provider.fetch_current(at).await?;
        let (hourly, daily) =
            tokio::try_join!(self.provider.fetch_hourly(at), self.provider.fetch_daily(at))?;

        normalize::snapshot(at, &current, &hourly, &daily, self.options)
    }

    fn publish_if_current(&self, ticket: u64, update: impl FnOnce(&mut WeatherState)) -> bool {
        self.state.send_if_modified(|s| {
            if self.generation.load(Ordering::SeqCst) != ticket {
                return false;
            }
            update(s);
            true
        })
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// Show an error that is not about the forecast itself, e.g. a failed
    /// save. Status and snapshot are left as they are.
    pub fn report_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.send_modify(|s| s.error = Some(message));
    }
}

/// Takes the state back out of `Loading` when a refresh future is dropped
/// before its fetch completes.
struct PendingRefresh<'a> {
    service: &'a WeatherService,
    ticket: u64,
    settled: bool,
}

impl Drop for PendingRefresh<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let restored = self.service.publish_if_current(self.ticket, |s| {
            s.status = if s.snapshot.is_some() { Status::Ready } else { Status::Idle };
        });
        if restored {
            debug!(ticket = self.ticket, "refresh cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Endpoint, FakeProvider};
    use std::time::Duration;

    fn service_with(provider: Arc<FakeProvider>) -> WeatherService {
        WeatherService::new(provider, NormalizeOptions::default())
    }

    #[tokio::test]
    async fn successful_refresh_publishes_bounded_snapshot() {
        let service = service_with(Arc::new(FakeProvider::new()));
        let mut rx = service.subscribe();

        let outcome = service.refresh(Coordinate::new(-8.05, -34.9)).await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Published);

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.status, Status::Ready);
        assert!(state.error.is_none());

        let snapshot = state.snapshot.expect("snapshot published");
        assert_eq!(snapshot.current.temperature, -8.05);
        assert!(snapshot.hourly.len() <= 24);
        assert!(snapshot.daily.len() <= 7);
        assert_eq!(snapshot.hourly.len(), 24);
        assert_eq!(snapshot.daily.len(), 7);
    }

    #[tokio::test]
    async fn failed_current_keeps_previous_snapshot() {
        let provider = Arc::new(FakeProvider::new());
        let service = service_with(Arc::clone(&provider));

        service.refresh(Coordinate::new(1.0, 1.0)).await.unwrap();
        let before = service.state().snapshot.expect("first snapshot");

        provider.fail(Endpoint::Current);
        let err = service.refresh(Coordinate::new(2.0, 2.0)).await.unwrap_err();
        assert!(err.to_string().contains("Current unavailable"));

        let state = service.state();
        assert_eq!(state.status, Status::Failed);
        assert!(!state.is_loading());
        assert!(state.error.is_some());
        assert_eq!(state.snapshot.as_deref(), Some(before.as_ref()));
    }

    #[tokio::test]
    async fn failed_current_skips_forecast_calls() {
        let provider = Arc::new(FakeProvider::new());
        let service = service_with(Arc::clone(&provider));
        provider.fail(Endpoint::Current);

        assert!(service.refresh(Coordinate::new(1.0, 1.0)).await.is_err());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn partial_failure_publishes_nothing_new() {
        let provider = Arc::new(FakeProvider::new());
        let service = service_with(Arc::clone(&provider));

        service.refresh(Coordinate::new(1.0, 1.0)).await.unwrap();

        provider.fail(Endpoint::Daily);
        assert!(service.refresh(Coordinate::new(2.0, 2.0)).await.is_err());

        let state = service.state();
        assert_eq!(state.status, Status::Failed);
        let snapshot = state.snapshot.expect("old snapshot kept");
        assert_eq!(snapshot.current.temperature, 1.0);
    }

    #[tokio::test]
    async fn empty_current_list_fails_refresh() {
        let provider = Arc::new(FakeProvider::new());
        let service = service_with(Arc::clone(&provider));
        provider.return_no_current_data();

        let err = service.refresh(Coordinate::new(1.0, 1.0)).await.unwrap_err();
        assert!(matches!(err, crate::ClimateError::EmptyResult));
        assert!(service.state().snapshot.is_none());
    }

    #[tokio::test]
    async fn next_refresh_clears_error() {
        let provider = Arc::new(FakeProvider::new());
        let service = service_with(Arc::clone(&provider));

        provider.fail(Endpoint::Hourly);
        assert!(service.refresh(Coordinate::new(1.0, 1.0)).await.is_err());
        assert!(service.state().error.is_some());

        provider.recover();
        service.refresh(Coordinate::new(1.0, 1.0)).await.unwrap();
        let state = service.state();
        assert_eq!(state.status, Status::Ready);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn superseded_refresh_is_discarded() {
        let provider = Arc::new(FakeProvider::new());
        let service = Arc::new(service_with(Arc::clone(&provider)));

        let release = provider.hold(1.0);
        let slow = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.refresh(Coordinate::new(1.0, 1.0)).await }
        });

        let mut rx = service.subscribe();
        rx.wait_for(|s| s.is_loading()).await.unwrap();

        let fast = service.refresh(Coordinate::new(2.0, 2.0)).await.unwrap();
        assert_eq!(fast, RefreshOutcome::Published);

        release.notify_one();
        let slow = slow.await.unwrap().unwrap();
        assert_eq!(slow, RefreshOutcome::Superseded);

        let state = service.state();
        assert_eq!(state.status, Status::Ready);
        assert_eq!(state.snapshot.expect("snapshot").current.temperature, 2.0);
    }

    #[tokio::test]
    async fn superseded_failure_does_not_mark_failed() {
        let provider = Arc::new(FakeProvider::new());
        let service = Arc::new(service_with(Arc::clone(&provider)));

        let release = provider.hold(1.0);
        let slow = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.refresh(Coordinate::new(1.0, 1.0)).await }
        });
        service.subscribe().wait_for(|s| s.is_loading()).await.unwrap();

        service.refresh(Coordinate::new(2.0, 2.0)).await.unwrap();

        provider.fail(Endpoint::Current);
        release.notify_one();
        assert_eq!(slow.await.unwrap().unwrap(), RefreshOutcome::Superseded);

        let state = service.state();
        assert_eq!(state.status, Status::Ready);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn cancelled_refresh_leaves_loading() {
        let provider = Arc::new(FakeProvider::new());
        let service = service_with(Arc::clone(&provider));
        let _release = provider.hold(1.0);

        let refresh = service.refresh(Coordinate::new(1.0, 1.0));
        let timed_out = tokio::time::timeout(Duration::from_millis(50), refresh).await;
        assert!(timed_out.is_err());

        let state = service.state();
        assert_eq!(state.status, Status::Idle);
        assert!(state.snapshot.is_none());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn cancelled_refresh_keeps_previous_snapshot_ready() {
        let provider = Arc::new(FakeProvider::new());
        let service = service_with(Arc::clone(&provider));
        service.refresh(Coordinate::new(2.0, 2.0)).await.unwrap();

        let _release = provider.hold(1.0);
        let refresh = service.refresh(Coordinate::new(1.0, 1.0));
        let timed_out = tokio::time::timeout(Duration::from_millis(50), refresh).await;
        assert!(timed_out.is_err());

        let state = service.state();
        assert_eq!(state.status, Status::Ready);
        assert_eq!(state.snapshot.expect("snapshot").current.temperature, 2.0);
    }

    #[tokio::test]
    async fn cancelled_older_refresh_does_not_touch_newer_one() {
        let provider = Arc::new(FakeProvider::new());
        let service = Arc::new(service_with(Arc::clone(&provider)));

        let release = provider.hold(1.0);
        let slow = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.refresh(Coordinate::new(1.0, 1.0)).await }
        });
        service.subscribe().wait_for(|s| s.is_loading()).await.unwrap();

        service.refresh(Coordinate::new(2.0, 2.0)).await.unwrap();
        slow.abort();
        assert!(slow.await.unwrap_err().is_cancelled());
        drop(release);

        let state = service.state();
        assert_eq!(state.status, Status::Ready);
        assert_eq!(state.snapshot.expect("snapshot").current.temperature, 2.0);
    }

    #[tokio::test]
    async fn report_and_clear_error_leave_snapshot_alone() {
        let service = service_with(Arc::new(FakeProvider::new()));
        service.refresh(Coordinate::new(1.0, 1.0)).await.unwrap();

        service.report_error("disk full");
        let state = service.state();
        assert_eq!(state.error.as_deref(), Some("disk full"));
        assert_eq!(state.status, Status::Ready);
        assert!(state.snapshot.is_some());

        service.clear_error();
        assert!(service.state().error.is_none());
    }

    #[test]
    fn initial_state_is_idle() {
        let service = service_with(Arc::new(FakeProvider::new()));
        let state = service.state();
        assert_eq!(state.status, Status::Idle);
        assert!(state.snapshot.is_none());
        assert!(state.error.is_none());
    }
}
