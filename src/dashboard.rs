//! Drives the lookups that feed the dashboard.
//!
//! Location, reverse geocoding and postal lookup run strictly in sequence
//! and stop at the first failure. The surveillance fetch is not part of that
//! chain: it is started by a city-code change in [`DashboardState`] and runs
//! as its own task, cancelled when a newer code supersedes it.

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::types::AggregateMode;
use crate::analyzers::window::EpiWindow;
use crate::services::{
    CityIdentity, LocationProvider, PostalCodeLookup, ReverseGeocoder, SurveillanceApi,
    UNSUPPORTED_MESSAGE, normalize_postcode,
};
use crate::state::{DashboardState, FetchTicket};

/// Shown when the reverse geocoder fails.
pub const SEARCH_FAILED_MESSAGE: &str = "Não foi possível realizar a pesquisa";

/// Where user-facing failure messages go.
pub trait Alert: Send + Sync {
    fn alert(&self, message: &str);
}

/// Writes alerts to stderr, keeping stdout for the dashboard itself.
pub struct StderrAlert;

impl Alert for StderrAlert {
    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }
}

struct InFlight {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct Dashboard {
    location: Option<Arc<dyn LocationProvider>>,
    geocoder: Arc<dyn ReverseGeocoder>,
    postal: Arc<dyn PostalCodeLookup>,
    surveillance: Arc<dyn SurveillanceApi>,
    alert: Arc<dyn Alert>,
    mode: AggregateMode,
    today: Option<NaiveDate>,
    state: Arc<Mutex<DashboardState>>,
    in_flight: Option<InFlight>,
}

impl Dashboard {
    /// A dashboard with no location source; see [`Dashboard::with_location`].
    pub fn new(
        geocoder: Arc<dyn ReverseGeocoder>,
        postal: Arc<dyn PostalCodeLookup>,
        surveillance: Arc<dyn SurveillanceApi>,
        alert: Arc<dyn Alert>,
    ) -> Self {
        Self {
            location: None,
            geocoder,
            postal,
            surveillance,
            alert,
            mode: AggregateMode::default(),
            today: None,
            state: Arc::new(Mutex::new(DashboardState::default())),
            in_flight: None,
        }
    }

    pub fn with_location(mut self, location: Arc<dyn LocationProvider>) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_mode(mut self, mode: AggregateMode) -> Self {
        self.mode = mode;
        self
    }

    /// Pins "today" for the lookback window instead of the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Locates the user and resolves their municipality.
    ///
    /// Returns `None` when any stage fails. Location failures and a failed
    /// reverse geocode raise one alert each; a failed postal lookup is silent.
    pub async fn resolve_city(&self) -> Option<CityIdentity> {
        let Some(location) = &self.location else {
            self.alert.alert(UNSUPPORTED_MESSAGE);
            return None;
        };

        let coords = match location.locate().await {
            Ok(coords) => coords,
            Err(e) => {
                warn!(error = %e, "Location unavailable");
                self.alert.alert(e.user_message());
                return None;
            }
        };
        debug!(
            latitude = coords.latitude,
            longitude = coords.longitude,
            "Location acquired"
        );

        let address = match self.geocoder.reverse(coords).await {
            Ok(address) => address,
            Err(e) => {
                debug!(error = %e, "Reverse geocode unsuccessful");
                self.alert.alert(SEARCH_FAILED_MESSAGE);
                return None;
            }
        };

        debug!(postcode = ?address.postcode, city = ?address.city, "Address resolved");
        let Some(postcode) = address.postcode.as_deref().map(normalize_postcode) else {
            debug!("Address has no postcode");
            return None;
        };

        match self.postal.lookup(&postcode).await {
            Ok(city) => {
                info!(city = %city.name, code = %city.code, "City resolved");
                Some(city)
            }
            Err(e) => {
                debug!(postcode = %postcode, error = %e, "Postal lookup unsuccessful");
                None
            }
        }
    }

    /// Records `city` and, if its code changed, starts a surveillance fetch,
    /// cancelling the previous one.
    pub fn apply_city(&mut self, city: CityIdentity) {
        let ticket = self.state.lock().set_city(city);
        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket);
        }
    }

    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        if let Some(previous) = self.in_flight.take() {
            previous.cancel.cancel();
        }

        let window = EpiWindow::ending(self.today());
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let api = Arc::clone(&self.surveillance);
        let state = Arc::clone(&self.state);
        let mode = self.mode;

        info!(code = %ticket.code, ?window, "Fetching surveillance data");

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(code = %ticket.code, "Surveillance fetch cancelled");
                }
                result = api.fetch(&ticket.code, &window) => {
                    let series = match result {
                        Ok(records) => Some(aggregate(&records, mode)),
                        Err(e) => {
                            debug!(code = %ticket.code, error = %e, "Surveillance fetch unsuccessful");
                            None
                        }
                    };
                    if !state.lock().set_series(&ticket, series) {
                        debug!(code = %ticket.code, "Dropped stale surveillance result");
                    }
                }
            }
        });

        self.in_flight = Some(InFlight { cancel, handle });
    }

    /// Waits for the current surveillance fetch, if any, to land.
    pub async fn settle(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            if let Err(e) = in_flight.handle.await {
                warn!(error = %e, "Surveillance task failed");
            }
        }
    }

    /// A copy of the current state, for rendering.
    pub fn snapshot(&self) -> DashboardState {
        self.state.lock().clone()
    }

    /// Back to the placeholder state; an in-flight fetch is cancelled.
    pub fn reset(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel.cancel();
        }
        self.state.lock().reset();
    }

    /// The whole session: resolve the city, fetch its data, return the
    /// state to render.
    pub async fn run(&mut self) -> DashboardState {
        if let Some(city) = self.resolve_city().await {
            self.apply_city(city);
            self.settle().await;
        }
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::WeekRecord;
    use crate::services::{Address, Coordinates, LocationError};
    use anyhow::{Result, anyhow};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const RIO: Coordinates = Coordinates {
        latitude: -22.9,
        longitude: -43.2,
    };

    struct MockLocation(Result<Coordinates, LocationError>);

    #[async_trait::async_trait]
    impl LocationProvider for MockLocation {
        async fn locate(&self) -> Result<Coordinates, LocationError> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct MockGeocoder {
        fail: bool,
        postcode: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ReverseGeocoder for MockGeocoder {
        async fn reverse(&self, _coords: Coordinates) -> Result<Address> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("status 500"));
            }
            Ok(Address {
                postcode: self.postcode.map(str::to_string),
                ..Default::default()
            })
        }
    }

    #[derive(Default)]
    struct MockPostal {
        fail: bool,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl PostalCodeLookup for MockPostal {
        async fn lookup(&self, postcode: &str) -> Result<CityIdentity> {
            self.seen.lock().push(postcode.to_string());
            if self.fail {
                return Err(anyhow!("not found"));
            }
            Ok(CityIdentity {
                name: "Rio de Janeiro".into(),
                code: "3304557".into(),
            })
        }
    }

    #[derive(Default)]
    struct MockSurveillance {
        fail: bool,
        slow_code: Option<&'static str>,
        calls: Mutex<Vec<(String, EpiWindow)>>,
    }

    #[async_trait::async_trait]
    impl SurveillanceApi for MockSurveillance {
        async fn fetch(&self, geocode: &str, window: &EpiWindow) -> Result<Vec<WeekRecord>> {
            self.calls.lock().push((geocode.to_string(), *window));
            if self.slow_code == Some(geocode) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.fail {
                return Err(anyhow!("network down"));
            }
            Ok(vec![
                WeekRecord {
                    week_id: "202423".into(),
                    casos: Some(10.0),
                    casprov: Some(9.0),
                    casos_est: Some(11.0),
                    ..Default::default()
                },
                WeekRecord {
                    week_id: "202424".into(),
                    casos: Some(20.0),
                    casprov: Some(19.0),
                    casos_est: Some(21.0),
                    notif_accum_year: geocode.parse().ok(),
                    ..Default::default()
                },
            ])
        }
    }

    #[derive(Default)]
    struct RecordingAlert(Mutex<Vec<String>>);

    impl Alert for RecordingAlert {
        fn alert(&self, message: &str) {
            self.0.lock().push(message.to_string());
        }
    }

    struct Harness {
        geocoder: Arc<MockGeocoder>,
        postal: Arc<MockPostal>,
        surveillance: Arc<MockSurveillance>,
        alert: Arc<RecordingAlert>,
    }

    impl Harness {
        fn new(geocoder: MockGeocoder, postal: MockPostal, surveillance: MockSurveillance) -> Self {
            Self {
                geocoder: Arc::new(geocoder),
                postal: Arc::new(postal),
                surveillance: Arc::new(surveillance),
                alert: Arc::new(RecordingAlert::default()),
            }
        }

        fn dashboard(&self, location: Option<Result<Coordinates, LocationError>>) -> Dashboard {
            let dashboard = Dashboard::new(
                self.geocoder.clone(),
                self.postal.clone(),
                self.surveillance.clone(),
                self.alert.clone(),
            )
            .with_today(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
            match location {
                Some(result) => dashboard.with_location(Arc::new(MockLocation(result))),
                None => dashboard,
            }
        }

        fn alerts(&self) -> Vec<String> {
            self.alert.0.lock().clone()
        }
    }

    fn healthy() -> Harness {
        Harness::new(
            MockGeocoder {
                postcode: Some("20040-020"),
                ..Default::default()
            },
            MockPostal::default(),
            MockSurveillance::default(),
        )
    }

    #[tokio::test]
    async fn test_full_run() {
        let h = healthy();
        let state = h.dashboard(Some(Ok(RIO))).run().await;

        assert_eq!(state.city_name(), "Rio de Janeiro");
        assert_eq!(state.city_code(), Some("3304557"));
        let series = state.series().unwrap();
        assert_eq!(series.labels, vec!["23-2024", "24-2024"]);
        assert_eq!(series.confirmed, vec![Some(9.0), Some(19.0)]);
        assert_eq!(series.latest.casos, Some(20.0));
        assert_eq!(series.latest.notif_accum_year, Some(3304557.0));
        assert!(h.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_postcode_hyphen_is_stripped() {
        let h = healthy();
        h.dashboard(Some(Ok(RIO))).resolve_city().await.unwrap();
        assert_eq!(*h.postal.seen.lock(), vec!["20040020".to_string()]);
    }

    #[tokio::test]
    async fn test_permission_denied_alerts_and_stops() {
        let h = healthy();
        let state = h
            .dashboard(Some(Err(LocationError::PermissionDenied)))
            .run()
            .await;

        assert_eq!(h.alerts(), vec!["Você negou o acesso à localização."]);
        assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(state.city_name(), "---");
    }

    #[tokio::test]
    async fn test_each_location_error_alerts_its_message() {
        for err in [
            LocationError::PositionUnavailable,
            LocationError::Timeout,
            LocationError::Unknown,
        ] {
            let h = healthy();
            h.dashboard(Some(Err(err.clone()))).run().await;
            assert_eq!(h.alerts(), vec![err.user_message()]);
        }
    }

    #[tokio::test]
    async fn test_missing_location_source_alerts_unsupported() {
        let h = healthy();
        h.dashboard(None).run().await;
        assert_eq!(h.alerts(), vec![UNSUPPORTED_MESSAGE]);
        assert_eq!(h.geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_geocoder_failure_skips_postal_lookup() {
        let h = Harness::new(
            MockGeocoder {
                fail: true,
                ..Default::default()
            },
            MockPostal::default(),
            MockSurveillance::default(),
        );
        let state = h.dashboard(Some(Ok(RIO))).run().await;

        assert_eq!(h.alerts(), vec![SEARCH_FAILED_MESSAGE]);
        assert!(h.postal.seen.lock().is_empty());
        assert!(h.surveillance.calls.lock().is_empty());
        assert!(state.series().is_none());
    }

    #[tokio::test]
    async fn test_postal_failure_is_silent() {
        let h = Harness::new(
            MockGeocoder {
                postcode: Some("20040-020"),
                ..Default::default()
            },
            MockPostal {
                fail: true,
                ..Default::default()
            },
            MockSurveillance::default(),
        );
        let state = h.dashboard(Some(Ok(RIO))).run().await;

        assert!(h.alerts().is_empty());
        assert!(h.surveillance.calls.lock().is_empty());
        assert_eq!(state.city_name(), "---");
    }

    #[tokio::test]
    async fn test_missing_postcode_stops_silently() {
        let h = Harness::new(
            MockGeocoder::default(),
            MockPostal::default(),
            MockSurveillance::default(),
        );
        assert!(h.dashboard(Some(Ok(RIO))).resolve_city().await.is_none());
        assert!(h.alerts().is_empty());
        assert!(h.postal.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_code_transition_fetches_exactly_once() {
        let h = healthy();
        let mut dashboard = h.dashboard(None);
        let rio = CityIdentity {
            name: "Rio de Janeiro".into(),
            code: "3304557".into(),
        };

        dashboard.apply_city(rio.clone());
        dashboard.settle().await;
        dashboard.apply_city(rio);
        dashboard.settle().await;

        let calls = h.surveillance.calls.lock().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "3304557");
        assert_eq!(
            calls[0].1,
            EpiWindow::ending(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
        );
    }

    #[tokio::test]
    async fn test_empty_code_never_fetches() {
        let h = healthy();
        let mut dashboard = h.dashboard(None);
        dashboard.apply_city(CityIdentity {
            name: "Nowhere".into(),
            code: String::new(),
        });
        dashboard.settle().await;
        assert!(h.surveillance.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_blank_series() {
        let h = Harness::new(
            MockGeocoder {
                postcode: Some("20040-020"),
                ..Default::default()
            },
            MockPostal::default(),
            MockSurveillance {
                fail: true,
                ..Default::default()
            },
        );
        let state = h.dashboard(Some(Ok(RIO))).run().await;

        assert_eq!(state.city_name(), "Rio de Janeiro");
        assert!(state.series().is_none());
        assert!(h.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_superseded_fetch_is_cancelled() {
        let h = Harness::new(
            MockGeocoder::default(),
            MockPostal::default(),
            MockSurveillance {
                slow_code: Some("3304557"),
                ..Default::default()
            },
        );
        let mut dashboard = h.dashboard(None);

        dashboard.apply_city(CityIdentity {
            name: "Rio de Janeiro".into(),
            code: "3304557".into(),
        });
        tokio::task::yield_now().await;
        dashboard.apply_city(CityIdentity {
            name: "Niterói".into(),
            code: "3303302".into(),
        });

        tokio::time::timeout(Duration::from_secs(5), dashboard.settle())
            .await
            .unwrap();

        let state = dashboard.snapshot();
        assert_eq!(state.city_code(), Some("3303302"));
        assert_eq!(
            state.series().unwrap().latest.notif_accum_year,
            Some(3303302.0)
        );
    }

    #[tokio::test]
    async fn test_reset_returns_to_placeholder() {
        let h = healthy();
        let mut dashboard = h.dashboard(Some(Ok(RIO)));
        dashboard.run().await;
        dashboard.reset();

        let state = dashboard.snapshot();
        assert_eq!(state.city_name(), "---");
        assert!(state.series().is_none());
    }
}
