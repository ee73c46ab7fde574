use std::sync::Arc;

use log::{info, warn};

use super::provider::{LocationProvider, ProviderError, SeaLevelObservation, SeaLevelPressureProvider};

/// Resolves the current location, then asks the provider for the sea-level
/// pressure there. One attempt per refresh; failures are recorded as-is.
pub struct AtmosphereStore {
    location: Arc<dyn LocationProvider>,
    provider: Arc<dyn SeaLevelPressureProvider>,
    latest_observation: Option<SeaLevelObservation>,
    last_error: Option<ProviderError>,
}

impl AtmosphereStore {
    pub fn new(
        location: Arc<dyn LocationProvider>,
        provider: Arc<dyn SeaLevelPressureProvider>,
    ) -> Self {
        Self {
            location,
            provider,
            latest_observation: None,
            last_error: None,
        }
    }

    pub fn latest_observation(&self) -> Option<&SeaLevelObservation> {
        self.latest_observation.as_ref()
    }

    pub fn last_error(&self) -> Option<&ProviderError> {
        self.last_error.as_ref()
    }

    /// A failed refresh keeps the previous observation.
    pub async fn refresh(&mut self) -> Result<SeaLevelObservation, ProviderError> {
        self.last_error = None;

        let location = Arc::clone(&self.location);
        let provider = Arc::clone(&self.provider);
        let result = tokio::task::spawn_blocking(move || {
            let coordinate = location.current_location()?;
            provider.fetch_observation(coordinate)
        })
        .await
        .unwrap_or_else(|join_err| {
            Err(ProviderError::Unknown(format!("provider task failed: {join_err}")))
        });

        match &result {
            Ok(observation) => {
                info!(
                    "sea-level pressure {:.1} hPa from {}",
                    observation.sea_level_pressure_hpa,
                    observation
                        .station
                        .as_ref()
                        .map(|station| station.id.as_str())
                        .unwrap_or("provider")
                );
                self.latest_observation = Some(observation.clone());
            }
            Err(err) => {
                warn!("sea-level pressure refresh failed: {err}");
                self.last_error = Some(err.clone());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atmosphere::provider::{Coordinate, FixedLocation};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DeniedLocation;

    impl LocationProvider for DeniedLocation {
        fn current_location(&self) -> Result<Coordinate, ProviderError> {
            Err(ProviderError::LocationDenied)
        }
    }

    struct ScriptedProvider {
        calls: AtomicUsize,
        responses: Vec<Result<f64, ProviderError>>,
    }

    impl SeaLevelPressureProvider for ScriptedProvider {
        fn fetch_observation(&self, _location: Coordinate) -> Result<SeaLevelObservation, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses[call].clone().map(|hpa| SeaLevelObservation {
                sea_level_pressure_hpa: hpa,
                timestamp: Utc::now(),
                station: None,
            })
        }
    }

    fn here() -> Arc<dyn LocationProvider> {
        Arc::new(FixedLocation(Coordinate::new(46.5, 7.9)))
    }

    #[tokio::test]
    async fn successful_refresh_records_observation() {
        let provider = Arc::new(ScriptedProvider {
            calls: AtomicUsize::new(0),
            responses: vec![Ok(1016.2)],
        });
        let mut store = AtmosphereStore::new(here(), provider);

        let observation = store.refresh().await.unwrap();
        assert_eq!(observation.sea_level_pressure_hpa, 1016.2);
        assert_eq!(store.latest_observation(), Some(&observation));
        assert!(store.last_error().is_none());
    }

    #[tokio::test]
    async fn failure_is_recorded_without_retry_and_keeps_last_value() {
        let provider = Arc::new(ScriptedProvider {
            calls: AtomicUsize::new(0),
            responses: vec![Ok(1009.0), Err(ProviderError::ServiceUnavailable(503))],
        });
        let mut store = AtmosphereStore::new(here(), provider.clone());

        store.refresh().await.unwrap();
        let err = store.refresh().await.unwrap_err();

        assert_eq!(err, ProviderError::ServiceUnavailable(503));
        assert_eq!(store.last_error(), Some(&ProviderError::ServiceUnavailable(503)));
        assert_eq!(store.latest_observation().unwrap().sea_level_pressure_hpa, 1009.0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn location_errors_pass_through() {
        let provider = Arc::new(ScriptedProvider {
            calls: AtomicUsize::new(0),
            responses: vec![],
        });
        let mut store = AtmosphereStore::new(Arc::new(DeniedLocation), provider.clone());

        assert_eq!(store.refresh().await, Err(ProviderError::LocationDenied));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
