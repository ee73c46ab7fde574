//! api.weather.gov client: nearest observation stations and their latest
//! sea-level pressure.
//!
//! HTTP goes through a blocking `ureq` agent; the JSON handling lives in
//! free functions so it can be exercised without the network.

use std::cmp::Ordering;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;
use ureq::Agent;

use crate::altitude::sea_level_pressure_from_station;

use super::provider::{
    Coordinate, ProviderError, SeaLevelObservation, SeaLevelPressureProvider, StationInfo,
};

pub const DEFAULT_BASE_URL: &str = "https://api.weather.gov";
const USER_AGENT: &str = "howhigh (barometric altimeter; contact: howhigh@example.com)";
const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Clone, PartialEq)]
pub struct NwsStation {
    pub id: String,
    pub name: Option<String>,
    pub coordinate: Option<Coordinate>,
    pub distance_meters: Option<f64>,
}

impl NwsStation {
    pub fn info(&self) -> StationInfo {
        StationInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            distance_meters: self.distance_meters,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PointResponse {
    properties: PointProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointProperties {
    observation_stations: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StationCollection {
    features: Vec<StationFeature>,
}

#[derive(Debug, Deserialize)]
struct StationFeature {
    geometry: Option<Geometry>,
    properties: StationProperties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationProperties {
    station_identifier: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LatestObservation {
    properties: ObservationProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObservationProperties {
    timestamp: Option<String>,
    sea_level_pressure: Option<QuantitativeValue>,
    barometric_pressure: Option<QuantitativeValue>,
    elevation: Option<QuantitativeValue>,
    station_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuantitativeValue {
    value: Option<f64>,
}

fn decode<'a, T: Deserialize<'a>>(body: &'a str, what: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body)
        .map_err(|err| ProviderError::Unknown(format!("invalid {what} response: {err}")))
}

/// Great-circle distance in meters.
pub fn haversine_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Extracts the observation-stations URL from a `/points` response.
pub fn parse_points(body: &str) -> Result<String, ProviderError> {
    let points: PointResponse = decode(body, "points")?;
    points
        .properties
        .observation_stations
        .ok_or_else(|| ProviderError::Unknown("points response has no observation stations".into()))
}

/// Nearest first; stations without coordinates go last, ordered by id.
pub fn parse_stations(body: &str, origin: Coordinate) -> Result<Vec<NwsStation>, ProviderError> {
    let collection: StationCollection = decode(body, "stations")?;

    let mut stations: Vec<NwsStation> = collection
        .features
        .into_iter()
        .map(|feature| {
            // GeoJSON order is [longitude, latitude].
            let coordinate = feature
                .geometry
                .and_then(|geometry| geometry.coordinates)
                .filter(|coords| coords.len() >= 2)
                .map(|coords| Coordinate::new(coords[1], coords[0]));
            NwsStation {
                id: feature.properties.station_identifier,
                name: feature.properties.name,
                distance_meters: coordinate.map(|c| haversine_meters(origin, c)),
                coordinate,
            }
        })
        .collect();

    stations.sort_by(|a, b| match (a.distance_meters, b.distance_meters) {
        (Some(lhs), Some(rhs)) => lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (None, None) => a.id.cmp(&b.id),
    });
    Ok(stations)
}

/// Reads `seaLevelPressure` (Pa) or derives it from station pressure and
/// elevation. `fetched_at` stands in for a missing or malformed timestamp.
pub fn parse_latest_observation(
    body: &str,
    station_id: &str,
    fetched_at: DateTime<Utc>,
) -> Result<SeaLevelObservation, ProviderError> {
    let observation: LatestObservation = decode(body, "observation")?;
    let props = observation.properties;

    let reported = props.sea_level_pressure.and_then(|q| q.value);
    let hpa = match reported {
        Some(pa) => pa / 100.0,
        None => {
            let station_pa = props.barometric_pressure.and_then(|q| q.value);
            let elevation = props.elevation.and_then(|q| q.value);
            match (station_pa, elevation) {
                (Some(pa), Some(elevation)) => sea_level_pressure_from_station(pa, elevation)
                    .ok_or(ProviderError::NoData)?,
                _ => return Err(ProviderError::NoData),
            }
        }
    };

    let timestamp = props
        .timestamp
        .as_deref()
        .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(fetched_at);

    Ok(SeaLevelObservation {
        sea_level_pressure_hpa: hpa,
        timestamp,
        station: Some(StationInfo {
            id: station_id.to_string(),
            name: props.station_name,
            distance_meters: None,
        }),
    })
}

/// Maps an HTTP status onto the provider taxonomy; `None` for success.
pub fn classify_status(status: u16) -> Option<ProviderError> {
    match status {
        200..=299 => None,
        404 => Some(ProviderError::OutOfCoverage),
        other => Some(ProviderError::ServiceUnavailable(other)),
    }
}

pub struct NwsClient {
    agent: Agent,
    base_url: String,
}

impl NwsClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn nearby_stations(&self, location: Coordinate) -> Result<Vec<NwsStation>, ProviderError> {
        let points_url = format!(
            "{}/points/{:.4},{:.4}",
            self.base_url, location.latitude, location.longitude
        );
        let stations_url = parse_points(&self.get_text(&points_url)?)?;
        parse_stations(&self.get_text(&stations_url)?, location)
    }

    pub fn latest_sea_level_pressure(
        &self,
        station_id: &str,
    ) -> Result<SeaLevelObservation, ProviderError> {
        let url = format!("{}/stations/{}/observations/latest", self.base_url, station_id);
        parse_latest_observation(&self.get_text(&url)?, station_id, Utc::now())
    }

    fn get_text(&self, url: &str) -> Result<String, ProviderError> {
        debug!("GET {url}");
        let response = match self
            .agent
            .get(url)
            .set("Accept", "application/geo+json")
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                warn!("{url} answered HTTP {status}");
                return Err(classify_status(status)
                    .unwrap_or(ProviderError::ServiceUnavailable(status)));
            }
            Err(ureq::Error::Transport(transport)) => {
                warn!("{url} unreachable: {transport}");
                return Err(ProviderError::NetworkUnavailable);
            }
        };

        if let Some(err) = classify_status(response.status()) {
            return Err(err);
        }
        response
            .into_string()
            .map_err(|err| ProviderError::Unknown(format!("failed to read response body: {err}")))
    }
}

impl Default for NwsClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Sea-level pressure from the nearest station that reports one.
pub struct NwsProvider {
    client: NwsClient,
    max_stations: usize,
}

impl NwsProvider {
    pub fn new(client: NwsClient) -> Self {
        Self {
            client,
            max_stations: 3,
        }
    }

    pub fn with_max_stations(mut self, max_stations: usize) -> Self {
        self.max_stations = max_stations.max(1);
        self
    }
}

impl SeaLevelPressureProvider for NwsProvider {
    fn fetch_observation(&self, location: Coordinate) -> Result<SeaLevelObservation, ProviderError> {
        let stations = self.client.nearby_stations(location)?;

        for station in stations.iter().take(self.max_stations) {
            match self.client.latest_sea_level_pressure(&station.id) {
                Ok(mut observation) => {
                    let mut info = station.info();
                    if let Some(reported) = observation.station.take() {
                        info.name = info.name.or(reported.name);
                    }
                    observation.station = Some(info);
                    return Ok(observation);
                }
                Err(ProviderError::NoData) => {
                    debug!("station {} has no pressure, trying next", station.id);
                }
                Err(other) => return Err(other),
            }
        }
        Err(ProviderError::NoData)
    }
}
