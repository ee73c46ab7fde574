use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Session, Trend};

use super::pressure_change;

/// Mean per-session pressure change must exceed this, kPa.
pub const PRESSURE_DRIFT_BAND_KPA: f64 = 0.08;

/// Cumulative ascent is only reported once this many sessions exist.
pub const CUMULATIVE_MIN_SESSIONS: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LatestSessionSummary {
    pub session_id: Uuid,
    pub total_ascent_meters: f64,
    pub duration_ms: i64,
    pub pressure_trend: Trend,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PressureDrift {
    pub mean_change_kpa: f64,
    /// `Rising` or `Falling`, never `Steady`.
    pub direction: Trend,
    pub session_count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeAscent {
    pub total_ascent_meters: f64,
    pub session_count: usize,
}

/// Figures derived across the stored history. Each part is `None` when the
/// history does not support it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionInsights {
    pub latest: Option<LatestSessionSummary>,
    pub pressure_drift: Option<PressureDrift>,
    pub cumulative_ascent: Option<CumulativeAscent>,
}

impl SessionInsights {
    pub fn is_empty(&self) -> bool {
        self.latest.is_none() && self.pressure_drift.is_none() && self.cumulative_ascent.is_none()
    }
}

pub fn session_insights(sessions: &[Session], now: DateTime<Utc>) -> SessionInsights {
    SessionInsights {
        latest: latest_summary(sessions, now),
        pressure_drift: pressure_drift(sessions),
        cumulative_ascent: cumulative_ascent(sessions),
    }
}

/// The most recently started session, in any input order.
pub fn latest_summary(sessions: &[Session], now: DateTime<Utc>) -> Option<LatestSessionSummary> {
    let latest = sessions.iter().max_by_key(|session| session.start_date)?;
    Some(LatestSessionSummary {
        session_id: latest.id,
        total_ascent_meters: latest.total_ascent_meters(),
        duration_ms: latest.duration(now).num_milliseconds(),
        pressure_trend: latest.pressure_trend(),
    })
}

/// Mean first-to-last pressure change over sessions that have samples.
pub fn pressure_drift(sessions: &[Session]) -> Option<PressureDrift> {
    let changes: Vec<f64> = sessions
        .iter()
        .filter_map(|session| pressure_change(&session.samples))
        .collect();
    if changes.is_empty() {
        return None;
    }

    let mean = changes.iter().sum::<f64>() / changes.len() as f64;
    match Trend::from_delta(mean, PRESSURE_DRIFT_BAND_KPA) {
        Trend::Steady => None,
        direction => Some(PressureDrift {
            mean_change_kpa: mean,
            direction,
            session_count: changes.len(),
        }),
    }
}

pub fn cumulative_ascent(sessions: &[Session]) -> Option<CumulativeAscent> {
    if sessions.len() < CUMULATIVE_MIN_SESSIONS {
        return None;
    }
    Some(CumulativeAscent {
        total_ascent_meters: sessions.iter().map(Session::total_ascent_meters).sum(),
        session_count: sessions.len(),
    })
}
