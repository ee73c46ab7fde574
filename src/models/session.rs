use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Sample;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Recording,
    Completed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Recording => "recording",
            SessionState::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    Altimeter,
    Barometer,
}

impl Default for SessionMode {
    fn default() -> Self {
        SessionMode::Altimeter
    }
}

impl SessionMode {
    pub const ALL: [SessionMode; 2] = [SessionMode::Altimeter, SessionMode::Barometer];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Altimeter => "altimeter",
            SessionMode::Barometer => "barometer",
        }
    }
}

/// A recording session. While recording, `samples` is replaced wholesale on
/// every tick; once completed it is sorted by timestamp and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub samples: Vec<Sample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub state: SessionState,
    /// Sessions stored before barometer mode existed carry no mode.
    #[serde(default)]
    pub mode: SessionMode,
}

impl Session {
    pub fn begin(mode: SessionMode, start_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_date,
            end_date: None,
            samples: Vec::new(),
            note: None,
            state: SessionState::Recording,
            mode,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    /// Sorts samples, stamps the end date and marks the session completed.
    pub fn finalize(&mut self, end_date: DateTime<Utc>) {
        self.samples.sort_by_key(|sample| sample.timestamp);
        self.end_date = Some(end_date);
        self.state = SessionState::Completed;
    }
}
