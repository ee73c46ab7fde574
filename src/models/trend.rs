use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Trend {
    Rising,
    Falling,
    Steady,
}

impl Default for Trend {
    fn default() -> Self {
        Trend::Steady
    }
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Steady => "steady",
        }
    }

    /// Classifies `delta` against a symmetric dead band. Values exactly on
    /// the threshold are steady.
    pub fn from_delta(delta: f64, threshold: f64) -> Self {
        if delta > threshold {
            Trend::Rising
        } else if delta < -threshold {
            Trend::Falling
        } else {
            Trend::Steady
        }
    }
}
