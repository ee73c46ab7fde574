use serde::{Deserialize, Serialize};

const METERS_PER_FOOT: f64 = 0.3048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum MeasurementUnit {
    #[default]
    Metric,
    Imperial,
}

impl MeasurementUnit {
    pub fn altitude_symbol(&self) -> &'static str {
        match self {
            MeasurementUnit::Metric => "m",
            MeasurementUnit::Imperial => "ft",
        }
    }

    pub fn converted_altitude(&self, meters: f64) -> f64 {
        match self {
            MeasurementUnit::Metric => meters,
            MeasurementUnit::Imperial => meters / METERS_PER_FOOT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PressureUnit {
    #[default]
    #[serde(rename = "hPa")]
    Hectopascal,
    #[serde(rename = "kPa")]
    Kilopascal,
}

impl PressureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            PressureUnit::Hectopascal => "hPa",
            PressureUnit::Kilopascal => "kPa",
        }
    }

    pub fn value_from_kpa(&self, kpa: f64) -> f64 {
        match self {
            PressureUnit::Hectopascal => kpa * 10.0,
            PressureUnit::Kilopascal => kpa,
        }
    }

    pub fn value_from_hpa(&self, hpa: f64) -> f64 {
        match self {
            PressureUnit::Hectopascal => hpa,
            PressureUnit::Kilopascal => hpa / 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressure_conversions() {
        assert!((PressureUnit::Hectopascal.value_from_kpa(101.325) - 1013.25).abs() < 1e-9);
        assert_eq!(PressureUnit::Kilopascal.value_from_kpa(101.325), 101.325);
        assert!((PressureUnit::Kilopascal.value_from_hpa(1013.25) - 101.325).abs() < 1e-9);
        assert_eq!(PressureUnit::Hectopascal.value_from_hpa(1013.25), 1013.25);
    }

    #[test]
    fn feet_from_meters() {
        assert!((MeasurementUnit::Imperial.converted_altitude(304.8) - 1000.0).abs() < 1e-9);
        assert_eq!(MeasurementUnit::Metric.converted_altitude(12.5), 12.5);
    }

    #[test]
    fn pressure_unit_serializes_as_symbol() {
        assert_eq!(serde_json::to_string(&PressureUnit::Kilopascal).unwrap(), "\"kPa\"");
        let unit: PressureUnit = serde_json::from_str("\"hPa\"").unwrap();
        assert_eq!(unit, PressureUnit::Hectopascal);
    }
}
