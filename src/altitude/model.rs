//! Standard-atmosphere pressure/altitude conversion.
//!
//! Single-stage ISA approximation with no temperature compensation:
//!
//! ```text
//! h  = 44330 * (1 - (p / p0)^0.1903)
//! p0 = p / (1 - h / 44330)^5.255
//! ```

/// Standard sea-level pressure, kPa.
pub const STANDARD_SEA_LEVEL_KPA: f64 = 101.325;

const SCALE_HEIGHT_M: f64 = 44_330.0;
const PRESSURE_EXPONENT: f64 = 0.1903;
const INVERSE_EXPONENT: f64 = 5.255;

/// Altitude in meters for `pressure_kpa` against the reference `sea_level_kpa`.
///
/// Returns 0 when either pressure is not positive. Negative results are
/// legitimate (pressure above the reference).
pub fn altitude_meters(pressure_kpa: f64, sea_level_kpa: f64) -> f64 {
    if !(pressure_kpa > 0.0 && sea_level_kpa > 0.0) {
        return 0.0;
    }
    let ratio = pressure_kpa / sea_level_kpa;
    SCALE_HEIGHT_M * (1.0 - ratio.powf(PRESSURE_EXPONENT))
}

/// Live-display variant of [`altitude_meters`], floored at zero.
pub fn clamped_altitude_meters(pressure_kpa: f64, sea_level_kpa: f64) -> f64 {
    altitude_meters(pressure_kpa, sea_level_kpa).max(0.0)
}

/// Sea-level pressure in hPa for a station reporting `station_pressure_pa`
/// at `elevation_meters`.
///
/// `None` only when the elevation reaches the model's scale height. Nothing
/// else is validated, so callers should bound the result before trusting it.
pub fn sea_level_pressure_from_station(station_pressure_pa: f64, elevation_meters: f64) -> Option<f64> {
    let denom = 1.0 - elevation_meters / SCALE_HEIGHT_M;
    if denom <= 0.0 {
        return None;
    }
    let station_pressure_hpa = station_pressure_pa / 100.0;
    Some(station_pressure_hpa / denom.powf(INVERSE_EXPONENT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pressure_equal_to_reference_is_sea_level() {
        let meters = altitude_meters(STANDARD_SEA_LEVEL_KPA, STANDARD_SEA_LEVEL_KPA);
        assert!(meters.abs() < 1e-4);
    }

    #[test]
    fn lower_pressure_is_positive_altitude() {
        assert!(altitude_meters(90.0, STANDARD_SEA_LEVEL_KPA) > 0.0);
    }

    #[test]
    fn higher_pressure_is_negative_altitude() {
        assert!(altitude_meters(103.0, STANDARD_SEA_LEVEL_KPA) < 0.0);
        assert_eq!(clamped_altitude_meters(103.0, STANDARD_SEA_LEVEL_KPA), 0.0);
    }

    #[test]
    fn non_positive_inputs_fail_closed() {
        assert_eq!(altitude_meters(0.0, STANDARD_SEA_LEVEL_KPA), 0.0);
        assert_eq!(altitude_meters(-5.0, STANDARD_SEA_LEVEL_KPA), 0.0);
        assert_eq!(altitude_meters(95.0, 0.0), 0.0);
        assert_eq!(altitude_meters(f64::NAN, STANDARD_SEA_LEVEL_KPA), 0.0);
    }

    #[test]
    fn station_fallback_matches_known_observation() {
        // KLAX, 2026-02-08: barometricPressure 102065.75 Pa at 32 m, no seaLevelPressure.
        let hpa = sea_level_pressure_from_station(102_065.75, 32.0).expect("valid elevation");
        assert!((hpa - 1024.538).abs() < 0.05, "got {hpa}");
    }

    #[test]
    fn station_fallback_rejects_scale_height() {
        assert!(sea_level_pressure_from_station(100_000.0, 44_330.0).is_none());
        assert!(sea_level_pressure_from_station(100_000.0, 50_000.0).is_none());
    }

    #[test]
    fn station_fallback_does_not_bound_inputs() {
        // Below-sea-level and negative pressures still produce a number.
        assert!(sea_level_pressure_from_station(101_000.0, -400.0).is_some());
        assert!(sea_level_pressure_from_station(-1.0, 100.0).unwrap() < 0.0);
    }

    proptest! {
        #[test]
        fn altitude_sign_follows_pressure_ratio(p in 1.0f64..120.0, p0 in 80.0f64..110.0) {
            let meters = altitude_meters(p, p0);
            if p < p0 {
                prop_assert!(meters > 0.0);
            } else if p > p0 {
                prop_assert!(meters < 0.0);
            }
        }

        #[test]
        fn station_fallback_round_trips(station_pa in 60_000.0f64..105_000.0, elevation in -400.0f64..4_000.0) {
            let sea_level_hpa = sea_level_pressure_from_station(station_pa, elevation).unwrap();
            let recovered = altitude_meters(station_pa / 1_000.0, sea_level_hpa / 10.0);
            // 0.1903 and 5.255 are not exact reciprocals; the drift stays well under a meter.
            prop_assert!((recovered - elevation).abs() < 1.0, "elevation {} recovered {}", elevation, recovered);
        }
    }
}
