use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::altitude::STANDARD_SEA_LEVEL_KPA;
use crate::units::{MeasurementUnit, PressureUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum AltitudeDisplayMode {
    /// Height gained since the session baseline.
    #[default]
    Gain,
    /// Net change between first and latest sample.
    Net,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub preferred_unit: MeasurementUnit,
    pub pressure_unit: PressureUnit,
    pub sea_level_pressure_kpa: f64,
    pub altitude_display_mode: AltitudeDisplayMode,
    pub provider_auto_calibration_enabled: bool,
    pub provider_last_calibration: Option<DateTime<Utc>>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            preferred_unit: MeasurementUnit::default(),
            pressure_unit: PressureUnit::default(),
            sea_level_pressure_kpa: STANDARD_SEA_LEVEL_KPA,
            altitude_display_mode: AltitudeDisplayMode::default(),
            provider_auto_calibration_enabled: false,
            provider_last_calibration: None,
        }
    }
}

impl UserSettings {
    fn normalized(mut self) -> Self {
        if !(self.sea_level_pressure_kpa > 0.0) {
            self.sea_level_pressure_kpa = STANDARD_SEA_LEVEL_KPA;
        }
        self
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str::<UserSettings>(&contents)
                .unwrap_or_default()
                .normalized()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn snapshot(&self) -> Result<UserSettings> {
        self.data
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| anyhow!("settings lock poisoned"))
    }

    pub fn sea_level_pressure_kpa(&self) -> Result<f64> {
        Ok(self.snapshot()?.sea_level_pressure_kpa)
    }

    /// Non-positive values reset the reference to standard atmosphere.
    pub fn set_sea_level_pressure_kpa(&self, kpa: f64) -> Result<f64> {
        let mut stored = kpa;
        self.update(|settings| {
            settings.sea_level_pressure_kpa = kpa;
            *settings = settings.clone().normalized();
            stored = settings.sea_level_pressure_kpa;
        })?;
        Ok(stored)
    }

    /// Stores a provider reading (hPa) as the reference and stamps it.
    /// Returns the new reference in kPa.
    pub fn apply_provider_sea_level_pressure(
        &self,
        hpa: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<f64> {
        let kpa = hpa / 10.0;
        let mut stored = kpa;
        self.update(|settings| {
            settings.sea_level_pressure_kpa = kpa;
            settings.provider_last_calibration = Some(timestamp);
            *settings = settings.clone().normalized();
            stored = settings.sea_level_pressure_kpa;
        })?;
        Ok(stored)
    }

    pub fn set_preferred_unit(&self, unit: MeasurementUnit) -> Result<()> {
        self.update(|settings| settings.preferred_unit = unit)
    }

    pub fn set_pressure_unit(&self, unit: PressureUnit) -> Result<()> {
        self.update(|settings| settings.pressure_unit = unit)
    }

    pub fn set_altitude_display_mode(&self, mode: AltitudeDisplayMode) -> Result<()> {
        self.update(|settings| settings.altitude_display_mode = mode)
    }

    pub fn set_provider_auto_calibration(&self, enabled: bool) -> Result<()> {
        self.update(|settings| settings.provider_auto_calibration_enabled = enabled)
    }

    fn update(&self, apply: impl FnOnce(&mut UserSettings)) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        let mut next = guard.clone();
        apply(&mut next);
        // Memory only moves once the file agrees.
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
