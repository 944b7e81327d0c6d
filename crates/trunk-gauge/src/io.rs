//! JSON configuration and report helpers for measurement runs.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::core::{CalibrationProfile, FovSource, InputError};
use crate::optics::{CalibrationParams, ViewAngles};
use crate::service::{MeasureError, MeasureParams, MeasurementOutcome, MeasurementService};

/// Width of an ID-1 card (credit card, ID card), in metres.
pub const ID1_CARD_WIDTH_M: f64 = 0.0856;

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn default_reference_width() -> f64 {
    ID1_CARD_WIDTH_M
}

/// Reference object of known width lying in the trunk plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceObject {
    /// Apparent width in the measured frame.
    pub pixel_width: f64,
    #[serde(default = "default_reference_width")]
    pub width_m: f64,
}

/// Configuration of one measurement run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureConfig {
    #[serde(default)]
    pub image_path: Option<String>,
    /// Camera-to-trunk distance in metres.
    #[serde(default)]
    pub subject_distance_m: Option<f64>,
    /// Known view angles; skips camera calibration when set.
    #[serde(default)]
    pub field_of_view: Option<ViewAngles>,
    /// Scale from a reference object instead of field of view and distance.
    #[serde(default)]
    pub reference: Option<ReferenceObject>,
    #[serde(default)]
    pub calibration: CalibrationParams,
    #[serde(default)]
    pub measure: MeasureParams,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl MeasureConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Where to write the run report; no report is written when unset.
    pub fn report_path(&self) -> Option<&Path> {
        self.output_path.as_deref().map(Path::new)
    }

    /// Profile from explicit view angles, if the config carries any.
    pub fn explicit_profile(&self) -> Option<Result<CalibrationProfile, InputError>> {
        self.field_of_view.map(|fov| {
            CalibrationProfile::new(fov.horizontal_deg, fov.vertical_deg, FovSource::Measured)
        })
    }

    pub fn build_service(&self) -> MeasurementService {
        MeasurementService::new(self.measure.clone())
    }
}

/// Result of one measurement run, as written to disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasureReport {
    pub image_path: String,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub outcome: Option<MeasurementOutcome>,
    #[serde(default)]
    pub error: Option<String>,
}

impl MeasureReport {
    pub fn new(image_path: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            image_path: image_path.into(),
            width,
            height,
            outcome: None,
            error: None,
        }
    }

    pub fn set_outcome(&mut self, outcome: MeasurementOutcome) {
        self.outcome = Some(outcome);
        self.error = None;
    }

    pub fn set_error(&mut self, err: &MeasureError) {
        self.outcome = None;
        self.error = Some(err.to_string());
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: MeasureConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, MeasureConfig::default());
        assert_eq!(cfg.calibration, CalibrationParams::DEFAULT);
        assert!(cfg.report_path().is_none());
        assert!(cfg.explicit_profile().is_none());
    }

    #[test]
    fn reference_width_defaults_to_id_card() {
        let cfg: MeasureConfig =
            serde_json::from_str(r#"{"reference": {"pixel_width": 120.0}}"#).unwrap();
        assert_eq!(
            cfg.reference,
            Some(ReferenceObject {
                pixel_width: 120.0,
                width_m: ID1_CARD_WIDTH_M,
            })
        );
    }

    #[test]
    fn explicit_profile_is_validated() {
        let cfg = MeasureConfig {
            field_of_view: Some(ViewAngles::new(200.0, 45.0)),
            ..MeasureConfig::default()
        };
        assert!(matches!(
            cfg.explicit_profile(),
            Some(Err(InputError::InvalidFieldOfView { .. }))
        ));
    }

    #[test]
    fn report_error_clears_outcome() {
        let mut report = MeasureReport::new("trunk.jpg", 640, 480);
        report.set_error(&MeasureError::NoTrunkDetected { confidence: 0.2 });
        assert!(report.outcome.is_none());
        assert_eq!(
            report.error.as_deref(),
            Some("no trunk detected (confidence 0.20)")
        );
    }
}
