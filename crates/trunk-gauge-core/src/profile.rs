use serde::{Deserialize, Serialize};

use crate::InputError;

/// Horizontal field of view used when no camera can be probed, in degrees.
pub const FALLBACK_HORIZONTAL_FOV_DEG: f64 = 60.0;
/// Vertical field of view used when no camera can be probed, in degrees.
pub const FALLBACK_VERTICAL_FOV_DEG: f64 = 45.0;

/// Where a calibration profile came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FovSource {
    /// Read from a camera device.
    Measured,
    /// Built-in or configured default.
    Fallback,
}

/// Camera field-of-view angles shared by every measurement in a session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    pub horizontal_fov_deg: f64,
    pub vertical_fov_deg: f64,
    pub source: FovSource,
}

#[inline]
fn angle_in_range(deg: f64) -> bool {
    deg.is_finite() && deg > 0.0 && deg < 180.0
}

impl CalibrationProfile {
    /// Build a profile, rejecting angles outside the open interval (0, 180).
    pub fn new(
        horizontal_fov_deg: f64,
        vertical_fov_deg: f64,
        source: FovSource,
    ) -> Result<Self, InputError> {
        let profile = Self {
            horizontal_fov_deg,
            vertical_fov_deg,
            source,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// The 60° x 45° profile used when no hardware is reachable.
    pub const fn fallback() -> Self {
        Self {
            horizontal_fov_deg: FALLBACK_HORIZONTAL_FOV_DEG,
            vertical_fov_deg: FALLBACK_VERTICAL_FOV_DEG,
            source: FovSource::Fallback,
        }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if angle_in_range(self.horizontal_fov_deg) && angle_in_range(self.vertical_fov_deg) {
            Ok(())
        } else {
            Err(InputError::InvalidFieldOfView {
                horizontal: self.horizontal_fov_deg,
                vertical: self.vertical_fov_deg,
            })
        }
    }

    #[inline]
    pub fn horizontal_fov_rad(&self) -> f64 {
        self.horizontal_fov_deg.to_radians()
    }

    #[inline]
    pub fn vertical_fov_rad(&self) -> f64 {
        self.vertical_fov_deg.to_radians()
    }

    #[inline]
    pub fn is_fallback(&self) -> bool {
        self.source == FovSource::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_profile_is_valid() {
        let p = CalibrationProfile::fallback();
        assert!(p.validate().is_ok());
        assert!(p.is_fallback());
        assert_eq!(p.horizontal_fov_deg, 60.0);
        assert_eq!(p.vertical_fov_deg, 45.0);
    }

    #[test]
    fn rejects_degenerate_angles() {
        for (h, v) in [(0.0, 45.0), (60.0, 180.0), (-10.0, 45.0), (f64::NAN, 45.0)] {
            assert!(
                CalibrationProfile::new(h, v, FovSource::Measured).is_err(),
                "h={h} v={v}"
            );
        }
    }

    #[test]
    fn serializes_source_in_lowercase() {
        let json = serde_json::to_string(&CalibrationProfile::fallback()).expect("json");
        assert!(json.contains("\"source\":\"fallback\""), "{json}");
    }
}
