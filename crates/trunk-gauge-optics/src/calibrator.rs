use std::sync::{Mutex, OnceLock, PoisonError};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use trunk_gauge_core::{
    CalibrationProfile, FovSource, InputError, FALLBACK_HORIZONTAL_FOV_DEG,
    FALLBACK_VERTICAL_FOV_DEG,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{CameraDevice, CameraProvider, ProbeError, ViewAngles};

fn default_fallback() -> Option<ViewAngles> {
    CalibrationParams::DEFAULT.fallback
}

/// Calibration settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParams {
    /// Angles used when the camera cannot be probed.
    ///
    /// `None` turns a failed probe into [`CalibrationError::Unavailable`].
    #[serde(default = "default_fallback")]
    pub fallback: Option<ViewAngles>,
}

impl CalibrationParams {
    pub const DEFAULT: Self = Self {
        fallback: Some(ViewAngles::new(
            FALLBACK_HORIZONTAL_FOV_DEG,
            FALLBACK_VERTICAL_FOV_DEG,
        )),
    };

    /// No fallback: probe failures surface to the caller.
    pub const STRICT: Self = Self { fallback: None };
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Errors returned by [`OpticalCalibrator::profile`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("camera field of view unavailable and no fallback configured: {0}")]
    Unavailable(ProbeError),
    #[error("configured fallback field of view is invalid: {0}")]
    InvalidFallback(InputError),
}

/// Lazily probes and caches the camera field of view.
///
/// The first successful call (measured or fallback) publishes a profile that
/// every later call returns without touching hardware. Concurrent first
/// callers serialize on an internal lock and re-check the cache once inside
/// it, so exactly one of them probes the camera.
///
/// The constructor is `const`, so a process-wide calibrator can live in a
/// `static`:
///
/// ```
/// use trunk_gauge_optics::{CalibrationParams, NoCamera, OpticalCalibrator};
///
/// static CALIBRATOR: OpticalCalibrator<NoCamera> =
///     OpticalCalibrator::new(NoCamera, CalibrationParams::DEFAULT);
///
/// let profile = CALIBRATOR.profile(None).expect("fallback profile");
/// assert!(profile.is_fallback());
/// ```
pub struct OpticalCalibrator<P> {
    provider: P,
    params: CalibrationParams,
    cache: OnceLock<CalibrationProfile>,
    probe_lock: Mutex<()>,
}

impl<P: CameraProvider> OpticalCalibrator<P> {
    pub const fn new(provider: P, params: CalibrationParams) -> Self {
        Self {
            provider,
            params,
            cache: OnceLock::new(),
            probe_lock: Mutex::new(()),
        }
    }

    #[inline]
    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    /// The cached profile, if calibration already ran.
    #[inline]
    pub fn cached(&self) -> Option<CalibrationProfile> {
        self.cache.get().copied()
    }

    /// Return the calibration profile, probing the camera on first use.
    ///
    /// `opened` is a device the caller already holds; it is read but not
    /// released. Without it, a handle is opened from the provider and dropped
    /// before this returns.
    pub fn profile(
        &self,
        opened: Option<&dyn CameraDevice>,
    ) -> Result<CalibrationProfile, CalibrationError> {
        if let Some(profile) = self.cache.get() {
            return Ok(*profile);
        }

        // The lock only guards the probe; a panic inside a previous probe
        // leaves nothing half-written, so poisoning is ignored.
        let _guard = self
            .probe_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(profile) = self.cache.get() {
            return Ok(*profile);
        }

        let profile = self.calibrate(opened)?;
        let _ = self.cache.set(profile);
        Ok(profile)
    }

    fn calibrate(
        &self,
        opened: Option<&dyn CameraDevice>,
    ) -> Result<CalibrationProfile, CalibrationError> {
        let probed = match opened {
            Some(device) => read_profile(device),
            None => self.probe_transient(),
        };

        match probed {
            Ok(profile) => {
                info!(
                    "camera field of view {:.1}x{:.1} deg",
                    profile.horizontal_fov_deg, profile.vertical_fov_deg
                );
                Ok(profile)
            }
            Err(err) => {
                let Some(angles) = self.params.fallback else {
                    warn!("camera probe failed ({err}); no fallback configured");
                    return Err(CalibrationError::Unavailable(err));
                };
                warn!(
                    "camera probe failed ({err}); using fallback {:.1}x{:.1} deg",
                    angles.horizontal_deg, angles.vertical_deg
                );
                CalibrationProfile::new(
                    angles.horizontal_deg,
                    angles.vertical_deg,
                    FovSource::Fallback,
                )
                .map_err(CalibrationError::InvalidFallback)
            }
        }
    }

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    fn probe_transient(&self) -> Result<CalibrationProfile, ProbeError> {
        debug!("opening camera for field-of-view probe");
        let device = self.provider.open()?;
        read_profile(device.as_ref())
    }
}

fn read_profile(device: &dyn CameraDevice) -> Result<CalibrationProfile, ProbeError> {
    let angles = device.view_angles()?;
    CalibrationProfile::new(
        angles.horizontal_deg,
        angles.vertical_deg,
        FovSource::Measured,
    )
    .map_err(|_| ProbeError::OutOfRange {
        horizontal: angles.horizontal_deg,
        vertical: angles.vertical_deg,
    })
}
