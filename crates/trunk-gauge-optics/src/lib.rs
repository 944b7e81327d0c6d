//! Camera field-of-view calibration.
//!
//! [`OpticalCalibrator`] reads horizontal/vertical view angles from a
//! camera once and caches them for the rest of the process. Hosts without
//! a reachable camera get the built-in 60° x 45° profile instead of an error.
//!
//! Camera access goes through two small traits: [`CameraProvider`] opens
//! transient handles, [`CameraDevice`] reads angles from one. Platform glue
//! implements them; [`NoCamera`] and [`FixedCamera`] cover desktop use and
//! tests.

mod calibrator;
mod device;

pub use calibrator::{CalibrationError, CalibrationParams, OpticalCalibrator};
pub use device::{CameraDevice, CameraProvider, FixedCamera, NoCamera, ProbeError, ViewAngles};
