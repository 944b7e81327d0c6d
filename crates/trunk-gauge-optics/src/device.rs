use serde::{Deserialize, Serialize};

/// Horizontal and vertical view angles, in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewAngles {
    pub horizontal_deg: f64,
    pub vertical_deg: f64,
}

impl ViewAngles {
    pub const fn new(horizontal_deg: f64, vertical_deg: f64) -> Self {
        Self {
            horizontal_deg,
            vertical_deg,
        }
    }
}

/// Why a camera could not be opened or read.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    #[error("no camera device available")]
    NoDevice,
    #[error("camera access denied")]
    PermissionDenied,
    #[error("camera is in use by another client")]
    Busy,
    #[error("failed to read camera parameters: {0}")]
    Read(String),
    #[error("camera reported out-of-range view angles (h={horizontal}, v={vertical})")]
    OutOfRange { horizontal: f64, vertical: f64 },
}

/// An open camera handle.
///
/// Implementations release the underlying hardware in `Drop`, so a handle
/// obtained from [`CameraProvider::open`] is released on every exit path,
/// including when [`CameraDevice::view_angles`] fails.
pub trait CameraDevice {
    fn view_angles(&self) -> Result<ViewAngles, ProbeError>;
}

/// Source of transient camera handles.
pub trait CameraProvider: Send + Sync {
    fn open(&self) -> Result<Box<dyn CameraDevice + '_>, ProbeError>;
}

/// Provider for hosts without camera hardware. Opening always fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCamera;

impl CameraProvider for NoCamera {
    fn open(&self) -> Result<Box<dyn CameraDevice + '_>, ProbeError> {
        Err(ProbeError::NoDevice)
    }
}

/// A camera whose view angles are known up front, e.g. from a datasheet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedCamera {
    pub angles: ViewAngles,
}

impl FixedCamera {
    pub const fn new(horizontal_deg: f64, vertical_deg: f64) -> Self {
        Self {
            angles: ViewAngles::new(horizontal_deg, vertical_deg),
        }
    }
}

impl CameraDevice for FixedCamera {
    fn view_angles(&self) -> Result<ViewAngles, ProbeError> {
        Ok(self.angles)
    }
}

impl CameraProvider for FixedCamera {
    fn open(&self) -> Result<Box<dyn CameraDevice + '_>, ProbeError> {
        Ok(Box::new(*self))
    }
}
