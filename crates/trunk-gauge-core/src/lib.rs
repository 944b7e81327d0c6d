//! Core types for single-photo trunk-diameter measurement.
//!
//! This crate is intentionally small and purely geometric. It knows about
//! pixel buffers, camera field of view and the pinhole relation between
//! them; it does not depend on any image decoder or camera API.

mod error;
mod frame;
mod logger;
mod profile;
pub mod projector;

pub use error::{FrameError, InputError};
pub use frame::{luma_from_rgb, Frame, FrameView, PixelLayout};
pub use profile::{
    CalibrationProfile, FovSource, FALLBACK_HORIZONTAL_FOV_DEG, FALLBACK_VERTICAL_FOV_DEG,
};
pub use projector::{
    check_reference, check_subject_distance, metric_scale, project_diameter,
    project_with_reference, reference_scale,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level, parse_level, LOG_ENV_VAR};
