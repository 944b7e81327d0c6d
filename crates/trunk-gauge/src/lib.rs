//! High-level facade crate for the `trunk-gauge-*` workspace.
//!
//! Measures the diameter of a tree trunk from a single photo. The trunk's
//! apparent width in pixels comes from a vertical-band segmentation; the
//! camera's horizontal field of view and the camera-to-trunk distance turn
//! it into metres through the pinhole relation
//! `diameter = pixel_width * 2 d tan(hfov / 2) / frame_width`.
//!
//! ## Quickstart
//!
//! ```no_run
//! use trunk_gauge::optics::{CalibrationParams, NoCamera, OpticalCalibrator};
//! use trunk_gauge::MeasurementService;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! static CALIBRATOR: OpticalCalibrator<NoCamera> =
//!     OpticalCalibrator::new(NoCamera, CalibrationParams::DEFAULT);
//!
//! let frame = trunk_gauge::ingest::load_frame("trunk.jpg")?;
//! let service = MeasurementService::default();
//! let out = service.measure_calibrated(&frame.view(), &CALIBRATOR, None, 1.5)?;
//! println!("{:.1} cm in {:.2} ms", out.diameter_cm(), out.elapsed_ms());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `trunk_gauge::core`: frames, calibration profile, metric projector, logger.
//! - `trunk_gauge::optics`: cached camera field-of-view calibration.
//! - `trunk_gauge::segment`: trunk segmentation and pixel predicates.
//! - `trunk_gauge::io`: JSON run configuration and reports.
//! - `trunk_gauge::ingest` (feature `image`): decoding into frames.

pub use trunk_gauge_core as core;
pub use trunk_gauge_optics as optics;
pub use trunk_gauge_segment as segment;

pub use trunk_gauge_core::{CalibrationProfile, Frame, FrameView, InputError, PixelLayout};
pub use trunk_gauge_segment::{SegmentationResult, SegmenterParams, TrunkSegmenter};

pub mod io;
mod service;

pub use service::{MeasureError, MeasureParams, MeasurementOutcome, MeasurementService, ScaleSource};

#[cfg(feature = "image")]
pub mod ingest;
