//! End-to-end measurement: segment the trunk, then project its width.

use std::time::Instant;

use log::{debug, info};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::core::{
    check_subject_distance, metric_scale, project_diameter, project_with_reference,
    reference_scale, CalibrationProfile, FrameError, FrameView, InputError,
};
use crate::optics::{CalibrationError, CameraDevice, CameraProvider, OpticalCalibrator};
use crate::segment::{SegmentationResult, SegmenterParams, TrunkSegmenter};

/// Errors returned by [`MeasurementService`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MeasureError {
    #[error("camera calibration unavailable: {0}")]
    CalibrationUnavailable(#[from] CalibrationError),

    #[error("no trunk detected (confidence {confidence:.2})")]
    NoTrunkDetected { confidence: f32 },

    #[error("invalid measurement input: {0}")]
    InvalidMeasurementInput(#[from] InputError),
}

impl From<FrameError> for MeasureError {
    fn from(err: FrameError) -> Self {
        Self::InvalidMeasurementInput(InputError::Frame(err))
    }
}

/// Parameters of the measurement pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureParams {
    /// Segmentation confidence below which no trunk is reported.
    ///
    /// Overrides `segmenter.min_confidence`, so fallback bands are searched
    /// until one clears this threshold.
    pub min_confidence: f32,
    pub segmenter: SegmenterParams,
}

impl Default for MeasureParams {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            segmenter: SegmenterParams::default(),
        }
    }
}

/// How pixels were turned into metres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScaleSource {
    /// Pinhole projection from the camera field of view and subject distance.
    FieldOfView {
        profile: CalibrationProfile,
        subject_distance_m: f64,
    },
    /// Ratio to a reference object of known width in the trunk plane.
    Reference { pixel_width: f64, width_m: f64 },
}

/// A successful measurement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementOutcome {
    pub diameter_m: f64,
    /// Wall-clock time spent in segmentation and projection.
    pub elapsed_nanos: u64,
    pub frame_width: u32,
    pub meters_per_pixel: f64,
    pub scale: ScaleSource,
    pub segmentation: SegmentationResult,
}

impl MeasurementOutcome {
    #[inline]
    pub fn pixel_width(&self) -> u32 {
        self.segmentation.trunk_pixel_width
    }

    #[inline]
    pub fn confidence(&self) -> f32 {
        self.segmentation.confidence
    }

    #[inline]
    pub fn diameter_cm(&self) -> f64 {
        self.diameter_m * 100.0
    }

    #[inline]
    pub fn diameter_mm(&self) -> f64 {
        self.diameter_m * 1000.0
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_nanos as f64 / 1.0e6
    }
}

/// Stateless measurement pipeline.
///
/// Holds only immutable configuration, so one instance can be shared by
/// reference across threads and reused for any number of frames.
pub struct MeasurementService {
    segmenter: TrunkSegmenter,
}

impl MeasurementService {
    pub fn new(params: MeasureParams) -> Self {
        let mut segmenter = params.segmenter;
        segmenter.min_confidence = params.min_confidence;
        Self::with_segmenter(TrunkSegmenter::new(segmenter))
    }

    /// Use an already configured segmenter, e.g. one with a custom predicate.
    ///
    /// Results are accepted at the segmenter's own `min_confidence`.
    pub fn with_segmenter(segmenter: TrunkSegmenter) -> Self {
        Self { segmenter }
    }

    #[inline]
    pub fn segmenter(&self) -> &TrunkSegmenter {
        &self.segmenter
    }

    #[inline]
    pub fn min_confidence(&self) -> f32 {
        self.segmenter.params().min_confidence
    }

    /// Measure the trunk diameter in metres.
    ///
    /// Distance, frame geometry and field of view are validated before any
    /// pixel is read.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, frame, fov),
            fields(width = frame.width, height = frame.height, hfov = fov.horizontal_fov_deg)
        )
    )]
    pub fn measure(
        &self,
        frame: &FrameView<'_>,
        fov: &CalibrationProfile,
        subject_distance_m: f64,
    ) -> Result<MeasurementOutcome, MeasureError> {
        check_subject_distance(subject_distance_m)?;
        let frame_width = checked_frame_width(frame)?;
        let meters_per_pixel = metric_scale(frame_width, fov, subject_distance_m)?;

        let started = Instant::now();
        let segmentation = self.detect(frame)?;
        let diameter_m = project_diameter(
            segmentation.trunk_pixel_width,
            frame_width,
            fov,
            subject_distance_m,
        )?;
        let elapsed_nanos = elapsed_nanos(started);

        info!(
            "trunk diameter {:.3} m ({} px of {} px at {:.2} m, confidence {:.2})",
            diameter_m,
            segmentation.trunk_pixel_width,
            frame_width,
            subject_distance_m,
            segmentation.confidence
        );
        Ok(MeasurementOutcome {
            diameter_m,
            elapsed_nanos,
            frame_width,
            meters_per_pixel,
            scale: ScaleSource::FieldOfView {
                profile: *fov,
                subject_distance_m,
            },
            segmentation,
        })
    }

    /// Like [`measure`](Self::measure), fetching the field of view from
    /// `calibrator`.
    ///
    /// The calibrator is consulted only after the inputs passed validation,
    /// so invalid calls never touch camera hardware.
    pub fn measure_calibrated<P: CameraProvider>(
        &self,
        frame: &FrameView<'_>,
        calibrator: &OpticalCalibrator<P>,
        opened: Option<&dyn CameraDevice>,
        subject_distance_m: f64,
    ) -> Result<MeasurementOutcome, MeasureError> {
        check_subject_distance(subject_distance_m)?;
        checked_frame_width(frame)?;
        let profile = calibrator.profile(opened)?;
        self.measure(frame, &profile, subject_distance_m)
    }

    /// Measure against a reference object of known width lying in the trunk
    /// plane, such as an 85.6 mm card held against the bark.
    ///
    /// `reference_pixel_width` is the reference's apparent width in the same
    /// frame; no field of view or distance is involved.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn measure_with_reference(
        &self,
        frame: &FrameView<'_>,
        reference_pixel_width: f64,
        reference_width_m: f64,
    ) -> Result<MeasurementOutcome, MeasureError> {
        let meters_per_pixel = reference_scale(reference_pixel_width, reference_width_m)?;
        let frame_width = checked_frame_width(frame)?;

        let started = Instant::now();
        let segmentation = self.detect(frame)?;
        let diameter_m = project_with_reference(
            segmentation.trunk_pixel_width,
            reference_pixel_width,
            reference_width_m,
        )?;
        let elapsed_nanos = elapsed_nanos(started);

        info!(
            "trunk diameter {:.3} m ({} px against a {:.1} px reference, confidence {:.2})",
            diameter_m,
            segmentation.trunk_pixel_width,
            reference_pixel_width,
            segmentation.confidence
        );
        Ok(MeasurementOutcome {
            diameter_m,
            elapsed_nanos,
            frame_width,
            meters_per_pixel,
            scale: ScaleSource::Reference {
                pixel_width: reference_pixel_width,
                width_m: reference_width_m,
            },
            segmentation,
        })
    }

    fn detect(&self, frame: &FrameView<'_>) -> Result<SegmentationResult, MeasureError> {
        let segmentation = self.segmenter.segment(frame);
        let min_confidence = self.min_confidence();
        if !segmentation.is_detected() || segmentation.confidence < min_confidence {
            debug!(
                "segmentation rejected: confidence {:.2} < {:.2}",
                segmentation.confidence, min_confidence
            );
            return Err(MeasureError::NoTrunkDetected {
                confidence: segmentation.confidence,
            });
        }
        Ok(segmentation)
    }
}

impl Default for MeasurementService {
    fn default() -> Self {
        Self::new(MeasureParams::default())
    }
}

fn checked_frame_width(frame: &FrameView<'_>) -> Result<u32, FrameError> {
    frame.validate()?;
    u32::try_from(frame.width).map_err(|_| FrameError::InvalidDimensions {
        width: frame.width,
        height: frame.height,
    })
}

fn elapsed_nanos(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Frame, PixelLayout};
    use crate::segment::BandPosition;
    use approx::assert_abs_diff_eq;

    fn trunk_frame(width: usize, start: usize, trunk_w: usize) -> Frame {
        Frame::from_rgb_fn(width, width / 2, PixelLayout::Rgb8, |x, _| {
            if (start..start + trunk_w).contains(&x) {
                [90, 66, 48]
            } else {
                [205, 218, 236]
            }
        })
        .expect("frame")
    }

    #[test]
    fn service_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MeasurementService>();
    }

    #[test]
    fn measures_centered_trunk() {
        let frame = trunk_frame(1000, 450, 100);
        let fov = CalibrationProfile::fallback();
        let out = MeasurementService::default()
            .measure(&frame.view(), &fov, 1.0)
            .expect("measurement");
        assert_eq!(out.pixel_width(), 100);
        assert_abs_diff_eq!(out.diameter_m, 0.11547, epsilon = 1e-3);
        assert_abs_diff_eq!(out.diameter_cm(), out.diameter_m * 100.0);
        assert_abs_diff_eq!(out.meters_per_pixel * 100.0, out.diameter_m, epsilon = 1e-12);
        assert!(matches!(out.scale, ScaleSource::FieldOfView { .. }));
    }

    #[test]
    fn strict_threshold_searches_fallback_bands() {
        // A limb crosses a third of the center band's scan rows.
        let frame = Frame::from_rgb_fn(400, 500, PixelLayout::Rgb8, |x, y| {
            if (175..225).contains(&x) || (210..247).contains(&y) {
                [90, 66, 48]
            } else {
                [205, 218, 236]
            }
        })
        .expect("frame");
        let fov = CalibrationProfile::fallback();

        let lenient = MeasurementService::default()
            .measure(&frame.view(), &fov, 1.0)
            .expect("measurement");
        assert_eq!(lenient.segmentation.band, BandPosition::Center);
        assert_abs_diff_eq!(lenient.confidence(), 10.0 / 15.0, epsilon = 1e-6);

        let strict = MeasurementService::new(MeasureParams {
            min_confidence: 0.9,
            ..MeasureParams::default()
        });
        assert_eq!(strict.min_confidence(), 0.9);
        assert_eq!(strict.segmenter().params().min_confidence, 0.9);
        let out = strict.measure(&frame.view(), &fov, 1.0).expect("measurement");
        assert_eq!(out.segmentation.band, BandPosition::Upper);
        assert_eq!(out.confidence(), 1.0);
        assert_eq!(out.pixel_width(), 50);
    }

    #[test]
    fn rejects_bad_distance_before_segmenting() {
        let frame = trunk_frame(200, 90, 20);
        let svc = MeasurementService::default();
        for d in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = svc
                .measure(&frame.view(), &CalibrationProfile::fallback(), d)
                .unwrap_err();
            assert!(matches!(
                err,
                MeasureError::InvalidMeasurementInput(InputError::NonPositiveDistance(_))
            ));
        }
    }

    #[test]
    fn overflowing_distance_is_invalid_input() {
        let frame = trunk_frame(1000, 450, 100);
        let svc = MeasurementService::default();
        for d in [f64::MAX, 1e308, 5e-324] {
            let err = svc
                .measure(&frame.view(), &CalibrationProfile::fallback(), d)
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    MeasureError::InvalidMeasurementInput(InputError::ScaleOutOfRange { .. })
                ),
                "d={d}: {err}"
            );
        }
    }

    #[test]
    fn malformed_frame_is_invalid_input() {
        let data = vec![0u8; 10];
        let view = FrameView {
            width: 8,
            height: 8,
            layout: PixelLayout::Rgb8,
            data: &data,
        };
        let err = MeasurementService::default()
            .measure(&view, &CalibrationProfile::fallback(), 2.0)
            .unwrap_err();
        assert!(matches!(
            err,
            MeasureError::InvalidMeasurementInput(InputError::Frame(FrameError::BufferLength { .. }))
        ));
    }

    #[test]
    fn reference_scale_uses_card_width() {
        let frame = trunk_frame(800, 250, 300);
        let out = MeasurementService::default()
            .measure_with_reference(&frame.view(), 100.0, 0.0856)
            .expect("measurement");
        assert_abs_diff_eq!(out.diameter_m, 0.2568, epsilon = 1e-9);
        assert_abs_diff_eq!(out.diameter_mm(), 256.8, epsilon = 1e-6);
    }

    #[test]
    fn params_fill_missing_fields() {
        let params: MeasureParams = serde_json::from_str(r#"{"min_confidence": 0.8}"#).unwrap();
        assert_eq!(params.min_confidence, 0.8);
        assert_eq!(params.segmenter, SegmenterParams::default());
    }
}
