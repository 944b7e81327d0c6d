//! Pinhole back-projection from apparent pixel width to metric width.
//!
//! At distance `d`, a camera with horizontal field of view `hfov` images a
//! fronto-parallel strip of width `2 d tan(hfov / 2)` across the whole frame.
//! Dividing by the frame width gives a constant metres-per-pixel scale for
//! objects at that distance.

use crate::{CalibrationProfile, InputError};

/// Reject distances that are not finite and strictly positive.
pub fn check_subject_distance(subject_distance_m: f64) -> Result<(), InputError> {
    if subject_distance_m.is_finite() && subject_distance_m > 0.0 {
        Ok(())
    } else {
        Err(InputError::NonPositiveDistance(subject_distance_m))
    }
}

/// Reject reference objects without a finite positive size.
pub fn check_reference(
    reference_pixel_width: f64,
    reference_width_m: f64,
) -> Result<(), InputError> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if valid(reference_pixel_width) && valid(reference_width_m) {
        Ok(())
    } else {
        Err(InputError::InvalidReference {
            pixels: reference_pixel_width,
            meters: reference_width_m,
        })
    }
}

fn finite_positive(quantity: &'static str, value: f64) -> Result<f64, InputError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(InputError::ScaleOutOfRange { quantity, value })
    }
}

/// Metres covered by one pixel column at `subject_distance_m`.
pub fn metric_scale(
    frame_width: u32,
    fov: &CalibrationProfile,
    subject_distance_m: f64,
) -> Result<f64, InputError> {
    check_subject_distance(subject_distance_m)?;
    if frame_width == 0 {
        return Err(InputError::NonPositiveFrameWidth);
    }
    fov.validate()?;

    let half_angle = 0.5 * fov.horizontal_fov_rad();
    let span_m = finite_positive("view span", 2.0 * subject_distance_m * half_angle.tan())?;
    finite_positive("scale", span_m / f64::from(frame_width))
}

/// Real-world width of an object spanning `pixel_width` columns.
///
/// `subject_distance_m` is the camera-to-trunk distance. It is never
/// inferred from the image; callers without a rangefinder pass an explicit
/// assumed constant, and the result is only as good as that assumption.
pub fn project_diameter(
    pixel_width: u32,
    frame_width: u32,
    fov: &CalibrationProfile,
    subject_distance_m: f64,
) -> Result<f64, InputError> {
    check_subject_distance(subject_distance_m)?;
    if pixel_width == 0 {
        return Err(InputError::NonPositivePixelWidth);
    }
    if frame_width == 0 {
        return Err(InputError::NonPositiveFrameWidth);
    }
    if pixel_width > frame_width {
        return Err(InputError::PixelWidthExceedsFrame {
            pixel_width,
            frame_width,
        });
    }
    let scale = metric_scale(frame_width, fov, subject_distance_m)?;
    finite_positive("diameter", f64::from(pixel_width) * scale)
}

/// Metres per pixel given by a reference object in the trunk plane.
pub fn reference_scale(
    reference_pixel_width: f64,
    reference_width_m: f64,
) -> Result<f64, InputError> {
    check_reference(reference_pixel_width, reference_width_m)?;
    finite_positive("scale", reference_width_m / reference_pixel_width)
}

/// Width relative to a reference object of known size in the same plane.
///
/// A credit-card sized reference (85.6 mm) held against the trunk gives the
/// scale directly, without any field of view or distance.
pub fn project_with_reference(
    pixel_width: u32,
    reference_pixel_width: f64,
    reference_width_m: f64,
) -> Result<f64, InputError> {
    if pixel_width == 0 {
        return Err(InputError::NonPositivePixelWidth);
    }
    let scale = reference_scale(reference_pixel_width, reference_width_m)?;
    finite_positive("diameter", f64::from(pixel_width) * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FovSource;
    use approx::assert_abs_diff_eq;

    fn fov(h: f64) -> CalibrationProfile {
        CalibrationProfile::new(h, 45.0, FovSource::Measured).expect("fov")
    }

    #[test]
    fn sixty_degree_reference_case() {
        let d = project_diameter(100, 1000, &fov(60.0), 1.0).expect("diameter");
        let expected = 2.0 * 1.0 * 30f64.to_radians().tan() * (100.0 / 1000.0);
        assert_abs_diff_eq!(d, expected, epsilon = 1e-12);
        assert_abs_diff_eq!(d, 0.1155, epsilon = 1e-3);
    }

    #[test]
    fn monotonic_in_pixel_width() {
        let p = fov(60.0);
        let mut prev = 0.0;
        for w in [1u32, 2, 10, 50, 200, 999, 1000] {
            let d = project_diameter(w, 1000, &p, 2.5).expect("diameter");
            assert!(d > prev, "w={w}: {d} <= {prev}");
            prev = d;
        }
    }

    #[test]
    fn monotonic_in_distance() {
        let p = fov(66.0);
        let mut prev = 0.0;
        for dist in [0.1, 0.5, 1.0, 1.5, 3.0, 10.0] {
            let d = project_diameter(120, 1080, &p, dist).expect("diameter");
            assert!(d > prev, "dist={dist}: {d} <= {prev}");
            prev = d;
        }
    }

    #[test]
    fn rejects_invalid_inputs() {
        let p = fov(60.0);
        assert_eq!(
            project_diameter(100, 1000, &p, 0.0),
            Err(InputError::NonPositiveDistance(0.0))
        );
        assert!(matches!(
            project_diameter(100, 1000, &p, -1.0),
            Err(InputError::NonPositiveDistance(_))
        ));
        assert!(matches!(
            project_diameter(100, 1000, &p, f64::INFINITY),
            Err(InputError::NonPositiveDistance(_))
        ));
        assert_eq!(
            project_diameter(0, 1000, &p, 1.0),
            Err(InputError::NonPositivePixelWidth)
        );
        assert_eq!(
            project_diameter(10, 0, &p, 1.0),
            Err(InputError::NonPositiveFrameWidth)
        );
        assert!(matches!(
            project_diameter(1001, 1000, &p, 1.0),
            Err(InputError::PixelWidthExceedsFrame { .. })
        ));

        let bad = CalibrationProfile {
            horizontal_fov_deg: 180.0,
            ..CalibrationProfile::fallback()
        };
        assert!(matches!(
            project_diameter(10, 100, &bad, 1.0),
            Err(InputError::InvalidFieldOfView { .. })
        ));
    }

    #[test]
    fn extreme_distances_never_yield_degenerate_widths() {
        let p = CalibrationProfile::fallback();
        for dist in [f64::MAX, 1e308, 5e-324] {
            let res = project_diameter(100, 1000, &p, dist);
            assert!(
                matches!(res, Err(InputError::ScaleOutOfRange { .. })),
                "dist={dist}: {res:?}"
            );
            assert!(metric_scale(1000, &p, dist).is_err(), "dist={dist}");
        }
        assert!(matches!(
            reference_scale(1e-310, 1e10),
            Err(InputError::ScaleOutOfRange { quantity: "scale", .. })
        ));
        assert!(matches!(
            project_with_reference(u32::MAX, 1e-300, 1e10),
            Err(InputError::ScaleOutOfRange { .. })
        ));
    }

    #[test]
    fn reference_scale_uses_card_width() {
        let d = project_with_reference(300, 100.0, 0.0856).expect("diameter");
        assert_abs_diff_eq!(d, 0.2568, epsilon = 1e-9);
        assert!(project_with_reference(300, 0.0, 0.0856).is_err());
        assert!(project_with_reference(0, 100.0, 0.0856).is_err());
    }
}
