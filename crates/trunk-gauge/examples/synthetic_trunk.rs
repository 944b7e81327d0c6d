//! Measure a rendered trunk and print the outcome as JSON.
//!
//! Run with: cargo run -p trunk-gauge --example synthetic_trunk -- [width_px] [distance_m]

use std::env;

use trunk_gauge::core::{Frame, PixelLayout};
use trunk_gauge::optics::{CalibrationParams, FixedCamera, OpticalCalibrator};
use trunk_gauge::MeasurementService;
#[cfg(feature = "tracing")]
use tracing_log::LogTracer;

/// A phone main camera, roughly.
static CALIBRATOR: OpticalCalibrator<FixedCamera> =
    OpticalCalibrator::new(FixedCamera::new(66.0, 51.0), CalibrationParams::DEFAULT);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let trunk_px: usize = args.get(1).map(|s| s.parse()).transpose()?.unwrap_or(180);
    let distance_m: f64 = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(1.5);

    let (width, height) = (1280usize, 960usize);
    let start = (width.saturating_sub(trunk_px)) / 2;
    let frame = Frame::from_rgb_fn(width, height, PixelLayout::Rgba8, |x, y| {
        if (start..start + trunk_px).contains(&x) {
            // Furrowed bark: darker every few rows.
            if y % 9 < 2 {
                [70, 52, 38]
            } else {
                [98, 74, 54]
            }
        } else if y > height * 4 / 5 {
            [64, 132, 58]
        } else {
            [196, 212, 230]
        }
    })?;

    let service = MeasurementService::default();
    let out = service.measure_calibrated(&frame.view(), &CALIBRATOR, None, distance_m)?;
    println!("{}", serde_json::to_string_pretty(&out)?);
    eprintln!(
        "{:.1} cm across {} px ({:.2} ms)",
        out.diameter_cm(),
        out.pixel_width(),
        out.elapsed_ms()
    );
    Ok(())
}

fn init_logging() {
    #[cfg(feature = "tracing")]
    {
        let _ = LogTracer::init();
        trunk_gauge::core::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = trunk_gauge::core::init_from_env(log::LevelFilter::Info);
    }
}
