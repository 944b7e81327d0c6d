//! trunk-gauge CLI: measure a tree trunk diameter from one photo.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use trunk_gauge::core::FALLBACK_VERTICAL_FOV_DEG;
use trunk_gauge::ingest::load_frame;
use trunk_gauge::io::{MeasureConfig, MeasureReport, ReferenceObject, ID1_CARD_WIDTH_M};
use trunk_gauge::optics::{NoCamera, OpticalCalibrator, ViewAngles};
use trunk_gauge::segment::PredicateKind;
use trunk_gauge::{Frame, MeasureError, MeasurementOutcome, MeasurementService};
#[cfg(feature = "tracing")]
use tracing_log::LogTracer;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(name = "trunk-gauge")]
#[command(about = "Measure a tree trunk diameter from a single photo")]
#[command(version)]
struct Cli {
    /// Input photo. Overrides `image_path` from the config.
    image: Option<PathBuf>,

    /// Camera-to-trunk distance in metres.
    #[arg(long, short)]
    distance: Option<f64>,

    /// Horizontal field of view in degrees. Skips camera calibration.
    #[arg(long)]
    hfov: Option<f64>,

    /// Vertical field of view in degrees.
    #[arg(long, requires = "hfov")]
    vfov: Option<f64>,

    /// Apparent width in pixels of a reference card held against the trunk.
    /// Replaces the field-of-view scale.
    #[arg(long)]
    reference_px: Option<f64>,

    /// Real width of the reference card in metres (default: ID-1 card).
    #[arg(long, requires = "reference_px")]
    reference_m: Option<f64>,

    /// JSON run configuration.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Trunk pixel predicate.
    #[arg(long, value_enum)]
    predicate: Option<PredicateArg>,

    /// Write a JSON report here.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log pipeline details to stderr.
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PredicateArg {
    Tone,
    Edge,
}

impl From<PredicateArg> for PredicateKind {
    fn from(arg: PredicateArg) -> Self {
        match arg {
            PredicateArg::Tone => PredicateKind::Tone,
            PredicateArg::Edge => PredicateKind::EdgePair,
        }
    }
}

impl Cli {
    /// Command-line flags take precedence over the config file.
    fn apply(&self, cfg: &mut MeasureConfig) {
        if let Some(image) = &self.image {
            cfg.image_path = Some(image.to_string_lossy().into_owned());
        }
        if let Some(d) = self.distance {
            cfg.subject_distance_m = Some(d);
        }
        if let Some(h) = self.hfov {
            let v = self
                .vfov
                .or(cfg.field_of_view.map(|fov| fov.vertical_deg))
                .unwrap_or(FALLBACK_VERTICAL_FOV_DEG);
            cfg.field_of_view = Some(ViewAngles::new(h, v));
        }
        if let Some(px) = self.reference_px {
            cfg.reference = Some(ReferenceObject {
                pixel_width: px,
                width_m: self.reference_m.unwrap_or(ID1_CARD_WIDTH_M),
            });
        }
        if let Some(predicate) = self.predicate {
            cfg.measure.segmenter.predicate = predicate.into();
        }
        if let Some(report) = &self.report {
            cfg.output_path = Some(report.to_string_lossy().into_owned());
        }
    }

    fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level());
    match try_main(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: &Cli) -> CliResult<()> {
    let mut cfg = match &cli.config {
        Some(path) => MeasureConfig::load_json(path)?,
        None => MeasureConfig::default(),
    };
    cli.apply(&mut cfg);

    let image_path = cfg
        .image_path
        .clone()
        .ok_or("no input image: pass IMAGE or set image_path in the config")?;
    if cfg.reference.is_none() && cfg.subject_distance_m.is_none() {
        return Err("subject distance required: pass --distance or --reference-px".into());
    }

    let frame = load_frame(&image_path)?;
    let service = cfg.build_service();
    let result = run(&service, &cfg, &frame);

    if let Some(path) = cfg.report_path() {
        let mut report = MeasureReport::new(image_path, frame.width, frame.height);
        match &result {
            Ok(out) => report.set_outcome(out.clone()),
            Err(err) => report.set_error(err),
        }
        report.write_json(path)?;
        log::info!("wrote report to {}", path.display());
    }

    let out = result?;
    println!(
        "diameter: {:.1} cm ({} px, confidence {:.2}, {:.2} ms)",
        out.diameter_cm(),
        out.pixel_width(),
        out.confidence(),
        out.elapsed_ms()
    );
    Ok(())
}

fn run(
    service: &MeasurementService,
    cfg: &MeasureConfig,
    frame: &Frame,
) -> Result<MeasurementOutcome, MeasureError> {
    let view = frame.view();
    if let Some(reference) = cfg.reference {
        return service.measure_with_reference(&view, reference.pixel_width, reference.width_m);
    }

    // Presence is checked by the caller; NaN fails validation regardless.
    let distance = cfg.subject_distance_m.unwrap_or(f64::NAN);
    match cfg.explicit_profile() {
        Some(profile) => service.measure(&view, &profile?, distance),
        None => {
            let calibrator = OpticalCalibrator::new(NoCamera, cfg.calibration);
            service.measure_calibrated(&view, &calibrator, None, distance)
        }
    }
}

fn init_logging(level: LevelFilter) {
    // Ignore errors if a logger/subscriber was already installed.
    #[cfg(feature = "tracing")]
    {
        let _ = LogTracer::init_with_filter(level);
        trunk_gauge::core::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = trunk_gauge::core::init_from_env(level);
    }
}
