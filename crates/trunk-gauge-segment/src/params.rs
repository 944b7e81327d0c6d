use serde::{Deserialize, Serialize};

/// Which pixel predicate marks trunk pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    /// Bark-tone split of the scan band intensities.
    #[default]
    Tone,
    /// Pair of strong opposite vertical edges.
    EdgePair,
}

/// Which intensity class is bark.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Opposite of the class that owns the frame borders.
    #[default]
    Auto,
    Dark,
    Light,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneParams {
    /// Minimum luma range inside the scan band; flatter bands hold no trunk.
    pub min_contrast: u8,
    pub polarity: Polarity,
    /// Treat green vegetation (HSV hue 76°..190°, S and V >= 55) as background.
    pub exclude_foliage: bool,
}

impl Default for ToneParams {
    fn default() -> Self {
        Self {
            min_contrast: 20,
            polarity: Polarity::Auto,
            exclude_foliage: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeParams {
    /// Minimum absolute luma step between neighbouring columns.
    pub min_gradient: u8,
    /// Strongest edges kept per row before pairing.
    pub max_edges: usize,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            min_gradient: 24,
            max_edges: 64,
        }
    }
}

/// Parameters of the vertical-band trunk segmenter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterParams {
    pub predicate: PredicateKind,
    pub tone: ToneParams,
    pub edge: EdgeParams,

    /// Height of the scan band as a fraction of frame height.
    pub band_height_frac: f32,
    /// Number of rows sampled inside the band.
    pub scan_rows: usize,
    /// Narrowest span, in source pixels, accepted as a trunk.
    pub min_span_px: u32,
    /// Relative width tolerance for a row to agree with the band median.
    pub width_tolerance_rel: f32,

    /// Confidence below which the upper and lower bands are tried too.
    pub min_confidence: f32,
    pub fallback_bands: bool,

    /// Apply a vertical [1, 2, 1] filter to scanned rows.
    pub smooth_rows: bool,
    /// Resample rows to this many columns before segmenting.
    ///
    /// Widths are mapped back to source pixels, so the result keeps the
    /// frame's own units at the cost of `width / working_width` px of
    /// quantization.
    pub working_width: Option<u32>,
}

impl Default for SegmenterParams {
    fn default() -> Self {
        Self {
            predicate: PredicateKind::Tone,
            tone: ToneParams::default(),
            edge: EdgeParams::default(),
            band_height_frac: 0.2,
            scan_rows: 15,
            min_span_px: 4,
            width_tolerance_rel: 0.1,
            min_confidence: 0.5,
            fallback_bands: true,
            smooth_rows: true,
            working_width: None,
        }
    }
}
