use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRegion {
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// Horizontal slice of the frame that was scanned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandPosition {
    #[default]
    Center,
    Upper,
    Lower,
}

impl BandPosition {
    /// Band center as a fraction of frame height.
    #[inline]
    pub fn center_frac(self) -> f32 {
        match self {
            Self::Center => 0.5,
            Self::Upper => 0.25,
            Self::Lower => 0.75,
        }
    }
}

/// Trunk span found on one scan row, in source pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSpan {
    pub y: u32,
    pub start: u32,
    pub width: u32,
}

impl RowSpan {
    /// Exclusive end column.
    #[inline]
    pub fn end(&self) -> u32 {
        self.start + self.width
    }

    #[inline]
    pub fn overlaps(&self, other: &RowSpan) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// Output of one segmentation run.
///
/// `confidence == 0` means no trunk was found. `trunk_pixel_width` is then 0
/// and must not be read as a zero-width trunk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentationResult {
    pub trunk_pixel_width: u32,
    pub bounding_region: PixelRegion,
    /// Fraction of scanned rows agreeing on the trunk span, in `[0, 1]`.
    pub confidence: f32,
    pub band: BandPosition,
    /// Agreeing per-row spans, top to bottom.
    pub row_spans: Vec<RowSpan>,
}

impl SegmentationResult {
    pub fn not_detected(band: BandPosition) -> Self {
        Self {
            trunk_pixel_width: 0,
            bounding_region: PixelRegion::default(),
            confidence: 0.0,
            band,
            row_spans: Vec::new(),
        }
    }

    #[inline]
    pub fn is_detected(&self) -> bool {
        self.confidence > 0.0 && self.trunk_pixel_width > 0
    }
}
