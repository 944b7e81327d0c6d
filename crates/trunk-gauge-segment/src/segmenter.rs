use log::{debug, warn};
use trunk_gauge_core::FrameView;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::{PredicateKind, SegmenterParams};
use crate::predicate::{EdgePair, ScanRow, ToneThreshold, TrunkPredicate};
use crate::result::{BandPosition, PixelRegion, RowSpan, SegmentationResult};

/// Vertical-band trunk segmenter.
///
/// A trunk is a roughly vertical object of near-constant cross-section, so
/// a handful of rows through the middle of the frame are enough to measure
/// it. Each scanned row contributes its widest border-free predicate span;
/// rows that agree with the median span decide width and confidence.
pub struct TrunkSegmenter {
    params: SegmenterParams,
    predicate: Box<dyn TrunkPredicate>,
}

impl TrunkSegmenter {
    /// Create a segmenter using the predicate selected in `params`.
    pub fn new(params: SegmenterParams) -> Self {
        let predicate: Box<dyn TrunkPredicate> = match params.predicate {
            PredicateKind::Tone => Box::new(ToneThreshold::new(params.tone)),
            PredicateKind::EdgePair => Box::new(EdgePair::new(params.edge)),
        };
        Self { params, predicate }
    }

    /// Create a segmenter with a caller-supplied predicate.
    ///
    /// `params.predicate`, `params.tone` and `params.edge` are ignored.
    pub fn with_predicate(params: SegmenterParams, predicate: Box<dyn TrunkPredicate>) -> Self {
        Self { params, predicate }
    }

    #[inline]
    pub fn params(&self) -> &SegmenterParams {
        &self.params
    }

    /// Find the trunk and its apparent width in source pixels.
    ///
    /// Never fails: frames without a usable trunk, including malformed
    /// views, yield a result with zero confidence.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn segment(&self, frame: &FrameView<'_>) -> SegmentationResult {
        if let Err(err) = frame.validate() {
            warn!("segmentation skipped: {err}");
            return SegmentationResult::not_detected(BandPosition::Center);
        }

        let bands: &[BandPosition] = if self.params.fallback_bands {
            &[BandPosition::Center, BandPosition::Upper, BandPosition::Lower]
        } else {
            &[BandPosition::Center]
        };

        let mut best: Option<SegmentationResult> = None;
        for &band in bands {
            let res = self.segment_band(frame, band);
            debug!(
                "band {:?}: width={} px confidence={:.2}",
                band, res.trunk_pixel_width, res.confidence
            );
            if res.confidence >= self.params.min_confidence {
                return res;
            }
            if best.as_ref().map_or(true, |b| res.confidence > b.confidence) {
                best = Some(res);
            }
        }
        best.unwrap_or_else(|| SegmentationResult::not_detected(BandPosition::Center))
    }

    fn segment_band(&self, frame: &FrameView<'_>, band: BandPosition) -> SegmentationResult {
        let ys = band_rows(
            frame.height,
            band.center_frac(),
            self.params.band_height_frac,
            self.params.scan_rows,
        );
        let sampler = ColumnSampler::new(frame.width, self.params.working_width);
        let rows: Vec<ScanRow> = ys
            .iter()
            .map(|&y| sampler.scan_row(frame, y, self.params.smooth_rows))
            .collect();

        let masks = self.predicate.mask_rows(&rows);
        let spans: Vec<RowSpan> = rows
            .iter()
            .zip(&masks)
            .filter_map(|(row, mask)| {
                let (start, end) = widest_interior_run(mask)?;
                let (start, end) = sampler.to_source(start, end);
                let width = (end - start) as u32;
                (width >= self.params.min_span_px.max(1)).then_some(RowSpan {
                    y: row.y as u32,
                    start: start as u32,
                    width,
                })
            })
            .collect();

        aggregate_spans(&spans, rows.len(), self.params.width_tolerance_rel, band)
    }
}

impl Default for TrunkSegmenter {
    fn default() -> Self {
        Self::new(SegmenterParams::default())
    }
}

/// Evenly spaced rows inside a band centered at `center_frac * height`.
fn band_rows(height: usize, center_frac: f32, height_frac: f32, count: usize) -> Vec<usize> {
    if height == 0 {
        return Vec::new();
    }
    let band_h = ((height as f32 * height_frac).round() as usize).clamp(1, height);
    let center = ((height as f32 * center_frac) as usize).min(height - 1);
    let top = center.saturating_sub(band_h / 2).min(height - band_h);
    let count = count.clamp(1, band_h);
    if count == 1 {
        return vec![center];
    }
    (0..count)
        .map(|i| top + i * (band_h - 1) / (count - 1))
        .collect()
}

/// Maps working columns to source columns.
struct ColumnSampler {
    xs: Vec<usize>,
    src_width: usize,
}

impl ColumnSampler {
    fn new(src_width: usize, working_width: Option<u32>) -> Self {
        let work = match working_width {
            Some(w) if w > 0 && (w as usize) < src_width => w as usize,
            _ => src_width,
        };
        let xs = (0..work).map(|i| i * src_width / work).collect();
        Self { xs, src_width }
    }

    #[inline]
    fn is_identity(&self) -> bool {
        self.xs.len() == self.src_width
    }

    /// Convert a working-column run `[start, end)` to source columns.
    fn to_source(&self, start: usize, end: usize) -> (usize, usize) {
        if self.is_identity() {
            return (start, end);
        }
        let scale = self.src_width as f64 / self.xs.len() as f64;
        let map = |c: usize| ((c as f64 * scale).round() as usize).min(self.src_width);
        (map(start), map(end))
    }

    fn scan_row(&self, frame: &FrameView<'_>, y: usize, smooth: bool) -> ScanRow {
        let up = y.saturating_sub(1);
        let down = (y + 1).min(frame.height - 1);
        let luma = self
            .xs
            .iter()
            .map(|&x| {
                if smooth {
                    let sum = frame.luma(x, up) as u16
                        + 2 * frame.luma(x, y) as u16
                        + frame.luma(x, down) as u16;
                    ((sum + 2) / 4) as u8
                } else {
                    frame.luma(x, y)
                }
            })
            .collect();
        let rgb = frame
            .layout
            .is_color()
            .then(|| self.xs.iter().map(|&x| frame.rgb(x, y)).collect());
        ScanRow { y, luma, rgb }
    }
}

/// Widest run of `true` that touches neither end of the row.
///
/// Ties go to the run closest to the row center. Returns `[start, end)`.
fn widest_interior_run(mask: &[bool]) -> Option<(usize, usize)> {
    let n = mask.len();
    let center = n / 2;
    let dist = |s: usize, e: usize| (s + e).abs_diff(2 * center);

    let mut best: Option<(usize, usize)> = None;
    let mut x = 0;
    while x < n {
        if !mask[x] {
            x += 1;
            continue;
        }
        let start = x;
        while x < n && mask[x] {
            x += 1;
        }
        let end = x;
        if start == 0 || end == n {
            continue;
        }
        let better = match best {
            None => true,
            Some((bs, be)) => {
                end - start > be - bs || (end - start == be - bs && dist(start, end) < dist(bs, be))
            }
        };
        if better {
            best = Some((start, end));
        }
    }
    best
}

/// Reduce per-row spans to one width, region and confidence.
fn aggregate_spans(
    spans: &[RowSpan],
    total_rows: usize,
    tolerance_rel: f32,
    band: BandPosition,
) -> SegmentationResult {
    if spans.is_empty() || total_rows == 0 {
        return SegmentationResult::not_detected(band);
    }

    let mut widths: Vec<u32> = spans.iter().map(|s| s.width).collect();
    widths.sort_unstable();
    let median = widths[(widths.len() - 1) / 2];
    let Some(reference) = spans.iter().find(|s| s.width == median) else {
        return SegmentationResult::not_detected(band);
    };

    let tol = (tolerance_rel * median as f32).max(1.0);
    let agreeing: Vec<RowSpan> = spans
        .iter()
        .filter(|s| (s.width as f32 - median as f32).abs() <= tol && s.overlaps(reference))
        .copied()
        .collect();

    let mut agreed: Vec<u32> = agreeing.iter().map(|s| s.width).collect();
    agreed.sort_unstable();
    let width = agreed[(agreed.len() - 1) / 2];

    let top = agreeing.iter().map(|s| s.y).min().unwrap_or(reference.y);
    let bottom = agreeing.iter().map(|s| s.y).max().unwrap_or(reference.y);
    let confidence = (agreeing.len() as f32 / total_rows as f32).min(1.0);

    SegmentationResult {
        trunk_pixel_width: width,
        bounding_region: PixelRegion {
            x: reference.start,
            y: top,
            w: width,
            h: bottom - top + 1,
        },
        confidence,
        band,
        row_spans: agreeing,
    }
}
