//! Pixel predicates deciding which scan-row pixels belong to the trunk.

use crate::params::{EdgeParams, Polarity, ToneParams};
use crate::threshold::{histogram, intensity_range, otsu_threshold};

/// One sampled frame row, as seen by a predicate.
#[derive(Clone, Debug)]
pub struct ScanRow {
    /// Source row index.
    pub y: usize,
    /// Luma per working column.
    pub luma: Vec<u8>,
    /// Color per working column; `None` for gray frames.
    pub rgb: Option<Vec<[u8; 3]>>,
}

impl ScanRow {
    #[inline]
    pub fn len(&self) -> usize {
        self.luma.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.luma.is_empty()
    }
}

/// Strategy that marks trunk pixels in a band of scan rows.
///
/// Implementations must be deterministic and return one mask per input row,
/// each as long as the row.
pub trait TrunkPredicate: Send + Sync {
    fn mask_rows(&self, rows: &[ScanRow]) -> Vec<Vec<bool>>;
}

fn empty_masks(rows: &[ScanRow]) -> Vec<Vec<bool>> {
    rows.iter().map(|r| vec![false; r.len()]).collect()
}

/// OpenCV-style 8-bit HSV: hue in `0..180`, saturation and value in `0..=255`.
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = v - min;
    if delta == 0 {
        return [0, 0, v as u8];
    }
    let s = 255 * delta / v;
    let mut h = if v == r {
        60.0 * (g - b) as f32 / delta as f32
    } else if v == g {
        120.0 + 60.0 * (b - r) as f32 / delta as f32
    } else {
        240.0 + 60.0 * (r - g) as f32 / delta as f32
    };
    if h < 0.0 {
        h += 360.0;
    }
    [(h / 2.0).round().min(179.0) as u8, s as u8, v as u8]
}

/// Green vegetation: hue 38..=95 (half-degrees), saturation and value >= 55.
#[inline]
pub fn is_foliage(rgb: [u8; 3]) -> bool {
    let [h, s, v] = rgb_to_hsv(rgb);
    (38..=95).contains(&h) && s >= 55 && v >= 55
}

/// Bark-tone predicate.
///
/// Splits the band's luma with an Otsu threshold and keeps the class that
/// bark belongs to, optionally discarding green vegetation first.
#[derive(Clone, Copy, Debug, Default)]
pub struct ToneThreshold {
    pub params: ToneParams,
}

impl ToneThreshold {
    pub fn new(params: ToneParams) -> Self {
        Self { params }
    }

    /// Background reaches the frame borders; bark is the other class.
    fn bark_is_dark(&self, rows: &[ScanRow], t: u8) -> bool {
        match self.params.polarity {
            Polarity::Dark => true,
            Polarity::Light => false,
            Polarity::Auto => {
                let (dark, total) = rows
                    .iter()
                    .filter_map(|r| Some((*r.luma.first()?, *r.luma.last()?)))
                    .fold((0usize, 0usize), |(dark, total), (l, r)| {
                        (dark + usize::from(l <= t) + usize::from(r <= t), total + 2)
                    });
                2 * dark <= total
            }
        }
    }
}

impl TrunkPredicate for ToneThreshold {
    fn mask_rows(&self, rows: &[ScanRow]) -> Vec<Vec<bool>> {
        let hist = histogram(rows.iter().map(|r| r.luma.as_slice()));
        let Some((lo, hi)) = intensity_range(&hist) else {
            return empty_masks(rows);
        };
        if hi - lo < self.params.min_contrast {
            return empty_masks(rows);
        }

        let t = otsu_threshold(&hist);
        let dark = self.bark_is_dark(rows, t);

        rows.iter()
            .map(|row| {
                row.luma
                    .iter()
                    .enumerate()
                    .map(|(i, &l)| {
                        let tone = if dark { l <= t } else { l > t };
                        let foliage = self.params.exclude_foliage
                            && row.rgb.as_ref().is_some_and(|rgb| is_foliage(rgb[i]));
                        tone && !foliage
                    })
                    .collect()
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug)]
struct Edge {
    /// Column `x` where the step between `x` and `x + 1` happens.
    x: usize,
    gradient: i16,
}

impl Edge {
    #[inline]
    fn strength(&self) -> u16 {
        self.gradient.unsigned_abs()
    }
}

/// Edge-pair predicate.
///
/// Finds the strongest pair of opposite-signed horizontal luma steps in each
/// row and marks the pixels between them: a trunk is bounded by a left and a
/// right silhouette edge of opposite contrast.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgePair {
    pub params: EdgeParams,
}

impl EdgePair {
    pub fn new(params: EdgeParams) -> Self {
        Self { params }
    }

    /// Local maxima of the horizontal gradient above `min_gradient`.
    fn edges(&self, luma: &[u8]) -> Vec<Edge> {
        let grad: Vec<i16> = luma
            .windows(2)
            .map(|w| w[1] as i16 - w[0] as i16)
            .collect();
        let min = self.params.min_gradient as u16;

        let mut edges: Vec<Edge> = grad
            .iter()
            .enumerate()
            .filter(|&(x, g)| {
                let s = g.unsigned_abs();
                let left = if x > 0 { grad[x - 1].unsigned_abs() } else { 0 };
                let right = grad.get(x + 1).map_or(0, |g| g.unsigned_abs());
                s >= min && s >= left && s > right
            })
            .map(|(x, &gradient)| Edge { x, gradient })
            .collect();

        edges.sort_by(|a, b| b.strength().cmp(&a.strength()).then(a.x.cmp(&b.x)));
        edges.truncate(self.params.max_edges);
        edges
    }

    /// Strongest opposite-signed pair, widest on ties. Returns `(left, right)`.
    fn best_pair(edges: &[Edge]) -> Option<(usize, usize)> {
        let mut best: Option<(u16, usize, usize)> = None;
        for a in edges {
            for b in edges {
                if a.x >= b.x || a.gradient.signum() == b.gradient.signum() {
                    continue;
                }
                let score = a.strength().min(b.strength());
                let width = b.x - a.x;
                let better = match best {
                    None => true,
                    Some((s, l, r)) => score > s || (score == s && width > r - l),
                };
                if better {
                    best = Some((score, a.x, b.x));
                }
            }
        }
        best.map(|(_, l, r)| (l, r))
    }
}

impl TrunkPredicate for EdgePair {
    fn mask_rows(&self, rows: &[ScanRow]) -> Vec<Vec<bool>> {
        rows.iter()
            .map(|row| {
                let mut mask = vec![false; row.len()];
                if let Some((left, right)) = Self::best_pair(&self.edges(&row.luma)) {
                    mask[left + 1..=right].fill(true);
                }
                mask
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(luma: Vec<u8>) -> ScanRow {
        ScanRow {
            y: 0,
            luma,
            rgb: None,
        }
    }

    fn step_row(width: usize, start: usize, end: usize, bg: u8, fg: u8) -> Vec<u8> {
        (0..width)
            .map(|x| if (start..end).contains(&x) { fg } else { bg })
            .collect()
    }

    #[test]
    fn hsv_matches_opencv_convention() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([90, 90, 90]), [0, 0, 90]);
    }

    #[test]
    fn foliage_test_ignores_bark_and_sky() {
        assert!(is_foliage([40, 120, 90]));
        assert!(!is_foliage([96, 72, 52]));
        assert!(!is_foliage([200, 215, 235]));
    }

    #[test]
    fn tone_marks_dark_trunk() {
        let rows = vec![row(step_row(40, 15, 25, 210, 70)); 3];
        let masks = ToneThreshold::default().mask_rows(&rows);
        assert_eq!(masks.len(), 3);
        for m in masks {
            let marked: Vec<usize> = (0..40).filter(|&x| m[x]).collect();
            assert_eq!(marked, (15..25).collect::<Vec<_>>());
        }
    }

    #[test]
    fn tone_auto_polarity_handles_light_trunk() {
        // Birch bark against a dark forest.
        let rows = vec![row(step_row(40, 12, 28, 50, 230)); 2];
        let masks = ToneThreshold::default().mask_rows(&rows);
        assert_eq!(masks[0].iter().filter(|&&m| m).count(), 16);
        assert!(masks[0][12] && masks[0][27] && !masks[0][11] && !masks[0][28]);
    }

    #[test]
    fn tone_ignores_low_contrast_band() {
        let rows = vec![row(step_row(40, 15, 25, 120, 130)); 2];
        let masks = ToneThreshold::default().mask_rows(&rows);
        assert!(masks.iter().flatten().all(|&m| !m));
    }

    #[test]
    fn edge_pair_marks_between_opposite_edges() {
        let rows = vec![row(step_row(60, 20, 35, 200, 60))];
        let masks = EdgePair::default().mask_rows(&rows);
        let marked: Vec<usize> = (0..60).filter(|&x| masks[0][x]).collect();
        assert_eq!(marked, (20..35).collect::<Vec<_>>());
    }

    #[test]
    fn edge_pair_prefers_stronger_pair() {
        // Faint stripe at 5..10, strong trunk at 30..45.
        let mut luma = step_row(60, 30, 45, 200, 40);
        for v in &mut luma[5..10] {
            *v = 170;
        }
        let masks = EdgePair::default().mask_rows(&[row(luma)]);
        assert!(masks[0][30] && masks[0][44]);
        assert!(!masks[0][7]);
    }

    #[test]
    fn edge_pair_needs_two_edges() {
        let luma = step_row(60, 30, 60, 200, 40);
        let masks = EdgePair::default().mask_rows(&[row(luma)]);
        assert!(masks[0].iter().all(|&m| !m));
    }
}
