//! Global intensity thresholding.

/// 256-bin intensity histogram.
pub(crate) fn histogram<'a>(rows: impl IntoIterator<Item = &'a [u8]>) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for row in rows {
        for &v in row {
            hist[v as usize] += 1;
        }
    }
    hist
}

/// Occupied intensity range `(min, max)`, or `None` for an empty histogram.
pub(crate) fn intensity_range(hist: &[u32; 256]) -> Option<(u8, u8)> {
    let lo = hist.iter().position(|&h| h > 0)?;
    let hi = hist.iter().rposition(|&h| h > 0)?;
    Some((lo as u8, hi as u8))
}

/// Otsu threshold: values `<= t` form the dark class.
///
/// Histograms with at most two occupied bins split halfway between them.
pub(crate) fn otsu_threshold(hist: &[u32; 256]) -> u8 {
    let Some((lo, hi)) = intensity_range(hist) else {
        return 127;
    };
    if lo == hi {
        return lo;
    }
    if hist.iter().filter(|&&h| h > 0).count() <= 2 {
        return ((lo as u16 + hi as u16) / 2) as u8;
    }

    let total: f64 = hist.iter().map(|&h| h as f64).sum();
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_dark = 0f64;
    let mut w_dark = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &h) in hist.iter().enumerate() {
        w_dark += h as f64;
        if w_dark < 1.0 {
            continue;
        }
        let w_light = total - w_dark;
        if w_light < 1.0 {
            break;
        }

        sum_dark += t as f64 * h as f64;
        let m_dark = sum_dark / w_dark;
        let m_light = (sum_total - sum_dark) / w_light;

        let var_between = w_dark * w_light * (m_dark - m_light) * (m_dark - m_light);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}
