use crate::error::{CubeMovieError, CubeMovieResult};

/// Fixed color-transfer bounds for the whole movie.
///
/// Computed once at configuration resolution so colors stay comparable from
/// channel to channel; the renderer never recomputes them per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorBounds {
    pub vmin: f64,
    pub vmax: f64,
}

/// Compute `(vmin, vmax)` from the `(lo, hi)` percentiles of `values`,
/// honoring explicit per-bound overrides.
///
/// Non-finite samples are dropped before the percentile computation. An
/// override replaces the corresponding percentile entirely; the other bound
/// is still estimated from the data.
pub fn estimate_bounds(
    values: impl IntoIterator<Item = f64>,
    percentiles: [f64; 2],
    vmin_override: Option<f64>,
    vmax_override: Option<f64>,
) -> CubeMovieResult<ColorBounds> {
    let [lo, hi] = percentiles;
    if !(0.0..=100.0).contains(&lo) || !(0.0..=100.0).contains(&hi) {
        return Err(CubeMovieError::config(format!(
            "percentiles must lie in [0, 100], got [{lo}, {hi}]"
        )));
    }
    if lo >= hi {
        return Err(CubeMovieError::config(format!(
            "low percentile must be below high percentile, got [{lo}, {hi}]"
        )));
    }

    if let (Some(vmin), Some(vmax)) = (vmin_override, vmax_override) {
        // Both bounds fixed by the caller; no data pass needed.
        return Ok(ColorBounds { vmin, vmax });
    }

    let mut finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Err(CubeMovieError::config(
            "cannot estimate color bounds: no finite pixel values",
        ));
    }
    finite.sort_unstable_by(f64::total_cmp);

    let vmin = vmin_override.unwrap_or_else(|| percentile_sorted(&finite, lo));
    let vmax = vmax_override.unwrap_or_else(|| percentile_sorted(&finite, hi));
    Ok(ColorBounds { vmin, vmax })
}

/// Linear-interpolated percentile of an ascending-sorted, non-empty slice.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (n - 1) as f64;
    let lo_idx = rank.floor() as usize;
    let hi_idx = rank.ceil() as usize;
    let frac = rank - lo_idx as f64;
    sorted[lo_idx] + (sorted[hi_idx] - sorted[lo_idx]) * frac
}
