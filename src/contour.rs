use ndarray::ArrayView2;

/// A contour line segment in data coordinates (x, y), where integer
/// coordinates sit on pixel centers.
pub type Segment = ((f64, f64), (f64, f64));

/// Marching-squares contour extraction at a single level.
///
/// Cells with any non-finite corner are skipped. A level outside the data
/// range simply yields no segments.
pub fn contour_segments(data: ArrayView2<'_, f32>, level: f64) -> Vec<Segment> {
    let (ny, nx) = data.dim();
    let mut segments = Vec::new();
    if ny < 2 || nx < 2 {
        return segments;
    }

    for y in 0..ny - 1 {
        for x in 0..nx - 1 {
            let bl = f64::from(data[[y, x]]);
            let br = f64::from(data[[y, x + 1]]);
            let tr = f64::from(data[[y + 1, x + 1]]);
            let tl = f64::from(data[[y + 1, x]]);
            if !(bl.is_finite() && br.is_finite() && tr.is_finite() && tl.is_finite()) {
                continue;
            }

            let case = usize::from(bl >= level)
                | usize::from(br >= level) << 1
                | usize::from(tr >= level) << 2
                | usize::from(tl >= level) << 3;
            if case == 0 || case == 15 {
                continue;
            }

            let xf = x as f64;
            let yf = y as f64;
            let frac = |a: f64, b: f64| (level - a) / (b - a);
            let bottom = (xf + frac(bl, br), yf);
            let right = (xf + 1.0, yf + frac(br, tr));
            let top = (xf + frac(tl, tr), yf + 1.0);
            let left = (xf, yf + frac(bl, tl));

            match case {
                1 | 14 => segments.push((bottom, left)),
                2 | 13 => segments.push((bottom, right)),
                3 | 12 => segments.push((left, right)),
                4 | 11 => segments.push((right, top)),
                6 | 9 => segments.push((bottom, top)),
                7 | 8 => segments.push((top, left)),
                // Saddle cells: disambiguate with the cell-center value.
                5 => {
                    if (bl + br + tr + tl) / 4.0 >= level {
                        segments.push((left, top));
                        segments.push((bottom, right));
                    } else {
                        segments.push((left, bottom));
                        segments.push((right, top));
                    }
                }
                10 => {
                    if (bl + br + tr + tl) / 4.0 >= level {
                        segments.push((bottom, right));
                        segments.push((top, left));
                    } else {
                        segments.push((bottom, left));
                        segments.push((top, right));
                    }
                }
                _ => unreachable!(),
            }
        }
    }

    segments
}
