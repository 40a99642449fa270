use std::path::Path;

use fitrs::{Fits, FitsData, Hdu, HeaderValue};
use ndarray::{Array3, ArrayView2, Axis};

use crate::{
    error::{CubeMovieError, CubeMovieResult},
    units::SpectralUnit,
};

/// The spectral axis of a cube: one physical coordinate per channel, derived
/// from the linear FITS WCS cards of axis 3.
#[derive(Clone, Debug)]
pub struct SpectralAxis {
    pub values: Vec<f64>,
    pub unit: SpectralUnit,
    /// `CTYPE3`, e.g. `VRAD` or `FREQ`.
    pub ctype: String,
}

/// Header metadata consumed by the `auto` label options.
#[derive(Clone, Debug, Default)]
pub struct CubeMeta {
    /// `CTYPE1`, used as the automatic x-axis label.
    pub xlabel: Option<String>,
    /// `CTYPE2`, used as the automatic y-axis label.
    pub ylabel: Option<String>,
    /// `BUNIT`, used as the automatic colorbar label.
    pub bunit: Option<String>,
}

/// A FITS spectral cube held fully in memory.
///
/// Data layout is `[channel, y, x]`; every channel plane shares the spatial
/// shape by construction, and the spectral axis always has exactly one value
/// per channel.
#[derive(Clone, Debug)]
pub struct SpectralCube {
    data: Array3<f32>,
    spectral: SpectralAxis,
    meta: CubeMeta,
}

impl SpectralCube {
    /// Read the primary HDU of `path` as a spectral cube.
    ///
    /// Accepts 3-D images and 4-D images with a degenerate trailing axis
    /// (the common `[x, y, spectral, stokes]` layout with one Stokes plane).
    pub fn open(path: impl AsRef<Path>) -> CubeMovieResult<Self> {
        let path = path.as_ref();
        let fits = Fits::open(path).map_err(|e| {
            CubeMovieError::input(format!("cannot open FITS file '{}': {e}", path.display()))
        })?;
        let hdu = fits
            .get(0)
            .ok_or_else(|| CubeMovieError::input("FITS file has no primary HDU"))?;

        let (shape, data) = read_image_f32(&hdu)?;
        let (nx, ny, nch) = cube_shape(&shape)?;
        if data.len() != nx * ny * nch {
            return Err(CubeMovieError::input(format!(
                "FITS data length {} does not match shape {shape:?}",
                data.len()
            )));
        }

        // FITS order is NAXIS1-fastest, which is exactly row-major [ch, y, x].
        let data = Array3::from_shape_vec((nch, ny, nx), data)
            .map_err(|e| CubeMovieError::input(format!("cube reshape failed: {e}")))?;

        let spectral = read_spectral_axis(&hdu, nch)?;
        let meta = CubeMeta {
            xlabel: card_string(&hdu, "CTYPE1"),
            ylabel: card_string(&hdu, "CTYPE2"),
            bunit: card_string(&hdu, "BUNIT"),
        };

        Self::from_parts(data, spectral, meta)
    }

    /// Assemble a cube from already-loaded parts, checking the channel-count
    /// invariant.
    pub fn from_parts(
        data: Array3<f32>,
        spectral: SpectralAxis,
        meta: CubeMeta,
    ) -> CubeMovieResult<Self> {
        if data.len_of(Axis(0)) != spectral.values.len() {
            return Err(CubeMovieError::input(format!(
                "cube has {} channels but the spectral axis has {} values",
                data.len_of(Axis(0)),
                spectral.values.len()
            )));
        }
        if data.len_of(Axis(1)) == 0 || data.len_of(Axis(2)) == 0 {
            return Err(CubeMovieError::input("cube has an empty spatial axis"));
        }
        Ok(Self {
            data,
            spectral,
            meta,
        })
    }

    pub fn n_channels(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Spatial size as `(width, height)` in pixels.
    pub fn spatial_shape(&self) -> (usize, usize) {
        (self.data.len_of(Axis(2)), self.data.len_of(Axis(1)))
    }

    pub fn channel(&self, index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), index)
    }

    pub fn spectral(&self) -> &SpectralAxis {
        &self.spectral
    }

    pub fn meta(&self) -> &CubeMeta {
        &self.meta
    }

    /// All pixel values of the given channels, for scale estimation.
    pub fn pixel_values(&self, channels: &[usize]) -> Vec<f64> {
        channels
            .iter()
            .flat_map(|&c| self.channel(c).into_iter().map(|&v| f64::from(v)))
            .collect()
    }
}

/// Decode the image HDU into `f32`, promoting integer data with
/// `BSCALE`/`BZERO` and mapping undefined samples to NaN.
fn read_image_f32(hdu: &Hdu) -> CubeMovieResult<(Vec<usize>, Vec<f32>)> {
    let bscale = card_f64(hdu, "BSCALE").unwrap_or(1.0);
    let bzero = card_f64(hdu, "BZERO").unwrap_or(0.0);
    let scale_int = |v: Option<i64>| -> f32 {
        match v {
            Some(v) => (bzero + bscale * v as f64) as f32,
            None => f32::NAN,
        }
    };

    match hdu.read_data() {
        FitsData::FloatingPoint32(arr) => Ok((arr.shape, arr.data)),
        FitsData::FloatingPoint64(arr) => {
            Ok((arr.shape, arr.data.into_iter().map(|v| v as f32).collect()))
        }
        FitsData::IntegersI32(arr) => Ok((
            arr.shape,
            arr.data
                .into_iter()
                .map(|v| scale_int(v.map(i64::from)))
                .collect(),
        )),
        FitsData::IntegersU32(arr) => Ok((
            arr.shape,
            arr.data
                .into_iter()
                .map(|v| scale_int(v.map(i64::from)))
                .collect(),
        )),
        FitsData::Characters(_) => Err(CubeMovieError::input(
            "primary HDU contains character data, not an image cube",
        )),
    }
}

/// Validate the axis count and squeeze a degenerate trailing axis.
fn cube_shape(shape: &[usize]) -> CubeMovieResult<(usize, usize, usize)> {
    match shape {
        [nx, ny, nch] => Ok((*nx, *ny, *nch)),
        [nx, ny, nch, 1] => Ok((*nx, *ny, *nch)),
        other => Err(CubeMovieError::input(format!(
            "expected a 3-D spectral cube (or 4-D with a single trailing plane), got shape {other:?}"
        ))),
    }
}

fn read_spectral_axis(hdu: &Hdu, nch: usize) -> CubeMovieResult<SpectralAxis> {
    let crval = require_f64(hdu, "CRVAL3")?;
    let cdelt = require_f64(hdu, "CDELT3")?;
    let crpix = require_f64(hdu, "CRPIX3")?;
    let ctype = card_string(hdu, "CTYPE3").unwrap_or_default();

    let unit = match card_string(hdu, "CUNIT3") {
        Some(s) => s.parse().map_err(|_| {
            CubeMovieError::input(format!("unsupported spectral unit in CUNIT3: '{s}'"))
        })?,
        // Fall back on the axis type's conventional SI unit.
        None => default_unit_for_ctype(&ctype).ok_or_else(|| {
            CubeMovieError::input("missing required header card CUNIT3 (and CTYPE3 gives no default unit)")
        })?,
    };

    // FITS pixel indices are 1-based.
    let values = (0..nch)
        .map(|i| crval + (i as f64 + 1.0 - crpix) * cdelt)
        .collect();

    Ok(SpectralAxis {
        values,
        unit,
        ctype,
    })
}

fn default_unit_for_ctype(ctype: &str) -> Option<SpectralUnit> {
    let t = ctype.trim().to_ascii_uppercase();
    if t.starts_with("VELO") || t.starts_with("VRAD") || t.starts_with("VOPT") {
        Some(SpectralUnit::MetersPerSecond)
    } else if t.starts_with("FREQ") {
        Some(SpectralUnit::Hertz)
    } else {
        None
    }
}

fn card_f64(hdu: &Hdu, key: &str) -> Option<f64> {
    match hdu.value(key)? {
        HeaderValue::RealFloatingNumber(v) => Some(*v),
        HeaderValue::IntegerNumber(v) => Some(*v as f64),
        _ => None,
    }
}

fn require_f64(hdu: &Hdu, key: &str) -> CubeMovieResult<f64> {
    card_f64(hdu, key)
        .ok_or_else(|| CubeMovieError::input(format!("missing required header card {key}")))
}

fn card_string(hdu: &Hdu, key: &str) -> Option<String> {
    match hdu.value(key)? {
        HeaderValue::CharacterString(s) => Some(s.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn test_axis(n: usize) -> SpectralAxis {
        SpectralAxis {
            values: (0..n).map(|i| i as f64 * 200.0).collect(),
            unit: SpectralUnit::MetersPerSecond,
            ctype: "VRAD".to_string(),
        }
    }

    #[test]
    fn from_parts_checks_channel_count() {
        let data = Array3::<f32>::zeros((3, 4, 5));
        let err = SpectralCube::from_parts(data, test_axis(2), CubeMeta::default()).unwrap_err();
        assert!(matches!(err, CubeMovieError::Input(_)));
    }

    #[test]
    fn channel_views_have_spatial_shape() {
        let data = Array3::<f32>::zeros((3, 4, 5));
        let cube = SpectralCube::from_parts(data, test_axis(3), CubeMeta::default()).unwrap();
        assert_eq!(cube.n_channels(), 3);
        assert_eq!(cube.spatial_shape(), (5, 4));
        assert_eq!(cube.channel(1).dim(), (4, 5));
    }

    #[test]
    fn pixel_values_cover_only_selected_channels() {
        let mut data = Array3::<f32>::zeros((2, 1, 2));
        data[[0, 0, 0]] = 1.0;
        data[[0, 0, 1]] = 2.0;
        data[[1, 0, 0]] = 10.0;
        data[[1, 0, 1]] = 20.0;
        let cube = SpectralCube::from_parts(data, test_axis(2), CubeMeta::default()).unwrap();

        assert_eq!(cube.pixel_values(&[1]), vec![10.0, 20.0]);
    }

    #[test]
    fn degenerate_trailing_axis_is_squeezed() {
        assert_eq!(cube_shape(&[5, 4, 3, 1]).unwrap(), (5, 4, 3));
        assert_eq!(cube_shape(&[5, 4, 3]).unwrap(), (5, 4, 3));
        assert!(cube_shape(&[5, 4]).is_err());
        assert!(cube_shape(&[5, 4, 3, 2]).is_err());
    }

    #[test]
    fn ctype_default_units() {
        assert_eq!(
            default_unit_for_ctype("VRAD"),
            Some(SpectralUnit::MetersPerSecond)
        );
        assert_eq!(default_unit_for_ctype("FREQ-LSR"), Some(SpectralUnit::Hertz));
        assert_eq!(default_unit_for_ctype("STOKES"), None);
    }
}
