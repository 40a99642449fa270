mod support;

use cubemovie::{CubeMovieError, SpectralCube, SpectralUnit};
use fitrs::{Fits, Hdu};

#[test]
fn loads_shape_data_and_spectral_axis() {
    let dir = support::scratch_dir("cube_loader_basic");
    let path = dir.join("cube.fits");
    support::write_test_cube(&path, 6, 5, 4);

    let cube = SpectralCube::open(&path).unwrap();
    assert_eq!(cube.n_channels(), 4);
    assert_eq!(cube.spatial_shape(), (6, 5));

    // Value layout written by the helper: c*100 + y*10 + x.
    assert_eq!(cube.channel(0)[[0, 0]], 0.0);
    assert_eq!(cube.channel(2)[[3, 5]], 235.0);

    let axis = cube.spectral();
    assert_eq!(axis.unit, SpectralUnit::MetersPerSecond);
    assert_eq!(axis.ctype, "VRAD");
    assert_eq!(axis.values, vec![1000.0, 1250.0, 1500.0, 1750.0]);
}

#[test]
fn header_metadata_feeds_auto_labels() {
    let dir = support::scratch_dir("cube_loader_meta");
    let path = dir.join("cube.fits");
    support::write_test_cube(&path, 4, 4, 2);

    let cube = SpectralCube::open(&path).unwrap();
    let meta = cube.meta();
    assert_eq!(meta.xlabel.as_deref(), Some("RA---SIN"));
    assert_eq!(meta.ylabel.as_deref(), Some("DEC--SIN"));
    assert_eq!(meta.bunit.as_deref(), Some("Jy/beam"));
}

#[test]
fn missing_wcs_card_is_a_descriptive_input_error() {
    let dir = support::scratch_dir("cube_loader_missing_card");
    let path = dir.join("cube.fits");

    // A 3-D image without the spectral WCS cards.
    let data: Vec<f32> = (0..8).map(|v| v as f32).collect();
    let hdu = Hdu::new(&[2, 2, 2], data);
    Fits::create(&path, hdu).unwrap();

    let err = SpectralCube::open(&path).unwrap_err();
    assert!(matches!(err, CubeMovieError::Input(_)));
    assert!(err.to_string().contains("CRVAL3"), "{err}");
}

#[test]
fn two_dimensional_image_is_rejected() {
    let dir = support::scratch_dir("cube_loader_2d");
    let path = dir.join("image.fits");

    let data: Vec<f32> = (0..16).map(|v| v as f32).collect();
    let hdu = Hdu::new(&[4, 4], data);
    Fits::create(&path, hdu).unwrap();

    let err = SpectralCube::open(&path).unwrap_err();
    assert!(matches!(err, CubeMovieError::Input(_)));
}

#[test]
fn nan_pixels_survive_loading() {
    let dir = support::scratch_dir("cube_loader_nan");
    let path = dir.join("cube.fits");

    let mut data: Vec<f32> = (0..8).map(|v| v as f32).collect();
    data[3] = f32::NAN;
    let mut hdu = Hdu::new(&[2, 2, 2], data);
    hdu.insert("CTYPE3", "VRAD");
    hdu.insert("CUNIT3", "m/s");
    hdu.insert("CRVAL3", 0.0);
    hdu.insert("CDELT3", 100.0);
    hdu.insert("CRPIX3", 1.0);
    Fits::create(&path, hdu).unwrap();

    let cube = SpectralCube::open(&path).unwrap();
    // Index 3 in FITS order is (x=1, y=1) of channel 0.
    assert!(cube.channel(0)[[1, 1]].is_nan());
    assert_eq!(cube.channel(1)[[0, 0]], 4.0);
}

#[test]
fn missing_cunit_falls_back_on_ctype_family() {
    let dir = support::scratch_dir("cube_loader_cunit_fallback");
    let path = dir.join("cube.fits");

    let data: Vec<f32> = (0..8).map(|v| v as f32).collect();
    let mut hdu = Hdu::new(&[2, 2, 2], data);
    hdu.insert("CTYPE3", "FREQ");
    hdu.insert("CRVAL3", 1.4e9);
    hdu.insert("CDELT3", 1.0e6);
    hdu.insert("CRPIX3", 1.0);
    Fits::create(&path, hdu).unwrap();

    let cube = SpectralCube::open(&path).unwrap();
    assert_eq!(cube.spectral().unit, SpectralUnit::Hertz);
    assert_eq!(cube.spectral().values[1], 1.401e9);
}
