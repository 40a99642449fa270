#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use fitrs::{Fits, Hdu};

/// Write a small synthetic spectral cube to `path`.
///
/// Data value at (x, y, channel) is `channel * 100 + y * 10 + x`, stored in
/// FITS order (NAXIS1 fastest). The spectral axis is radio velocity in m/s
/// starting at 1000 with 250 m/s channels.
pub fn write_test_cube(path: &Path, nx: usize, ny: usize, nch: usize) {
    let data: Vec<f32> = (0..nch)
        .flat_map(|c| {
            (0..ny).flat_map(move |y| (0..nx).map(move |x| (c * 100 + y * 10 + x) as f32))
        })
        .collect();

    let mut hdu = Hdu::new(&[nx, ny, nch], data);
    hdu.insert("CTYPE1", "RA---SIN");
    hdu.insert("CTYPE2", "DEC--SIN");
    hdu.insert("CTYPE3", "VRAD");
    hdu.insert("CUNIT3", "m/s");
    hdu.insert("CRVAL3", 1000.0);
    hdu.insert("CDELT3", 250.0);
    hdu.insert("CRPIX3", 1.0);
    hdu.insert("BUNIT", "Jy/beam");

    Fits::create(path, hdu).expect("failed to write test cube");
}

/// Fresh scratch directory under `target/` for one test.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("test_scratch").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn ffmpeg_available() -> bool {
    tool_available("ffmpeg")
}

pub fn ffprobe_available() -> bool {
    tool_available("ffprobe")
}

fn tool_available(name: &str) -> bool {
    Command::new(name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
