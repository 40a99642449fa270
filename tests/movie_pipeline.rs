mod support;

use std::process::Command;

use cubemovie::{cube_to_movie, CubeMovieError, MovieConfig, SpectralCube};

fn small_movie_config(out: std::path::PathBuf) -> MovieConfig {
    let mut cfg = MovieConfig {
        width: 320,
        height: 240,
        ..MovieConfig::default()
    };
    cfg.output.path = out;
    cfg.output.fps = 4;
    cfg
}

#[test]
fn end_to_end_movie_has_one_frame_per_channel() {
    if !support::ffmpeg_available() {
        eprintln!("skipping: ffmpeg not found on PATH");
        return;
    }

    let dir = support::scratch_dir("movie_end_to_end");
    let cube_path = dir.join("cube.fits");
    let out_path = dir.join("movie.mp4");
    support::write_test_cube(&cube_path, 16, 16, 5);

    let cube = SpectralCube::open(&cube_path).unwrap();
    let report = cube_to_movie(&cube, &small_movie_config(out_path.clone())).unwrap();

    assert_eq!(report.frames, 5);
    assert!(out_path.exists());

    if support::ffprobe_available() {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-count_frames",
                "-show_entries",
                "stream=nb_read_frames",
                "-of",
                "csv=p=0",
            ])
            .arg(&out_path)
            .output()
            .unwrap();
        assert!(output.status.success());
        let frames: u64 = String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .unwrap();
        assert_eq!(frames, 5);
    }
}

#[test]
fn existing_output_without_overwrite_is_rejected() {
    let dir = support::scratch_dir("movie_no_overwrite");
    let cube_path = dir.join("cube.fits");
    let out_path = dir.join("movie.mp4");
    support::write_test_cube(&cube_path, 8, 8, 2);
    std::fs::write(&out_path, b"existing").unwrap();

    let cube = SpectralCube::open(&cube_path).unwrap();
    let mut cfg = small_movie_config(out_path.clone());
    cfg.output.overwrite = false;

    // The overwrite refusal fires before the encoder probes for ffmpeg.
    let err = cube_to_movie(&cube, &cfg).unwrap_err();
    assert!(matches!(err, CubeMovieError::Config(_)));
    assert_eq!(std::fs::read(&out_path).unwrap(), b"existing");
}

#[test]
fn bad_config_fails_before_touching_the_output_path() {
    let dir = support::scratch_dir("movie_bad_config");
    let cube_path = dir.join("cube.fits");
    let out_path = dir.join("movie.mp4");
    support::write_test_cube(&cube_path, 8, 8, 2);

    let cube = SpectralCube::open(&cube_path).unwrap();
    let mut cfg = small_movie_config(out_path.clone());
    cfg.percentiles = [99.0, 1.0];

    let err = cube_to_movie(&cube, &cfg).unwrap_err();
    assert!(matches!(err, CubeMovieError::Config(_)));
    assert!(!out_path.exists());
}
