use std::{
    path::Path,
    process::{Command, Stdio},
};

use crate::error::{CubeMovieError, CubeMovieResult};

pub fn is_ffplay_on_path() -> bool {
    Command::new("ffplay")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Play the finished movie with the system `ffplay` binary.
///
/// Runs strictly after encoding, never alongside it; blocks until the player
/// exits. With `repeat` the movie loops until the window is closed.
pub fn play(path: &Path, repeat: bool) -> CubeMovieResult<()> {
    if !is_ffplay_on_path() {
        return Err(CubeMovieError::encode(
            "ffplay is required for preview, but was not found on PATH",
        ));
    }

    let mut cmd = Command::new("ffplay");
    cmd.args(["-loglevel", "error"]);
    if repeat {
        // -loop 0 repeats indefinitely; the window close ends it.
        cmd.args(["-loop", "0"]);
    } else {
        cmd.arg("-autoexit");
    }
    cmd.arg(path);

    let status = cmd
        .status()
        .map_err(|e| CubeMovieError::encode(format!("failed to spawn ffplay: {e}")))?;
    if !status.success() {
        return Err(CubeMovieError::encode(format!(
            "ffplay exited with status {status}"
        )));
    }
    Ok(())
}
