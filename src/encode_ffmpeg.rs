use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    config::ResolvedConfig,
    error::{CubeMovieError, CubeMovieResult},
    render::FrameRgb,
};

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
    /// ffmpeg video codec identifier, e.g. `libx264`.
    pub codec: String,
    /// Video bitrate in kbit/s; `None` leaves the rate choice to ffmpeg.
    pub bitrate_kbps: Option<u32>,
}

impl EncodeConfig {
    pub fn from_resolved(cfg: &ResolvedConfig) -> Self {
        Self {
            width: cfg.width,
            height: cfg.height,
            fps: cfg.output.fps,
            out_path: cfg.output.path.clone(),
            overwrite: cfg.output.overwrite,
            codec: cfg.output.codec.clone(),
            bitrate_kbps: cfg.output.bitrate_kbps,
        }
    }

    pub fn validate(&self) -> CubeMovieResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CubeMovieError::config(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(CubeMovieError::config("encode fps must be non-zero"));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            // The default settings target yuv420p output for maximum compatibility.
            return Err(CubeMovieError::config(
                "encode width/height must be even (required for yuv420p output)",
            ));
        }
        if self.codec.trim().is_empty() {
            return Err(CubeMovieError::config("encode codec must be non-empty"));
        }
        Ok(())
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> CubeMovieResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Streams raw `rgb24` frames to a system `ffmpeg` process which muxes them
/// into the output file. One encoder per movie; frames are accepted strictly
/// in order.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    frames_written: u64,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig) -> CubeMovieResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(CubeMovieError::config(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(CubeMovieError::encode(
                "ffmpeg is required for movie encoding, but was not found on PATH",
            ));
        }

        // The system `ffmpeg` binary is used deliberately instead of linking
        // FFmpeg natively, to avoid dev header/lib requirements.
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if cfg.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            &cfg.codec,
        ]);
        if let Some(kbps) = cfg.bitrate_kbps {
            cmd.args(["-b:v", &format!("{kbps}k")]);
        }
        cmd.args(["-pix_fmt", "yuv420p", "-movflags", "+faststart"])
            .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            CubeMovieError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CubeMovieError::encode("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            cfg,
            child: Some(child),
            stdin: Some(stdin),
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn write_frame(&mut self, frame: &FrameRgb) -> CubeMovieResult<()> {
        if frame.width != self.cfg.width || frame.height != self.cfg.height {
            return Err(CubeMovieError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.cfg.width, self.cfg.height
            )));
        }
        if frame.data.len() != (self.cfg.width * self.cfg.height * 3) as usize {
            return Err(CubeMovieError::encode(
                "frame.data size mismatch with width*height*3",
            ));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(CubeMovieError::encode("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            CubeMovieError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames_written += 1;

        Ok(())
    }

    /// Close the stream and wait for ffmpeg to finish the file.
    pub fn finish(&mut self) -> CubeMovieResult<()> {
        drop(self.stdin.take());

        let child = self
            .child
            .take()
            .ok_or_else(|| CubeMovieError::encode("ffmpeg encoder is already finalized"))?;

        let output = child.wait_with_output().map_err(|e| {
            CubeMovieError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CubeMovieError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cfg() -> EncodeConfig {
        EncodeConfig {
            width: 160,
            height: 120,
            fps: 2,
            out_path: PathBuf::from("target/out.mp4"),
            overwrite: true,
            codec: "libx264".to_string(),
            bitrate_kbps: None,
        }
    }

    #[test]
    fn config_validation_catches_bad_values() {
        assert!(EncodeConfig {
            width: 0,
            ..base_cfg()
        }
        .validate()
        .is_err());

        assert!(EncodeConfig {
            width: 161,
            ..base_cfg()
        }
        .validate()
        .is_err());

        assert!(EncodeConfig {
            fps: 0,
            ..base_cfg()
        }
        .validate()
        .is_err());

        assert!(EncodeConfig {
            codec: "  ".to_string(),
            ..base_cfg()
        }
        .validate()
        .is_err());

        assert!(base_cfg().validate().is_ok());
    }
}
