use std::{
    io::Read as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdout},
};

use crate::{
    capture::source::{CapturedFrame, FixedCadence, FrameSource},
    foundation::core::{PixelBuffer, rgba_len},
    foundation::error::{GlyphcastError, GlyphcastResult},
};

/// Stream properties reported by `ffprobe`.
#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    /// Probed file.
    pub source_path: PathBuf,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Duration in seconds, 0 when unknown.
    pub duration_sec: f64,
}

#[cfg(feature = "media-ffmpeg")]
/// Probe the first video stream of `source_path` with the system `ffprobe`.
pub fn probe_video(source_path: &Path) -> GlyphcastResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| GlyphcastError::io("run ffprobe", e))?;
    if !out.status.success() {
        return Err(GlyphcastError::invalid_input(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| GlyphcastError::serde(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            GlyphcastError::invalid_input(format!(
                "no video stream in '{}'",
                source_path.display()
            ))
        })?;
    let (Some(width), Some(height)) = (video.width, video.height) else {
        return Err(GlyphcastError::invalid_input(
            "ffprobe reported no video dimensions",
        ));
    };
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        duration_sec,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Probe the first video stream of `source_path` with the system `ffprobe`.
pub fn probe_video(_source_path: &Path) -> GlyphcastResult<VideoSourceInfo> {
    Err(GlyphcastError::invalid_input(
        "video decoding requires the 'media-ffmpeg' feature",
    ))
}

/// Video file decoded by the system `ffmpeg`, resampled to the capture cadence.
///
/// Frames stream from ffmpeg's stdout as raw RGBA8 one at a time, so memory use does not
/// grow with video length.
pub struct FfmpegFrameSource {
    info: VideoSourceInfo,
    child: Child,
    stdout: ChildStdout,
    cadence: FixedCadence,
    frame_len: usize,
    finished: bool,
}

impl FfmpegFrameSource {
    /// Probe `source_path` and start decoding it at one frame every `interval_ms`.
    pub fn open(source_path: &Path, interval_ms: u32) -> GlyphcastResult<Self> {
        let info = probe_video(source_path)?;
        let frame_len = rgba_len(info.width, info.height)?;
        if frame_len == 0 {
            return Err(GlyphcastError::invalid_input(format!(
                "video '{}' has zero-sized frames",
                source_path.display()
            )));
        }
        let cadence = FixedCadence::new(interval_ms);

        let mut child = std::process::Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(source_path)
            .args([
                "-an",
                "-vf",
                &format!("fps=1000/{}", cadence.interval_ms()),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| GlyphcastError::io("spawn ffmpeg (is it installed and on PATH?)", e))?;
        let stdout = child.stdout.take().ok_or_else(|| {
            GlyphcastError::invalid_input("failed to open ffmpeg stdout (unexpected)")
        })?;

        tracing::debug!(
            source = %source_path.display(),
            width = info.width,
            height = info.height,
            interval_ms = cadence.interval_ms(),
            "ffmpeg decode started"
        );

        Ok(Self {
            info,
            child,
            stdout,
            cadence,
            frame_len,
            finished: false,
        })
    }

    /// Probed stream properties.
    pub fn info(&self) -> &VideoSourceInfo {
        &self.info
    }

    fn finish(&mut self) -> GlyphcastResult<()> {
        self.finished = true;
        let status = self
            .child
            .wait()
            .map_err(|e| GlyphcastError::io("wait for ffmpeg", e))?;
        if !status.success() {
            return Err(GlyphcastError::invalid_input(format!(
                "ffmpeg exited with {status} while decoding '{}'",
                self.info.source_path.display()
            )));
        }
        Ok(())
    }
}

impl FrameSource for FfmpegFrameSource {
    fn frame_interval_ms(&self) -> u32 {
        self.cadence.interval_ms()
    }

    fn next_frame(&mut self) -> GlyphcastResult<Option<CapturedFrame>> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.frame_len];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .stdout
                .read(&mut buf[filled..])
                .map_err(|e| GlyphcastError::io("read ffmpeg output", e))?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            self.finish()?;
            return Ok(None);
        }
        if filled < buf.len() {
            self.finish()?;
            return Err(GlyphcastError::invalid_input(format!(
                "ffmpeg produced a partial frame ({filled} of {} bytes)",
                self.frame_len
            )));
        }

        let pixels = PixelBuffer::new(self.info.width, self.info.height, buf)?;
        Ok(Some(CapturedFrame {
            timestamp_ms: self.cadence.tick(),
            pixels,
        }))
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/media.rs"]
mod tests;
