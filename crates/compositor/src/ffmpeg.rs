//! ffmpeg/ffprobe command construction and probe output parsing.
//!
//! Segments are encoded as ProRes 4444 with alpha
//! (`yuva444p10le`) so filler stays transparent and concatenation
//! never re-times page clips.

use std::path::Path;

use serde::Deserialize;

use crate::exec::{ExecError, ProcessRunner, ToolCommand};

const VIDEO_CODEC_ARGS: [&str; 6] = [
    "-c:v",
    "prores_ks",
    "-profile:v",
    "4",
    "-pix_fmt",
    "yuva444p10le",
];

/// ffprobe JSON shape, first video stream only.
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: u32,
    height: u32,
}

/// Why a probe produced no dimensions. Callers treat this as a
/// warning and fall back to a default size.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("unparseable ffprobe output: {0}")]
    BadOutput(#[from] serde_json::Error),
    #[error("no video stream found")]
    NoVideoStream,
}

/// Ask ffprobe for the clip's frame dimensions.
pub fn probe_dimensions(
    runner: &dyn ProcessRunner,
    clip_path: &Path,
) -> Result<(u32, u32), ProbeError> {
    let cmd = ToolCommand::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_streams",
            "-select_streams",
            "v:0",
        ])
        .arg(clip_path.to_string_lossy());

    let output = runner.run(&cmd)?;
    let parsed: ProbeOutput = serde_json::from_str(&output.stdout)?;
    let stream = parsed.streams.first().ok_or(ProbeError::NoVideoStream)?;
    Ok((stream.width, stream.height))
}

/// A transparent filler clip of the given duration.
pub fn blank_segment(output: &Path, duration: f64, size: (u32, u32)) -> ToolCommand {
    let (width, height) = size;
    ToolCommand::new("ffmpeg")
        .args(["-y", "-f", "lavfi", "-i"])
        .arg(format!(
            "color=color=#FF00FF:size={width}x{height}:rate=30:duration={duration}"
        ))
        .args(["-vf", "colorkey=0xFF00FF:0.3:0.0,format=yuva444p10le"])
        .args(VIDEO_CODEC_ARGS)
        .arg(output.to_string_lossy())
}

/// A filler clip that freezes the last frame of `source` for
/// `duration` seconds.
pub fn hold_last_frame_segment(output: &Path, source: &Path, duration: f64) -> ToolCommand {
    ToolCommand::new("ffmpeg")
        .args(["-y", "-sseof", "-0.05", "-i"])
        .arg(source.to_string_lossy())
        .args(["-vf", "loop=loop=-1:size=1:start=0"])
        .arg("-t")
        .arg(format!("{duration:.3}"))
        .args(VIDEO_CODEC_ARGS)
        .arg(output.to_string_lossy())
}

/// Re-encode `input` trimmed from its start down to `duration`.
pub fn trim_segment(output: &Path, input: &Path, duration: f64) -> ToolCommand {
    ToolCommand::new("ffmpeg")
        .args(["-y", "-i"])
        .arg(input.to_string_lossy())
        .args(["-ss", "0.000"])
        .arg("-t")
        .arg(format!("{duration:.3}"))
        .args(VIDEO_CODEC_ARGS)
        .arg(output.to_string_lossy())
}

/// Concatenate the segments listed in `concat_file`, re-encoding at
/// constant frame rate so timing stays exact.
pub fn concat_segments(output: &Path, concat_file: &Path) -> ToolCommand {
    ToolCommand::new("ffmpeg")
        .args(["-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(concat_file.to_string_lossy())
        .args(VIDEO_CODEC_ARGS)
        .args(["-fps_mode", "cfr"])
        .arg(output.to_string_lossy())
}

/// Mux an audio track onto `video`, matching the shorter stream.
pub fn mux_audio(output: &Path, video: &Path, audio: &Path) -> ToolCommand {
    ToolCommand::new("ffmpeg")
        .args(["-y", "-i"])
        .arg(video.to_string_lossy())
        .arg("-i")
        .arg(audio.to_string_lossy())
        .args([
            "-c:v", "copy", "-c:a", "aac", "-map", "0:v:0", "-map", "1:a:0", "-shortest",
        ])
        .arg(output.to_string_lossy())
}

/// Concat-demuxer list content for an ordered set of segment files.
/// Single quotes in paths are escaped the way ffmpeg expects.
pub fn concat_file_contents<'a>(segments: impl Iterator<Item = &'a Path>) -> String {
    let mut contents = String::new();
    for path in segments {
        let escaped = path.to_string_lossy().replace('\'', "'\\''");
        contents.push_str(&format!("file '{escaped}'\n"));
    }
    contents
}
