//! Compositor driver: executes a segment plan into one output clip.
//!
//! Filler and trimmed segments are rendered into a temp directory,
//! concatenated in plan order, and optionally muxed with an audio
//! track. Temp files are removed best-effort afterwards, also when a
//! step failed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::exec::{ExecError, ProcessRunner};
use crate::ffmpeg;
use crate::plan::{build_plan, Segment};
use crate::window::{PageStatistics, PageWindow};

/// What fills the silence between pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillerStyle {
    /// Transparent blank segments.
    #[default]
    Blank,
    /// Freeze the previous page's last frame. Gaps before the first
    /// page still render blank.
    HoldLastFrame,
}

#[derive(Debug, Clone)]
pub struct CompositorConfig {
    pub filler: FillerStyle,
    pub cleanup_temp_files: bool,
    pub temp_dir: PathBuf,
    /// Frame size used when probing the first clip fails.
    pub fallback_size: (u32, u32),
    /// Tail padding and overlap trims at or below this many seconds
    /// are ignored. Gaps between pages are always filled.
    pub gap_epsilon: f64,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        CompositorConfig {
            filler: FillerStyle::Blank,
            cleanup_temp_files: true,
            temp_dir: std::env::temp_dir(),
            fallback_size: (1920, 1080),
            gap_epsilon: 0.01,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompositorError {
    #[error("no page statistics provided")]
    NoPages,
    #[error("page clip not found: {0}")]
    MissingClip(PathBuf),
    #[error(transparent)]
    Tool(#[from] ExecError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Assembles page clips into one continuous, audio-synchronized clip.
pub struct Compositor<R: ProcessRunner> {
    config: CompositorConfig,
    runner: R,
}

impl<R: ProcessRunner> Compositor<R> {
    pub fn new(config: CompositorConfig, runner: R) -> Self {
        Compositor { config, runner }
    }

    /// Build and execute the timeline for `page_statistics`, padded or
    /// trimmed to exactly `total_duration` seconds, writing the result
    /// to `output_path`. When `audio_path` is given the track is muxed
    /// onto the concatenated video.
    pub fn compose(
        &self,
        page_statistics: &[PageStatistics],
        total_duration: f64,
        output_path: &Path,
        audio_path: Option<&Path>,
    ) -> Result<PathBuf, CompositorError> {
        if page_statistics.is_empty() {
            return Err(CompositorError::NoPages);
        }

        tracing::info!(
            pages = page_statistics.len(),
            total_duration,
            "composing full tab timeline"
        );

        let windows = PageWindow::from_statistics(page_statistics);
        for window in &windows {
            if !window.clip_path.is_file() {
                return Err(CompositorError::MissingClip(window.clip_path.clone()));
            }
        }

        let size = match ffmpeg::probe_dimensions(&self.runner, &windows[0].clip_path) {
            Ok(size) => size,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    fallback = ?self.config.fallback_size,
                    "could not probe clip dimensions"
                );
                self.config.fallback_size
            }
        };

        let plan = build_plan(&windows, total_duration, self.config.gap_epsilon);

        let mut temp_files: Vec<PathBuf> = Vec::new();
        let result = self.execute_plan(&plan, size, output_path, audio_path, &mut temp_files);

        if self.config.cleanup_temp_files {
            for file in &temp_files {
                if let Err(err) = fs::remove_file(file) {
                    tracing::debug!(path = %file.display(), error = %err, "temp cleanup skipped");
                }
            }
        }

        result?;
        tracing::info!(output = %output_path.display(), "full tab timeline created");
        Ok(output_path.to_path_buf())
    }

    fn execute_plan(
        &self,
        plan: &[Segment],
        size: (u32, u32),
        output_path: &Path,
        audio_path: Option<&Path>,
        temp_files: &mut Vec<PathBuf>,
    ) -> Result<(), CompositorError> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros())
            .unwrap_or(0);

        let mut segment_files: Vec<PathBuf> = Vec::new();
        for (idx, segment) in plan.iter().enumerate() {
            let file = match segment {
                Segment::Filler { duration } => {
                    let path = self.config.temp_dir.join(format!("filler_{stamp}_{idx}.mov"));
                    let cmd = match (self.config.filler, segment_files.last()) {
                        (FillerStyle::HoldLastFrame, Some(previous)) => {
                            ffmpeg::hold_last_frame_segment(&path, previous, *duration)
                        }
                        _ => ffmpeg::blank_segment(&path, *duration, size),
                    };
                    self.runner.run(&cmd)?;
                    temp_files.push(path.clone());
                    path
                }
                Segment::Clip {
                    clip_path,
                    duration,
                    trimmed: true,
                    window_index,
                } => {
                    tracing::info!(
                        index = window_index,
                        duration,
                        "re-encoding overlapped page clip"
                    );
                    let path = self.config.temp_dir.join(format!("trimmed_{stamp}_{idx}.mov"));
                    self.runner
                        .run(&ffmpeg::trim_segment(&path, clip_path, *duration))?;
                    temp_files.push(path.clone());
                    path
                }
                Segment::Clip {
                    clip_path,
                    trimmed: false,
                    ..
                } => clip_path.clone(),
            };
            segment_files.push(file);
        }

        let concat_file = self.config.temp_dir.join(format!("concat_{stamp}.txt"));
        let contents = ffmpeg::concat_file_contents(segment_files.iter().map(PathBuf::as_path));
        fs::write(&concat_file, contents).map_err(|source| CompositorError::Io {
            path: concat_file.clone(),
            source,
        })?;
        temp_files.push(concat_file.clone());

        match audio_path {
            Some(audio) => {
                let video_only = self
                    .config
                    .temp_dir
                    .join(format!("timeline_{stamp}_noaudio.mov"));
                self.runner
                    .run(&ffmpeg::concat_segments(&video_only, &concat_file))?;
                temp_files.push(video_only.clone());
                self.runner
                    .run(&ffmpeg::mux_audio(output_path, &video_only, audio))?;
            }
            None => {
                self.runner
                    .run(&ffmpeg::concat_segments(output_path, &concat_file))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{RecordingRunner, ToolOutput};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn probe_output() -> ToolOutput {
        ToolOutput {
            stdout: r#"{"streams": [{"width": 1920, "height": 1080}]}"#.into(),
            stderr: String::new(),
        }
    }

    fn stats(dir: &TempDir, name: &str, start: f64, end: f64) -> PageStatistics {
        let clip_path = dir.path().join(format!("{name}.mov"));
        fs::write(&clip_path, b"clip").unwrap();
        PageStatistics {
            page_name: name.into(),
            start_time: start,
            end_time: end,
            duration: end - start,
            clip_path,
        }
    }

    fn config(dir: &TempDir) -> CompositorConfig {
        CompositorConfig {
            temp_dir: dir.path().to_path_buf(),
            ..CompositorConfig::default()
        }
    }

    #[test]
    fn test_empty_statistics_rejected() {
        let dir = TempDir::new().unwrap();
        let compositor = Compositor::new(config(&dir), RecordingRunner::new());
        let err = compositor
            .compose(&[], 10.0, &dir.path().join("out.mov"), None)
            .unwrap_err();
        assert!(matches!(err, CompositorError::NoPages));
    }

    #[test]
    fn test_missing_clip_rejected() {
        let dir = TempDir::new().unwrap();
        let pages = vec![PageStatistics {
            page_name: "page 1".into(),
            start_time: 0.0,
            end_time: 5.0,
            duration: 5.0,
            clip_path: dir.path().join("absent.mov"),
        }];
        let compositor = Compositor::new(config(&dir), RecordingRunner::new());
        let err = compositor
            .compose(&pages, 5.0, &dir.path().join("out.mov"), None)
            .unwrap_err();
        assert!(matches!(err, CompositorError::MissingClip(_)));
    }

    #[test]
    fn test_gap_timeline_runs_expected_commands() {
        let dir = TempDir::new().unwrap();
        let pages = vec![
            stats(&dir, "page_1", 0.5, 5.5),
            stats(&dir, "page_2", 6.0, 12.0),
        ];
        let runner = RecordingRunner::new().with_output("ffprobe", probe_output());
        let compositor = Compositor::new(config(&dir), runner);
        let out = dir.path().join("out.mov");
        compositor.compose(&pages, 13.0, &out, None).unwrap();

        let commands = compositor.runner.commands();
        // Probe, three fillers (0.5s lead-in, 0.5s gap, 1.0s tail),
        // then the concat.
        assert_eq!(commands.len(), 5);
        assert_eq!(commands[0].program, "ffprobe");
        for filler in &commands[1..4] {
            assert_eq!(filler.program, "ffmpeg");
            assert!(filler.args.iter().any(|a| a.starts_with("color=")));
        }
        assert!(commands[4].args.contains(&"concat".to_string()));
        assert_eq!(
            commands[4].args.last().unwrap(),
            &out.to_string_lossy().into_owned()
        );
    }

    #[test]
    fn test_overlap_triggers_trim_command() {
        let dir = TempDir::new().unwrap();
        let pages = vec![
            stats(&dir, "page_1", 0.0, 5.0),
            stats(&dir, "page_2", 3.5, 9.0),
        ];
        let runner = RecordingRunner::new().with_output("ffprobe", probe_output());
        let compositor = Compositor::new(config(&dir), runner);
        compositor
            .compose(&pages, 9.0, &dir.path().join("out.mov"), None)
            .unwrap();

        let commands = compositor.runner.commands();
        // Probe, trim of page 1, concat.
        assert_eq!(commands.len(), 3);
        let trim = &commands[1];
        assert!(trim.args.contains(&"3.500".to_string()));
        assert!(trim
            .args
            .iter()
            .any(|a| a.ends_with("page_1.mov")));
    }

    #[test]
    fn test_audio_mux_appended() {
        let dir = TempDir::new().unwrap();
        let pages = vec![stats(&dir, "page_1", 0.0, 5.0)];
        let audio = dir.path().join("audio.wav");
        fs::write(&audio, b"wav").unwrap();

        let runner = RecordingRunner::new().with_output("ffprobe", probe_output());
        let compositor = Compositor::new(config(&dir), runner);
        compositor
            .compose(&pages, 5.0, &dir.path().join("out.mov"), Some(&audio))
            .unwrap();

        let commands = compositor.runner.commands();
        let last = commands.last().unwrap();
        assert!(last.args.contains(&"-shortest".to_string()));
        assert!(last.args.contains(&audio.to_string_lossy().into_owned()));
    }

    #[test]
    fn test_hold_last_frame_filler_uses_previous_clip() {
        let dir = TempDir::new().unwrap();
        let pages = vec![stats(&dir, "page_1", 0.5, 5.0)];
        let cfg = CompositorConfig {
            filler: FillerStyle::HoldLastFrame,
            ..config(&dir)
        };
        let runner = RecordingRunner::new().with_output("ffprobe", probe_output());
        let compositor = Compositor::new(cfg, runner);
        compositor
            .compose(&pages, 8.0, &dir.path().join("out.mov"), None)
            .unwrap();

        let commands = compositor.runner.commands();
        // Lead-in filler has no previous page: blank. Tail filler
        // freezes page 1's last frame.
        assert!(commands[1].args.iter().any(|a| a.starts_with("color=")));
        assert!(commands[2].args.contains(&"-sseof".to_string()));
        assert!(commands[2]
            .args
            .iter()
            .any(|a| a.ends_with("page_1.mov")));
    }

    #[test]
    fn test_probe_failure_falls_back_to_default_size() {
        let dir = TempDir::new().unwrap();
        let pages = vec![stats(&dir, "page_1", 0.5, 5.0)];
        // No canned ffprobe output: the probe JSON is empty and fails
        // to parse.
        let runner = RecordingRunner::new();
        let compositor = Compositor::new(config(&dir), runner);
        compositor
            .compose(&pages, 5.0, &dir.path().join("out.mov"), None)
            .unwrap();

        let blank = &compositor.runner.commands()[1];
        assert!(blank.args.iter().any(|a| a.contains("size=1920x1080")));
    }

    #[test]
    fn test_temp_files_cleaned_up() {
        let dir = TempDir::new().unwrap();
        let pages = vec![stats(&dir, "page_1", 0.5, 5.0)];
        let runner = RecordingRunner::new().with_output("ffprobe", probe_output());
        let compositor = Compositor::new(config(&dir), runner);
        compositor
            .compose(&pages, 5.0, &dir.path().join("out.mov"), None)
            .unwrap();

        // The recording runner never writes media, so anything left
        // over would be the concat list.
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("concat_"))
            .collect();
        assert_eq!(leftovers, Vec::<String>::new());
    }
}
