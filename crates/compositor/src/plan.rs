//! Timeline segment planning.
//!
//! Pure interval arithmetic over page windows: walk the windows in
//! order keeping a running clock, fill gaps with filler segments, trim
//! the previous segment when a window starts before the clock, and pad
//! the tail out to the total duration. Execution of the plan (actual
//! ffmpeg work) lives in [`crate::compose`].

use std::path::PathBuf;

use crate::window::PageWindow;

/// One entry in the ordered clip plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Synthetic filler covering silence between pages.
    Filler { duration: f64 },
    /// A page's rendered clip. `trimmed` is set when an overlap
    /// shortened it below the window's own duration, which forces a
    /// re-encode at execution time.
    Clip {
        window_index: usize,
        clip_path: PathBuf,
        duration: f64,
        trimmed: bool,
    },
}

impl Segment {
    pub fn duration(&self) -> f64 {
        match self {
            Segment::Filler { duration } => *duration,
            Segment::Clip { duration, .. } => *duration,
        }
    }
}

/// Build the ordered segment plan for `windows` over a timeline of
/// `total_duration` seconds. Every positive gap between pages is
/// filled; `epsilon` only gates the tail pad and drops segments an
/// overlap trim would leave that short.
pub fn build_plan(windows: &[PageWindow], total_duration: f64, epsilon: f64) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut current_time = 0.0f64;

    for window in windows {
        if current_time < window.start_time {
            let gap = window.start_time - current_time;
            tracing::debug!(
                index = window.index,
                gap,
                "inserting filler before page"
            );
            segments.push(Segment::Filler { duration: gap });
            current_time = window.start_time;
        } else if current_time > window.start_time {
            let overlap = current_time - window.start_time;
            tracing::warn!(index = window.index, overlap, "page overlaps previous");
            trim_last_segment(&mut segments, overlap, epsilon);
            current_time = window.start_time;
        }

        segments.push(Segment::Clip {
            window_index: window.index,
            clip_path: window.clip_path.clone(),
            duration: window.duration,
            trimmed: false,
        });
        current_time = window.end_time;
    }

    let tail = total_duration - current_time;
    if tail > epsilon {
        tracing::debug!(tail, "padding timeline to total duration");
        segments.push(Segment::Filler { duration: tail });
    }

    segments
}

/// Shorten the previously emitted segment by `overlap` seconds. A
/// segment trimmed to `epsilon` or less is dropped entirely.
fn trim_last_segment(segments: &mut Vec<Segment>, overlap: f64, epsilon: f64) {
    let Some(last) = segments.last_mut() else {
        return;
    };
    let new_duration = last.duration() - overlap;
    if new_duration <= epsilon {
        segments.pop();
        return;
    }
    match last {
        Segment::Filler { duration } => *duration = new_duration,
        Segment::Clip {
            duration, trimmed, ..
        } => {
            *duration = new_duration;
            *trimmed = true;
        }
    }
}
