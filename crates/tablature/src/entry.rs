//! Timed note events from outside the notation engine.

use serde::{Deserialize, Serialize};

/// A note event with performance timing, typically derived from MIDI.
///
/// `hole` uses the same signed encoding as [`crate::ast::Note`]:
/// positive blow, negative draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEntry {
    pub hole: i8,
    /// Onset in seconds.
    pub start_time: f64,
    /// Sounding length in seconds.
    pub duration: f64,
    /// Transcription confidence in [0, 1].
    pub confidence: f64,
    pub is_bend: bool,
    /// Glyph appended to a bent note when rendering notation.
    pub bend_glyph: String,
}

impl TimedEntry {
    pub fn new(hole: i8, start_time: f64, duration: f64, confidence: f64) -> Self {
        TimedEntry {
            hole,
            start_time,
            duration,
            confidence,
            is_bend: false,
            bend_glyph: String::new(),
        }
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}
