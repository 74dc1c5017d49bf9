//! MIDI pitch to harmonica hole mapping.
//!
//! Transcription output arrives as pitched note events; this module
//! turns them into [`TimedEntry`] values using a per-key mapping of
//! MIDI pitch to signed hole number. Mappings for the standard
//! diatonic keys are derived from the C layout by semitone offset.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entry::TimedEntry;

/// A pitched note event from an external transcription source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub start_time: f64,
    pub end_time: f64,
    /// MIDI pitch.
    pub pitch: u8,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapperError {
    #[error("no note events provided")]
    NoEvents,
    #[error("no events mapped to harmonica holes")]
    NothingMapped,
    #[error("unknown harmonica key: {0}")]
    UnknownKey(String),
}

/// Richter-tuned C diatonic layout: MIDI pitch to signed hole.
const C_LAYOUT: [(u8, i8); 19] = [
    (60, 1),
    (62, -1),
    (64, 2),
    (67, 3),
    (71, -3),
    (72, 4),
    (74, -4),
    (76, 5),
    (77, -5),
    (79, 6),
    (81, -6),
    (83, -7),
    (84, 7),
    (86, -8),
    (88, 8),
    (89, -9),
    (91, 9),
    (93, -10),
    (96, 10),
];

/// Semitone offset of each supported harp key relative to C. Keys G
/// through B sit below middle C, matching how diatonic harps are
/// actually pitched.
fn key_offset(key: &str) -> Option<i8> {
    match key.to_ascii_uppercase().as_str() {
        "G" => Some(-5),
        "AB" => Some(-4),
        "A" => Some(-3),
        "BB" => Some(-2),
        "B" => Some(-1),
        "C" => Some(0),
        "CS" | "DB" => Some(1),
        "D" => Some(2),
        "EB" => Some(3),
        "E" => Some(4),
        "F" => Some(5),
        "FS" => Some(6),
        _ => None,
    }
}

/// Maps pitched note events onto a specific harmonica's holes.
#[derive(Debug, Clone, PartialEq)]
pub struct HoleMapper {
    mapping: HashMap<u8, i8>,
}

impl HoleMapper {
    /// Mapper for a harp in the given key (`"C"`, `"G"`, `"BB"`, ...).
    pub fn for_key(key: &str) -> Result<Self, MapperError> {
        let offset = key_offset(key).ok_or_else(|| MapperError::UnknownKey(key.to_string()))?;
        let mapping = C_LAYOUT
            .iter()
            .filter_map(|&(pitch, hole)| {
                pitch
                    .checked_add_signed(offset)
                    .map(|shifted| (shifted, hole))
            })
            .collect();
        Ok(HoleMapper { mapping })
    }

    /// Mapper from an explicit pitch-to-hole table.
    pub fn with_mapping(mapping: HashMap<u8, i8>) -> Self {
        HoleMapper { mapping }
    }

    pub fn hole_for_pitch(&self, pitch: u8) -> Option<i8> {
        self.mapping.get(&pitch).copied()
    }

    /// Convert note events to timed entries, sorted by onset.
    ///
    /// Unmappable pitches and zero-or-negative-length events are
    /// skipped; failing to map anything at all is an error.
    pub fn map_events(&self, events: &[NoteEvent]) -> Result<Vec<TimedEntry>, MapperError> {
        if events.is_empty() {
            return Err(MapperError::NoEvents);
        }

        let mut entries: Vec<TimedEntry> = Vec::new();
        let mut skipped = 0usize;

        for event in events {
            let Some(hole) = self.hole_for_pitch(event.pitch) else {
                skipped += 1;
                continue;
            };
            if event.end_time <= event.start_time {
                tracing::warn!(pitch = event.pitch, "skipping event with invalid timing");
                skipped += 1;
                continue;
            }
            entries.push(TimedEntry::new(
                hole,
                round5(event.start_time),
                round5(event.end_time - event.start_time),
                round5(event.confidence),
            ));
        }

        if entries.is_empty() {
            return Err(MapperError::NothingMapped);
        }

        entries.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        tracing::debug!(
            mapped = entries.len(),
            skipped,
            "mapped note events to tab entries"
        );
        Ok(entries)
    }
}

/// Round to 1e-5 seconds, enough precision for frame-accurate timing.
fn round5(x: f64) -> f64 {
    (x * 1e5).round() / 1e5
}
