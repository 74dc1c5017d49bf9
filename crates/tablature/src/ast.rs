//! Structural types for harmonica tab notation.
//!
//! A tab document is pages of lines of chords of notes. Every level is
//! a named type so arity and optionality stay visible: a `Chord` holds
//! one or two `Note`s, a `ChordSlot` in a matched document is `None`
//! when no timed entry lined up with the chord.

use serde::{Deserialize, Serialize};

use crate::entry::TimedEntry;

/// A single harmonica note. The sign of `hole` encodes breath
/// direction: positive is blow, negative is draw. `hole` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub hole: i8,
    pub is_bend: bool,
}

impl Note {
    pub fn blow(hole: u8) -> Self {
        Note {
            hole: hole as i8,
            is_bend: false,
        }
    }

    pub fn draw(hole: u8) -> Self {
        Note {
            hole: -(hole as i8),
            is_bend: false,
        }
    }

    /// Hole number without the direction sign.
    pub fn magnitude(&self) -> u8 {
        self.hole.unsigned_abs()
    }

    pub fn is_draw(&self) -> bool {
        self.hole < 0
    }
}

/// Reasons a chord fails harmonica-realism validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordViolation {
    #[error("hole {hole} out of range [{min}, {max}]")]
    HoleOutOfRange { hole: i8, min: u8, max: u8 },
    #[error("chord of {arity} notes exceeds the 2-note limit")]
    TooManyNotes { arity: usize },
    #[error("chord mixes blow and draw notes")]
    MixedDirection,
    #[error("chord holes {a} and {b} are not consecutive")]
    NonConsecutive { a: u8, b: u8 },
    #[error("bend notation is only valid on a single note")]
    BendOnChord,
}

/// One or more notes sounded together. Structurally a chord may be
/// empty (a source line with no recognized notes); validation rejects
/// anything outside the 1–2 note playable shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pub notes: Vec<Note>,
}

impl Chord {
    pub fn new(notes: Vec<Note>) -> Self {
        Chord { notes }
    }

    pub fn arity(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Check the chord against what a diatonic harmonica can actually
    /// play: holes within `[min_hole, max_hole]`, at most two notes,
    /// and a two-note chord must be adjacent holes in the same breath
    /// direction with no bend mark.
    pub fn validate(&self, min_hole: u8, max_hole: u8) -> Result<(), ChordViolation> {
        for note in &self.notes {
            let mag = note.magnitude();
            if mag < min_hole || mag > max_hole {
                return Err(ChordViolation::HoleOutOfRange {
                    hole: note.hole,
                    min: min_hole,
                    max: max_hole,
                });
            }
        }

        match self.notes.len() {
            0 | 1 => Ok(()),
            2 => {
                let (a, b) = (self.notes[0], self.notes[1]);
                if a.is_bend || b.is_bend {
                    return Err(ChordViolation::BendOnChord);
                }
                if a.is_draw() != b.is_draw() {
                    return Err(ChordViolation::MixedDirection);
                }
                if a.magnitude().abs_diff(b.magnitude()) != 1 {
                    return Err(ChordViolation::NonConsecutive {
                        a: a.magnitude(),
                        b: b.magnitude(),
                    });
                }
                Ok(())
            }
            n => Err(ChordViolation::TooManyNotes { arity: n }),
        }
    }
}

/// One row of chords within a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub chords: Vec<Chord>,
}

/// A named page of tab lines. Pages keep their first-seen order in the
/// source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub name: String,
    pub lines: Vec<Line>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A parsed tab document: ordered pages keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabDocument {
    pub pages: Vec<Page>,
}

impl TabDocument {
    pub fn page(&self, name: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.name == name)
    }

    pub fn page_names(&self) -> Vec<&str> {
        self.pages.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// The timed entries matched to one chord: `None` when nothing
/// matched, otherwise up to the chord's arity of entries.
pub type ChordSlot = Option<Vec<TimedEntry>>;

/// A line with each chord replaced by its match result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchedLine {
    pub slots: Vec<ChordSlot>,
}

/// A page of matched lines, same shape and order as the source page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPage {
    pub name: String,
    pub lines: Vec<MatchedLine>,
}

/// A tab document with timing spliced in, chord slot by chord slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchedDocument {
    pub pages: Vec<MatchedPage>,
}

impl MatchedDocument {
    pub fn page(&self, name: &str) -> Option<&MatchedPage> {
        self.pages.iter().find(|p| p.name == name)
    }
}
