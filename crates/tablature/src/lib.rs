//! Harmonica tab notation engine.
//!
//! This crate parses plain-text harmonica tablature into a structured
//! document, binds MIDI-derived timing to it, and generates notation
//! text back from timed entries.
//!
//! # Example
//!
//! ```
//! use tablature::{parse, ParseConfig, TimingMatcher, TimedEntry};
//!
//! let text = "page 1:\n4 -4 5\n45 6'\n";
//! let parsed = parse(text, &ParseConfig::default()).unwrap();
//!
//! let entries = vec![
//!     TimedEntry::new(4, 0.0, 0.4, 0.95),
//!     TimedEntry::new(-4, 0.5, 0.4, 0.92),
//! ];
//! let mut matcher = TimingMatcher::new();
//! let matched = matcher.match_document(&entries, &parsed.document).unwrap();
//! assert!(matched.pages[0].lines[0].slots[0].is_some());
//! ```

pub mod ast;
pub mod entry;
pub mod feedback;
pub mod generate;
pub mod mapper;
pub mod matcher;
pub mod parse;
pub mod scan;

pub use ast::{
    Chord, ChordSlot, ChordViolation, Line, MatchedDocument, MatchedLine, MatchedPage, Note, Page,
    TabDocument,
};
pub use entry::TimedEntry;
pub use feedback::Warning;
pub use generate::{generate, GeneratorConfig, GeneratorError};
pub use mapper::{HoleMapper, MapperError, NoteEvent};
pub use matcher::{MatchStatistics, MatcherError, TimingMatcher};
pub use parse::{parse, ParseConfig, ParseError, ParseOutput, ParseStatistics};
