//! Binds timed note events to a parsed tab document.
//!
//! Entries are consumed from one chronologically sorted pool shared
//! across the whole document: each note takes the earliest unconsumed
//! entry with its hole number, and an entry is used at most once. This
//! is greedy first-available matching, not a globally optimal
//! assignment.

use crate::ast::{Chord, MatchedDocument, MatchedLine, MatchedPage, TabDocument};
use crate::entry::TimedEntry;

/// Matching preconditions. Per-chord mismatches are not errors; they
/// surface as `None` slots in the result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatcherError {
    #[error("no timed entries")]
    NoEntries,
    #[error("no document")]
    NoDocument,
}

/// Counts from one matching run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatchStatistics {
    pub total_chords_processed: usize,
    /// Chords with at least one matched note.
    pub successful_matches: usize,
    pub failed_matches: usize,
    pub notes_matched: usize,
    pub notes_unmatched: usize,
}

/// Matches a [`TabDocument`] against timed entries.
#[derive(Debug, Default)]
pub struct TimingMatcher {
    debug: bool,
    statistics: MatchStatistics,
}

impl TimingMatcher {
    pub fn new() -> Self {
        TimingMatcher::default()
    }

    /// Emit one trace line per match attempt.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Statistics from the most recent run.
    pub fn statistics(&self) -> MatchStatistics {
        self.statistics
    }

    /// Match `entries` against `document`, consuming each entry at
    /// most once in chronological order.
    pub fn match_document(
        &mut self,
        entries: &[TimedEntry],
        document: &TabDocument,
    ) -> Result<MatchedDocument, MatcherError> {
        if entries.is_empty() {
            return Err(MatcherError::NoEntries);
        }
        if document.is_empty() {
            return Err(MatcherError::NoDocument);
        }

        self.statistics = MatchStatistics::default();

        // Stable sort keeps original order for equal onsets.
        let mut pool: Vec<TimedEntry> = entries.to_vec();
        pool.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        let mut result = MatchedDocument::default();
        for page in &document.pages {
            let mut matched_page = MatchedPage {
                name: page.name.clone(),
                lines: Vec::with_capacity(page.lines.len()),
            };
            for line in &page.lines {
                let mut matched_line = MatchedLine::default();
                for chord in &line.chords {
                    self.statistics.total_chords_processed += 1;
                    let slot = self.match_chord(chord, &mut pool);
                    if slot.is_some() {
                        self.statistics.successful_matches += 1;
                    } else {
                        self.statistics.failed_matches += 1;
                    }
                    matched_line.slots.push(slot);
                }
                matched_page.lines.push(matched_line);
            }
            result.pages.push(matched_page);
        }

        tracing::info!(
            chords = self.statistics.total_chords_processed,
            matched = self.statistics.successful_matches,
            failed = self.statistics.failed_matches,
            notes_matched = self.statistics.notes_matched,
            notes_unmatched = self.statistics.notes_unmatched,
            "tab matching complete"
        );

        Ok(result)
    }

    /// Take the first unconsumed entry for each note of the chord.
    /// Partial matches are kept; a chord with no matches yields `None`.
    fn match_chord(&mut self, chord: &Chord, pool: &mut Vec<TimedEntry>) -> Option<Vec<TimedEntry>> {
        let mut matched: Vec<TimedEntry> = Vec::new();

        for note in &chord.notes {
            match pool.iter().position(|e| e.hole == note.hole) {
                Some(idx) => {
                    let mut entry = pool.remove(idx);
                    // Notation is the authority on bends.
                    entry.is_bend = note.is_bend;
                    if self.debug {
                        tracing::debug!(
                            hole = note.hole,
                            bend = note.is_bend,
                            time = entry.start_time,
                            "matched note"
                        );
                    }
                    matched.push(entry);
                    self.statistics.notes_matched += 1;
                }
                None => {
                    if self.debug {
                        tracing::debug!(hole = note.hole, "no entry for note");
                    }
                    self.statistics.notes_unmatched += 1;
                }
            }
        }

        if matched.is_empty() {
            None
        } else {
            Some(matched)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse, ParseConfig};
    use pretty_assertions::assert_eq;

    fn doc(text: &str) -> TabDocument {
        parse(text, &ParseConfig::default()).unwrap().document
    }

    fn entry(hole: i8, start: f64, duration: f64) -> TimedEntry {
        TimedEntry::new(hole, start, duration, 1.0)
    }

    #[test]
    fn test_empty_inputs_are_errors() {
        let mut matcher = TimingMatcher::new();
        assert_eq!(
            matcher.match_document(&[], &doc("page 1:\n1\n")),
            Err(MatcherError::NoEntries)
        );
        assert_eq!(
            matcher.match_document(&[entry(1, 0.0, 0.5)], &TabDocument::default()),
            Err(MatcherError::NoDocument)
        );
    }

    #[test]
    fn test_text_order_drives_slot_position() {
        let entries = vec![entry(1, 0.0, 0.5), entry(2, 0.5, 0.5)];
        let mut matcher = TimingMatcher::new();

        let forward = matcher.match_document(&entries, &doc("page 1:\n1 2\n")).unwrap();
        let slots = &forward.pages[0].lines[0].slots;
        assert_eq!(slots[0].as_ref().unwrap()[0].hole, 1);
        assert_eq!(slots[1].as_ref().unwrap()[0].hole, 2);

        let reversed = matcher.match_document(&entries, &doc("page 1:\n2 1\n")).unwrap();
        let slots = &reversed.pages[0].lines[0].slots;
        assert_eq!(slots[0].as_ref().unwrap()[0].hole, 2);
        assert!((slots[0].as_ref().unwrap()[0].start_time - 0.5).abs() < 1e-9);
        assert_eq!(slots[1].as_ref().unwrap()[0].hole, 1);
        assert!((slots[1].as_ref().unwrap()[0].start_time - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_each_entry_consumed_at_most_once() {
        // Two notated 4s but only one entry; the second chord misses.
        let entries = vec![entry(4, 0.0, 0.5)];
        let mut matcher = TimingMatcher::new();
        let result = matcher.match_document(&entries, &doc("page 1:\n4 4\n")).unwrap();

        let slots = &result.pages[0].lines[0].slots;
        assert!(slots[0].is_some());
        assert!(slots[1].is_none());
        assert_eq!(matcher.statistics().notes_matched, 1);
        assert_eq!(matcher.statistics().notes_unmatched, 1);
        assert_eq!(matcher.statistics().failed_matches, 1);
    }

    #[test]
    fn test_repeated_holes_consume_chronologically() {
        let entries = vec![entry(4, 2.0, 0.5), entry(4, 0.0, 0.5)];
        let mut matcher = TimingMatcher::new();
        let result = matcher.match_document(&entries, &doc("page 1:\n4 4\n")).unwrap();

        let slots = &result.pages[0].lines[0].slots;
        assert!((slots[0].as_ref().unwrap()[0].start_time - 0.0).abs() < 1e-9);
        assert!((slots[1].as_ref().unwrap()[0].start_time - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_chord_match_is_kept() {
        let entries = vec![entry(1, 0.0, 0.5)];
        let mut matcher = TimingMatcher::new();
        let result = matcher.match_document(&entries, &doc("page 1:\n12\n")).unwrap();

        let slot = result.pages[0].lines[0].slots[0].as_ref().unwrap();
        assert_eq!(slot.len(), 1);
        assert_eq!(slot[0].hole, 1);
        assert_eq!(matcher.statistics().successful_matches, 1);
        assert_eq!(matcher.statistics().notes_unmatched, 1);
    }

    #[test]
    fn test_pool_spans_pages() {
        let entries = vec![entry(4, 0.0, 0.5), entry(4, 1.0, 0.5)];
        let mut matcher = TimingMatcher::new();
        let result = matcher
            .match_document(&entries, &doc("page 1:\n4\n\npage 2:\n4\n"))
            .unwrap();

        let first = result.pages[0].lines[0].slots[0].as_ref().unwrap();
        let second = result.pages[1].lines[0].slots[0].as_ref().unwrap();
        assert!((first[0].start_time - 0.0).abs() < 1e-9);
        assert!((second[0].start_time - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_notation_bend_overrides_entry() {
        let mut e = entry(6, 0.0, 0.5);
        e.is_bend = false;
        let mut matcher = TimingMatcher::new();
        let result = matcher.match_document(&[e], &doc("page 1:\n6'\n")).unwrap();
        assert!(result.pages[0].lines[0].slots[0].as_ref().unwrap()[0].is_bend);
    }

    #[test]
    fn test_statistics_reset_between_runs() {
        let entries = vec![entry(1, 0.0, 0.5)];
        let mut matcher = TimingMatcher::new();
        matcher.match_document(&entries, &doc("page 1:\n1\n")).unwrap();
        matcher.match_document(&entries, &doc("page 1:\n1\n")).unwrap();
        assert_eq!(matcher.statistics().total_chords_processed, 1);
        assert_eq!(matcher.statistics().notes_matched, 1);
    }
}
