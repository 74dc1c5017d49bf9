//! Notation text generation from timed entries.
//!
//! The inverse of parsing, with its own grouping heuristics: entries
//! close in time collapse into chords, silence gaps and note counts
//! decide line and page breaks, and pages get 1-based `page N:`
//! headers.

use crate::entry::TimedEntry;

/// Grouping and pagination thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Max chords per line.
    pub notes_per_line: usize,
    /// Max chords per page.
    pub notes_per_page: usize,
    /// Seconds of silence that force a line break.
    pub line_gap_threshold: f64,
    /// Seconds of silence that force a page break.
    pub page_gap_threshold: f64,
    /// Max onset difference for entries to group as one chord.
    pub chord_time_tolerance: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            notes_per_line: 6,
            notes_per_page: 24,
            line_gap_threshold: 0.5,
            page_gap_threshold: 2.0,
            chord_time_tolerance: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    #[error("no entries")]
    NoEntries,
}

/// Render timed entries as tab notation text.
pub fn generate(entries: &[TimedEntry], config: &GeneratorConfig) -> Result<String, GeneratorError> {
    if entries.is_empty() {
        return Err(GeneratorError::NoEntries);
    }

    let mut sorted: Vec<TimedEntry> = entries.to_vec();
    sorted.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let chords = group_into_chords(sorted, config);
    let pages = split_into_pages(chords, config);
    Ok(format_pages(&pages))
}

/// Entries whose onsets fall within the tolerance of the chord's first
/// entry sound together.
fn group_into_chords(sorted: Vec<TimedEntry>, config: &GeneratorConfig) -> Vec<Vec<TimedEntry>> {
    let mut chords: Vec<Vec<TimedEntry>> = Vec::new();
    let mut current: Vec<TimedEntry> = Vec::new();

    for entry in sorted {
        match current.first() {
            Some(anchor)
                if (entry.start_time - anchor.start_time).abs()
                    <= config.chord_time_tolerance =>
            {
                current.push(entry);
            }
            Some(_) => {
                chords.push(std::mem::take(&mut current));
                current.push(entry);
            }
            None => current.push(entry),
        }
    }
    if !current.is_empty() {
        chords.push(current);
    }
    chords
}

/// Split chords into pages of lines by silence gaps and chord counts.
fn split_into_pages(
    chords: Vec<Vec<TimedEntry>>,
    config: &GeneratorConfig,
) -> Vec<Vec<Vec<Vec<TimedEntry>>>> {
    let mut pages = Vec::new();
    let mut current_page: Vec<Vec<Vec<TimedEntry>>> = Vec::new();
    let mut current_line: Vec<Vec<TimedEntry>> = Vec::new();
    let mut page_chord_count = 0usize;
    let mut prev_chord_end = 0.0f64;

    for chord in chords {
        let chord_start = chord[0].start_time;
        let chord_end = chord
            .iter()
            .map(TimedEntry::end_time)
            .fold(f64::NEG_INFINITY, f64::max);
        let gap = if prev_chord_end > 0.0 {
            chord_start - prev_chord_end
        } else {
            0.0
        };

        if gap >= config.page_gap_threshold
            || (page_chord_count >= config.notes_per_page && !current_line.is_empty())
        {
            if !current_line.is_empty() {
                current_page.push(std::mem::take(&mut current_line));
            }
            if !current_page.is_empty() {
                pages.push(std::mem::take(&mut current_page));
                page_chord_count = 0;
            }
        } else if gap >= config.line_gap_threshold || current_line.len() >= config.notes_per_line {
            if !current_line.is_empty() {
                current_page.push(std::mem::take(&mut current_line));
            }
        }

        current_line.push(chord);
        page_chord_count += 1;
        prev_chord_end = chord_end;
    }

    if !current_line.is_empty() {
        current_page.push(current_line);
    }
    if !current_page.is_empty() {
        pages.push(current_page);
    }
    pages
}

fn format_pages(pages: &[Vec<Vec<Vec<TimedEntry>>>]) -> String {
    let mut out: Vec<String> = Vec::new();

    for (page_num, page) in pages.iter().enumerate() {
        out.push(format!("page {}:", page_num + 1));
        for line in page {
            let formatted: Vec<String> = line.iter().map(|c| format_chord(c)).collect();
            out.push(formatted.join(" "));
        }
        if page_num + 1 < pages.len() {
            out.push(String::new());
        }
    }

    out.join("\n")
}

/// Format one chord: `6`, `-5`, `45` for a blow chord, `-4-5` for a
/// draw chord, with a bend glyph only on single notes.
fn format_chord(chord: &[TimedEntry]) -> String {
    if chord.is_empty() {
        return String::new();
    }

    let mut sorted: Vec<&TimedEntry> = chord.iter().collect();
    sorted.sort_by_key(|e| e.hole.unsigned_abs());
    let is_draw = sorted[0].hole < 0;

    let mut result = if sorted.len() == 1 {
        let entry = sorted[0];
        if is_draw {
            format!("-{}", entry.hole.unsigned_abs())
        } else {
            entry.hole.to_string()
        }
    } else if is_draw {
        sorted
            .iter()
            .map(|e| format!("-{}", e.hole.unsigned_abs()))
            .collect()
    } else {
        sorted
            .iter()
            .map(|e| e.hole.unsigned_abs().to_string())
            .collect()
    };

    if chord.len() == 1 && chord[0].is_bend {
        if chord[0].bend_glyph.is_empty() {
            result.push('\'');
        } else {
            result.push_str(&chord[0].bend_glyph);
        }
    }

    result
}
