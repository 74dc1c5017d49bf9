//! Tab document parser.
//!
//! Scans text line by line: `page ...` headers open pages, every other
//! non-blank line is tokenized into chords and validated. The caller
//! picks the propagation policy through [`ParseConfig::strict`]: fatal
//! errors, or recorded warnings with the bad line dropped.

use crate::ast::{Chord, Line, Note, Page, TabDocument};
use crate::feedback::{Warning, WarningLog};
use crate::scan::{Scanner, Token};

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseConfig {
    /// Accept pages with no tab lines.
    pub allow_empty_pages: bool,
    /// Tolerate malformed chords (e.g. a dangling bend mark) by
    /// dropping them instead of failing.
    pub allow_empty_chords: bool,
    /// Enforce hole range and chord legality.
    pub validate_hole_numbers: bool,
    pub min_hole: u8,
    pub max_hole: u8,
    /// Fatal errors instead of warnings for bad lines.
    pub strict: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            allow_empty_pages: false,
            allow_empty_chords: true,
            validate_hole_numbers: true,
            min_hole: 1,
            max_hole: 10,
            strict: false,
        }
    }
}

/// Parse failures. Line-scoped errors carry the offending line number
/// and a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: {reason}")]
    Line { line: usize, reason: String },
    #[error("no pages found")]
    NoPages,
    #[error("empty pages not allowed: {names:?}")]
    EmptyPages { names: Vec<String> },
}

/// Counts gathered while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParseStatistics {
    pub total_pages: usize,
    pub total_lines: usize,
    pub total_chords: usize,
    pub total_notes: usize,
    pub empty_pages: usize,
    pub invalid_lines: usize,
    /// (min, max) hole magnitude seen, (0, 0) when no notes parsed.
    pub hole_range: (u8, u8),
}

/// A parsed document plus its statistics and any permissive-mode
/// warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub document: TabDocument,
    pub statistics: ParseStatistics,
    pub warnings: Vec<Warning>,
}

/// Parse tab notation text into a [`TabDocument`].
pub fn parse(input: &str, config: &ParseConfig) -> Result<ParseOutput, ParseError> {
    let mut document = TabDocument::default();
    let mut log = WarningLog::new();
    let mut invalid_lines = 0usize;
    let mut current_page: Option<usize> = None;

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        log.set_position(line_no, 0);

        if line.is_empty() {
            continue;
        }

        if is_page_header(line) {
            let name = resolve_page_name(line);
            match document.pages.iter().position(|p| p.name == name) {
                Some(pos) => {
                    // Reopening a page resets its content but keeps
                    // its first-seen position.
                    document.pages[pos].lines.clear();
                    current_page = Some(pos);
                }
                None => {
                    document.pages.push(Page {
                        name,
                        lines: Vec::new(),
                    });
                    current_page = Some(document.pages.len() - 1);
                }
            }
            continue;
        }

        let Some(page_idx) = current_page else {
            log.warn(format!("tab line outside page context: {line}"));
            invalid_lines += 1;
            continue;
        };

        match parse_tab_line(line, line_no, config, &mut log)? {
            Some(chords) => document.pages[page_idx].lines.push(Line { chords }),
            None => invalid_lines += 1,
        }
    }

    if document.pages.is_empty() {
        return Err(ParseError::NoPages);
    }

    let empty_names: Vec<String> = document
        .pages
        .iter()
        .filter(|p| p.is_empty())
        .map(|p| p.name.clone())
        .collect();
    if !config.allow_empty_pages && !empty_names.is_empty() {
        return Err(ParseError::EmptyPages { names: empty_names });
    }

    let mut statistics = finalize_statistics(&document);
    statistics.invalid_lines = invalid_lines;

    Ok(ParseOutput {
        document,
        statistics,
        warnings: log.into_warnings(),
    })
}

/// Case-insensitive `page` keyword opens a page.
fn is_page_header(line: &str) -> bool {
    line.get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("page"))
}

/// Page name is the whole header, trimmed, with at most one trailing
/// colon stripped.
fn resolve_page_name(line: &str) -> String {
    line.strip_suffix(':').unwrap_or(line).trim_end().to_string()
}

/// Tokenize one tab line into chords.
///
/// Returns `Ok(None)` when the line is dropped in permissive mode; in
/// strict mode every problem is a [`ParseError::Line`].
fn parse_tab_line(
    line: &str,
    line_no: usize,
    config: &ParseConfig,
    log: &mut WarningLog,
) -> Result<Option<Vec<Chord>>, ParseError> {
    let mut chords: Vec<Chord> = Vec::new();
    let mut current: Vec<Note> = Vec::new();
    let mut scanner = Scanner::new(line);

    while let Some(token) = scanner.next_token() {
        let token = match token {
            Ok(token) => token,
            Err(err) => {
                if config.strict {
                    return Err(ParseError::Line {
                        line: line_no,
                        reason: err.to_string(),
                    });
                }
                log.set_position(line_no, err.column);
                log.warn(format!("skipping line: {err}"));
                return Ok(None);
            }
        };

        match token {
            Token::Notes { holes, .. } => {
                current.extend(holes.into_iter().map(|hole| Note {
                    hole,
                    is_bend: false,
                }));
            }
            Token::Bend { adjacent: true, .. } => {
                if let Some(note) = current.last_mut() {
                    note.is_bend = true;
                }
            }
            Token::Bend {
                adjacent: false,
                column,
            } => {
                if !config.allow_empty_chords {
                    let reason = "bend notation must be directly adjacent to a note";
                    if config.strict {
                        return Err(ParseError::Line {
                            line: line_no,
                            reason: reason.to_string(),
                        });
                    }
                    log.set_position(line_no, column);
                    log.warn(format!("skipping line: {reason}"));
                    return Ok(None);
                }
                // Empty-chord tolerance: drop the offending chord.
                log.set_position(line_no, column);
                log.warn("dropping chord with dangling bend mark");
                current.clear();
            }
            Token::Break { .. } | Token::Separator { .. } => {
                if !current.is_empty() {
                    chords.push(Chord::new(std::mem::take(&mut current)));
                }
            }
        }
    }
    if !current.is_empty() {
        chords.push(Chord::new(current));
    }

    if chords.is_empty() && !config.allow_empty_chords {
        let reason = "line contains no chords";
        if config.strict {
            return Err(ParseError::Line {
                line: line_no,
                reason: reason.to_string(),
            });
        }
        log.set_position(line_no, 0);
        log.warn(format!("skipping line: {reason}"));
        return Ok(None);
    }

    if config.validate_hole_numbers {
        for chord in &chords {
            if let Err(violation) = chord.validate(config.min_hole, config.max_hole) {
                if config.strict {
                    return Err(ParseError::Line {
                        line: line_no,
                        reason: violation.to_string(),
                    });
                }
                log.set_position(line_no, 0);
                log.warn(format!("skipping line: {violation}"));
                return Ok(None);
            }
        }
    }

    Ok(Some(chords))
}

fn finalize_statistics(document: &TabDocument) -> ParseStatistics {
    let mut stats = ParseStatistics {
        total_pages: document.pages.len(),
        empty_pages: document.pages.iter().filter(|p| p.is_empty()).count(),
        ..ParseStatistics::default()
    };

    let mut min_hole = u8::MAX;
    let mut max_hole = 0u8;
    for page in &document.pages {
        for line in &page.lines {
            stats.total_lines += 1;
            for chord in &line.chords {
                stats.total_chords += 1;
                for note in &chord.notes {
                    stats.total_notes += 1;
                    min_hole = min_hole.min(note.magnitude());
                    max_hole = max_hole.max(note.magnitude());
                }
            }
        }
    }
    if stats.total_notes > 0 {
        stats.hole_range = (min_hole, max_hole);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn holes(chord: &Chord) -> Vec<i8> {
        chord.notes.iter().map(|n| n.hole).collect()
    }

    #[test]
    fn test_parse_two_pages() {
        let text = "page 1:\n4 -4 5\n45 -4-5\n\npage 2:\n6' -6\n";
        let out = parse(text, &ParseConfig::default()).unwrap();

        assert_eq!(out.document.page_names(), vec!["page 1", "page 2"]);
        let p1 = out.document.page("page 1").unwrap();
        assert_eq!(p1.lines.len(), 2);
        assert_eq!(holes(&p1.lines[0].chords[0]), vec![4]);
        assert_eq!(holes(&p1.lines[0].chords[1]), vec![-4]);
        assert_eq!(holes(&p1.lines[1].chords[0]), vec![4, 5]);
        assert_eq!(holes(&p1.lines[1].chords[1]), vec![-4, -5]);

        let p2 = out.document.page("page 2").unwrap();
        assert!(p2.lines[0].chords[0].notes[0].is_bend);
        assert_eq!(out.statistics.total_pages, 2);
        assert_eq!(out.statistics.total_notes, 9);
        assert_eq!(out.statistics.hole_range, (4, 6));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_header_keyword_is_case_insensitive() {
        let out = parse("PAGE intro:\n4 5\n", &ParseConfig::default()).unwrap();
        assert_eq!(out.document.page_names(), vec!["PAGE intro"]);
    }

    #[test]
    fn test_at_most_one_trailing_colon_stripped() {
        let out = parse("page 1::\n4\n", &ParseConfig::default()).unwrap();
        assert_eq!(out.document.page_names(), vec!["page 1:"]);
    }

    #[test]
    fn test_no_pages_is_an_error() {
        assert_eq!(parse("\n\n", &ParseConfig::default()), Err(ParseError::NoPages));
    }

    #[test]
    fn test_empty_page_rejected_unless_allowed() {
        let text = "page 1:\n\npage 2:\n4\n";
        assert_eq!(
            parse(text, &ParseConfig::default()),
            Err(ParseError::EmptyPages {
                names: vec!["page 1".into()]
            })
        );

        let cfg = ParseConfig {
            allow_empty_pages: true,
            ..ParseConfig::default()
        };
        let out = parse(text, &cfg).unwrap();
        assert_eq!(out.statistics.empty_pages, 1);
    }

    #[test]
    fn test_line_outside_page_is_skipped_with_warning() {
        let out = parse("4 5\npage 1:\n6\n", &ParseConfig::default()).unwrap();
        assert_eq!(out.statistics.invalid_lines, 1);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].message.contains("outside page context"));
    }

    #[test]
    fn test_reopened_page_resets_but_keeps_position() {
        let text = "page 1:\n4\npage 2:\n5\npage 1:\n6\n";
        let out = parse(text, &ParseConfig::default()).unwrap();
        assert_eq!(out.document.page_names(), vec!["page 1", "page 2"]);
        let p1 = out.document.page("page 1").unwrap();
        assert_eq!(p1.lines.len(), 1);
        assert_eq!(holes(&p1.lines[0].chords[0]), vec![6]);
    }

    #[test]
    fn test_invalid_chord_drops_line_in_permissive_mode() {
        let text = "page 1:\n13\n4 5\n";
        let out = parse(text, &ParseConfig::default()).unwrap();
        let p1 = out.document.page("page 1").unwrap();
        assert_eq!(p1.lines.len(), 1);
        assert_eq!(out.statistics.invalid_lines, 1);
        assert!(out.warnings[0].message.contains("not consecutive"));
    }

    #[test]
    fn test_invalid_chord_is_fatal_in_strict_mode() {
        let cfg = ParseConfig {
            strict: true,
            ..ParseConfig::default()
        };
        let err = parse("page 1:\n1-2\n", &cfg).unwrap_err();
        assert_eq!(
            err,
            ParseError::Line {
                line: 2,
                reason: "chord mixes blow and draw notes".into()
            }
        );
    }

    #[test]
    fn test_arity_and_bend_validation_literals() {
        // Dropping the sole line leaves the page empty, so empty pages
        // are tolerated here to observe the drop itself.
        let cfg = ParseConfig {
            allow_empty_pages: true,
            ..ParseConfig::default()
        };
        let ok = |text: &str| parse(&format!("page 1:\n{text}\n"), &cfg);
        assert!(ok("12").unwrap().warnings.is_empty());
        assert_eq!(ok("13").unwrap().statistics.invalid_lines, 1);
        assert_eq!(ok("1-2").unwrap().statistics.invalid_lines, 1);
        assert_eq!(ok("123").unwrap().statistics.invalid_lines, 1);
        assert!(ok("6'").unwrap().warnings.is_empty());
        assert_eq!(ok("12'").unwrap().statistics.invalid_lines, 1);
    }

    #[test]
    fn test_dangling_bend_drops_chord_under_tolerance() {
        let out = parse("page 1:\n4 ' 5\n", &ParseConfig::default()).unwrap();
        let line = &out.document.page("page 1").unwrap().lines[0];
        assert_eq!(line.chords.len(), 2);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].message.contains("dangling bend"));
    }

    #[test]
    fn test_dangling_bend_is_error_without_tolerance() {
        let cfg = ParseConfig {
            allow_empty_chords: false,
            strict: true,
            ..ParseConfig::default()
        };
        let err = parse("page 1:\n4 ' 5\n", &cfg).unwrap_err();
        assert!(matches!(err, ParseError::Line { line: 2, .. }));
    }

    #[test]
    fn test_bare_draw_mark_handling() {
        let out = parse("page 1:\n- 5\n4\n", &ParseConfig::default()).unwrap();
        assert_eq!(out.statistics.invalid_lines, 1);
        assert_eq!(out.warnings[0].column, 1);

        let cfg = ParseConfig {
            strict: true,
            ..ParseConfig::default()
        };
        assert!(parse("page 1:\n- 5\n", &cfg).is_err());
    }

    #[test]
    fn test_separators_close_chords() {
        let out = parse("page 1:\n4#comment 5\n", &ParseConfig::default()).unwrap();
        let line = &out.document.page("page 1").unwrap().lines[0];
        assert_eq!(holes(&line.chords[0]), vec![4]);
        assert_eq!(holes(&line.chords[1]), vec![5]);
    }

    #[test]
    fn test_note_count_matches_digit_tokens() {
        let text = "page 1:\n4 -45 6' 78\n-2-3\n";
        let out = parse(text, &ParseConfig::default()).unwrap();
        assert_eq!(out.statistics.total_notes, 8);
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let cfg = ParseConfig {
            validate_hole_numbers: false,
            ..ParseConfig::default()
        };
        let out = parse("page 1:\n123\n", &cfg).unwrap();
        let line = &out.document.page("page 1").unwrap().lines[0];
        assert_eq!(line.chords[0].arity(), 3);
    }
}
