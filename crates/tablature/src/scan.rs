//! Position-tracked scanner for tab notation lines.
//!
//! A small state machine over the four token classes a tab line can
//! contain: digit runs (one note per digit), the `-` draw prefix, bend
//! marks, and separators. Columns are 1-based character positions so
//! errors can point at the offending spot.

/// One lexical token from a tab line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A run of digits, one signed hole per digit. Negative holes when
    /// the run was led by `-`.
    Notes { holes: Vec<i8>, column: usize },
    /// A bend mark: `'` or `''` (the doubled form is tolerated input
    /// and reads the same). `adjacent` is true when the mark directly
    /// followed a digit.
    Bend { adjacent: bool, column: usize },
    /// Whitespace, which closes the current chord.
    Break { column: usize },
    /// Any other character. Closes the current chord but is otherwise
    /// ignored, so trailing commentary doesn't break a line.
    Separator { column: usize },
}

/// A malformed token, positioned by column within the line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("column {column}: {message}")]
pub struct ScanError {
    pub column: usize,
    pub message: String,
}

/// Character scanner over a single tab line.
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
    prev_was_digit: bool,
}

impl Scanner {
    pub fn new(line: &str) -> Self {
        Scanner {
            chars: line.chars().collect(),
            pos: 0,
            prev_was_digit: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Current 1-based column.
    fn column(&self) -> usize {
        self.pos + 1
    }

    fn take_digit_run(&mut self, draw: bool) -> Vec<i8> {
        let mut holes = Vec::new();
        while let Some(c) = self.peek() {
            match c.to_digit(10) {
                Some(d) => {
                    let hole = d as i8;
                    holes.push(if draw { -hole } else { hole });
                    self.pos += 1;
                }
                None => break,
            }
        }
        self.prev_was_digit = true;
        holes
    }

    /// Produce the next token, or `None` at end of line.
    pub fn next_token(&mut self) -> Option<Result<Token, ScanError>> {
        let column = self.column();
        let c = self.peek()?;

        if c == '-' {
            self.pos += 1;
            if !matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                self.prev_was_digit = false;
                return Some(Err(ScanError {
                    column,
                    message: "draw mark must be followed by a hole digit".into(),
                }));
            }
            let holes = self.take_digit_run(true);
            return Some(Ok(Token::Notes { holes, column }));
        }

        if c.is_ascii_digit() {
            let holes = self.take_digit_run(false);
            return Some(Ok(Token::Notes { holes, column }));
        }

        if c == '\'' {
            let adjacent = self.prev_was_digit;
            self.pos += 1;
            // A doubled mark parses as one bend.
            if self.peek() == Some('\'') {
                self.pos += 1;
            }
            self.prev_was_digit = false;
            return Some(Ok(Token::Bend { adjacent, column }));
        }

        if c.is_whitespace() {
            while matches!(self.peek(), Some(w) if w.is_whitespace()) {
                self.pos += 1;
            }
            self.prev_was_digit = false;
            return Some(Ok(Token::Break { column }));
        }

        self.pos += 1;
        self.prev_was_digit = false;
        Some(Ok(Token::Separator { column }))
    }
}
