//! Warning collection for permissive parsing.
//!
//! In permissive mode the parser keeps going past bad lines, recording
//! what it skipped so callers can report it. Each warning carries the
//! source position it was raised at.

use serde::{Deserialize, Serialize};

/// A recorded parser warning with its source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub message: String,
    /// 1-based source line.
    pub line: usize,
    /// 1-based column, 0 when the warning covers the whole line.
    pub column: usize,
}

/// Collects warnings while tracking the parser's current position.
#[derive(Debug, Default)]
pub struct WarningLog {
    warnings: Vec<Warning>,
    line: usize,
    column: usize,
}

impl WarningLog {
    pub fn new() -> Self {
        WarningLog {
            warnings: Vec::new(),
            line: 1,
            column: 0,
        }
    }

    /// Update position tracking; call when advancing through input.
    pub fn set_position(&mut self, line: usize, column: usize) {
        self.line = line;
        self.column = column;
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(line = self.line, column = self.column, "{message}");
        self.warnings.push(Warning {
            message,
            line: self.line,
            column: self.column,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}
