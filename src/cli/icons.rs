//! Leading marks for CLI status lines.

use std::fmt;

use console::style;

/// Glyph printed before a status line.
///
/// Status lines go to stderr, so colors follow stderr's terminal detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// Finished step (green ✓).
    Ok,
    /// Step in progress (cyan →).
    Step,
    /// Recoverable problem (yellow !).
    Warn,
    /// Failed step (red ✗).
    Fail,
    /// Indented detail under a previous line.
    Detail,
}

impl Mark {
    pub fn glyph(self) -> &'static str {
        match self {
            Mark::Ok => "✓",
            Mark::Step | Mark::Detail => "→",
            Mark::Warn => "!",
            Mark::Fail => "✗",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let glyph = style(self.glyph()).for_stderr();
        let styled = match self {
            Mark::Ok => glyph.green(),
            Mark::Step => glyph.cyan(),
            Mark::Warn => glyph.yellow(),
            Mark::Fail => glyph.red(),
            Mark::Detail => glyph.dim(),
        };
        write!(f, "{}", styled)
    }
}
