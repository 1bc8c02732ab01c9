//! Diagnostic reporting.
//!
//! The lexer and parser don't own a stream to print to — they record
//! [`Diagnostic`]s into a [`Handler`], which the driver later renders to
//! its error sink. This keeps the lex/parse phases pure functions of
//! their input plus the handler, matching `spec.md` §9's note that a
//! target implementation should "thread a diagnostic sink through the
//! lexer/parser rather than rely on process-wide state."

use crate::Span;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self { level: Level::Error, message: message.into(), span }
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self { level: Level::Warning, message: message.into(), span }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}:{}] {}: {}", self.span.line, self.span.column, self.level, self.message)
    }
}

/// Accumulates diagnostics raised while lexing or parsing one source unit.
///
/// `had_error` in the spec's terms is [`Handler::has_errors`]; a REPL
/// driver resets a handler per input line by simply constructing a new
/// one (see `Handler::new`/`Handler::clear`).
///
/// # Examples
///
/// ```
/// use msl_util::{Handler, Span};
///
/// let mut handler = Handler::new();
/// assert!(!handler.has_errors());
///
/// handler.error("unexpected character '@'", Span::point(4, 1, 5));
/// assert!(handler.has_errors());
/// assert_eq!(handler.diagnostics().len(), 1);
///
/// handler.clear();
/// assert!(!handler.has_errors());
/// ```
#[derive(Default)]
pub struct Handler {
    diagnostics: Vec<Diagnostic>,
}

impl Handler {
    pub fn new() -> Self {
        Self { diagnostics: Vec::new() }
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        log::debug!("diagnostic: {diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, message: impl Into<String>, span: Span) {
        self.report(Diagnostic::error(message, span));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == Level::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_no_errors() {
        let handler = Handler::new();
        assert!(!handler.has_errors());
    }

    #[test]
    fn reporting_an_error_flips_has_errors() {
        let mut handler = Handler::new();
        handler.error("boom", Span::DUMMY);
        assert!(handler.has_errors());
        assert_eq!(handler.diagnostics().len(), 1);
    }

    #[test]
    fn warnings_alone_do_not_count_as_errors() {
        let mut handler = Handler::new();
        handler.report(Diagnostic::warning("hmm", Span::DUMMY));
        assert!(!handler.has_errors());
    }

    #[test]
    fn clear_resets_state_for_repl_reuse() {
        let mut handler = Handler::new();
        handler.error("boom", Span::DUMMY);
        handler.clear();
        assert!(!handler.has_errors());
        assert!(handler.diagnostics().is_empty());
    }
}
