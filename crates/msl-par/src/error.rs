//! Parse errors.

use msl_util::Span;

#[derive(Debug, Clone, thiserror::Error)]
#[error("[line {}:{}] parse error: {message}", span.line, span.column)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span }
    }
}
