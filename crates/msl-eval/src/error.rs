//! Runtime errors.

use msl_util::Span;

#[derive(Debug, Clone, thiserror::Error)]
#[error("[line {}:{}] runtime error: {message}", span.line, span.column)]
pub struct RuntimeError {
    pub message: String,
    pub span: Span,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span }
    }
}
