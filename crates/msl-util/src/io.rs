//! Seams between the core and its external collaborators.
//!
//! `spec.md` §1 names the collaborators the core needs but deliberately
//! leaves outside its scope: a line-oriented reader backing the built-in
//! `Read` function, and a sink for the two logical output streams
//! (normal output, diagnostics). Expressing them as traits here lets
//! `msl-eval` depend on them without depending on `std::io`, stdin, or
//! any particular driver.

/// Supplies the built-in `Read` function with one line of input at a time.
pub trait LineReader {
    /// Reads one line (without its trailing newline). `None` at EOF.
    fn read_line(&mut self) -> Option<String>;
}

/// The two logical output streams a running program writes to.
pub trait OutputSink {
    fn write_out(&mut self, text: &str);
    fn write_err(&mut self, text: &str);
}

/// An [`OutputSink`] that discards everything; handy for tests that only
/// care about the final [`crate::symbol::Symbol`]/value result.
#[derive(Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn write_out(&mut self, _text: &str) {}
    fn write_err(&mut self, _text: &str) {}
}

/// An [`OutputSink`] that appends everything to in-memory buffers, used
/// by tests that assert on captured stdout/stderr.
#[derive(Default)]
pub struct BufferSink {
    pub out: String,
    pub err: String,
}

impl OutputSink for BufferSink {
    fn write_out(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn write_err(&mut self, text: &str) {
        self.err.push_str(text);
    }
}

/// A [`LineReader`] over a fixed, pre-supplied sequence of lines, used by
/// tests that exercise the `Read` built-in without real stdin.
pub struct FixedLines {
    lines: std::collections::VecDeque<String>,
}

impl FixedLines {
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { lines: lines.into_iter().map(Into::into).collect() }
    }
}

impl LineReader for FixedLines {
    fn read_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}
