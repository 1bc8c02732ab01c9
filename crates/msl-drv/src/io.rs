//! Real stdio implementations of `msl-util`'s I/O seams, plus the
//! line-buffered prompt/read loop the REPL needs.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use msl_util::{LineReader, OutputSink};

/// Reads lines from a [`BufRead`] — `stdin().lock()` in production,
/// anything byte-oriented in tests.
pub struct BufReadLines<R> {
    lines: io::Lines<R>,
}

impl<R: BufRead> BufReadLines<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines() }
    }

    /// Distinguishes a read failure from clean EOF, which the
    /// [`LineReader`] trait's `Option<String>` can't — the REPL loop
    /// needs that distinction to choose between exit code 0 and 1
    /// (§6), while the `Read` built-in is content to see both as `None`.
    pub fn next_line(&mut self) -> Option<io::Result<String>> {
        self.lines.next()
    }
}

impl<R: BufRead> LineReader for BufReadLines<R> {
    fn read_line(&mut self) -> Option<String> {
        match self.lines.next() {
            Some(Ok(line)) => Some(line),
            Some(Err(_)) | None => None,
        }
    }
}

/// Gives the REPL loop and the running program's `Read` built-in a
/// handle onto the *same* input stream without fighting the borrow
/// checker over it — both need mutable access, but never at the same
/// instant, since the evaluator only reads a line when `Read()`
/// actually runs. `Rc<RefCell<_>>` is the single-threaded idiom for
/// that "shared, but never concurrently" access pattern.
pub struct SharedLines<R>(Rc<RefCell<BufReadLines<R>>>);

impl<R: BufRead> SharedLines<R> {
    pub fn new(inner: BufReadLines<R>) -> Self {
        Self(Rc::new(RefCell::new(inner)))
    }

    pub fn next_line(&self) -> Option<io::Result<String>> {
        self.0.borrow_mut().next_line()
    }

    /// A second handle onto the same underlying stream, for handing to
    /// the evaluator as its `LineReader`.
    pub fn handle(&self) -> SharedLinesHandle<R> {
        SharedLinesHandle(Rc::clone(&self.0))
    }
}

pub struct SharedLinesHandle<R>(Rc<RefCell<BufReadLines<R>>>);

impl<R: BufRead> LineReader for SharedLinesHandle<R> {
    fn read_line(&mut self) -> Option<String> {
        self.0.borrow_mut().read_line()
    }
}

/// Writes normal output to stdout and diagnostics to stderr, flushing
/// after every write so REPL output interleaves correctly with the next
/// prompt.
#[derive(Default)]
pub struct StdioSink;

impl OutputSink for StdioSink {
    fn write_out(&mut self, text: &str) {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    fn write_err(&mut self, text: &str) {
        let mut stderr = io::stderr();
        let _ = stderr.write_all(text.as_bytes());
        let _ = stderr.flush();
    }
}
