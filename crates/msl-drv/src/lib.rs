//! msl-drv — the command-line driver: chooses between REPL and script
//! mode, wires real stdio into the evaluator's I/O seams, and maps
//! lex/parse/runtime outcomes onto the process exit codes §6 specifies.
//!
//! The core crates (`msl-lex`, `msl-par`, `msl-heap`, `msl-eval`) know
//! nothing about files, stdin, or exit codes — that orchestration is
//! everything below.

mod cli;
mod io;

pub use cli::{parse_args, Mode, UsageError};
pub use io::{BufReadLines, SharedLines, StdioSink};

use std::io::BufRead;

use log::{debug, info};
use msl_util::{Handler, OutputSink};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_STDIN_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 64;
pub const EXIT_COMPILE_ERROR: i32 = 65;
pub const EXIT_FILE_ERROR: i32 = 74;

/// Parses `argv`, dispatches to the REPL or script runner, and returns
/// the process exit code. `main.rs` is just `process::exit(msl_drv::main())`.
pub fn main() -> i32 {
    env_logger::init();

    let args = std::env::args().skip(1);
    match parse_args(args) {
        Ok(Mode::Repl) => {
            let stdin = std::io::stdin();
            let lines = BufReadLines::new(stdin.lock());
            let mut output = StdioSink;
            run_repl(lines, &mut output)
        }
        Ok(Mode::Script(path)) => {
            let mut output = StdioSink;
            run_script(&path, &mut output)
        }
        Err(usage) => {
            eprintln!("{usage}");
            EXIT_USAGE
        }
    }
}

/// Reads one line at a time from `lines`, prompting `"> "` before each,
/// and runs it against one long-lived [`msl_eval::Evaluator`] so
/// variables persist across lines (§5: "The REPL loop invokes `run`
/// once per input line"). The same underlying stream backs both the
/// prompt's own input and the evaluated program's `Read` built-in,
/// matching the source's single shared `stdin` stream — see
/// [`SharedLines`] for how the two borrows coexist.
pub fn run_repl<R: BufRead>(lines: BufReadLines<R>, output: &mut dyn OutputSink) -> i32 {
    let lines = SharedLines::new(lines);
    let mut reader = lines.handle();
    let mut evaluator = msl_eval::Evaluator::new(output, &mut reader);

    loop {
        print!("> ");
        let _ = std::io::Write::flush(&mut std::io::stdout());
        let line = match lines.next_line() {
            Some(Ok(line)) => line,
            Some(Err(_)) => return EXIT_STDIN_FAILURE,
            None => return EXIT_SUCCESS,
        };

        let mut handler = Handler::new();
        let tokens = msl_lex::tokenize(&line, &mut handler);
        match msl_par::parse(tokens, &mut handler) {
            Ok(program) => {
                if let Err(err) = evaluator.run(&program) {
                    eprintln!("RuntimeException: {}", err.message);
                }
            }
            Err(_) => {
                for diagnostic in handler.diagnostics() {
                    eprintln!("{diagnostic}");
                }
            }
        }
        handler.clear();
    }
}

pub fn run_script(path: &std::path::Path, output: &mut dyn OutputSink) -> i32 {
    info!("running {}", path.display());

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Failed to open file {}: {}", path.display(), err);
            return EXIT_FILE_ERROR;
        }
    };

    let mut handler = Handler::new();
    let tokens = msl_lex::tokenize(&source, &mut handler);
    debug!("lexed {} tokens", tokens.len());

    let program = match msl_par::parse(tokens, &mut handler) {
        Ok(program) => program,
        Err(_) => {
            for diagnostic in handler.diagnostics() {
                eprintln!("{diagnostic}");
            }
            return EXIT_COMPILE_ERROR;
        }
    };

    // A stdin `Read` in script mode draws from the process's real
    // stdin, independent of the program source.
    let stdin = std::io::stdin();
    let mut input = BufReadLines::new(stdin.lock());
    let mut evaluator = msl_eval::Evaluator::new(output, &mut input);

    if let Err(err) = evaluator.run(&program) {
        eprintln!("RuntimeException: {}", err.message);
    }

    EXIT_SUCCESS
}
