//! Command-line argument handling (§6): `msl` enters the REPL, `msl
//! <path>` runs a script, anything else is a usage error. No `clap` here
//! — the whole surface is one optional positional argument, so a flag
//! parser would be more ceremony than the thing it parses.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Repl,
    Script(PathBuf),
}

/// `argv[1..]`, i.e. without the program name.
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Mode, UsageError> {
    let args: Vec<String> = args.into_iter().collect();
    match args.as_slice() {
        [] => Ok(Mode::Repl),
        [path] => Ok(Mode::Script(PathBuf::from(path))),
        _ => Err(UsageError),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageError;

impl std::fmt::Display for UsageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Usage: msl <script>")
    }
}
