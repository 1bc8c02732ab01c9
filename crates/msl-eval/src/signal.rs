//! Non-local control-flow propagation.
//!
//! §9 recommends a target implementation "thread an explicit
//! control-flow signal through statement execution rather than using
//! exceptions," since host-exception-based control flow obscures where
//! a loop or call boundary actually catches `return`/`break`/`continue`.
//! `Signal` is that explicit value: every statement's execution method
//! returns one, and callers pattern-match it instead of relying on
//! unwinding.

use msl_heap::Value;

#[derive(Debug, Clone)]
pub enum Signal {
    Normal,
    Return(Value),
    Break,
    Continue,
}
