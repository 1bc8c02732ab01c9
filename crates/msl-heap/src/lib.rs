//! msl-heap — the dynamic [`Value`] type, the heap that owns
//! [`Object`]/[`Array`]/[`Function`] entities behind it, its
//! mark-and-sweep collector, and the variable [`Environment`]/[`Stack`]
//! that supplies the collector's roots.
//!
//! Value, Heap, and the heap entities live in one crate rather than
//! three: an `Object`'s property map holds `Value`s, and `Value`'s
//! Object/Array/Function variants hold handles into the Heap, so the
//! three are mutually recursive and can't be split across a dependency
//! edge without an awkward trait-object seam.

mod coerce;
mod entities;
mod environment;
mod handle;
mod heap;
mod value;

pub use entities::{Array, Builtin, Function, Object, UserFunction};
pub use environment::{Environment, Stack};
pub use handle::Handle;
pub use heap::Heap;
pub use value::Value;
