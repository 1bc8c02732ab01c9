//! String interning.
//!
//! Identifiers and string literals flow through the lexer, parser and
//! evaluator many times over; interning them once means every later
//! comparison (environment lookup, object key lookup) is an integer
//! compare instead of a byte-by-byte one.
//!
//! The interner is process-global and strings are never evicted — this
//! mirrors `faxc-util`'s string table, which leaks interned strings
//! deliberately rather than tracking their lifetime. MSL programs run to
//! completion in one process invocation, so the leak is bounded by the
//! number of distinct identifiers and string literals in the source.

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};

/// A compact, cheaply-copyable handle to an interned string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Interns `s`, returning the same [`Symbol`] for any two calls with
    /// equal text.
    ///
    /// # Examples
    ///
    /// ```
    /// use msl_util::Symbol;
    ///
    /// let a = Symbol::intern("foo");
    /// let b = Symbol::intern("foo");
    /// let c = Symbol::intern("bar");
    ///
    /// assert_eq!(a, b);
    /// assert_ne!(a, c);
    /// assert_eq!(a.as_str(), "foo");
    /// ```
    pub fn intern(s: &str) -> Self {
        table().intern(s)
    }

    pub fn as_str(self) -> &'static str {
        table().get(self)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn table() -> &'static StringTable {
    static TABLE: OnceLock<StringTable> = OnceLock::new();
    TABLE.get_or_init(StringTable::new)
}

struct StringTable {
    inner: Mutex<StringTableInner>,
}

struct StringTableInner {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

impl StringTable {
    fn new() -> Self {
        Self {
            inner: Mutex::new(StringTableInner {
                map: FxHashMap::default(),
                strings: Vec::new(),
            }),
        }
    }

    fn intern(&self, s: &str) -> Symbol {
        let mut inner = self.inner.lock().unwrap();
        if let Some(&index) = inner.map.get(s) {
            return Symbol(index);
        }
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let index = inner.strings.len() as u32;
        inner.strings.push(leaked);
        inner.map.insert(leaked, index);
        Symbol(index)
    }

    fn get(&self, symbol: Symbol) -> &'static str {
        let inner = self.inner.lock().unwrap();
        inner.strings[symbol.0 as usize]
    }
}
