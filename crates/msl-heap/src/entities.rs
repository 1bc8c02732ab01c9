//! The three kinds of entity the heap owns.

use std::rc::Rc;

use msl_ast::Block;
use msl_util::Symbol;
use rustc_hash::FxHashMap;

use crate::value::Value;

/// A mapping from string key to [`Value`]. Insertion order is
/// irrelevant (§3); a missing key reads as `Null` rather than erroring.
#[derive(Debug, Default)]
pub struct Object {
    pub properties: FxHashMap<Symbol, Value>,
}

impl Object {
    pub fn new() -> Self {
        Self { properties: FxHashMap::default() }
    }

    pub fn get(&self, key: Symbol) -> Value {
        self.properties.get(&key).cloned().unwrap_or(Value::Null)
    }

    pub fn set(&mut self, key: Symbol, value: Value) {
        self.properties.insert(key, value);
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// An ordered, 0-indexed sequence of [`Value`]s.
#[derive(Debug, Default)]
pub struct Array {
    pub elements: Vec<Value>,
}

impl Array {
    pub fn new() -> Self {
        Self { elements: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Either a user-defined function (its body is `Rc`-shared with the AST
/// node that produced it — see `msl_ast`'s module docs) or one of the
/// two built-ins the evaluator installs into globals.
#[derive(Debug, Clone)]
pub enum Function {
    User(UserFunction),
    Builtin(Builtin),
}

#[derive(Debug, Clone)]
pub struct UserFunction {
    pub params: Vec<Symbol>,
    pub body: Rc<Block>,
}

/// `Print` writes every argument's string form, space-separated, plus a
/// trailing newline, and returns `Null`. `Read` ignores its arguments,
/// reads one line from the driver's input source, and returns it as a
/// `String` (or `Null` at end of input). Both are variadic: the
/// evaluator's argument-count check is skipped for built-ins (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Read,
}

impl Function {
    pub fn arity(&self) -> Option<usize> {
        match self {
            Function::User(f) => Some(f.params.len()),
            Function::Builtin(_) => None,
        }
    }
}
