//! Variable environments and the evaluator's frame stack (§3).

use msl_util::Symbol;
use rustc_hash::FxHashMap;

use crate::value::Value;

/// A single lexical frame: a name-to-value mapping with unique keys.
#[derive(Debug, Default)]
pub struct Environment {
    bindings: FxHashMap<Symbol, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self { bindings: FxHashMap::default() }
    }

    /// Inserts a new binding. Returns `false` if `name` is already bound
    /// in this frame (§4.5: "duplicate name in the same frame fails").
    pub fn define(&mut self, name: Symbol, value: Value) -> bool {
        if self.bindings.contains_key(&name) {
            return false;
        }
        self.bindings.insert(name, value);
        true
    }

    pub fn get(&self, name: Symbol) -> Option<&Value> {
        self.bindings.get(&name)
    }

    /// Overwrites an existing binding in this frame. Returns `false` if
    /// `name` isn't bound here.
    pub fn assign(&mut self, name: Symbol, value: Value) -> bool {
        match self.bindings.get_mut(&name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.bindings.values()
    }
}

/// The ordered sequence of [`Environment`]s the evaluator is currently
/// executing inside of. Bottom = globals; name resolution and GC
/// rooting both walk top to bottom / all frames respectively.
#[derive(Debug, Default)]
pub struct Stack {
    frames: Vec<Environment>,
}

impl Stack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(&mut self, env: Environment) {
        self.frames.push(env);
    }

    /// Pops the top frame. A pop with no matching push is an evaluator
    /// bug, not a user-triggerable error — panicking here is the same
    /// trade-off the rest of the crate makes for internal invariants.
    pub fn pop(&mut self) -> Environment {
        self.frames.pop().expect("Stack::pop called on an empty stack")
    }

    pub fn top(&self) -> &Environment {
        self.frames.last().expect("Stack::top called on an empty stack")
    }

    pub fn top_mut(&mut self) -> &mut Environment {
        self.frames.last_mut().expect("Stack::top_mut called on an empty stack")
    }

    pub fn frames(&self) -> impl Iterator<Item = &Environment> {
        self.frames.iter()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Defines `name` in the top frame. `false` means a duplicate in
    /// that frame.
    pub fn define(&mut self, name: Symbol, value: Value) -> bool {
        self.top_mut().define(name, value)
    }

    /// Looks up `name` from the top frame down to globals.
    pub fn lookup(&self, name: Symbol) -> Option<&Value> {
        self.frames.iter().rev().find_map(|env| env.get(name))
    }

    /// Walks top to bottom for the frame that defines `name` and
    /// updates it there. `false` means no frame defines it.
    pub fn assign(&mut self, name: Symbol, value: Value) -> bool {
        for env in self.frames.iter_mut().rev() {
            if env.assign(name, value.clone()) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_searches_from_top_frame_down_to_globals() {
        let mut stack = Stack::new();
        let global = Symbol::intern("g");
        let local = Symbol::intern("x");

        let mut globals = Environment::new();
        globals.define(global, Value::Number(1.0));
        stack.push(globals);

        let mut frame = Environment::new();
        frame.define(local, Value::Number(2.0));
        stack.push(frame);

        assert!(matches!(stack.lookup(global), Some(Value::Number(n)) if *n == 1.0));
        assert!(matches!(stack.lookup(local), Some(Value::Number(n)) if *n == 2.0));
    }

    #[test]
    fn define_rejects_a_duplicate_name_in_the_same_frame() {
        let mut env = Environment::new();
        let x = Symbol::intern("x");
        assert!(env.define(x, Value::Null));
        assert!(!env.define(x, Value::Number(1.0)));
    }

    #[test]
    fn assign_updates_the_defining_frame_not_the_top_one() {
        let mut stack = Stack::new();
        let x = Symbol::intern("x");

        let mut globals = Environment::new();
        globals.define(x, Value::Number(1.0));
        stack.push(globals);
        stack.push(Environment::new());

        assert!(stack.assign(x, Value::Number(99.0)));
        assert!(matches!(stack.lookup(x), Some(Value::Number(n)) if *n == 99.0));
    }

    #[test]
    fn assign_to_an_undefined_name_fails() {
        let mut stack = Stack::new();
        stack.push(Environment::new());
        assert!(!stack.assign(Symbol::intern("missing"), Value::Null));
    }
}
