//! Generational handles into a [`crate::heap::Slab`].
//!
//! A handle pairs a slot index with the generation the slot was at when
//! the handle was issued. Sweeping an entity bumps its slot's
//! generation, so a stale handle captured before a collection can never
//! silently observe whatever the slot was reused for afterward — it
//! simply fails to resolve. The core's own invariant (§3: "the GC may
//! only run at allocation points") means user code never actually
//! observes a stale handle, but the check costs nothing and catches
//! evaluator bugs early.

use std::fmt;
use std::marker::PhantomData;

pub struct Handle<E> {
    pub(crate) index: u32,
    pub(crate) generation: u32,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Handle<E> {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation, _entity: PhantomData }
    }
}

impl<E> Clone for Handle<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Handle<E> {}

impl<E> PartialEq for Handle<E> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<E> Eq for Handle<E> {}

impl<E> fmt::Debug for Handle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle(#{}, gen {})", self.index, self.generation)
    }
}
