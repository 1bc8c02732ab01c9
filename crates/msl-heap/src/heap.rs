//! The heap: owns every [`Object`], [`Array`], and [`Function`], and
//! runs the mark-and-sweep cycle over them (§4.4).

use log::debug;

use crate::entities::{Array, Builtin, Function, Object, UserFunction};
use crate::environment::Stack;
use crate::handle::Handle;
use crate::value::Value;
use msl_ast::Block;
use msl_util::Symbol;
use std::rc::Rc;

/// Live-set size at which an enabled allocation triggers a collection
/// first. §4.4 calls a fixed constant acceptable; adaptive growth is
/// explicitly optional and not implemented here.
const DEFAULT_GC_THRESHOLD: usize = 20;

struct Slot<E> {
    generation: u32,
    marked: bool,
    value: Option<E>,
}

/// A generational arena of one entity kind. `free` holds indices of
/// slots whose previous occupant was swept, ready for reuse with a
/// bumped generation.
struct Slab<E> {
    slots: Vec<Slot<E>>,
    free: Vec<u32>,
    live: usize,
}

impl<E> Slab<E> {
    fn new() -> Self {
        Self { slots: Vec::new(), free: Vec::new(), live: 0 }
    }

    fn insert(&mut self, value: E) -> Handle<E> {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            slot.marked = false;
            Handle::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot { generation: 0, marked: false, value: Some(value) });
            Handle::new(index, 0)
        }
    }

    fn slot(&self, handle: Handle<E>) -> Option<&Slot<E>> {
        self.slots.get(handle.index as usize).filter(|s| s.generation == handle.generation)
    }

    fn slot_mut(&mut self, handle: Handle<E>) -> Option<&mut Slot<E>> {
        self.slots.get_mut(handle.index as usize).filter(|s| s.generation == handle.generation)
    }

    fn get(&self, handle: Handle<E>) -> Option<&E> {
        self.slot(handle).and_then(|s| s.value.as_ref())
    }

    fn get_mut(&mut self, handle: Handle<E>) -> Option<&mut E> {
        self.slot_mut(handle).and_then(|s| s.value.as_mut())
    }

    fn unmark_all(&mut self) {
        for slot in &mut self.slots {
            slot.marked = false;
        }
    }

    /// Marks the entity live. Returns `true` if this is the first time
    /// it's been marked this cycle (so its children should be scanned).
    fn mark(&mut self, handle: Handle<E>) -> bool {
        match self.slot_mut(handle) {
            Some(slot) if slot.value.is_some() && !slot.marked => {
                slot.marked = true;
                true
            }
            _ => false,
        }
    }

    fn sweep(&mut self) -> usize {
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.is_some() && !slot.marked {
                slot.value = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                freed += 1;
            }
        }
        self.live -= freed;
        freed
    }

    fn len(&self) -> usize {
        self.live
    }
}

/// Unifies the three handle kinds for the mark phase's gray set.
enum GcRef {
    Object(Handle<Object>),
    Array(Handle<Array>),
    Function(Handle<Function>),
}

pub struct Heap {
    objects: Slab<Object>,
    arrays: Slab<Array>,
    functions: Slab<Function>,
    gc_disable_depth: u32,
    threshold: usize,
}

impl Heap {
    pub fn new() -> Self {
        Self {
            objects: Slab::new(),
            arrays: Slab::new(),
            functions: Slab::new(),
            gc_disable_depth: 0,
            threshold: DEFAULT_GC_THRESHOLD,
        }
    }

    pub fn live_count(&self) -> usize {
        self.objects.len() + self.arrays.len() + self.functions.len()
    }

    pub fn gc_enabled(&self) -> bool {
        self.gc_disable_depth == 0
    }

    /// Disables collection. Used around multi-step aggregate-literal
    /// construction so a partially built Object/Array can't be
    /// collected mid-expression; must be paired with [`Heap::enable_gc`]
    /// on every exit path, including error paths.
    ///
    /// A depth counter rather than a flag: an object or array literal
    /// nested inside another (`[{a: 1}]`) disables and re-enables GC
    /// around its own construction too, and a flag would have the inner
    /// literal's `enable_gc` re-arm collection while the outer literal
    /// is still mid-construction and not yet reachable from any frame.
    pub fn disable_gc(&mut self) {
        self.gc_disable_depth += 1;
    }

    pub fn enable_gc(&mut self) {
        self.gc_disable_depth = self.gc_disable_depth.saturating_sub(1);
    }

    pub fn allocate_object(&mut self, stack: &Stack) -> Handle<Object> {
        self.maybe_collect(stack);
        self.objects.insert(Object::new())
    }

    pub fn allocate_array(&mut self, stack: &Stack) -> Handle<Array> {
        self.maybe_collect(stack);
        self.arrays.insert(Array::new())
    }

    pub fn allocate_user_function(
        &mut self,
        stack: &Stack,
        params: Vec<Symbol>,
        body: Rc<Block>,
    ) -> Handle<Function> {
        self.maybe_collect(stack);
        self.functions.insert(Function::User(UserFunction { params, body }))
    }

    pub fn allocate_builtin(&mut self, stack: &Stack, builtin: Builtin) -> Handle<Function> {
        self.maybe_collect(stack);
        self.functions.insert(Function::Builtin(builtin))
    }

    pub fn object(&self, handle: Handle<Object>) -> Option<&Object> {
        self.objects.get(handle)
    }

    pub fn object_mut(&mut self, handle: Handle<Object>) -> Option<&mut Object> {
        self.objects.get_mut(handle)
    }

    pub fn array(&self, handle: Handle<Array>) -> Option<&Array> {
        self.arrays.get(handle)
    }

    pub fn array_mut(&mut self, handle: Handle<Array>) -> Option<&mut Array> {
        self.arrays.get_mut(handle)
    }

    pub fn function(&self, handle: Handle<Function>) -> Option<&Function> {
        self.functions.get(handle)
    }

    fn maybe_collect(&mut self, stack: &Stack) {
        if self.gc_enabled() && self.live_count() >= self.threshold {
            self.collect(stack);
        }
    }

    /// Runs one full mark-and-sweep cycle right now, regardless of the
    /// threshold or the enabled flag.
    ///
    /// # Examples
    ///
    /// ```
    /// use msl_heap::{Heap, Stack};
    ///
    /// let mut heap = Heap::new();
    /// let stack = Stack::new();
    ///
    /// // Not reachable from any frame on the stack, so it's collected.
    /// let orphan = heap.allocate_object(&stack);
    /// assert!(heap.object(orphan).is_some());
    ///
    /// heap.collect(&stack);
    /// assert!(heap.object(orphan).is_none());
    /// ```
    pub fn collect(&mut self, stack: &Stack) {
        self.objects.unmark_all();
        self.arrays.unmark_all();
        self.functions.unmark_all();

        let mut gray = Vec::new();
        for env in stack.frames() {
            for value in env.values() {
                self.seed(value, &mut gray);
            }
        }

        while let Some(gc_ref) = gray.pop() {
            match gc_ref {
                GcRef::Object(handle) => {
                    if self.objects.mark(handle) {
                        if let Some(obj) = self.objects.get(handle) {
                            let children: Vec<Value> = obj.properties.values().cloned().collect();
                            for value in &children {
                                self.seed(value, &mut gray);
                            }
                        }
                    }
                }
                GcRef::Array(handle) => {
                    if self.arrays.mark(handle) {
                        if let Some(arr) = self.arrays.get(handle) {
                            let children: Vec<Value> = arr.elements.clone();
                            for value in &children {
                                self.seed(value, &mut gray);
                            }
                        }
                    }
                }
                GcRef::Function(handle) => {
                    // Bodies live in the AST, not the heap; a Function
                    // entity has no heap-reachable children.
                    self.functions.mark(handle);
                }
            }
        }

        let freed = self.objects.sweep() + self.arrays.sweep() + self.functions.sweep();
        debug!("gc: swept {freed} entities, {} live remain", self.live_count());
    }

    fn seed(&self, value: &Value, gray: &mut Vec<GcRef>) {
        match value {
            Value::Object(h) => gray.push(GcRef::Object(*h)),
            Value::Array(h) => gray.push(GcRef::Array(*h)),
            Value::Function(h) => gray.push(GcRef::Function(*h)),
            Value::Null | Value::Boolean(_) | Value::Number(_) | Value::String(_) => {}
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;

    #[test]
    fn collects_an_object_unreachable_from_any_frame() {
        let mut heap = Heap::new();
        let mut stack = Stack::new();
        stack.push(Environment::new());

        let handle = heap.allocate_object(&stack);
        assert_eq!(heap.live_count(), 1);

        heap.collect(&stack);
        assert_eq!(heap.live_count(), 0);
        assert!(heap.object(handle).is_none());
    }

    #[test]
    fn keeps_an_object_reachable_from_a_frame() {
        let mut heap = Heap::new();
        let mut stack = Stack::new();
        stack.push(Environment::new());

        let handle = heap.allocate_object(&stack);
        stack.top_mut().define(Symbol::intern("x"), Value::Object(handle));

        heap.collect(&stack);
        assert_eq!(heap.live_count(), 1);
        assert!(heap.object(handle).is_some());
    }

    #[test]
    fn keeps_a_chain_of_nested_objects_alive() {
        let mut heap = Heap::new();
        let mut stack = Stack::new();
        stack.push(Environment::new());

        let inner = heap.allocate_object(&stack);
        let outer = heap.allocate_object(&stack);
        heap.object_mut(outer).unwrap().set(Symbol::intern("inner"), Value::Object(inner));
        stack.top_mut().define(Symbol::intern("root"), Value::Object(outer));

        heap.collect(&stack);
        assert_eq!(heap.live_count(), 2);
    }

    #[test]
    fn disabling_gc_skips_collection_at_allocation_points() {
        let mut heap = Heap::new();
        let mut stack = Stack::new();
        stack.push(Environment::new());
        heap.disable_gc();

        for _ in 0..(DEFAULT_GC_THRESHOLD + 5) {
            heap.allocate_object(&stack);
        }
        assert_eq!(heap.live_count(), DEFAULT_GC_THRESHOLD + 5);
    }

    #[test]
    fn a_freed_slot_handle_does_not_resolve_after_reuse() {
        let mut heap = Heap::new();
        let mut stack = Stack::new();
        stack.push(Environment::new());

        let stale = heap.allocate_object(&stack);
        heap.collect(&stack); // nothing rooted, stale's slot is swept
        let _fresh = heap.allocate_object(&stack); // reuses the freed slot

        assert!(heap.object(stale).is_none());
    }
}
