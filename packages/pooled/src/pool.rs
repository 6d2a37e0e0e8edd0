//! Dense per-type component storage.
//!
//! Every component type gets one `Pool`, a resizable sequence indexed
//! directly by entity id. A dense array trades memory (one slot per issued
//! entity id for every type ever attached) for O(1) access without hashing.

use std::any::Any;

use crate::component::Component;

/// The type-erased face of a `Pool`.
///
/// The registry stores one boxed `AnyPool` per component type id and drives
/// sizing and teardown through this trait without knowing the component
/// type; typed access goes through a checked downcast to `Pool<T>`.
pub trait AnyPool: Any {
    /// Grow (or shrink) the pool to `n` slots. New slots hold default
    /// values.
    fn resize(&mut self, n: usize);

    /// Return the number of slots in the pool.
    fn len(&self) -> usize;

    /// Returns true if the pool has no slots.
    fn is_empty(&self) -> bool;

    /// Drop every slot in the pool.
    fn clear(&mut self);
}

/// Dense storage for every instance of one component type, indexed by
/// entity id.
///
/// A slot holds meaningful data only while the owning entity's signature has
/// the matching bit set; otherwise its contents are stale or default.
#[derive(Debug)]
pub struct Pool<T> {
    data: Vec<T>,
}

impl<T: Component> Pool<T> {
    /// Create an empty pool.
    pub fn new() -> Pool<T> {
        Pool { data: Vec::new() }
    }

    /// Overwrite the slot at `index`.
    ///
    /// Requires `index` to be within the pool; callers `resize` first.
    /// Panics otherwise.
    pub fn set(&mut self, index: usize, value: T) {
        self.data[index] = value;
    }

    /// Append a value in the next free slot at the end of the pool.
    pub fn push(&mut self, value: T) {
        self.data.push(value);
    }

    /// Fetch the slot at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// Fetch the slot at `index` mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.data.get_mut(index)
    }
}

impl<T: Component> AnyPool for Pool<T> {
    fn resize(&mut self, n: usize) {
        self.data.resize_with(n, T::default);
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn clear(&mut self) {
        self.data.clear();
    }
}

impl<T: Component> Default for Pool<T> {
    fn default() -> Pool<T> {
        Pool::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Slot(i32);

    crate::component!(Slot);

    #[test]
    fn test_resize_default_fills() {
        let mut pool = Pool::<Slot>::new();
        assert!(pool.is_empty());

        pool.resize(4);
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.get(3), Some(&Slot(0)));
        assert_eq!(pool.get(4), None);
    }

    #[test]
    fn test_set_get() {
        let mut pool = Pool::<Slot>::new();
        pool.resize(2);

        pool.set(1, Slot(17));
        assert_eq!(pool.get(1), Some(&Slot(17)));
        assert_eq!(pool.get(0), Some(&Slot(0)));

        if let Some(slot) = pool.get_mut(1) {
            slot.0 += 1;
        }
        assert_eq!(pool.get(1), Some(&Slot(18)));
    }

    #[test]
    fn test_push_and_clear() {
        let mut pool = Pool::<Slot>::new();
        pool.push(Slot(1));
        pool.push(Slot(2));
        assert_eq!(pool.len(), 2);

        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.get(0), None);
    }

    #[test]
    #[should_panic]
    fn test_set_out_of_range_panics() {
        let mut pool = Pool::<Slot>::new();
        pool.set(0, Slot(1));
    }
}
