//! Free-list recycling for short-lived scene objects.
//!
//! Effects like smoke puffs never allocate while the demo runs: a fixed set
//! of objects is created up front, handed out with [`Pool::acquire`] and
//! returned with [`Pool::release`], which runs the pool's reset callback so
//! the next acquire starts from a clean slate.

use log::warn;

/// Fixed-capacity object pool with a reset callback.
pub struct Pool<P> {
    free: Vec<P>,
    capacity: usize,
    reset: Box<dyn FnMut(&mut P)>,
}

impl<P> Pool<P> {
    /// Create a pool of `capacity` objects built by `make` (called with the
    /// object's index). All objects start out free.
    pub fn new(
        capacity: usize,
        mut make: impl FnMut(usize) -> P,
        reset: impl FnMut(&mut P) + 'static,
    ) -> Self {
        let free = (0..capacity).map(|i| make(i)).collect();
        Self {
            free,
            capacity,
            reset: Box::new(reset),
        }
    }

    /// Take a free object, or `None` when the pool is exhausted.
    pub fn acquire(&mut self) -> Option<P> {
        self.free.pop()
    }

    /// Reset an object and return it to the free list.
    pub fn release(&mut self, mut object: P) {
        (self.reset)(&mut object);
        if self.free.len() < self.capacity {
            self.free.push(object);
        } else {
            // Releasing more objects than were ever acquired points at a
            // double release in the caller.
            warn!("pool received more objects than its capacity of {}", self.capacity);
        }
    }

    /// Number of objects currently available.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<P> std::fmt::Debug for Pool<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("available", &self.free.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
