//! Fixed-length FIFO for dead time
//!
//! Used twice by the simulator: once on the control path (actuator delay)
//! and once on the measurement path (transport delay).
//!
//! The buffer is full from the start. Every [`DelayBuffer::push_pop`]
//! appends one value and removes the oldest one, so the length never
//! changes and a pushed value comes back out after exactly `capacity`
//! further pushes.

use std::collections::VecDeque;

/// Pre-filled FIFO of constant length
///
/// # Example
///
/// ```rust
/// use cstr_rs::environment::DelayBuffer;
///
/// let mut buffer = DelayBuffer::new(2, 0);
/// assert_eq!(buffer.push_pop(1), 0);
/// assert_eq!(buffer.push_pop(2), 0);
/// assert_eq!(buffer.push_pop(3), 1);
/// assert_eq!(buffer.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DelayBuffer<T> {
    queue: VecDeque<T>,
    capacity: usize,
}

impl<T: Copy> DelayBuffer<T> {
    /// Buffer of `capacity` copies of `initial`; a capacity of 0 is raised to 1
    pub fn new(capacity: usize, initial: T) -> Self {
        let capacity = capacity.max(1);
        let mut queue = VecDeque::with_capacity(capacity + 1);
        queue.extend(std::iter::repeat(initial).take(capacity));
        Self { queue, capacity }
    }

    /// Refill with `capacity` copies of `initial`
    pub fn reset(&mut self, initial: T) {
        self.queue.clear();
        self.queue
            .extend(std::iter::repeat(initial).take(self.capacity));
    }

    /// Oldest entry, the next one to leave the buffer
    pub fn oldest(&self) -> T {
        // The queue is never empty between calls: `push_pop` pushes first
        self.queue[0]
    }

    /// Append `value` and return the oldest entry
    pub fn push_pop(&mut self, value: T) -> T {
        self.queue.push_back(value);
        match self.queue.pop_front() {
            Some(oldest) => oldest,
            None => value,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Entries from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.queue.iter()
    }
}
