use crate::error::{Error, Result};

/// Fixed-capacity ring buffer. Oldest entry is overwritten on every push once
/// the buffer has wrapped; every slot always holds a value (defaults until
/// overwritten).
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data:   Vec<T>,
    head:   usize,
    pushed: u64,
}

impl<T: Clone> RingBuffer<T> {
    /// Build a buffer with every slot set to a clone of `default`.
    pub fn new(cap: usize, default: T) -> Result<Self> {
        Self::with_factory(cap, || default.clone())
    }

    /// Resets every slot to `default` and rewinds the head.
    pub fn clear(&mut self, default: T) {
        for slot in &mut self.data {
            *slot = default.clone();
        }
        self.head   = 0;
        self.pushed = 0;
    }

    /// Chronological copy of every slot, oldest first.
    pub fn to_series(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// Returns up to `n` most-recent values, oldest first.
    pub fn last_n(&self, n: usize) -> Vec<T> {
        let n = n.min(self.data.len());
        self.iter().skip(self.data.len() - n).cloned().collect()
    }
}

impl<T> RingBuffer<T> {
    /// Build a buffer calling `factory` once per slot, so slots never share
    /// a mutable default.
    pub fn with_factory<F: FnMut() -> T>(cap: usize, mut factory: F) -> Result<Self> {
        if cap == 0 {
            return Err(Error::invalid("capacity", "ring buffer capacity must be at least 1"));
        }
        let data = (0..cap).map(|_| factory()).collect();
        Ok(Self { data, head: 0, pushed: 0 })
    }

    pub fn push(&mut self, val: T) {
        self.data[self.head] = val;
        self.head = (self.head + 1) % self.data.len();
        self.pushed = self.pushed.saturating_add(1);
    }

    /// Lazy chronological traversal. Call again to restart.
    pub fn iter(&self) -> Iter<'_, T> {
        let (newer, older) = self.data.split_at(self.head);
        Iter { inner: older.iter().chain(newer.iter()) }
    }

    /// Invokes `visitor` once per slot, oldest first.
    pub fn for_each_in_order<F: FnMut(&T)>(&self, visitor: F) {
        self.iter().for_each(visitor);
    }

    /// Most recently pushed value (the slot behind the head).
    pub fn latest(&self) -> &T {
        let cap = self.data.len();
        &self.data[(self.head + cap - 1) % cap]
    }

    pub fn capacity(&self) -> usize { self.data.len() }
    pub fn head(&self) -> usize { self.head }

    /// Total pushes since creation or the last `clear`.
    pub fn pushed(&self) -> u64 { self.pushed }

    /// Number of slots holding pushed samples rather than defaults.
    pub fn filled(&self) -> usize {
        self.pushed.min(self.data.len() as u64) as usize
    }
}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item     = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Chronological iterator over a [`RingBuffer`].
#[derive(Debug, Clone)]
pub struct Iter<'a, T> {
    inner: std::iter::Chain<std::slice::Iter<'a, T>, std::slice::Iter<'a, T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        let err = RingBuffer::new(0, 0u64).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { name: "capacity", .. }));
    }

    #[test]
    fn starts_filled_with_default() {
        let rb = RingBuffer::new(4, 7u64).unwrap();
        assert_eq!(rb.to_series(), vec![7, 7, 7, 7]);
        assert_eq!(rb.filled(), 0);
    }

    #[test]
    fn partial_fill_keeps_defaults_at_the_front() {
        let mut rb = RingBuffer::new(5, 0u64).unwrap();
        rb.push(1);
        rb.push(2);
        assert_eq!(rb.to_series(), vec![0, 0, 0, 1, 2]);
        assert_eq!(rb.filled(), 2);
        assert_eq!(*rb.latest(), 2);
    }

    #[test]
    fn wraparound_overwrites_oldest() {
        let mut rb = RingBuffer::new(3, 0u64).unwrap();
        for v in 1..=5 {
            rb.push(v);
        }
        assert_eq!(rb.to_series(), vec![3, 4, 5]);
        assert_eq!(rb.head(), 2);
        assert_eq!(rb.pushed(), 5);
    }

    #[test]
    fn full_cycle_returns_head() {
        let mut rb = RingBuffer::new(4, 0u64).unwrap();
        rb.push(9);
        let start = rb.head();
        for v in 0..4 {
            rb.push(v);
        }
        assert_eq!(rb.head(), start);
    }

    #[test]
    fn capacity_one_holds_latest() {
        let mut rb = RingBuffer::new(1, 0u64).unwrap();
        rb.push(10);
        rb.push(20);
        assert_eq!(rb.to_series(), vec![20]);
        assert_eq!(rb.head(), 0);
    }

    #[test]
    fn last_n_clamps_to_capacity() {
        let mut rb = RingBuffer::new(4, 0u64).unwrap();
        for v in 1..=6 {
            rb.push(v);
        }
        assert_eq!(rb.last_n(2), vec![5, 6]);
        assert_eq!(rb.last_n(10), vec![3, 4, 5, 6]);
        assert!(rb.last_n(0).is_empty());
    }

    #[test]
    fn iteration_is_restartable_and_reversible() {
        let mut rb = RingBuffer::new(3, 0u64).unwrap();
        for v in 1..=4 {
            rb.push(v);
        }
        let first: Vec<u64> = rb.iter().copied().collect();
        let second: Vec<u64> = rb.iter().copied().collect();
        assert_eq!(first, second);
        let rev: Vec<u64> = rb.iter().rev().copied().collect();
        assert_eq!(rev, vec![4, 3, 2]);
        assert_eq!(rb.iter().len(), 3);
    }

    #[test]
    fn for_each_visits_oldest_first() {
        let mut rb = RingBuffer::new(3, 0u64).unwrap();
        for v in 1..=4 {
            rb.push(v);
        }
        let mut seen = Vec::new();
        rb.for_each_in_order(|v| seen.push(*v));
        assert_eq!(seen, vec![2, 3, 4]);
    }

    #[test]
    fn factory_slots_are_independent() {
        let mut calls = 0;
        let mut rb = RingBuffer::with_factory(3, || { calls += 1; vec![0u32; 2] }).unwrap();
        assert_eq!(calls, 3);
        rb.push(vec![1, 1]);
        let series = rb.to_series();
        assert_eq!(series[0], vec![0, 0]);
        assert_eq!(series[2], vec![1, 1]);
    }

    #[test]
    fn clear_rewinds() {
        let mut rb = RingBuffer::new(2, 0u64).unwrap();
        rb.push(5);
        rb.clear(1);
        assert_eq!(rb.to_series(), vec![1, 1]);
        assert_eq!(rb.head(), 0);
        assert_eq!(rb.pushed(), 0);
    }
}
