//! Fixed-capacity rolling history of derived samples.

use std::collections::VecDeque;

use serde::Serialize;
use xxhash_rust::xxh3::xxh3_64;

/// Samples kept per resource history.
pub const DEFAULT_CAPACITY: usize = 50;

/// Ring buffer that evicts its oldest sample once full.
///
/// Iteration is always oldest to newest.
#[derive(Debug, Clone)]
pub struct History<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T> History<T> {
    /// Creates an empty buffer. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Samples from oldest to newest. Each call starts a fresh pass.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl<T: Clone> History<T> {
    /// Copies the samples out, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.samples.iter().cloned().collect()
    }
}

impl<T: Serialize> History<T> {
    /// Content hash used as the published change marker for this history.
    pub fn fingerprint(&self) -> u64 {
        fingerprint(&self.samples)
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// xxh3 of the bincode encoding of `value`; 0 if it cannot be encoded.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> u64 {
    match bincode::serialize(value) {
        Ok(bytes) => xxh3_64(&bytes),
        Err(e) => {
            tracing::debug!(error = %e, "fingerprint encoding failed");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest() {
        let mut history = History::new(3);
        for s in ["A", "B", "C", "D"] {
            history.push(s);
        }
        assert_eq!(history.to_vec(), vec!["B", "C", "D"]);
        assert_eq!(history.latest(), Some(&"D"));
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut history = History::new(50);
        for i in 0..120u32 {
            history.push(i);
            assert!(history.len() <= 50);
        }
        assert_eq!(history.len(), 50);
        let expected: Vec<u32> = (70..120).collect();
        assert_eq!(history.to_vec(), expected);
    }

    #[test]
    fn test_iter_is_restartable() {
        let mut history = History::new(4);
        history.push(1.0);
        history.push(2.0);
        let first: Vec<_> = history.iter().copied().collect();
        let second: Vec<_> = history.iter().copied().collect();
        assert_eq!(first, second);
        assert_eq!(history.iter().rev().next(), Some(&2.0));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut history = History::new(0);
        history.push(1);
        history.push(2);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.to_vec(), vec![2]);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let mut a = History::new(3);
        let mut b = History::new(3);
        for v in [1.0, 2.0, 3.0] {
            a.push(v);
            b.push(v);
        }
        assert_eq!(a.fingerprint(), b.fingerprint());

        a.push(4.0);
        assert_ne!(a.fingerprint(), b.fingerprint());

        // Same content reached through different pushes.
        b.push(4.0);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_clear() {
        let mut history: History<u8> = History::default();
        history.push(1);
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), DEFAULT_CAPACITY);
    }
}
