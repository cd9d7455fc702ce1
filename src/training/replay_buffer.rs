use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::ai::Transition;
use crate::error::ReplayError;

/// Fixed-capacity ring buffer of past transitions.
///
/// The backing store is allocated once; when full, each push overwrites the
/// oldest slot. Sampling is uniform without replacement.
pub struct ReplayMemory {
    buffer: Vec<Transition>,
    capacity: usize,
    position: usize,
    rng: StdRng,
}

impl ReplayMemory {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_os_rng())
    }

    /// Create a memory whose sampling is driven by `rng`.
    pub fn with_rng(capacity: usize, rng: StdRng) -> Self {
        assert!(capacity > 0, "replay capacity must be > 0");
        ReplayMemory {
            buffer: Vec::with_capacity(capacity),
            capacity,
            position: 0,
            rng,
        }
    }

    /// Add a transition. Overwrites the oldest when full.
    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
        } else {
            self.buffer[self.position] = transition;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Sample `batch_size` distinct transitions.
    pub fn sample(&mut self, batch_size: usize) -> Result<Vec<&Transition>, ReplayError> {
        if batch_size > self.buffer.len() {
            return Err(ReplayError::InsufficientData {
                requested: batch_size,
                available: self.buffer.len(),
            });
        }
        let indices = index::sample(&mut self.rng, self.buffer.len(), batch_size);
        Ok(indices.iter().map(|i| &self.buffer[i]).collect())
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        let split = if self.buffer.len() < self.capacity {
            0
        } else {
            self.position
        };
        self.buffer[split..].iter().chain(self.buffer[..split].iter())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
