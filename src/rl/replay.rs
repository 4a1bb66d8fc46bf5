//! Bounded experience replay.

use std::collections::VecDeque;

/// One state transition observed by the proposer.
#[derive(Clone, Debug)]
pub struct Transition {
    /// Normalized metric vector before the action.
    pub state: Vec<f64>,
    /// Action taken, as a unit-hypercube vector.
    pub action: Vec<f64>,
    /// Shaped reward for the step.
    pub reward: f64,
    /// Normalized metric vector after the action.
    pub next_state: Vec<f64>,
    /// Whether the episode terminated on this step.
    pub done: bool,
}

/// FIFO-bounded transition store with uniform random sampling.
#[derive(Debug)]
pub struct ReplayBuffer {
    transitions: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    /// Creates a buffer holding at most `capacity` transitions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Appends a transition, evicting the oldest at capacity.
    pub fn push(&mut self, transition: Transition) {
        if self.transitions.len() == self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Number of stored transitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Whether the buffer holds no transitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Uniformly samples `batch_size` transitions with replacement.
    ///
    /// Returns fewer only when the buffer is empty.
    #[must_use]
    pub fn sample_batch(&self, rng: &mut fastrand::Rng, batch_size: usize) -> Vec<Transition> {
        if self.transitions.is_empty() {
            return Vec::new();
        }
        (0..batch_size)
            .map(|_| self.transitions[rng.usize(0..self.transitions.len())].clone())
            .collect()
    }
}
