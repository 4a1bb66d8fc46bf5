//! Lazy challenger sequence with chooser-driven random injection.

use std::sync::Arc;

use crate::chooser::SharedChooser;
use crate::config::Configuration;
use crate::space::ConfigurationSpace;
use crate::types::Origin;

/// Single-pass sequence combining a ranked candidate queue with randomly
/// injected configurations.
///
/// Each pull either returns a freshly sampled random configuration (without
/// advancing the candidate cursor) or the next unconsumed candidate,
/// depending on the chooser's policy. The sequence is exhausted once the
/// candidate cursor reaches the end of the queue — random injections do not
/// extend its length — and pulling past exhaustion yields `None`, not an
/// error. Sampling lazily avoids generating hundreds of random
/// configurations per round that are never looked at.
pub struct ChallengerList {
    challengers: Vec<Configuration>,
    space: Arc<ConfigurationSpace>,
    chooser: SharedChooser,
    rng: fastrand::Rng,
    index: usize,
    // 1-based so the very first pull is never a forced random injection.
    iteration: u64,
}

impl ChallengerList {
    /// Creates a challenger sequence over a ranked candidate queue.
    #[must_use]
    pub fn new(
        challengers: Vec<Configuration>,
        space: Arc<ConfigurationSpace>,
        chooser: SharedChooser,
        rng: fastrand::Rng,
    ) -> Self {
        Self {
            challengers,
            space,
            chooser,
            rng,
            index: 0,
            iteration: 1,
        }
    }

    /// Returns the ranked candidates backing this sequence, in order.
    #[must_use]
    pub fn challengers(&self) -> &[Configuration] {
        &self.challengers
    }

    /// Returns the number of unconsumed candidates.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.challengers.len() - self.index
    }
}

impl Iterator for ChallengerList {
    type Item = Configuration;

    fn next(&mut self) -> Option<Configuration> {
        if self.index == self.challengers.len() {
            return None;
        }
        let inject = self.chooser.lock().check(self.iteration);
        self.iteration += 1;
        if inject {
            Some(
                self.space
                    .sample(&mut self.rng)
                    .with_origin(Origin::RandomSearch),
            )
        } else {
            let config = self.challengers[self.index].clone();
            self.index += 1;
            Some(config)
        }
    }
}
