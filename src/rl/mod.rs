//! Reinforcement-learning configuration proposer.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`RlConfig`] | explicit knob struct (learning rates, reward shaping, cadences) |
//! | [`Policy`] / [`PolicyBuilder`] | opaque trainable actor-critic model |
//! | [`ReplayBuffer`] | bounded transition store |
//! | [`MetricNormalizer`] | mean/variance scaling of internal metrics |
//! | [`RlProposer`] | warmup / episode state machine around all of the above |
//!
//! The proposer treats each tuning step as one RL step: the state is the
//! normalized internal-metrics vector of the last evaluation, the action is
//! the next configuration, and the reward is shaped from relative objective
//! change since episode start and since the previous step.

pub mod config;
pub mod policy;
pub mod replay;

use std::collections::HashMap;

use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::history::{HistoryContainer, Observation};
use crate::space::{max_min_distance, ConfigurationSpace};
use crate::types::{Direction, Origin, TrialState};

pub use config::{InitStrategy, RlConfig};
pub use policy::{Policy, PolicyBuilder};
pub use replay::{ReplayBuffer, Transition};

use std::sync::Arc;

/// Random pool size for the farthest-point initial design.
const EXPLORE_POOL_SIZE: usize = 100;

/// Variance floor when normalizing metrics.
const VAR_EPSILON: f64 = 1e-8;

/// Observable phase of the proposer's state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RlPhase {
    /// Serving the initial design and collecting metrics.
    Warmup,
    /// Next proposal resets the episode with the default configuration.
    EpisodeInit,
    /// Proposing learned actions.
    Stepping,
}

/// Mean/variance scaler over internal-metrics vectors.
///
/// Metric vectors of mixed dimensionality can appear in a history (partial
/// collection, schema drift between runs). The scaler is fit on the modal
/// dimension only; at normalization time shorter vectors are padded with
/// the mean (zero after scaling) and longer ones truncated.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricNormalizer {
    mean: Vec<f64>,
    var: Vec<f64>,
}

impl MetricNormalizer {
    /// Fits a scaler on the samples sharing the most common dimension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoInternalMetrics`] when no non-empty sample
    /// exists.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_samples(samples: &[Vec<f64>]) -> Result<Self> {
        let mut dimension_counts: HashMap<usize, usize> = HashMap::new();
        for sample in samples {
            if !sample.is_empty() {
                *dimension_counts.entry(sample.len()).or_insert(0) += 1;
            }
        }
        let (&modal_dim, _) = dimension_counts
            .iter()
            .max_by_key(|(_, &count)| count)
            .ok_or(Error::NoInternalMetrics)?;

        let selected: Vec<&Vec<f64>> =
            samples.iter().filter(|s| s.len() == modal_dim).collect();
        let n = selected.len() as f64;

        let mut mean = vec![0.0; modal_dim];
        for sample in &selected {
            for (m, v) in mean.iter_mut().zip(sample.iter()) {
                *m += v / n;
            }
        }
        let mut var = vec![0.0; modal_dim];
        for sample in &selected {
            for ((va, v), m) in var.iter_mut().zip(sample.iter()).zip(&mean) {
                *va += (v - m) * (v - m) / n;
            }
        }
        Ok(Self { mean, var })
    }

    /// Dimensionality the scaler was fit on.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Scales a metric vector to zero mean and unit variance.
    #[must_use]
    pub fn normalize(&self, metrics: &[f64]) -> Vec<f64> {
        self.mean
            .iter()
            .zip(&self.var)
            .enumerate()
            .map(|(i, (m, v))| {
                let value = metrics.get(i).copied().unwrap_or(*m);
                (value - m) / (v + VAR_EPSILON).sqrt()
            })
            .collect()
    }

    /// Writes the scaler as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Checkpoint`] on serialization or I/O failure.
    #[cfg(feature = "checkpoint")]
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let json = serde_json::to_string(self).map_err(|e| Error::Checkpoint(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| Error::Checkpoint(e.to_string()))
    }

    /// Reads a scaler previously written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Checkpoint`] on I/O or parse failure.
    #[cfg(feature = "checkpoint")]
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let json =
            std::fs::read_to_string(path).map_err(|e| Error::Checkpoint(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| Error::Checkpoint(e.to_string()))
    }
}

/// DDPG-style proposer driving a [`Policy`] through warmup and episodes.
///
/// The proposer owns the full state machine: it serves a precomputed
/// initial design while collecting metrics, fits the [`MetricNormalizer`]
/// and builds the policy once enough trials exist, then alternates episode
/// resets with learned steps. All methods take `&mut self`; the proposer is
/// single-threaded by design.
pub struct RlProposer {
    space: Arc<ConfigurationSpace>,
    config: RlConfig,
    direction: Direction,
    builder: Box<dyn PolicyBuilder>,
    policy: Option<Box<dyn Policy>>,
    normalizer: Option<MetricNormalizer>,
    replay: ReplayBuffer,
    rng: fastrand::Rng,
    task_id: String,
    initial_design: Vec<Configuration>,
    init_step: usize,
    warmup_metrics: Vec<Vec<f64>>,
    episode: usize,
    global_t: usize,
    t: usize,
    score: f64,
    episode_init: bool,
    state: Vec<f64>,
    episode_start_objective: f64,
    last_objective: f64,
}

impl RlProposer {
    /// Creates a proposer and replays `history` into it.
    ///
    /// Metrics already in the history count toward warmup; if enough exist
    /// the policy is built immediately and every real, successful
    /// observation is replayed as a learning step. Synthetic entries are
    /// skipped, they carry no trustworthy metrics.
    ///
    /// # Errors
    ///
    /// Propagates normalizer persistence failures.
    pub fn new(
        space: Arc<ConfigurationSpace>,
        config: RlConfig,
        builder: Box<dyn PolicyBuilder>,
        task_id: impl Into<String>,
        seed: u64,
        history: &HistoryContainer,
    ) -> Result<Self> {
        let mut rng = fastrand::Rng::with_seed(seed);
        let excluded = history.configurations();
        let initial_design =
            build_initial_design(&space, &config, &mut rng, &excluded);

        let mut proposer = Self {
            space,
            direction: history.direction(),
            builder,
            policy: None,
            normalizer: None,
            replay: ReplayBuffer::new(config.replay_capacity),
            rng,
            task_id: task_id.into(),
            initial_design,
            init_step: 0,
            warmup_metrics: Vec::new(),
            episode: 0,
            global_t: 0,
            t: 0,
            score: 0.0,
            episode_init: true,
            state: Vec::new(),
            episode_start_objective: 0.0,
            last_objective: 0.0,
            config,
        };

        #[cfg(feature = "checkpoint")]
        proposer.try_load_normalizer();

        for (i, observation) in history.observations().iter().enumerate() {
            if history.is_synthetic(i) || observation.trial_state == TrialState::Failed {
                continue;
            }
            proposer.warmup_metrics.push(observation.internal_metrics.clone());
        }
        if proposer.normalizer.is_some()
            || proposer.warmup_metrics.len() >= proposer.config.warmup_trials
        {
            proposer.instantiate_policy()?;
            proposer.replay_history(history)?;
        }
        Ok(proposer)
    }

    /// Current phase of the state machine.
    #[must_use]
    pub fn phase(&self) -> RlPhase {
        if self.policy.is_none() {
            RlPhase::Warmup
        } else if self.episode_init {
            RlPhase::EpisodeInit
        } else {
            RlPhase::Stepping
        }
    }

    /// Episodes started so far.
    #[must_use]
    pub fn episode(&self) -> usize {
        self.episode
    }

    /// Learned steps taken across all episodes.
    #[must_use]
    pub fn global_step(&self) -> usize {
        self.global_t
    }

    /// Cumulative shaped score of the current episode.
    #[must_use]
    pub fn episode_score(&self) -> f64 {
        self.score
    }

    /// Proposes the next configuration to evaluate.
    ///
    /// # Errors
    ///
    /// Returns an error when a learned action has the wrong
    /// dimensionality.
    #[allow(clippy::cast_precision_loss)]
    pub fn propose(&mut self) -> Result<Configuration> {
        let Some(policy) = self.policy.as_mut() else {
            let config = match self.initial_design.get(self.init_step) {
                Some(config) => config.clone(),
                None => {
                    trace_warn!("initial design exhausted before warmup completed");
                    self.space.sample(&mut self.rng).with_origin(Origin::InitialDesign)
                }
            };
            self.init_step += 1;
            return Ok(config);
        };

        if self.episode_init {
            self.t = 0;
            self.score = 0.0;
            return Ok(self.space.default_configuration());
        }

        // Mostly decayed-noise exploitation, occasional full-noise draws.
        let noise_scale = if self.rng.f64() < 1.0 - self.config.explore_prob {
            1.0 / (self.global_t as f64 + 1.0)
        } else {
            1.0
        };
        let action = policy.choose_action(&self.state, noise_scale);
        self.space.from_unit_vector(&action, Origin::Policy)
    }

    /// Feeds back an evaluated observation.
    ///
    /// # Errors
    ///
    /// Propagates normalizer persistence failures at the warmup boundary.
    pub fn observe(&mut self, observation: &Observation) -> Result<()> {
        if self.policy.is_none() {
            self.warmup_metrics.push(observation.internal_metrics.clone());
            if self.warmup_metrics.len() >= self.config.warmup_trials {
                self.instantiate_policy()?;
                trace_info!("warmup complete after {} trials", self.warmup_metrics.len());
            }
            return Ok(());
        }

        let normalizer = self
            .normalizer
            .as_ref()
            .ok_or(Error::Internal("policy exists without a normalizer"))?;
        let objective = observation.objectives.first().copied().unwrap_or(0.0);

        if self.episode_init {
            self.state = normalizer.normalize(&observation.internal_metrics);
            self.episode_start_objective = objective;
            self.last_objective = objective;
            self.episode_init = false;
            self.episode += 1;
            self.t = 0;
            trace_debug!("episode {} initialized", self.episode);
            return Ok(());
        }

        let reward = self.shaped_reward(objective);
        self.score += reward;
        self.last_objective = objective;
        let next_state = normalizer.normalize(&observation.internal_metrics);
        self.t += 1;
        self.global_t += 1;

        let done = self.t >= self.config.episode_steps;
        if done || self.score < self.config.score_floor {
            self.episode_init = true;
        }

        self.replay.push(Transition {
            state: core::mem::replace(&mut self.state, next_state),
            action: observation.config.unit_vector().to_vec(),
            reward,
            next_state: self.state.clone(),
            done,
        });

        if self.replay.len() >= self.config.batch_size.max(2) {
            if let Some(policy) = self.policy.as_mut() {
                for _ in 0..self.config.updates_per_step {
                    let batch = self.replay.sample_batch(&mut self.rng, self.config.batch_size);
                    let loss = policy.update(&batch, &self.config);
                    trace_debug!("policy update loss {loss}");
                }
            }
        }

        if self.config.checkpoint_every > 0 && self.global_t % self.config.checkpoint_every == 0 {
            if let Some(policy) = self.policy.as_mut() {
                if let Err(err) = policy.checkpoint(&self.task_id, self.global_t) {
                    trace_warn!("policy checkpoint failed: {err}");
                }
            }
        }
        Ok(())
    }

    /// Shapes the step reward from relative objective change.
    ///
    /// `delta0` is the change since episode start, `delta_t` since the
    /// previous step, both oriented so positive means improvement. A
    /// positive cumulative reward is zeroed when the instantaneous change
    /// regressed. Any objective of exactly zero marks a failed trial and
    /// yields zero reward.
    fn shaped_reward(&self, objective: f64) -> f64 {
        if objective == 0.0
            || self.episode_start_objective == 0.0
            || self.last_objective == 0.0
        {
            return 0.0;
        }
        let delta0 = self.relative_change(objective, self.episode_start_objective);
        let delta_t = self.relative_change(objective, self.last_objective);

        let exp = self.config.reward_exponent;
        let mut reward = if delta0 > 0.0 {
            ((1.0 + delta0).powf(exp) - 1.0) * (1.0 + delta_t).abs()
        } else {
            -((1.0 - delta0).powf(exp) - 1.0) * (1.0 - delta_t).abs()
        };
        if reward > 0.0 && delta_t < 0.0 {
            reward = 0.0;
        }
        reward
    }

    fn relative_change(&self, current: f64, baseline: f64) -> f64 {
        let raw = (current - baseline) / baseline;
        match self.direction {
            Direction::Maximize => raw,
            Direction::Minimize => -raw,
        }
    }

    fn instantiate_policy(&mut self) -> Result<()> {
        if self.normalizer.is_none() {
            let normalizer = MetricNormalizer::from_samples(&self.warmup_metrics)?;
            #[cfg(feature = "checkpoint")]
            normalizer.save(&self.normalizer_path())?;
            self.normalizer = Some(normalizer);
        }
        let n_states = self
            .normalizer
            .as_ref()
            .ok_or(Error::Internal("normalizer missing after fit"))?
            .dim();
        self.policy = Some(
            self.builder
                .build(n_states, self.space.len(), &self.config),
        );
        Ok(())
    }

    /// Replays real, successful observations as learning steps.
    fn replay_history(&mut self, history: &HistoryContainer) -> Result<()> {
        for (i, observation) in history.observations().iter().enumerate() {
            if history.is_synthetic(i) || observation.trial_state == TrialState::Failed {
                continue;
            }
            self.observe(observation)?;
        }
        Ok(())
    }

    #[cfg(feature = "checkpoint")]
    fn normalizer_path(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(format!("{}_mean_var.json", self.task_id))
    }

    #[cfg(feature = "checkpoint")]
    fn try_load_normalizer(&mut self) {
        let path = self.normalizer_path();
        if path.exists() {
            match MetricNormalizer::load(&path) {
                Ok(normalizer) => {
                    trace_info!("loaded metric normalizer from {}", path.display());
                    self.normalizer = Some(normalizer);
                }
                Err(err) => trace_warn!("ignoring unreadable normalizer file: {err}"),
            }
        }
    }
}

/// Builds the warmup proposal sequence.
fn build_initial_design(
    space: &ConfigurationSpace,
    config: &RlConfig,
    rng: &mut fastrand::Rng,
    excluded: &[Configuration],
) -> Vec<Configuration> {
    let default = space.default_configuration();
    let num_random = config.warmup_trials.saturating_sub(1);
    let mut design = match config.init_strategy {
        InitStrategy::Random => space.sample_distinct(rng, config.warmup_trials, excluded),
        InitStrategy::Default => {
            let mut design = vec![default];
            design.extend(space.sample_distinct(rng, num_random, excluded));
            design
        }
        InitStrategy::RandomExploreFirst => {
            let pool = space.sample_distinct(rng, EXPLORE_POOL_SIZE, excluded);
            max_min_distance(default, pool, num_random)
        }
    };
    for entry in &mut design {
        entry.set_origin(Origin::InitialDesign);
    }
    design
}
