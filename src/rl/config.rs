//! Tunable knobs of the reinforcement-learning proposer.

/// Strategy for building the warmup initial design.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitStrategy {
    /// Default configuration followed by distinct random samples.
    Default,
    /// Distinct random samples only.
    Random,
    /// Default configuration plus farthest-point selections from a
    /// 100-sample random pool, for a space-filling design.
    #[default]
    RandomExploreFirst,
}

/// Every recognized option of the proposer and its effect.
///
/// Replaces ad-hoc keyword plumbing with an explicit struct so a caller can
/// see at a glance which constants shape learning and reward.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RlConfig {
    /// Soft target-network update rate.
    pub tau: f64,
    /// Actor learning rate.
    pub actor_lr: f64,
    /// Critic learning rate.
    pub critic_lr: f64,
    /// Discount factor.
    pub gamma: f64,
    /// Replay buffer capacity; oldest transitions are evicted first.
    pub replay_capacity: usize,
    /// Mini-batch size for policy updates.
    pub batch_size: usize,
    /// Observations collected before the policy is instantiated.
    pub warmup_trials: usize,
    /// Steps per episode before a forced reset.
    pub episode_steps: usize,
    /// Cumulative score below which the episode terminates early.
    pub score_floor: f64,
    /// Probability of a full-noise exploration draw instead of
    /// decayed-noise exploitation.
    pub explore_prob: f64,
    /// Exponent applied to the cumulative relative improvement when
    /// shaping the reward.
    pub reward_exponent: f64,
    /// Policy updates performed per observed step once the replay buffer
    /// is warm.
    pub updates_per_step: usize,
    /// Checkpoint the policy every this many global steps.
    pub checkpoint_every: usize,
    /// Warmup initial-design strategy.
    pub init_strategy: InitStrategy,
}

impl Default for RlConfig {
    fn default() -> Self {
        Self {
            tau: 0.002,
            actor_lr: 0.001,
            critic_lr: 0.001,
            gamma: 0.9,
            replay_capacity: 100_000,
            batch_size: 16,
            warmup_trials: 5,
            episode_steps: 100,
            score_floor: -50.0,
            explore_prob: 0.3,
            reward_exponent: 2.0,
            updates_per_step: 4,
            checkpoint_every: 5,
            init_strategy: InitStrategy::default(),
        }
    }
}
