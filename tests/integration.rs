//! Integration tests for the acqmax library.

use std::sync::Arc;

use acqmax::prelude::*;
use acqmax::rl::Transition;

fn tuning_space() -> Arc<ConfigurationSpace> {
    Arc::new(
        ConfigurationSpace::new(vec![
            ParameterDef::float("buffer_pool_ratio", 0.0, 1.0, 0.25),
            ParameterDef::int("io_threads", 1, 64, 4),
            ParameterDef::float("checkpoint_interval", 1.0, 300.0, 60.0),
        ])
        .expect("space definition should be valid"),
    )
}

fn numeric_space() -> Arc<ConfigurationSpace> {
    Arc::new(
        ConfigurationSpace::new(vec![
            ParameterDef::float("x", 0.0, 1.0, 0.5),
            ParameterDef::float("y", 0.0, 1.0, 0.5),
        ])
        .expect("space definition should be valid"),
    )
}

/// Smooth acquisition with its maximum in the interior of the cube.
fn smooth_acquisition() -> Arc<dyn AcquisitionFunction> {
    Arc::new(|point: &[f64]| {
        let value: f64 = point
            .iter()
            .map(|&v| -(v - 0.6) * (v - 0.6))
            .sum();
        Ok::<_, Error>(value)
    })
}

// =============================================================================
// Test: ensemble rounds record exactly one real entry
// =============================================================================

#[test]
fn test_ensemble_round_records_one_real_rest_synthetic() {
    let space = tuning_space();
    let mut rng = fastrand::Rng::with_seed(7);
    let mut history = HistoryContainer::new(Direction::Minimize);

    for round in 0..4 {
        let group: Vec<Observation> = (0..5)
            .map(|i| {
                Observation::new(space.sample(&mut rng), f64::from(round * 10 + i))
            })
            .collect();
        history
            .push_ensemble(group)
            .expect("non-empty round should succeed");
    }

    assert_eq!(history.len(), 20);
    assert_eq!(
        history.synthetic_count(),
        16,
        "each of 4 rounds of size 5 must add exactly 4 synthetic entries"
    );
    // The real entry per round is the best (minimal) objective.
    for round in 0..4usize {
        let real: Vec<usize> = (round * 5..round * 5 + 5)
            .filter(|&i| !history.is_synthetic(i))
            .collect();
        assert_eq!(real.len(), 1);
        assert_eq!(
            history.observations()[real[0]].objectives[0],
            (round * 10) as f64
        );
    }
}

// =============================================================================
// Test: challenger list yields at most n non-injected candidates
// =============================================================================

#[test]
fn test_challenger_list_bounds_non_injected_pulls() {
    let space = tuning_space();
    let maximizer = RandomSearch::with_sorted(smooth_acquisition(), Arc::clone(&space), 11, true);
    let history = HistoryContainer::new(Direction::Minimize);

    let list = maximizer
        .maximize(&history, 9)
        .expect("maximize should succeed");
    let candidates = list.challengers().to_vec();
    assert_eq!(candidates.len(), 9);

    // Sorted candidates carry `Origin::RandomSearchSorted`; on-the-fly
    // injections carry `Origin::RandomSearch`. Dropping the injections must
    // leave the nine candidates exactly once each, in rank order.
    let pulled: Vec<Configuration> = list.collect();
    let non_injected: Vec<Configuration> = pulled
        .iter()
        .filter(|c| c.origin() != Origin::RandomSearch)
        .cloned()
        .collect();
    assert_eq!(non_injected.len(), 9, "never more than n non-injected pulls");
    assert_eq!(non_injected, candidates);
}

// =============================================================================
// Test: local search respects its step cap and empty-history contract
// =============================================================================

#[test]
fn test_local_search_empty_history_returns_exactly_num_points() {
    let search = LocalSearch::builder(smooth_acquisition(), tuning_space())
        .seed(42)
        .build();
    let history = HistoryContainer::new(Direction::Minimize);
    let ranked = search.rank(&history, 5).expect("rank should succeed");
    assert_eq!(ranked.len(), 5);
    assert!(
        ranked.windows(2).all(|w| w[0].acq_value >= w[1].acq_value),
        "ranking must be descending"
    );
}

#[test]
fn test_local_search_seeding_excludes_synthetic_duplicates() {
    let space = tuning_space();
    let mut rng = fastrand::Rng::with_seed(3);
    let shared_config = space.sample(&mut rng);

    let mut history = HistoryContainer::new(Direction::Minimize);
    history.push(Observation::new(shared_config.clone(), 1.0));
    history.push_synthetic(Observation::new(shared_config, 1.0));

    let real = history.real_success_configs();
    assert_eq!(
        real.len(),
        1,
        "identical real and synthetic configs must collapse to the real one"
    );

    let search = LocalSearch::builder(smooth_acquisition(), space)
        .seed(9)
        .build();
    let ranked = search.rank(&history, 5).expect("rank should succeed");
    assert_eq!(ranked.len(), 1, "only the real config can seed a climb");
}

// =============================================================================
// Test: sorted random search is deterministic under a fixed seed
// =============================================================================

#[test]
fn test_sorted_random_search_deterministic_under_seed() {
    let history = HistoryContainer::new(Direction::Minimize);
    let run = || {
        let maximizer =
            RandomSearch::with_sorted(smooth_acquisition(), tuning_space(), 123, true);
        maximizer
            .rank(&history, 12)
            .expect("rank should succeed")
            .into_iter()
            .map(|s| (s.acq_value, s.config))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run(), "same seed and inputs must give same ranking");
}

// =============================================================================
// Test: interleaved search mixes sources and stays sorted
// =============================================================================

#[test]
fn test_interleaved_search_round_trip() {
    let maximizer = InterleavedLocalAndRandomSearch::builder(smooth_acquisition(), tuning_space())
        .n_sls_iterations(4)
        .seed(21)
        .build();
    let history = HistoryContainer::new(Direction::Minimize);

    let list = maximizer
        .maximize(&history, 10)
        .expect("maximize should succeed");
    let origins: Vec<Origin> = list.challengers().iter().map(Configuration::origin).collect();
    assert_eq!(origins.len(), 10);
    assert_eq!(
        origins.iter().filter(|&&o| o == Origin::LocalSearch).count(),
        4
    );
    assert_eq!(
        origins
            .iter()
            .filter(|&&o| o == Origin::RandomSearchSorted)
            .count(),
        6
    );
}

// =============================================================================
// Test: continuous family refuses categorical spaces, converges on numeric
// =============================================================================

#[test]
fn test_continuous_optimizers_reject_categorical_dimensions() {
    let space = Arc::new(
        ConfigurationSpace::new(vec![
            ParameterDef::float("x", 0.0, 1.0, 0.5),
            ParameterDef::categorical("engine", 3, 0),
        ])
        .expect("space definition should be valid"),
    );
    assert!(matches!(
        ContinuousOptimizer::new(smooth_acquisition(), Arc::clone(&space), 1),
        Err(Error::UnsupportedParameter { .. })
    ));
    assert!(GlobalContinuousOptimizer::new(smooth_acquisition(), Arc::clone(&space), 1).is_err());
    assert!(MultiStartContinuousOptimizer::new(smooth_acquisition(), Arc::clone(&space), 1).is_err());
    assert!(StagedBatchOptimizer::new(smooth_acquisition(), Arc::clone(&space), 1).is_err());
    assert!(McGradientOptimizer::new(smooth_acquisition(), space, 1).is_err());
}

#[test]
fn test_multi_start_finds_interior_peak() {
    let optimizer = MultiStartContinuousOptimizer::new(smooth_acquisition(), numeric_space(), 17)
        .expect("numeric space should be accepted");
    let history = HistoryContainer::new(Direction::Minimize);
    let ranked = optimizer.rank(&history, 10).expect("rank should succeed");
    assert!(
        ranked[0].acq_value > -1e-3,
        "best refined candidate should be near the peak, got {}",
        ranked[0].acq_value
    );
}

// =============================================================================
// Test: RL proposer end-to-end through warmup, episodes, and rewards
// =============================================================================

struct CenteringPolicy {
    dim: usize,
}

impl Policy for CenteringPolicy {
    fn choose_action(&mut self, _state: &[f64], noise_scale: f64) -> Vec<f64> {
        vec![(0.5 + noise_scale * 0.1).min(1.0); self.dim]
    }
    fn update(&mut self, batch: &[Transition], _config: &RlConfig) -> f64 {
        batch.iter().map(|t| t.reward.abs()).sum()
    }
    fn checkpoint(&mut self, _task_id: &str, _global_step: usize) -> Result<()> {
        Ok(())
    }
}

struct CenteringBuilder;

impl PolicyBuilder for CenteringBuilder {
    fn build(&self, _n_states: usize, n_actions: usize, _config: &RlConfig) -> Box<dyn Policy> {
        Box::new(CenteringPolicy { dim: n_actions })
    }
}

#[test]
fn test_rl_proposer_full_lifecycle() {
    let space = numeric_space();
    let config = RlConfig {
        warmup_trials: 4,
        batch_size: 2,
        ..RlConfig::default()
    };
    let history = HistoryContainer::new(Direction::Maximize);
    let mut proposer = RlProposer::new(
        Arc::clone(&space),
        config,
        Box::new(CenteringBuilder),
        "lifecycle",
        42,
        &history,
    )
    .expect("construction should succeed");

    // Warmup: initial design proposals until enough metrics exist.
    assert_eq!(proposer.phase(), RlPhase::Warmup);
    for i in 0..4 {
        let proposal = proposer.propose().expect("warmup proposal");
        assert_eq!(proposal.origin(), Origin::InitialDesign);
        proposer
            .observe(
                &Observation::new(proposal, 100.0 + f64::from(i))
                    .with_internal_metrics(vec![1.0, 2.0, 3.0]),
            )
            .expect("warmup observation");
    }

    // Episode init: the default configuration, never a learned action.
    assert_eq!(proposer.phase(), RlPhase::EpisodeInit);
    let reset = proposer.propose().expect("episode-init proposal");
    assert_eq!(reset.values(), space.default_configuration().values());
    proposer
        .observe(&Observation::new(reset, 100.0).with_internal_metrics(vec![1.0, 2.0, 3.0]))
        .expect("episode-init observation");

    // Stepping: learned actions, shaped rewards, replay growth.
    assert_eq!(proposer.phase(), RlPhase::Stepping);
    for step in 0..5 {
        let proposal = proposer.propose().expect("learned proposal");
        assert_eq!(proposal.origin(), Origin::Policy);
        proposer
            .observe(
                &Observation::new(proposal, 110.0 + f64::from(step))
                    .with_internal_metrics(vec![1.0, 2.0, 3.0]),
            )
            .expect("stepping observation");
    }
    assert_eq!(proposer.global_step(), 5);
    assert!(
        proposer.episode_score() > 0.0,
        "monotonically improving objectives must accumulate positive score"
    );
}

#[test]
fn test_rl_zero_objective_gives_zero_reward() {
    let space = numeric_space();
    let config = RlConfig {
        warmup_trials: 2,
        ..RlConfig::default()
    };
    let history = HistoryContainer::new(Direction::Maximize);
    let mut proposer = RlProposer::new(
        space,
        config,
        Box::new(CenteringBuilder),
        "zero-reward",
        1,
        &history,
    )
    .expect("construction should succeed");

    for _ in 0..2 {
        let proposal = proposer.propose().expect("warmup proposal");
        proposer
            .observe(
                &Observation::new(proposal, 50.0).with_internal_metrics(vec![4.0, 5.0]),
            )
            .expect("warmup observation");
    }
    let reset = proposer.propose().expect("episode-init proposal");
    proposer
        .observe(&Observation::new(reset, 50.0).with_internal_metrics(vec![4.0, 5.0]))
        .expect("episode-init observation");

    // A zero objective marks a failed benchmark run.
    let proposal = proposer.propose().expect("learned proposal");
    proposer
        .observe(&Observation::new(proposal, 0.0).with_internal_metrics(vec![4.0, 5.0]))
        .expect("stepping observation");
    assert_eq!(proposer.episode_score(), 0.0);
}
