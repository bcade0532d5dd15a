//! Self-play DQN training loop.
//!
//! The trainer alternates between collecting experience (one environment
//! step of a self-play episode) and training (sampling a batch and fitting
//! the online network to bootstrapped targets from the target network).
//! [`DQNTrainer::train_concurrent`] runs the collection on producer threads
//! instead, with the learner on the calling thread.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{CancelToken, GameRng, PlayerId};
use crate::error::{CheckpointError, TrainingError};
use crate::game::Game;
use crate::nn::{QFunction, StateEncoder, TrainingSample};
use crate::training::{ReplayEntry, ReplayPool, SharedReplayBuffer};

use super::agent::DQNAgent;
use super::checkpoint::{Checkpoint, LearnerState, ResumeState, CHECKPOINT_FORMAT_VERSION};
use super::config::{DQNConfig, NetworkSharing};
use super::episode::{EpisodeOutcome, EpisodeRunner};
use super::policy::masked_max;

/// Where the trainer is in its loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainerPhase {
    Idle,
    Collecting,
    Training,
}

/// Online network plus its periodically synced target copy.
#[derive(Clone, Debug)]
pub struct Learner<Q> {
    online: Q,
    target: Q,
    train_steps: u64,
    last_loss: Option<f32>,
}

/// Result of one successful training step.
#[derive(Clone, Copy, Debug, PartialEq)]
struct TrainStep {
    loss: f32,
    synced: bool,
}

impl<Q: QFunction + Clone> Learner<Q> {
    fn new(q: Q) -> Self {
        Self {
            target: q.clone(),
            online: q,
            train_steps: 0,
            last_loss: None,
        }
    }

    pub fn online(&self) -> &Q {
        &self.online
    }

    pub fn target(&self) -> &Q {
        &self.target
    }

    pub fn train_steps(&self) -> u64 {
        self.train_steps
    }

    pub fn last_loss(&self) -> Option<f32> {
        self.last_loss
    }

    /// Bootstrapped regression targets for a sampled batch.
    fn targets(&self, batch: &[ReplayEntry], discount: f64) -> Vec<TrainingSample> {
        let next_states: Vec<_> = batch.iter().map(|e| e.next_state.clone()).collect();
        let next_values = self.target.predict_batch(&next_states);
        batch
            .iter()
            .zip(next_values)
            .map(|(entry, values)| {
                let bootstrap = if entry.done {
                    0.0
                } else {
                    masked_max(&values, &entry.next_legal).map_or(0.0, f64::from)
                };
                TrainingSample {
                    input: entry.state.clone(),
                    action: entry.action,
                    target: (entry.reward + discount * bootstrap) as f32,
                }
            })
            .collect()
    }

    fn train_on(
        &mut self,
        buffer: &SharedReplayBuffer,
        config: &DQNConfig,
        rng: &mut GameRng,
    ) -> Result<TrainStep, TrainingError> {
        let batch = buffer.sample(config.batch_size, config.min_replay_size, rng)?;
        let samples = self.targets(&batch, config.discount);
        let loss = self.online.train(&samples, config.learning_rate);
        self.train_steps += 1;
        self.last_loss = Some(loss);

        let synced = self.train_steps % config.target_update_frequency == 0;
        if synced {
            self.sync_target()?;
        }
        Ok(TrainStep { loss, synced })
    }

    /// Hard copy of the online parameters into the target network.
    fn sync_target(&mut self) -> Result<(), CheckpointError> {
        let snapshot = self.online.snapshot()?;
        self.target.restore(&snapshot)
    }
}

/// Counters accumulated over the lifetime of a trainer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub episodes: u64,
    /// Episodes abandoned at `max_episode_moves`.
    pub truncated_episodes: u64,
    pub env_steps: u64,
    pub train_steps: u64,
    /// Training attempts skipped because the replay buffer was too small.
    pub skipped_steps: u64,
    pub target_syncs: u64,
    pub mean_loss: Option<f64>,
    pub epsilon: f64,
}

#[derive(Clone, Debug, Default)]
struct Counters {
    episodes: u64,
    truncated: u64,
    env_steps: u64,
    train_steps: u64,
    skipped_steps: u64,
    target_syncs: u64,
    loss_sum: f64,
    loss_count: u64,
}

impl Counters {
    fn attempts(&self) -> u64 {
        self.train_steps + self.skipped_steps
    }

    /// Tally a training attempt. Underflow is recovered here; anything else
    /// is passed on.
    fn record(
        &mut self,
        learner: usize,
        result: Result<TrainStep, TrainingError>,
    ) -> Result<bool, TrainingError> {
        match result {
            Ok(step) => {
                self.train_steps += 1;
                self.loss_sum += f64::from(step.loss);
                self.loss_count += 1;
                if step.synced {
                    self.target_syncs += 1;
                    debug!(learner, train_steps = self.train_steps, "target network synced");
                }
                Ok(true)
            }
            Err(TrainingError::ReplayUnderflow { .. }) => {
                self.skipped_steps += 1;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

/// Buffer a learner samples from. Per-player networks read their own seat's
/// buffer; a shared network walks the buffers round-robin.
fn replay_source(
    pool: &ReplayPool,
    sharing: NetworkSharing,
    learner: usize,
    round: u64,
) -> &SharedReplayBuffer {
    let buffers = pool.buffers();
    let index = match sharing {
        NetworkSharing::PerPlayer => learner,
        NetworkSharing::Shared => (round % buffers.len() as u64) as usize,
    };
    &buffers[index % buffers.len()]
}

fn learner_index(sharing: NetworkSharing, player: PlayerId) -> usize {
    match sharing {
        NetworkSharing::Shared => 0,
        NetworkSharing::PerPlayer => player.index(),
    }
}

fn enter(phase: &mut TrainerPhase, next: TrainerPhase) {
    if *phase != next {
        debug!(from = ?*phase, to = ?next, "trainer phase");
        *phase = next;
    }
}

/// State shared between the learner and the self-play producer threads of
/// one concurrent run.
struct Producers<'a, G: Game, E, Q> {
    game: &'a G,
    encoder: &'a E,
    config: &'a DQNConfig,
    pool: &'a ReplayPool,
    initial: &'a G::State,
    episodes: u64,
    stop: &'a CancelToken,
    /// Latest online networks, refreshed by the learner.
    published: RwLock<Vec<Q>>,
    next_episode: AtomicU64,
    env_steps: AtomicU64,
    completed: AtomicU64,
    truncated: AtomicU64,
    running: AtomicUsize,
    abort: AtomicBool,
}

impl<G, E, Q> Producers<'_, G, E, Q>
where
    G: Game,
    E: StateEncoder<G>,
    Q: QFunction + Clone,
{
    fn halted(&self) -> bool {
        self.stop.is_cancelled() || self.abort.load(Ordering::SeqCst)
    }

    fn networks(&self) -> Vec<Q> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Claim and play episodes until none are left or the run is halted.
    fn produce(&self, rng: &mut GameRng) -> Result<(), TrainingError> {
        let mut nets = self.networks();
        while !self.halted() && self.next_episode.fetch_add(1, Ordering::SeqCst) < self.episodes {
            let mut runner = EpisodeRunner::new(self.game, self.initial);
            let mut finished = true;
            while !runner.is_done(self.game) {
                if runner.moves() >= self.config.max_episode_moves {
                    warn!(
                        moves = runner.moves(),
                        "episode hit the move limit, discarding its transitions"
                    );
                    finished = false;
                    break;
                }
                let player = runner.to_move(self.game);
                let net = &nets[learner_index(self.config.network_sharing, player) % nets.len()];
                let epsilon = self.config.epsilon_at(self.env_steps.load(Ordering::SeqCst));
                runner.step(self.game, self.encoder, net, epsilon, rng)?;
                self.env_steps.fetch_add(1, Ordering::SeqCst);
            }

            if finished {
                runner.finish(self.game, self.encoder, self.pool)?;
                self.completed.fetch_add(1, Ordering::SeqCst);
            } else {
                self.truncated.fetch_add(1, Ordering::SeqCst);
            }
            nets = self.networks();
        }
        Ok(())
    }
}

/// DQN self-play trainer.
pub struct DQNTrainer<G: Game, E: StateEncoder<G>, Q: QFunction + Clone> {
    game: G,
    encoder: E,
    config: DQNConfig,
    learners: Vec<Learner<Q>>,
    replay: ReplayPool,
    rng: GameRng,
    phase: TrainerPhase,
    stop: CancelToken,
    counters: Counters,
}

impl<G, E, Q> DQNTrainer<G, E, Q>
where
    G: Game,
    E: StateEncoder<G>,
    Q: QFunction + Clone,
{
    /// Build a trainer whose networks all start as copies of `q`.
    pub fn new(game: G, encoder: E, q: Q, config: DQNConfig) -> Result<Self, TrainingError> {
        config
            .validate()
            .map_err(|e| TrainingError::Config(e.to_string()))?;
        if q.feature_count() != encoder.feature_count() || q.action_count() != encoder.action_count() {
            return Err(TrainingError::Config(format!(
                "network is {}x{} (features x actions), encoder produces {}x{}",
                q.feature_count(),
                q.action_count(),
                encoder.feature_count(),
                encoder.action_count()
            )));
        }

        let players = game.player_count();
        let networks = match config.network_sharing {
            NetworkSharing::Shared => 1,
            NetworkSharing::PerPlayer => players,
        };
        let learners = (0..networks).map(|_| Learner::new(q.clone())).collect();
        let replay = ReplayPool::new(config.replay_sharing, players, config.replay_capacity);
        let rng = GameRng::new(config.seed);

        Ok(Self {
            game,
            encoder,
            config,
            learners,
            replay,
            rng,
            phase: TrainerPhase::Idle,
            stop: CancelToken::new(),
            counters: Counters::default(),
        })
    }

    pub fn config(&self) -> &DQNConfig {
        &self.config
    }

    pub fn phase(&self) -> TrainerPhase {
        self.phase
    }

    /// Token that stops `train` / `train_concurrent` after the current
    /// episode.
    pub fn stop_token(&self) -> CancelToken {
        self.stop.clone()
    }

    /// Exploration rate at the current environment step.
    pub fn epsilon(&self) -> f64 {
        self.config.epsilon_at(self.counters.env_steps)
    }

    pub fn learners(&self) -> &[Learner<Q>] {
        &self.learners
    }

    /// Learner that plays `player`'s seat.
    pub fn learner(&self, player: PlayerId) -> &Learner<Q> {
        &self.learners[learner_index(self.config.network_sharing, player) % self.learners.len()]
    }

    pub fn online(&self, player: PlayerId) -> &Q {
        self.learner(player).online()
    }

    pub fn replay(&self) -> &ReplayPool {
        &self.replay
    }

    pub fn report(&self) -> TrainingReport {
        let c = &self.counters;
        TrainingReport {
            episodes: c.episodes,
            truncated_episodes: c.truncated,
            env_steps: c.env_steps,
            train_steps: c.train_steps,
            skipped_steps: c.skipped_steps,
            target_syncs: c.target_syncs,
            mean_loss: (c.loss_count > 0).then(|| c.loss_sum / c.loss_count as f64),
            epsilon: self.epsilon(),
        }
    }

    /// One training attempt for `learner`; underflow counts as skipped.
    pub fn train_step(&mut self, learner: usize) -> Result<bool, TrainingError> {
        enter(&mut self.phase, TrainerPhase::Training);
        let buffer = replay_source(
            &self.replay,
            self.config.network_sharing,
            learner,
            self.counters.attempts(),
        );
        let result = self.learners[learner].train_on(buffer, &self.config, &mut self.rng);
        self.counters.record(learner, result)
    }

    /// Play one self-play episode from `initial`, training after every
    /// environment step. Transitions reach the replay pool when the episode
    /// ends. Returns `None` if the episode hit the move limit; none of its
    /// transitions are kept.
    pub fn run_episode(&mut self, initial: &G::State) -> Result<Option<EpisodeOutcome>, TrainingError> {
        let sharing = self.config.network_sharing;
        let mut runner = EpisodeRunner::new(&self.game, initial);

        while !runner.is_done(&self.game) {
            if runner.moves() >= self.config.max_episode_moves {
                warn!(
                    moves = runner.moves(),
                    "episode hit the move limit, discarding its transitions"
                );
                self.counters.truncated += 1;
                return Ok(None);
            }

            enter(&mut self.phase, TrainerPhase::Collecting);
            let player = runner.to_move(&self.game);
            let learner = learner_index(sharing, player) % self.learners.len();
            let epsilon = self.epsilon();
            runner.step(
                &self.game,
                &self.encoder,
                &self.learners[learner].online,
                epsilon,
                &mut self.rng,
            )?;
            self.counters.env_steps += 1;

            for _ in 0..self.config.train_steps_per_env_step {
                self.train_step(learner)?;
            }
        }

        let outcome = runner.finish(&self.game, &self.encoder, &self.replay)?;
        self.counters.episodes += 1;
        Ok(Some(outcome))
    }

    /// Train for `episodes` self-play episodes or until the stop token is
    /// cancelled. Always ends in the `Idle` phase.
    pub fn train(&mut self, initial: &G::State, episodes: u64) -> Result<TrainingReport, TrainingError> {
        info!(episodes, "dqn training started");
        let result = self.train_serial(initial, episodes);
        enter(&mut self.phase, TrainerPhase::Idle);
        result?;

        let report = self.report();
        info!(
            episodes = report.episodes,
            train_steps = report.train_steps,
            epsilon = report.epsilon,
            "dqn training finished"
        );
        Ok(report)
    }

    fn train_serial(&mut self, initial: &G::State, episodes: u64) -> Result<(), TrainingError> {
        for _ in 0..episodes {
            if self.stop.is_cancelled() {
                info!("dqn training stopped");
                break;
            }
            self.run_episode(initial)?;
        }
        Ok(())
    }

    /// Train with `producer_threads` self-play threads feeding the replay
    /// pool while this thread trains. Producers play with snapshot copies of
    /// the online networks and refresh them after each episode. The learner
    /// never runs ahead of `train_steps_per_env_step` attempts per collected
    /// step. Thread interleaving makes the result nondeterministic.
    pub fn train_concurrent(
        &mut self,
        initial: &G::State,
        episodes: u64,
    ) -> Result<TrainingReport, TrainingError> {
        let producers = self.config.producer_threads.max(1);
        info!(episodes, producers, "concurrent dqn training started");

        let result = self.run_concurrent(initial, episodes, producers);
        enter(&mut self.phase, TrainerPhase::Idle);
        result?;
        Ok(self.report())
    }

    fn run_concurrent(
        &mut self,
        initial: &G::State,
        episodes: u64,
        producers: usize,
    ) -> Result<(), TrainingError> {
        let game = &self.game;
        let encoder = &self.encoder;
        let config = &self.config;
        let pool = &self.replay;
        let stop = &self.stop;
        let learners = &mut self.learners;
        let counters = &mut self.counters;
        let phase = &mut self.phase;
        let rng = &mut self.rng;

        let shared = Producers {
            game,
            encoder,
            config,
            pool,
            initial,
            episodes,
            stop,
            published: RwLock::new(learners.iter().map(|l| l.online.clone()).collect()),
            next_episode: AtomicU64::new(0),
            env_steps: AtomicU64::new(counters.env_steps),
            completed: AtomicU64::new(0),
            truncated: AtomicU64::new(0),
            running: AtomicUsize::new(producers),
            abort: AtomicBool::new(false),
        };
        let steps_before = counters.env_steps;
        let producer_rngs: Vec<GameRng> = (0..producers).map(|_| rng.fork()).collect();

        enter(phase, TrainerPhase::Collecting);
        thread::scope(|scope| -> Result<(), TrainingError> {
            let shared = &shared;
            let handles: Vec<_> = producer_rngs
                .into_iter()
                .map(|mut producer_rng| {
                    scope.spawn(move || {
                        let result = shared.produce(&mut producer_rng);
                        if result.is_err() {
                            shared.abort.store(true, Ordering::SeqCst);
                        }
                        shared.running.fetch_sub(1, Ordering::SeqCst);
                        result
                    })
                })
                .collect();

            let mut round = 0u64;
            let mut learner_result = Ok(());
            loop {
                // Read completion before the step count so a finished run
                // sees its final total.
                let producers_done = shared.running.load(Ordering::SeqCst) == 0
                    || handles.iter().all(|h| h.is_finished());
                let collected = shared.env_steps.load(Ordering::SeqCst) - steps_before;
                let budget = collected * u64::from(config.train_steps_per_env_step);
                if round >= budget {
                    if producers_done || shared.halted() {
                        break;
                    }
                    thread::yield_now();
                    continue;
                }

                let learner = (round % learners.len() as u64) as usize;
                let buffer = replay_source(pool, config.network_sharing, learner, counters.attempts());
                let result = learners[learner].train_on(buffer, config, rng);
                round += 1;
                match counters.record(learner, result) {
                    Ok(true) => {
                        enter(phase, TrainerPhase::Training);
                        let mut board = shared.published.write().unwrap_or_else(PoisonError::into_inner);
                        board[learner] = learners[learner].online.clone();
                    }
                    Ok(false) => thread::yield_now(),
                    Err(e) => {
                        shared.abort.store(true, Ordering::SeqCst);
                        learner_result = Err(e);
                        break;
                    }
                }
            }

            for handle in handles {
                match handle.join() {
                    Ok(result) => result?,
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            learner_result
        })?;

        counters.env_steps = shared.env_steps.load(Ordering::SeqCst);
        counters.episodes += shared.completed.load(Ordering::SeqCst);
        counters.truncated += shared.truncated.load(Ordering::SeqCst);
        Ok(())
    }

    /// Snapshot of the networks, counters, RNG position and replay contents.
    /// Taken between episodes, it resumes to the same run.
    pub fn checkpoint(&self) -> Result<Checkpoint, CheckpointError> {
        let networks = self
            .learners
            .iter()
            .map(|l| l.online.snapshot())
            .collect::<Result<Vec<_>, _>>()?;
        let learners = self
            .learners
            .iter()
            .map(|l| -> Result<LearnerState, CheckpointError> {
                Ok(LearnerState {
                    train_steps: l.train_steps,
                    last_loss: l.last_loss,
                    target: l.target.snapshot()?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let c = &self.counters;

        Ok(Checkpoint {
            format_version: CHECKPOINT_FORMAT_VERSION,
            feature_count: self.encoder.feature_count(),
            action_count: self.encoder.action_count(),
            episodes: c.episodes,
            env_steps: c.env_steps,
            train_steps: c.train_steps,
            epsilon: self.epsilon(),
            config: self.config.clone(),
            networks,
            resume: ResumeState {
                truncated_episodes: c.truncated,
                skipped_steps: c.skipped_steps,
                target_syncs: c.target_syncs,
                loss_sum: c.loss_sum,
                loss_count: c.loss_count,
                learners,
                rng: self.rng.state(),
                replay: self.replay.buffers().iter().map(SharedReplayBuffer::to_vec).collect(),
            },
        })
    }

    pub fn save_checkpoint(&self, path: impl AsRef<Path>) -> Result<(), TrainingError> {
        self.checkpoint()?.save(path)?;
        Ok(())
    }

    /// Resume from a checkpoint taken with the same network and replay
    /// layout. Networks, counters, RNG position and replay contents are all
    /// replaced; the trainer's own config is kept.
    pub fn restore_checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<(), TrainingError> {
        let resume = &checkpoint.resume;
        let learners = self.learners.len();
        if checkpoint.networks.len() != learners || resume.learners.len() != learners {
            return Err(CheckpointError::Incompatible(format!(
                "checkpoint holds {} networks, trainer uses {learners}",
                checkpoint.networks.len()
            ))
            .into());
        }
        if resume.replay.len() != self.replay.buffers().len() {
            return Err(CheckpointError::Incompatible(format!(
                "checkpoint holds {} replay buffers, trainer uses {}",
                resume.replay.len(),
                self.replay.buffers().len()
            ))
            .into());
        }

        let states = self.learners.iter_mut().zip(&resume.learners);
        for (index, (learner, state)) in states.enumerate() {
            checkpoint.restore_into(index, &mut learner.online)?;
            checkpoint.restore_target_into(index, &mut learner.target)?;
            learner.train_steps = state.train_steps;
            learner.last_loss = state.last_loss;
        }
        for (buffer, entries) in self.replay.buffers().iter().zip(&resume.replay) {
            buffer.replace(entries.iter().cloned());
        }
        self.rng = GameRng::from_state(&resume.rng);
        self.counters = Counters {
            episodes: checkpoint.episodes,
            truncated: resume.truncated_episodes,
            env_steps: checkpoint.env_steps,
            train_steps: checkpoint.train_steps,
            skipped_steps: resume.skipped_steps,
            target_syncs: resume.target_syncs,
            loss_sum: resume.loss_sum,
            loss_count: resume.loss_count,
        };
        info!(
            episodes = checkpoint.episodes,
            train_steps = checkpoint.train_steps,
            replay = self.replay.total_len(),
            "dqn trainer restored"
        );
        Ok(())
    }

    /// Greedy agent playing with `player`'s current online network.
    pub fn agent_for(&self, player: PlayerId) -> DQNAgent<G, E, Q>
    where
        E: Clone,
    {
        DQNAgent::new(self.game.clone(), self.encoder.clone(), self.online(player).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::dqn::EpsilonSchedule;
    use crate::games::{Nim, NimEncoder, Take};
    use crate::nn::LinearQFunction;
    use crate::training::ReplaySharing;

    fn trainer(config: DQNConfig) -> DQNTrainer<Nim, NimEncoder, LinearQFunction> {
        let game = Nim::new(2, 3);
        let encoder = NimEncoder::new(&game, 10);
        let q = LinearQFunction::new(encoder.feature_count(), encoder.action_count(), 5);
        DQNTrainer::new(game, encoder, q, config).unwrap()
    }

    fn small_config() -> DQNConfig {
        DQNConfig::default()
            .with_replay(1_000, 8)
            .with_batch_size(8)
            .with_target_update_frequency(5)
            .with_epsilon(1.0, 0.1, 200)
    }

    #[test]
    fn test_rejects_per_player_network_with_shared_replay() {
        let game = Nim::new(2, 3);
        let encoder = NimEncoder::new(&game, 10);
        let q = LinearQFunction::zeros(encoder.feature_count(), encoder.action_count());
        let config = DQNConfig::default().with_sharing(NetworkSharing::PerPlayer, ReplaySharing::Shared);
        let err = DQNTrainer::new(game, encoder, q, config).err().unwrap();
        assert!(matches!(err, TrainingError::Config(_)));
    }

    #[test]
    fn test_rejects_mismatched_network() {
        let game = Nim::new(2, 3);
        let encoder = NimEncoder::new(&game, 10);
        let q = LinearQFunction::zeros(3, encoder.action_count());
        let err = DQNTrainer::new(game, encoder, q, DQNConfig::default()).err().unwrap();
        assert!(matches!(err, TrainingError::Config(_)));
    }

    #[test]
    fn test_underflow_skips_training() {
        let mut trainer = trainer(DQNConfig::default().with_replay(1_000, 500));
        let report = trainer.train(&Nim::new(2, 3).initial_state(10), 3).unwrap();

        assert_eq!(report.episodes, 3);
        assert_eq!(report.train_steps, 0);
        assert_eq!(report.skipped_steps, report.env_steps);
        assert_eq!(report.mean_loss, None);
        assert_eq!(trainer.phase(), TrainerPhase::Idle);
    }

    #[test]
    fn test_target_syncs_on_schedule() {
        let mut trainer = trainer(small_config());
        let report = trainer.train(&Nim::new(2, 3).initial_state(10), 20).unwrap();

        assert!(report.train_steps > 0);
        assert_eq!(report.train_steps + report.skipped_steps, report.env_steps);
        assert_eq!(report.target_syncs, report.train_steps / 5);
        assert!(report.mean_loss.is_some());
        assert_eq!(trainer.learners()[0].train_steps(), report.train_steps);
    }

    #[test]
    fn test_training_is_deterministic() {
        let initial = Nim::new(2, 3).initial_state(10);
        let mut a = trainer(small_config().with_seed(11));
        let mut b = trainer(small_config().with_seed(11));
        a.train(&initial, 15).unwrap();
        b.train(&initial, 15).unwrap();

        assert_eq!(a.report(), b.report());
        assert_eq!(a.online(PlayerId::new(0)), b.online(PlayerId::new(0)));
    }

    #[test]
    fn test_stop_token_halts_before_next_episode() {
        let mut trainer = trainer(small_config());
        trainer.stop_token().cancel();
        let report = trainer.train(&Nim::new(2, 3).initial_state(10), 50).unwrap();
        assert_eq!(report.episodes, 0);
        assert_eq!(trainer.phase(), TrainerPhase::Idle);
    }

    #[test]
    fn test_per_player_networks_train_separately() {
        let config = small_config().with_sharing(NetworkSharing::PerPlayer, ReplaySharing::PerPlayer);
        let mut trainer = trainer(config);
        trainer.train(&Nim::new(2, 3).initial_state(10), 20).unwrap();

        assert_eq!(trainer.learners().len(), 2);
        assert_eq!(trainer.replay().buffers().len(), 2);
        assert!(trainer.learners().iter().all(|l| l.train_steps() > 0));
        assert_ne!(trainer.online(PlayerId::new(0)), trainer.online(PlayerId::new(1)));
    }

    #[test]
    fn test_concurrent_training_accounts_every_step() {
        let config = small_config().with_producer_threads(3);
        let mut trainer = trainer(config);
        let report = trainer
            .train_concurrent(&Nim::new(2, 3).initial_state(10), 12)
            .unwrap();

        assert_eq!(report.episodes, 12);
        assert_eq!(trainer.replay().total_len() as u64, report.env_steps);
        assert_eq!(report.train_steps + report.skipped_steps, report.env_steps);
        assert_eq!(trainer.phase(), TrainerPhase::Idle);
    }

    #[test]
    fn test_learns_immediate_win() {
        let config = DQNConfig::default()
            .with_discount(0.9)
            .with_replay(2_000, 16)
            .with_batch_size(16)
            .with_learning_rate(0.1)
            .with_target_update_frequency(20)
            .with_epsilon(1.0, 0.2, 400)
            .with_schedule(EpsilonSchedule::Linear);
        let mut trainer = trainer(config);
        let game = Nim::new(2, 3);
        trainer.train(&game.initial_state(3), 400).unwrap();

        let mut agent = trainer.agent_for(PlayerId::new(0));
        assert_eq!(agent.decide(&game.initial_state(3)).unwrap(), Take(3));
    }

    #[test]
    fn test_checkpoint_restores_networks() {
        let initial = Nim::new(2, 3).initial_state(10);
        let mut source = trainer(small_config());
        source.train(&initial, 10).unwrap();
        let checkpoint = source.checkpoint().unwrap();

        let mut resumed = trainer(small_config().with_seed(99));
        resumed.restore_checkpoint(&checkpoint).unwrap();
        assert_eq!(resumed.online(PlayerId::new(0)), source.online(PlayerId::new(0)));
        assert_eq!(resumed.learners()[0].target(), source.learners()[0].target());
        assert_eq!(resumed.learners()[0].train_steps(), source.learners()[0].train_steps());
        assert_eq!(resumed.replay().buffers()[0].to_vec(), source.replay().buffers()[0].to_vec());

        let report = resumed.report();
        assert_eq!(report, source.report());
        assert!(report.target_syncs > 0);
        assert_eq!(report.target_syncs, report.train_steps / 5);
    }

    #[test]
    fn test_resume_matches_uninterrupted_run() {
        let initial = Nim::new(2, 3).initial_state(10);
        let mut straight = trainer(small_config());
        straight.train(&initial, 20).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dqn.ckpt");
        let mut first = trainer(small_config());
        first.train(&initial, 10).unwrap();
        first.save_checkpoint(&path).unwrap();

        let mut resumed = trainer(small_config().with_seed(99));
        resumed.restore_checkpoint(&Checkpoint::load(&path).unwrap()).unwrap();
        resumed.train(&initial, 10).unwrap();

        assert_eq!(resumed.report(), straight.report());
        assert_eq!(resumed.online(PlayerId::new(0)), straight.online(PlayerId::new(0)));
        assert_eq!(resumed.learners()[0].target(), straight.learners()[0].target());
        assert_eq!(resumed.replay().total_len(), straight.replay().total_len());
    }

    #[test]
    fn test_restore_rejects_other_replay_layout() {
        let initial = Nim::new(2, 3).initial_state(10);
        let mut source = trainer(small_config());
        source.train(&initial, 2).unwrap();
        let checkpoint = source.checkpoint().unwrap();

        let config = small_config().with_sharing(NetworkSharing::Shared, ReplaySharing::PerPlayer);
        let mut other = trainer(config);
        assert!(matches!(
            other.restore_checkpoint(&checkpoint),
            Err(TrainingError::Checkpoint(CheckpointError::Incompatible(_)))
        ));
    }

    #[test]
    fn test_truncated_episode_leaves_replay_untouched() {
        let mut trainer = trainer(small_config().with_max_episode_moves(2));
        let report = trainer.train(&Nim::new(2, 3).initial_state(10), 4).unwrap();

        assert_eq!(report.episodes, 0);
        assert_eq!(report.truncated_episodes, 4);
        assert_eq!(report.env_steps, 8);
        assert_eq!(trainer.replay().total_len(), 0);
    }
}
