//! Simulation session - runs the clock and serializes every command
//!
//! `Simulation` is a cheap clonable handle. All state sits behind one
//! `parking_lot::Mutex`, so a tick and an input command never interleave.
//! The lock is never held across an `.await`; async tasks hand off to
//! plain functions that lock, mutate, publish and return.
//!
//! Two kinds of background task exist:
//! - the clock ticker, tagged with a clock epoch so a ticker left over
//!   from an earlier start exits on its next wakeup
//! - the deferred wave advance, a `sleep` that carries the game loop's
//!   `AdvanceToken` and is aborted on stop, reset and game over

use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::{ConfigError, SimConfig};
use crate::game::events::{EventFeed, EventReceiver};
use crate::game::game_loop::{AdvanceToken, GameLoop, GameLoopConfig, GameLoopEvent};
use crate::game::skills::SkillId;
use crate::game::snapshot::SimulationSnapshot;
use crate::metrics::Metrics;

/// Mutable session state guarded by the mutex
struct Session {
    game_loop: GameLoop,
    running: bool,
    /// Bumped whenever the clock starts or halts
    clock_epoch: u64,
    ticker: Option<JoinHandle<()>>,
    advance: Option<JoinHandle<()>>,
}

impl Session {
    /// Stop the clock and drop any pending wave advance
    ///
    /// `abort_ticker` is false when called from inside the ticker itself;
    /// the ticker then notices the epoch change and exits on its own.
    fn halt(&mut self, abort_ticker: bool) {
        self.running = false;
        self.clock_epoch += 1;
        if let Some(ticker) = self.ticker.take() {
            if abort_ticker {
                ticker.abort();
            }
        }
        self.cancel_advance();
    }

    fn cancel_advance(&mut self) {
        if let Some(advance) = self.advance.take() {
            advance.abort();
        }
        if let Some(token) = self.game_loop.cancel_pending_advance() {
            debug!("Cancelled pending wave advance {:?}", token);
        }
    }
}

/// State shared with background tasks that never needs the lock
struct Shared {
    config: SimConfig,
    metrics: Arc<Metrics>,
    events: EventFeed,
    snapshots: watch::Sender<SimulationSnapshot>,
}

impl Shared {
    /// Push events to the feed and refresh the snapshot
    fn publish(&self, session: &Session, events: Vec<GameLoopEvent>) {
        let game_loop = &session.game_loop;
        if !events.is_empty() {
            self.metrics.record_events(&events);
            let dropped =
                self.events
                    .publish_all(game_loop.generation(), game_loop.state().tick, events);
            self.metrics.record_dropped_events(dropped);
        }
        self.snapshots
            .send_replace(SimulationSnapshot::capture(game_loop, session.running));
    }
}

/// Shared handle to one running simulation
///
/// `start`, `reset` and any command that may schedule work spawn tokio
/// tasks and must be called from within a tokio runtime.
#[derive(Clone)]
pub struct Simulation {
    session: Arc<Mutex<Session>>,
    shared: Arc<Shared>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let game_loop = GameLoop::new(GameLoopConfig::from(&config));
        let (snapshots, _) = watch::channel(SimulationSnapshot::capture(&game_loop, false));
        let shared = Arc::new(Shared {
            events: EventFeed::new(config.event_feed_capacity),
            metrics: Arc::new(Metrics::new()),
            snapshots,
            config,
        });

        let session = Session {
            game_loop,
            running: false,
            clock_epoch: 0,
            ticker: None,
            advance: None,
        };

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            shared,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.shared.config
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.shared.metrics.clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SimulationSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    /// Watch snapshots as they are published
    pub fn subscribe(&self) -> watch::Receiver<SimulationSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Receive game loop events
    pub fn events(&self) -> EventReceiver {
        self.shared.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.session.lock().running
    }

    /// Stopped -> Running
    ///
    /// Spawns the first wave if none exists yet. Returns false (no-op) if
    /// the clock is already running or the game is over.
    pub fn start(&self) -> bool {
        let mut session = self.session.lock();
        if session.running || session.game_loop.state().game_over {
            return false;
        }

        let events = session.game_loop.begin();
        self.start_clock(&mut session);
        info!(
            "Simulation clock started at {} Hz (generation {})",
            self.shared.config.tick_rate,
            session.game_loop.generation()
        );
        self.shared.publish(&session, events);
        true
    }

    /// Running -> Stopped; returns false if already stopped
    ///
    /// A pending wave advance is cancelled; the next tick after a restart
    /// schedules it again.
    pub fn stop(&self) -> bool {
        let mut session = self.session.lock();
        if !session.running {
            return false;
        }
        session.halt(true);
        info!("Simulation clock stopped at tick {}", session.game_loop.state().tick);
        self.shared.publish(&session, Vec::new());
        true
    }

    /// Replace the simulation with a fresh generation and restart the clock
    pub fn reset(&self) {
        let mut session = self.session.lock();
        session.halt(true);
        let events = session.game_loop.reset();
        self.shared.metrics.record_reset();
        self.start_clock(&mut session);
        self.shared.publish(&session, events);
    }

    pub fn submit_word(&self, text: &str) -> Vec<GameLoopEvent> {
        self.command(|game_loop| game_loop.submit_word(text))
    }

    /// Submit the pending input buffer
    pub fn submit_input(&self) -> Vec<GameLoopEvent> {
        self.command(GameLoop::submit_input)
    }

    pub fn push_char(&self, c: char) -> Vec<GameLoopEvent> {
        self.command(|game_loop| game_loop.push_char(c))
    }

    pub fn backspace(&self) {
        self.command(|game_loop| {
            game_loop.backspace();
            Vec::new()
        });
    }

    pub fn choose_skill(&self, id: SkillId) -> Vec<GameLoopEvent> {
        self.command(|game_loop| game_loop.choose_skill(id))
    }

    pub fn offer_skills(&self) -> Vec<GameLoopEvent> {
        self.command(GameLoop::offer_skills)
    }

    /// Route damage through the player (shield, game over)
    pub fn apply_damage(&self, amount: f32) -> Vec<GameLoopEvent> {
        self.command(|game_loop| game_loop.apply_damage(amount))
    }

    pub fn set_arena_dimensions(&self, width: f32, height: f32) {
        self.command(|game_loop| {
            game_loop.set_arena_dimensions(width, height);
            Vec::new()
        });
    }

    /// Run one command under the lock, halting on game over, and publish
    fn command<F>(&self, f: F) -> Vec<GameLoopEvent>
    where
        F: FnOnce(&mut GameLoop) -> Vec<GameLoopEvent>,
    {
        let mut session = self.session.lock();
        let events = f(&mut session.game_loop);
        if session.game_loop.state().game_over && (session.running || session.advance.is_some()) {
            session.halt(true);
            info!("Simulation clock halted by game over");
        }
        self.shared.publish(&session, events.clone());
        events
    }

    fn start_clock(&self, session: &mut Session) {
        session.running = true;
        session.clock_epoch += 1;
        let epoch = session.clock_epoch;
        let weak = Arc::downgrade(&self.session);
        let shared = self.shared.clone();
        session.ticker = Some(tokio::spawn(run_clock(weak, shared, epoch)));
    }
}

/// Clock task: one `on_tick` per interval until the epoch changes
async fn run_clock(session: Weak<Mutex<Session>>, shared: Arc<Shared>, epoch: u64) {
    let mut ticker = interval(shared.config.tick_duration());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(strong) = session.upgrade() else {
            break;
        };
        if !on_tick(&strong, &shared, epoch) {
            break;
        }
    }
    debug!("Clock task for epoch {} exited", epoch);
}

/// Run one tick under the lock; returns false once this clock is stale
fn on_tick(session_lock: &Arc<Mutex<Session>>, shared: &Arc<Shared>, epoch: u64) -> bool {
    let mut session = session_lock.lock();
    if !session.running || session.clock_epoch != epoch {
        return false;
    }

    let started = Instant::now();
    let events = session.game_loop.tick();
    shared.metrics.record_tick_time(started.elapsed());

    for event in &events {
        if let GameLoopEvent::WaveCleared { wave, token } = event {
            debug!("Wave {} cleared; advancing in {:?}", wave, shared.config.wave_advance_delay());
            schedule_advance(&mut session, session_lock, shared, *token);
        }
    }

    if session.game_loop.state().game_over {
        session.halt(false);
        info!("Simulation clock halted by game over");
    }

    let still_running = session.running;
    shared.publish(&session, events);
    still_running
}

/// Spawn the delayed wave advance for `token`
fn schedule_advance(
    session: &mut Session,
    session_lock: &Arc<Mutex<Session>>,
    shared: &Arc<Shared>,
    token: AdvanceToken,
) {
    if let Some(previous) = session.advance.take() {
        previous.abort();
    }
    let weak = Arc::downgrade(session_lock);
    let shared = shared.clone();
    let delay = shared.config.wave_advance_delay();

    session.advance = Some(tokio::spawn(async move {
        sleep(delay).await;
        if let Some(session) = weak.upgrade() {
            apply_advance(&session, &shared, token);
        }
    }));
}

fn apply_advance(session_lock: &Arc<Mutex<Session>>, shared: &Shared, token: AdvanceToken) {
    let mut session = session_lock.lock();
    if session.game_loop.pending_advance() != Some(token) {
        // Woke up after being superseded; the tracked handle belongs to a newer task
        debug!("Discarding stale wave advance {:?}", token);
        return;
    }
    session.advance = None;

    let events = session.game_loop.apply_wave_advance(token);
    if !events.is_empty() {
        shared.publish(&session, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn create_test_simulation() -> Simulation {
        // Tall arena so nothing reaches the player during a test
        tokio_test::assert_ok!(Simulation::new(SimConfig {
            arena_width: 2000.0,
            arena_height: 2000.0,
            rng_seed: Some(7),
            ..SimConfig::default()
        }))
    }

    fn clear_wave(sim: &Simulation) {
        let words: Vec<String> = sim
            .snapshot()
            .adversaries
            .iter()
            .map(|a| a.word.clone())
            .collect();
        for word in words {
            sim.submit_word(&word);
        }
        assert!(sim.snapshot().adversaries.is_empty());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = Simulation::new(SimConfig {
            tick_rate: 0,
            ..SimConfig::default()
        });
        assert!(matches!(result, Err(ConfigError::ZeroTickRate)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_runs_at_tick_rate() {
        let sim = create_test_simulation();
        assert!(sim.start());
        assert_eq!(sim.snapshot().adversaries.len(), 4);

        sleep(Duration::from_millis(1000)).await;
        let tick = sim.snapshot().tick;
        assert!((55..=61).contains(&tick), "tick = {}", tick);
        assert!(sim.snapshot().running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_noop_when_running() {
        let sim = create_test_simulation();
        assert!(sim.start());
        assert!(!sim.start());

        sleep(Duration::from_millis(500)).await;
        // A second ticker would double the rate
        assert!(sim.snapshot().tick <= 31);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let sim = create_test_simulation();
        sim.start();
        sleep(Duration::from_millis(200)).await;

        assert!(sim.stop());
        let after_first = sim.snapshot();
        assert!(!sim.stop());
        assert_eq!(sim.snapshot(), after_first);
        assert!(!sim.is_running());

        sleep(Duration::from_millis(500)).await;
        assert_eq!(sim.snapshot().tick, after_first.tick);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wave_advances_after_delay() {
        let sim = create_test_simulation();
        sim.start();
        clear_wave(&sim);

        sleep(Duration::from_millis(100)).await;
        let snapshot = sim.snapshot();
        assert!(snapshot.advance_pending);
        assert_eq!(snapshot.wave, 1);

        sleep(Duration::from_millis(1800)).await;
        assert_eq!(sim.snapshot().wave, 1);

        sleep(Duration::from_millis(300)).await;
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.wave, 2);
        assert_eq!(snapshot.adversaries.len(), 5);
        assert!(!snapshot.advance_pending);
        assert!(!snapshot.available_skills.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_during_pending_advance() {
        let sim = create_test_simulation();
        sim.start();
        clear_wave(&sim);
        sleep(Duration::from_millis(100)).await;
        assert!(sim.snapshot().advance_pending);

        sim.reset();
        sleep(Duration::from_millis(3000)).await;

        let snapshot = sim.snapshot();
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.wave, 1);
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.adversaries.len(), 4);
        assert!(snapshot.running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_advance_and_restart_reschedules() {
        let sim = create_test_simulation();
        sim.start();
        clear_wave(&sim);
        sleep(Duration::from_millis(100)).await;

        sim.stop();
        assert!(!sim.snapshot().advance_pending);
        sleep(Duration::from_millis(3000)).await;
        assert_eq!(sim.snapshot().wave, 1);

        sim.start();
        sleep(Duration::from_millis(2200)).await;
        assert_eq!(sim.snapshot().wave, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_game_over_stops_clock() {
        let sim = create_test_simulation();
        sim.start();
        sleep(Duration::from_millis(100)).await;

        let events = sim.apply_damage(150.0);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameLoopEvent::GameOver { .. })));

        let snapshot = sim.snapshot();
        assert!(snapshot.game_over);
        assert!(!snapshot.running);
        assert_eq!(snapshot.player.hp, 0.0);

        assert!(!sim.start());
        sleep(Duration::from_millis(500)).await;
        assert_eq!(sim.snapshot().tick, snapshot.tick);

        // Terminal until reset
        sim.reset();
        assert!(!sim.snapshot().game_over);
        assert!(sim.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_game_over_cancels_pending_advance() {
        let sim = create_test_simulation();
        sim.start();
        clear_wave(&sim);
        sleep(Duration::from_millis(100)).await;

        sim.apply_damage(500.0);
        sleep(Duration::from_millis(3000)).await;
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.wave, 1);
        assert!(snapshot.adversaries.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_and_snapshots_published() {
        let sim = create_test_simulation();
        let events = sim.events();
        let mut snapshots = sim.subscribe();

        sim.start();
        snapshots.changed().await.unwrap();
        assert!(snapshots.borrow().running);

        let drained = events.drain();
        assert!(drained
            .iter()
            .any(|e| e.event == GameLoopEvent::WaveStarted { wave: 1, count: 4 }));

        sim.submit_word("definitely-not-a-word");
        let drained = events.drain();
        assert!(drained
            .iter()
            .any(|e| matches!(e.event, GameLoopEvent::Miss { .. })));
        assert_eq!(
            sim.metrics()
                .words_missed
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_subscriber_gets_current_events() {
        let sim = tokio_test::assert_ok!(Simulation::new(SimConfig {
            arena_width: 2000.0,
            arena_height: 2000.0,
            rng_seed: Some(7),
            event_feed_capacity: 4,
            ..SimConfig::default()
        }));
        sim.start();
        for i in 0..20 {
            sim.submit_word(&format!("nope{}", i));
        }

        let first = sim.events();
        let second = sim.events();
        sim.submit_word("late");

        for receiver in [&first, &second] {
            let events: Vec<_> = receiver.drain().into_iter().map(|e| e.event).collect();
            assert_eq!(
                events,
                vec![GameLoopEvent::Miss {
                    text: "late".to_string()
                }]
            );
        }
        assert_eq!(
            sim.metrics()
                .events_dropped
                .load(std::sync::atomic::Ordering::Relaxed),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_advance_keeps_newer_handle() {
        let sim = create_test_simulation();
        let events = sim.events();
        sim.start();
        clear_wave(&sim);
        sleep(Duration::from_millis(100)).await;
        let stale = events
            .drain()
            .iter()
            .find_map(|e| match e.event {
                GameLoopEvent::WaveCleared { token, .. } => Some(token),
                _ => None,
            })
            .unwrap();

        sim.stop();
        sim.start();
        sleep(Duration::from_millis(100)).await;
        assert!(sim.snapshot().advance_pending);

        // Same generation, older sequence: must not touch the newer task
        apply_advance(&sim.session, &sim.shared, stale);
        assert!(sim.session.lock().advance.is_some());
        assert_eq!(sim.snapshot().wave, 1);

        // The newer task is still abortable
        sim.stop();
        sleep(Duration::from_millis(3000)).await;
        assert_eq!(sim.snapshot().wave, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_commands_refresh_snapshot() {
        let sim = create_test_simulation();
        sim.start();

        sim.push_char('a');
        sim.push_char('b');
        sim.backspace();
        assert_eq!(sim.snapshot().input, "a");

        sim.submit_input();
        let snapshot = sim.snapshot();
        assert!(snapshot.input.is_empty());
        assert_eq!(snapshot.combo, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_arena_dimensions_moves_player() {
        let sim = create_test_simulation();
        sim.set_arena_dimensions(1000.0, 700.0);
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.player.position.x, 500.0);
        assert_eq!(snapshot.player.position.y, 640.0);
    }
}
