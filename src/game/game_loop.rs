//! Game loop - owns the simulation state and runs the tick pipeline
//!
//! Each tick runs Movement -> PassiveSkillHooks -> WaveCheck in that
//! order. Every system works on the owned `SimulationState` and reports
//! what happened; the loop turns those reports into `GameLoopEvent`s.
//!
//! The loop itself has no notion of time. The wave-advance delay is
//! scheduled by the caller from the `WaveCleared` event and comes back
//! through `apply_wave_advance` carrying the token it was issued, so a
//! stale timer from an older generation (or a cancelled one) is a no-op.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::game::skills::SkillId;
use crate::game::state::{AdversaryId, Arena, SimulationState};
use crate::game::systems::combat::{self, DamageOutcome, SubmitOutcome};
use crate::game::systems::{aura, freeze, movement, wave};

/// Game loop configuration
#[derive(Debug, Clone)]
pub struct GameLoopConfig {
    pub arena_width: f32,
    pub arena_height: f32,
    /// Fixed seed for reproducible runs; `None` seeds from entropy
    pub rng_seed: Option<u64>,
    /// Lifesteal cooldown in ticks (0 = heal on every defeat)
    pub lifesteal_cooldown_ticks: u64,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            arena_width: 800.0,
            arena_height: 600.0,
            rng_seed: None,
            lifesteal_cooldown_ticks: 0,
        }
    }
}

impl From<&SimConfig> for GameLoopConfig {
    fn from(config: &SimConfig) -> Self {
        Self {
            arena_width: config.arena_width,
            arena_height: config.arena_height,
            rng_seed: config.rng_seed,
            lifesteal_cooldown_ticks: config.lifesteal_cooldown_ticks(),
        }
    }
}

/// Ticket for one scheduled wave advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdvanceToken {
    /// Simulation generation the advance was scheduled in
    pub generation: u64,
    /// Distinguishes re-schedules within one generation
    pub sequence: u64,
}

/// Events produced by the game loop
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameLoopEvent {
    WaveStarted {
        wave: u32,
        count: usize,
    },
    /// Live collection emptied; the caller should schedule `token`
    WaveCleared {
        wave: u32,
        token: AdvanceToken,
    },
    AdversaryDefeated {
        id: AdversaryId,
        word: String,
        score_gained: u64,
        combo: u32,
    },
    ChainSplash {
        target: AdversaryId,
        damage: f32,
        killed: bool,
    },
    PlayerHealed {
        amount: f32,
        hp: f32,
    },
    Miss {
        text: String,
    },
    Overrun {
        count: usize,
        damage: f32,
    },
    ShieldAbsorbed {
        amount: f32,
    },
    PlayerDamaged {
        amount: f32,
        hp: f32,
    },
    AuraKills {
        count: usize,
    },
    Frozen {
        count: usize,
    },
    SkillsOffered {
        skills: Vec<SkillId>,
    },
    SkillChosen {
        skill: SkillId,
    },
    GameOver {
        score: u64,
        wave: u32,
    },
}

/// Owned simulation plus its pipeline
pub struct GameLoop {
    state: SimulationState,
    config: GameLoopConfig,
    rng: StdRng,
    /// Bumped on every reset
    generation: u64,
    pending_advance: Option<AdvanceToken>,
    next_advance_sequence: u64,
}

impl GameLoop {
    pub fn new(config: GameLoopConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let arena = Arena::new(config.arena_width, config.arena_height);
        let state = Self::fresh_state(&config, arena);

        Self {
            state,
            config,
            rng,
            generation: 0,
            pending_advance: None,
            next_advance_sequence: 0,
        }
    }

    fn fresh_state(config: &GameLoopConfig, arena: Arena) -> SimulationState {
        let mut state = SimulationState::new(arena);
        state.skill_runtime.lifesteal_cooldown_ticks = config.lifesteal_cooldown_ticks;
        state
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending_advance(&self) -> Option<AdvanceToken> {
        self.pending_advance
    }

    /// Spawn the first wave if this simulation has none yet
    pub fn begin(&mut self) -> Vec<GameLoopEvent> {
        if self.state.game_over || self.state.waves_spawned > 0 {
            return Vec::new();
        }
        let wave_number = self.state.wave;
        let count = wave::spawn(&mut self.state, wave_number, &mut self.rng);
        vec![GameLoopEvent::WaveStarted {
            wave: wave_number,
            count,
        }]
    }

    /// Run one tick of the pipeline
    pub fn tick(&mut self) -> Vec<GameLoopEvent> {
        let mut events = Vec::new();
        if self.state.game_over {
            return events;
        }
        self.state.tick += 1;

        // Movement
        let moved = movement::update(&mut self.state);
        if !moved.is_empty() {
            events.push(GameLoopEvent::Overrun {
                count: moved.arrived.len(),
                damage: moved.overrun_damage,
            });
            self.route_damage(moved.overrun_damage, &mut events);
            if self.state.game_over {
                return events;
            }
        }

        // Passive skill hooks
        let burned = aura::update(&mut self.state);
        if !burned.killed.is_empty() {
            events.push(GameLoopEvent::AuraKills {
                count: burned.killed.len(),
            });
        }

        // Wave check
        if self.pending_advance.is_none() && wave::is_cleared(&self.state) {
            let token = AdvanceToken {
                generation: self.generation,
                sequence: self.next_advance_sequence,
            };
            self.next_advance_sequence += 1;
            self.pending_advance = Some(token);
            debug!("Wave {} cleared, advance scheduled", self.state.wave);
            events.push(GameLoopEvent::WaveCleared {
                wave: self.state.wave,
                token,
            });
        }

        events
    }

    /// Damage funnel shared by every damage source
    fn route_damage(&mut self, amount: f32, events: &mut Vec<GameLoopEvent>) {
        match combat::apply_damage(&mut self.state, amount) {
            DamageOutcome::Ignored => {}
            DamageOutcome::Absorbed { amount } => {
                events.push(GameLoopEvent::ShieldAbsorbed { amount });
            }
            DamageOutcome::Applied { amount, hp } => {
                events.push(GameLoopEvent::PlayerDamaged { amount, hp });
            }
            DamageOutcome::Fatal { amount } => {
                events.push(GameLoopEvent::PlayerDamaged { amount, hp: 0.0 });
                self.pending_advance = None;
                info!(
                    "Game over at wave {} with score {}",
                    self.state.wave, self.state.score
                );
                events.push(GameLoopEvent::GameOver {
                    score: self.state.score,
                    wave: self.state.wave,
                });
            }
        }
    }

    /// Apply external damage (e.g. from a scripted source) through the funnel
    pub fn apply_damage(&mut self, amount: f32) -> Vec<GameLoopEvent> {
        let mut events = Vec::new();
        self.route_damage(amount, &mut events);
        events
    }

    /// Resolve a submitted word
    pub fn submit_word(&mut self, text: &str) -> Vec<GameLoopEvent> {
        let mut events = Vec::new();
        match combat::submit_word(&mut self.state, text, &mut self.rng) {
            SubmitOutcome::Empty | SubmitOutcome::Ignored => {}
            SubmitOutcome::Miss { text } => events.push(GameLoopEvent::Miss { text }),
            SubmitOutcome::Defeated(defeat) => {
                events.push(GameLoopEvent::AdversaryDefeated {
                    id: defeat.adversary.id,
                    word: defeat.adversary.word,
                    score_gained: defeat.score_gained,
                    combo: defeat.combo,
                });
                if let Some(splash) = defeat.chain {
                    events.push(GameLoopEvent::ChainSplash {
                        target: splash.target,
                        damage: splash.damage,
                        killed: splash.killed,
                    });
                }
                if defeat.healed > 0.0 {
                    events.push(GameLoopEvent::PlayerHealed {
                        amount: defeat.healed,
                        hp: self.state.player.hp,
                    });
                }
            }
        }
        events
    }

    /// Submit whatever is in the pending input buffer
    pub fn submit_input(&mut self) -> Vec<GameLoopEvent> {
        if self.state.game_over {
            return Vec::new();
        }
        let text = std::mem::take(&mut self.state.input);
        self.submit_word(&text)
    }

    /// Append a typed character to the pending input
    ///
    /// The first character of a new word is the "typing begins" trigger for
    /// ice shatter.
    pub fn push_char(&mut self, c: char) -> Vec<GameLoopEvent> {
        if self.state.game_over {
            return Vec::new();
        }
        let starting = self.state.input.is_empty();
        self.state.input.push(c);

        if starting {
            let count = freeze::trigger(&mut self.state);
            if count > 0 {
                return vec![GameLoopEvent::Frozen { count }];
            }
        }
        Vec::new()
    }

    /// Remove the last typed character
    pub fn backspace(&mut self) {
        if !self.state.game_over {
            self.state.input.pop();
        }
    }

    /// Offer new skills for the current wave
    pub fn offer_skills(&mut self) -> Vec<GameLoopEvent> {
        if self.state.game_over {
            return Vec::new();
        }
        let offered = self.state.skills.offer(self.state.wave);
        if offered.is_empty() {
            return Vec::new();
        }
        vec![GameLoopEvent::SkillsOffered {
            skills: offered.to_vec(),
        }]
    }

    /// Activate an offered skill; anything else is a no-op
    pub fn choose_skill(&mut self, id: SkillId) -> Vec<GameLoopEvent> {
        if !self.state.skills.choose(id) {
            return Vec::new();
        }
        if id == SkillId::ShieldBarrier {
            self.state.skill_runtime.shield_charge = true;
        }
        info!("Skill chosen: {}", id);
        vec![GameLoopEvent::SkillChosen { skill: id }]
    }

    pub fn set_arena_dimensions(&mut self, width: f32, height: f32) {
        self.state.set_arena_dimensions(width, height);
    }

    /// Drop the pending advance so a timer carrying its token does nothing
    pub fn cancel_pending_advance(&mut self) -> Option<AdvanceToken> {
        self.pending_advance.take()
    }

    /// Apply a scheduled wave advance
    ///
    /// No-op unless `token` is the one currently pending, the game is still
    /// running and the wave is still cleared.
    pub fn apply_wave_advance(&mut self, token: AdvanceToken) -> Vec<GameLoopEvent> {
        if self.pending_advance != Some(token) {
            debug!("Discarding stale wave advance {:?}", token);
            return Vec::new();
        }
        self.pending_advance = None;

        if self.state.game_over || !wave::is_cleared(&self.state) {
            return Vec::new();
        }

        let advanced = wave::advance(&mut self.state, &mut self.rng);
        info!(
            "Wave {} started: {} adversaries, player {:.1}/{:.1} hp",
            advanced.wave, advanced.spawned, self.state.player.hp, self.state.player.max_hp
        );

        let mut events = Vec::new();
        if advanced.healed > 0.0 {
            events.push(GameLoopEvent::PlayerHealed {
                amount: advanced.healed,
                hp: self.state.player.hp,
            });
        }
        events.push(GameLoopEvent::WaveStarted {
            wave: advanced.wave,
            count: advanced.spawned,
        });
        events.extend(self.offer_skills());
        events
    }

    /// Replace the whole simulation with a fresh one and spawn wave 1
    pub fn reset(&mut self) -> Vec<GameLoopEvent> {
        self.generation += 1;
        self.pending_advance = None;
        self.next_advance_sequence = 0;
        self.state = Self::fresh_state(&self.config, self.state.arena);
        info!("Simulation reset (generation {})", self.generation);
        self.begin()
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new(GameLoopConfig::default())
    }
}
