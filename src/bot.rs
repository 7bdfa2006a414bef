//! Autotyper used by the headless runner
//!
//! Picks a random live word, types it one character at a time at the
//! configured words-per-minute rate and submits it. A configurable share of
//! words is deliberately mistyped. Any skill on offer is taken right away.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::BotConfig;
use crate::game::session::Simulation;
use crate::game::skills::SkillId;
use crate::game::snapshot::SimulationSnapshot;

/// Average characters per word used for WPM conversion
const CHARS_PER_WORD: f64 = 5.0;

/// What the bot does on its next keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    Idle,
    Choose(SkillId),
    Type(char),
    Submit,
}

pub struct AutoTyper {
    config: BotConfig,
    rng: StdRng,
    /// Word currently being typed (possibly mangled)
    target: Option<String>,
    /// Live word `target` was derived from
    source: Option<String>,
    typed: usize,
}

impl AutoTyper {
    pub fn new(config: BotConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            target: None,
            source: None,
            typed: 0,
        }
    }

    /// Delay between two keystrokes
    pub fn keystroke_interval(&self) -> Duration {
        let chars_per_second = self.config.words_per_minute * CHARS_PER_WORD / 60.0;
        Duration::from_secs_f64(1.0 / chars_per_second)
    }

    /// Decide the next action from the latest snapshot
    pub fn next_action(&mut self, snapshot: &SimulationSnapshot) -> BotAction {
        if snapshot.game_over {
            self.abandon();
            return BotAction::Idle;
        }
        if let Some(&skill) = snapshot.available_skills.first() {
            return BotAction::Choose(skill);
        }

        // Target died under us (chain, aura or overrun)
        let still_live = self
            .source
            .as_ref()
            .is_some_and(|word| snapshot.adversaries.iter().any(|a| &a.word == word));
        if !still_live || !snapshot.input.starts_with(self.typed_prefix()) {
            self.abandon();
            if !snapshot.input.is_empty() {
                return BotAction::Submit;
            }
            if !self.pick_target(snapshot) {
                return BotAction::Idle;
            }
        }

        let Some(target) = self.target.as_deref() else {
            return BotAction::Idle;
        };
        match target.chars().nth(self.typed) {
            Some(c) => {
                self.typed += 1;
                BotAction::Type(c)
            }
            None => {
                self.abandon();
                BotAction::Submit
            }
        }
    }

    fn typed_prefix(&self) -> &str {
        match &self.target {
            Some(target) => {
                let end = target
                    .char_indices()
                    .nth(self.typed)
                    .map_or(target.len(), |(i, _)| i);
                &target[..end]
            }
            None => "",
        }
    }

    fn pick_target(&mut self, snapshot: &SimulationSnapshot) -> bool {
        if snapshot.adversaries.is_empty() {
            return false;
        }
        let index = self.rng.gen_range(0..snapshot.adversaries.len());
        let word = snapshot.adversaries[index].word.clone();

        let typed = if self.rng.gen_bool(self.config.miss_rate) {
            // Doubling the last letter never matches a list word exactly
            let mut mangled = word.clone();
            if let Some(last) = word.chars().last() {
                mangled.push(last);
            }
            mangled
        } else {
            word.clone()
        };
        debug!("Bot targeting '{}' (typing '{}')", word, typed);

        self.source = Some(word);
        self.target = Some(typed);
        self.typed = 0;
        true
    }

    fn abandon(&mut self) {
        self.target = None;
        self.source = None;
        self.typed = 0;
    }
}

/// Drive `simulation` forever; cancel by dropping or aborting the task
pub async fn run(simulation: Simulation, config: BotConfig, seed: Option<u64>) {
    let mut bot = AutoTyper::new(config, seed);
    let mut ticker = tokio::time::interval(bot.keystroke_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let snapshot = simulation.snapshot();
        match bot.next_action(&snapshot) {
            BotAction::Idle => {}
            BotAction::Choose(skill) => {
                simulation.choose_skill(skill);
            }
            BotAction::Type(c) => {
                simulation.push_char(c);
            }
            BotAction::Submit => {
                simulation.submit_input();
            }
        }
    }
}
