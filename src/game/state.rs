//! Simulation state definitions
//!
//! Contains the entity model (player, adversaries) and the aggregate
//! `SimulationState` owned by the game loop. Nothing here has behavior
//! beyond constructors and lookups; mutation rules live in `systems`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::constants::player;
use crate::game::skills::{SkillPool, SkillRuntime};
use crate::util::vec2::Vec2;

/// Unique adversary identifier (never reused within a process)
pub type AdversaryId = Uuid;

/// The defended point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub position: Vec2,
    pub hp: f32,
    pub max_hp: f32,
}

impl Player {
    pub fn new(position: Vec2, max_hp: f32) -> Self {
        Self {
            position,
            hp: max_hp,
            max_hp,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Heal up to max HP, returning the amount actually restored
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        self.hp - before
    }
}

/// A word-carrying adversary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Adversary {
    pub id: AdversaryId,
    /// Exact text the player must type
    pub word: String,
    pub position: Vec2,
    /// Distance units per tick
    pub speed: f32,
    pub hp: f32,
    pub max_hp: f32,
    /// Remaining ticks this adversary is held in place
    #[serde(default)]
    pub frozen_ticks: u32,
}

impl Adversary {
    pub fn new(word: impl Into<String>, position: Vec2, speed: f32, hp: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            word: word.into(),
            position,
            speed,
            hp,
            max_hp: hp,
            frozen_ticks: 0,
        }
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen_ticks > 0
    }
}

/// Arena dimensions as reported by the presentation layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Point the adversaries converge on: bottom center, raised by a fixed offset
    pub fn defended_point(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height - player::BOTTOM_OFFSET)
    }
}

/// Aggregate simulation state
///
/// Replaced wholesale on reset; see `GameLoop::reset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    pub player: Player,
    /// Live adversaries in spawn order
    pub adversaries: Vec<Adversary>,
    /// Current wave number (starts at 1)
    pub wave: u32,
    /// Number of waves spawned in this simulation
    pub waves_spawned: u32,
    pub score: u64,
    pub combo: u32,
    /// Pending (not yet submitted) input
    pub input: String,
    pub game_over: bool,
    pub arena: Arena,
    pub skills: SkillPool,
    pub skill_runtime: SkillRuntime,
    /// Ticks executed in this simulation
    pub tick: u64,
}

impl SimulationState {
    pub fn new(arena: Arena) -> Self {
        Self {
            player: Player::new(arena.defended_point(), player::BASE_HP),
            adversaries: Vec::new(),
            wave: 1,
            waves_spawned: 0,
            score: 0,
            combo: 0,
            input: String::new(),
            game_over: false,
            arena,
            skills: SkillPool::new(),
            skill_runtime: SkillRuntime::default(),
            tick: 0,
        }
    }

    /// Resize the arena and re-center the defended point
    pub fn set_arena_dimensions(&mut self, width: f32, height: f32) {
        self.arena = Arena::new(width, height);
        self.player.position = self.arena.defended_point();
    }

    /// First live adversary carrying exactly `word`, in iteration order
    pub fn find_by_word(&self, word: &str) -> Option<usize> {
        self.adversaries.iter().position(|a| a.word == word)
    }

    pub fn get_adversary(&self, id: AdversaryId) -> Option<&Adversary> {
        self.adversaries.iter().find(|a| a.id == id)
    }

    pub fn get_adversary_mut(&mut self, id: AdversaryId) -> Option<&mut Adversary> {
        self.adversaries.iter_mut().find(|a| a.id == id)
    }

    /// Remove by id, preserving the order of the rest
    pub fn remove_adversary(&mut self, id: AdversaryId) -> Option<Adversary> {
        let index = self.adversaries.iter().position(|a| a.id == id)?;
        Some(self.adversaries.remove(index))
    }

    #[inline]
    pub fn adversary_count(&self) -> usize {
        self.adversaries.len()
    }
}
