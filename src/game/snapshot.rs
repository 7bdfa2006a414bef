//! Read-only simulation snapshot
//!
//! Built after every tick and every input so renderers and tests can read
//! a consistent copy without touching the live state.

use serde::Serialize;

use crate::game::game_loop::GameLoop;
use crate::game::skills::SkillId;
use crate::game::state::{Adversary, AdversaryId, Arena, Player};

/// Snapshot of one adversary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdversarySnapshot {
    pub id: AdversaryId,
    pub word: String,
    pub x: f32,
    pub y: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub frozen: bool,
}

impl From<&Adversary> for AdversarySnapshot {
    fn from(adversary: &Adversary) -> Self {
        Self {
            id: adversary.id,
            word: adversary.word.clone(),
            x: adversary.position.x,
            y: adversary.position.y,
            hp: adversary.hp,
            max_hp: adversary.max_hp,
            frozen: adversary.is_frozen(),
        }
    }
}

/// Complete observable state at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSnapshot {
    pub generation: u64,
    pub tick: u64,
    pub player: Player,
    pub adversaries: Vec<AdversarySnapshot>,
    pub wave: u32,
    pub score: u64,
    pub combo: u32,
    pub input: String,
    pub game_over: bool,
    /// Whether the clock is ticking
    pub running: bool,
    pub arena: Arena,
    pub available_skills: Vec<SkillId>,
    pub active_skills: Vec<SkillId>,
    pub shield_ready: bool,
    /// A wave advance is waiting on its delay
    pub advance_pending: bool,
}

impl SimulationSnapshot {
    pub fn capture(game_loop: &GameLoop, running: bool) -> Self {
        let state = game_loop.state();
        Self {
            generation: game_loop.generation(),
            tick: state.tick,
            player: state.player.clone(),
            adversaries: state.adversaries.iter().map(AdversarySnapshot::from).collect(),
            wave: state.wave,
            score: state.score,
            combo: state.combo,
            input: state.input.clone(),
            game_over: state.game_over,
            running,
            arena: state.arena,
            available_skills: state.skills.available().to_vec(),
            active_skills: state.skills.active().to_vec(),
            shield_ready: state.skills.is_active(SkillId::ShieldBarrier)
                && state.skill_runtime.shield_charge,
            advance_pending: game_loop.pending_advance().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::game_loop::GameLoopConfig;

    #[test]
    fn test_capture_reflects_state() {
        let mut game = GameLoop::new(GameLoopConfig {
            rng_seed: Some(11),
            ..GameLoopConfig::default()
        });
        game.begin();
        game.push_char('x');

        let snapshot = SimulationSnapshot::capture(&game, true);
        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.wave, 1);
        assert_eq!(snapshot.adversaries.len(), 4);
        assert_eq!(snapshot.input, "x");
        assert!(snapshot.running);
        assert!(!snapshot.shield_ready);
        assert!(!snapshot.advance_pending);
        assert_eq!(snapshot.player.hp, 100.0);
    }

    #[test]
    fn test_shield_ready_tracks_charge() {
        let mut game = GameLoop::default();
        game.offer_skills();
        game.choose_skill(SkillId::ShieldBarrier);
        assert!(SimulationSnapshot::capture(&game, false).shield_ready);

        game.apply_damage(10.0);
        assert!(!SimulationSnapshot::capture(&game, false).shield_ready);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut game = GameLoop::default();
        game.begin();
        let json = serde_json::to_value(SimulationSnapshot::capture(&game, false)).unwrap();
        assert_eq!(json["wave"], 1);
        assert_eq!(json["adversaries"].as_array().map(Vec::len), Some(4));
    }
}
