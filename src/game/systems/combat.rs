//! Combat resolver
//!
//! Two entry points: `submit_word` (typed input against live adversaries)
//! and `apply_damage` (the single funnel for all player damage). Defeat
//! triggers for the chain and lifesteal skills run inside `submit_word`
//! before it returns.

use rand::Rng;

use crate::game::constants::combat::SCORE_PER_COMBO;
use crate::game::constants::skills::{CHAIN_DAMAGE_RATIO, CHAIN_PROBABILITY, LIFESTEAL_HEAL};
use crate::game::skills::SkillId;
use crate::game::state::{Adversary, AdversaryId, SimulationState};

/// Result of routing damage through the player
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Game already over, nothing changed
    Ignored,
    /// Shield charge consumed, HP untouched
    Absorbed { amount: f32 },
    /// HP reduced, player still alive
    Applied { amount: f32, hp: f32 },
    /// HP reached zero; the game is over
    Fatal { amount: f32 },
}

/// Splash damage dealt by the chain skill
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSplash {
    pub target: AdversaryId,
    pub damage: f32,
    pub killed: bool,
}

/// A typed defeat
#[derive(Debug, Clone, PartialEq)]
pub struct Defeat {
    pub adversary: Adversary,
    pub score_gained: u64,
    /// Combo after the increment
    pub combo: u32,
    pub chain: Option<ChainSplash>,
    /// HP restored by lifesteal (0 when inactive or cooling down)
    pub healed: f32,
}

/// Result of a submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing was typed
    Empty,
    /// Game already over
    Ignored,
    /// Non-empty text matching no adversary; combo reset
    Miss { text: String },
    Defeated(Defeat),
}

/// Apply `amount` damage to the player
///
/// An armed shield swallows the whole hit. Any hit, absorbed or not,
/// breaks the combo. Reaching zero HP sets game over; halting the clock is
/// up to the caller.
pub fn apply_damage(state: &mut SimulationState, amount: f32) -> DamageOutcome {
    if state.game_over {
        return DamageOutcome::Ignored;
    }

    state.combo = 0;

    if state.skills.is_active(SkillId::ShieldBarrier) && state.skill_runtime.shield_charge {
        state.skill_runtime.shield_charge = false;
        return DamageOutcome::Absorbed { amount };
    }

    state.player.hp = (state.player.hp - amount).max(0.0);
    if state.player.hp <= 0.0 {
        state.player.hp = 0.0;
        state.game_over = true;
        return DamageOutcome::Fatal { amount };
    }

    DamageOutcome::Applied {
        amount,
        hp: state.player.hp,
    }
}

/// Resolve typed `text` against the live adversaries
///
/// Matching is exact; with duplicate words the first adversary in
/// iteration order is taken. The pending input is cleared in every case.
pub fn submit_word<R: Rng>(
    state: &mut SimulationState,
    text: &str,
    rng: &mut R,
) -> SubmitOutcome {
    if state.game_over {
        return SubmitOutcome::Ignored;
    }

    state.input.clear();

    if text.is_empty() {
        return SubmitOutcome::Empty;
    }

    let Some(index) = state.find_by_word(text) else {
        state.combo = 0;
        return SubmitOutcome::Miss {
            text: text.to_string(),
        };
    };

    let adversary = state.adversaries.remove(index);
    state.combo += 1;
    let score_gained = SCORE_PER_COMBO * u64::from(state.combo);
    state.score += score_gained;

    let chain = if state.skills.is_active(SkillId::ChainLightning) {
        chain_strike(state, adversary.hp, rng)
    } else {
        None
    };

    let healed = if state.skills.is_active(SkillId::VampiricTouch) {
        lifesteal(state)
    } else {
        0.0
    };

    SubmitOutcome::Defeated(Defeat {
        adversary,
        score_gained,
        combo: state.combo,
        chain,
        healed,
    })
}

/// Splash a random other adversary for a share of the defeated one's HP
///
/// Chains never cascade: a splash kill triggers nothing further.
fn chain_strike<R: Rng>(
    state: &mut SimulationState,
    defeated_hp: f32,
    rng: &mut R,
) -> Option<ChainSplash> {
    if state.adversaries.is_empty() || !rng.gen_bool(CHAIN_PROBABILITY) {
        return None;
    }

    let index = rng.gen_range(0..state.adversaries.len());
    let damage = (defeated_hp * CHAIN_DAMAGE_RATIO).round();
    let target = &mut state.adversaries[index];
    target.hp -= damage;
    let id = target.id;
    let killed = target.hp <= 0.0;
    if killed {
        state.adversaries.remove(index);
    }

    Some(ChainSplash {
        target: id,
        damage,
        killed,
    })
}

fn lifesteal(state: &mut SimulationState) -> f32 {
    let runtime = &mut state.skill_runtime;
    if state.tick < runtime.lifesteal_ready_at {
        return 0.0;
    }
    runtime.lifesteal_ready_at = state.tick + runtime.lifesteal_cooldown_ticks;
    state.player.heal(LIFESTEAL_HEAL)
}
