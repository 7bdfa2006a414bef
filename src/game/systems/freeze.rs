//! Ice shatter: freeze every adversary when the player starts typing

use crate::game::constants::skills::{FREEZE_COOLDOWN_TICKS, FREEZE_TICKS};
use crate::game::skills::SkillId;
use crate::game::state::SimulationState;

/// Freeze all live adversaries if the skill is active and off cooldown
///
/// Returns the number of adversaries frozen.
pub fn trigger(state: &mut SimulationState) -> usize {
    if state.game_over
        || !state.skills.is_active(SkillId::IceShatter)
        || state.tick < state.skill_runtime.freeze_ready_at
        || state.adversaries.is_empty()
    {
        return 0;
    }

    for adversary in &mut state.adversaries {
        adversary.frozen_ticks = adversary.frozen_ticks.max(FREEZE_TICKS);
    }
    state.skill_runtime.freeze_ready_at = state.tick + FREEZE_COOLDOWN_TICKS;
    state.adversaries.len()
}
