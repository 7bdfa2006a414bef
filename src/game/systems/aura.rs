//! Passive skill hooks run once per tick
//!
//! Currently the fire aura: fixed damage to every adversary near the
//! player, with kills removed in the same tick.

use crate::game::constants::skills::{AURA_DAMAGE, AURA_RADIUS};
use crate::game::skills::SkillId;
use crate::game::state::{AdversaryId, SimulationState};

/// Result of one aura pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuraOutcome {
    /// Adversaries that took damage (including the killed ones)
    pub damaged: usize,
    pub killed: Vec<AdversaryId>,
}

/// Run the aura hook if the skill is active
pub fn update(state: &mut SimulationState) -> AuraOutcome {
    if state.game_over || !state.skills.is_active(SkillId::FireAura) {
        return AuraOutcome::default();
    }

    let center = state.player.position;
    let radius_sq = AURA_RADIUS * AURA_RADIUS;
    let mut outcome = AuraOutcome::default();

    for adversary in state
        .adversaries
        .iter_mut()
        .filter(|a| a.position.distance_sq_to(center) < radius_sq)
    {
        adversary.hp = (adversary.hp - AURA_DAMAGE).max(0.0);
        outcome.damaged += 1;
        if adversary.hp <= 0.0 {
            outcome.killed.push(adversary.id);
        }
    }

    if !outcome.killed.is_empty() {
        state.adversaries.retain(|a| a.hp > 0.0);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{Adversary, Arena};
    use crate::util::vec2::Vec2;

    fn create_test_state(aura: bool) -> SimulationState {
        let mut state = SimulationState::new(Arena::new(800.0, 600.0));
        if aura {
            state.skills.offer(1);
            assert!(state.skills.choose(SkillId::FireAura));
        }
        state
    }

    #[test]
    fn test_inactive_aura_does_nothing() {
        let mut state = create_test_state(false);
        let center = state.player.position;
        state.adversaries.push(Adversary::new("code", center, 1.0, 50.0));
        assert_eq!(update(&mut state), AuraOutcome::default());
        assert_eq!(state.adversaries[0].hp, 50.0);
    }

    #[test]
    fn test_damages_only_within_radius() {
        let mut state = create_test_state(true);
        let center = state.player.position;
        state
            .adversaries
            .push(Adversary::new("near", center + Vec2::new(69.0, 0.0), 1.0, 50.0));
        state
            .adversaries
            .push(Adversary::new("edge", center + Vec2::new(0.0, -70.0), 1.0, 50.0));
        state
            .adversaries
            .push(Adversary::new("far", Vec2::new(0.0, 0.0), 1.0, 50.0));

        let outcome = update(&mut state);
        assert_eq!(outcome.damaged, 1);
        assert!(outcome.killed.is_empty());
        assert_eq!(state.adversaries[0].hp, 45.0);
        assert_eq!(state.adversaries[1].hp, 50.0);
        assert_eq!(state.adversaries[2].hp, 50.0);
    }

    #[test]
    fn test_kills_removed_same_tick() {
        let mut state = create_test_state(true);
        let center = state.player.position;
        let mut weak = Adversary::new("weak", center + Vec2::new(10.0, 0.0), 1.0, 50.0);
        weak.hp = 5.0;
        let weak_id = weak.id;
        state.adversaries.push(weak);
        state
            .adversaries
            .push(Adversary::new("strong", center + Vec2::new(-10.0, 0.0), 1.0, 50.0));

        let outcome = update(&mut state);
        assert_eq!(outcome.killed, vec![weak_id]);
        assert_eq!(state.adversaries.len(), 1);
        assert!(state.adversaries.iter().all(|a| a.hp > 0.0));
    }
}
