//! Spatial movement engine
//!
//! Advances every live adversary toward the defended point and pulls out
//! the ones that reached it. Their remaining HP becomes a single overrun
//! damage instance for the combat resolver.

use rayon::prelude::*;

use crate::game::constants::adversary::ARRIVAL_EPSILON;
use crate::game::state::{Adversary, SimulationState};
use crate::util::vec2::Vec2;

/// Result of one movement pass
#[derive(Debug, Clone, Default)]
pub struct MovementOutcome {
    /// Adversaries removed because they reached the defended point
    pub arrived: Vec<Adversary>,
    /// Combined HP of `arrived`
    pub overrun_damage: f32,
}

impl MovementOutcome {
    pub fn is_empty(&self) -> bool {
        self.arrived.is_empty()
    }
}

/// True once `position` is within `ARRIVAL_EPSILON` of `target`
#[inline]
pub fn has_arrived(position: Vec2, target: Vec2) -> bool {
    position.distance_sq_to(target) < ARRIVAL_EPSILON * ARRIVAL_EPSILON
}

/// Move all adversaries one tick and remove arrivals
///
/// Frozen adversaries hold position and burn one tick of their freeze.
/// The arrival test runs on every adversary after moving, so one that
/// snapped onto the target last tick is caught as well.
pub fn update(state: &mut SimulationState) -> MovementOutcome {
    let target = state.player.position;

    state.adversaries.par_iter_mut().for_each(|adversary| {
        if adversary.frozen_ticks > 0 {
            adversary.frozen_ticks -= 1;
            return;
        }
        adversary.position = adversary.position.move_towards(target, adversary.speed);
    });

    if !state
        .adversaries
        .iter()
        .any(|a| has_arrived(a.position, target))
    {
        return MovementOutcome::default();
    }

    let (arrived, remaining): (Vec<Adversary>, Vec<Adversary>) = state
        .adversaries
        .drain(..)
        .partition(|a| has_arrived(a.position, target));
    state.adversaries = remaining;

    let overrun_damage = arrived.iter().map(|a| a.hp).sum();
    MovementOutcome {
        arrived,
        overrun_damage,
    }
}
