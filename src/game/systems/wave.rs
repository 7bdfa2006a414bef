//! Wave director
//!
//! Spawns adversary cohorts with wave-scaled stats and applies the
//! wave-advance step (player max HP scaling, partial heal, next cohort).
//! Scaling is always computed from the wave number directly.

use rand::Rng;
use tracing::debug;

use crate::game::constants::{adversary, player, wave, words};
use crate::game::state::{Adversary, SimulationState};
use crate::util::vec2::Vec2;

/// Number of adversaries in `wave_number`: BASE_COUNT + ceil(wave * 0.8)
pub fn adversary_count(wave_number: u32) -> usize {
    let extra =
        (wave_number * wave::COUNT_GROWTH_NUMERATOR).div_ceil(wave::COUNT_GROWTH_DENOMINATOR);
    wave::BASE_COUNT + extra as usize
}

pub fn adversary_speed(wave_number: u32) -> f32 {
    adversary::BASE_SPEED * (1.0 + wave_offset(wave_number) * adversary::SPEED_GROWTH)
}

pub fn adversary_hp(wave_number: u32) -> f32 {
    adversary::BASE_HP * (1.0 + wave_offset(wave_number) * adversary::HP_GROWTH)
}

pub fn player_max_hp(wave_number: u32) -> f32 {
    player::BASE_HP * (1.0 + wave_offset(wave_number) * player::MAX_HP_GROWTH)
}

#[inline]
fn wave_offset(wave_number: u32) -> f32 {
    wave_number.saturating_sub(1) as f32
}

/// Random spawn point: anywhere across the width, top 60% of the height
pub fn random_spawn_position<R: Rng>(width: f32, height: f32, rng: &mut R) -> Vec2 {
    Vec2::new(
        rng.gen::<f32>() * width,
        rng.gen::<f32>() * height * wave::SPAWN_HEIGHT_FRACTION,
    )
}

/// Spawn the cohort for `wave_number`, returning how many were added
pub fn spawn<R: Rng>(state: &mut SimulationState, wave_number: u32, rng: &mut R) -> usize {
    let count = adversary_count(wave_number);
    let speed = adversary_speed(wave_number);
    let hp = adversary_hp(wave_number);
    let (width, height) = (state.arena.width, state.arena.height);

    state.adversaries.reserve(count);
    for _ in 0..count {
        let word = words::LIST[rng.gen_range(0..words::LIST.len())];
        let position = random_spawn_position(width, height, rng);
        state
            .adversaries
            .push(Adversary::new(word, position, speed, hp));
    }
    state.waves_spawned += 1;

    debug!(
        "Spawned wave {}: {} adversaries (speed {:.2}, hp {:.1})",
        wave_number, count, speed, hp
    );
    count
}

/// True once the live collection is empty after at least one spawn
pub fn is_cleared(state: &SimulationState) -> bool {
    state.waves_spawned > 0 && state.adversaries.is_empty()
}

/// Result of a wave advance
#[derive(Debug, Clone, PartialEq)]
pub struct WaveAdvance {
    pub wave: u32,
    pub max_hp: f32,
    pub healed: f32,
    pub spawned: usize,
}

/// Move to the next wave
///
/// Raises player max HP for the new wave, heals 20% of the gap between
/// current HP and the new max, then spawns the next cohort.
pub fn advance<R: Rng>(state: &mut SimulationState, rng: &mut R) -> WaveAdvance {
    state.wave += 1;
    let max_hp = player_max_hp(state.wave);

    let defender = &mut state.player;
    defender.max_hp = max_hp;
    let gap = (max_hp - defender.hp).max(0.0);
    let healed = defender.heal(gap * player::WAVE_HEAL_FRACTION);

    let wave_number = state.wave;
    let spawned = spawn(state, wave_number, rng);
    WaveAdvance {
        wave: wave_number,
        max_hp,
        healed,
        spawned,
    }
}
