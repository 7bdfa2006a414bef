//! Balance constants for the simulation core
//!
//! Grouped by the component that consumes them. Wave-scaled values are
//! derived from these in `systems::wave`, never accumulated tick by tick.

/// Clock constants
pub mod tick {
    /// Nominal tick rate in Hz
    pub const RATE: u32 = 60;
    /// Tick duration in milliseconds
    pub const DURATION_MS: u64 = 1000 / RATE as u64;
}

/// Player (defended point) constants
pub mod player {
    /// Hit points at wave 1
    pub const BASE_HP: f32 = 100.0;
    /// Max HP growth per wave past the first: max_hp = BASE_HP * (1 + (wave - 1) * GROWTH)
    pub const MAX_HP_GROWTH: f32 = 0.02;
    /// Fraction of the gap to the new max HP healed on wave advance
    pub const WAVE_HEAL_FRACTION: f32 = 0.2;
    /// Distance of the defended point above the bottom edge of the arena
    pub const BOTTOM_OFFSET: f32 = 60.0;
}

/// Adversary constants
pub mod adversary {
    /// Speed at wave 1 (distance units per tick)
    pub const BASE_SPEED: f32 = 1.0;
    /// Hit points at wave 1
    pub const BASE_HP: f32 = 50.0;
    /// Speed growth per wave past the first
    pub const SPEED_GROWTH: f32 = 0.08;
    /// HP growth per wave past the first
    pub const HP_GROWTH: f32 = 0.15;
    /// Distance to the defended point that counts as "reached"
    pub const ARRIVAL_EPSILON: f32 = 5.0;
}

/// Wave director constants
pub mod wave {
    /// Adversaries spawned regardless of wave number
    pub const BASE_COUNT: usize = 3;
    /// Extra adversaries per wave as a ratio: ceil(wave * NUMERATOR / DENOMINATOR)
    /// Kept as an integer fraction (0.8) so the count is exact for every wave.
    pub const COUNT_GROWTH_NUMERATOR: u32 = 4;
    pub const COUNT_GROWTH_DENOMINATOR: u32 = 5;
    /// Real-time delay between a wave being cleared and the next one spawning
    pub const ADVANCE_DELAY_MS: u64 = 2000;
    /// Spawn band: top fraction of the arena height
    pub const SPAWN_HEIGHT_FRACTION: f32 = 0.6;
}

/// Combat resolver constants
pub mod combat {
    /// Score per defeat is SCORE_PER_COMBO * combo (after increment)
    pub const SCORE_PER_COMBO: u64 = 100;
}

/// Skill hook constants
pub mod skills {
    /// Maximum number of candidates per offer
    pub const OFFER_COUNT: usize = 3;
    /// Chance that a defeat chains into another adversary
    pub const CHAIN_PROBABILITY: f64 = 0.3;
    /// Splash damage as a ratio of the defeated adversary's HP
    pub const CHAIN_DAMAGE_RATIO: f32 = 0.3;
    /// Wave from which the chain skill can be offered
    pub const CHAIN_UNLOCK_WAVE: u32 = 2;
    /// HP healed per defeat by lifesteal
    pub const LIFESTEAL_HEAL: f32 = 1.0;
    /// Aura damage per tick
    pub const AURA_DAMAGE: f32 = 5.0;
    /// Aura radius around the player
    pub const AURA_RADIUS: f32 = 70.0;
    /// Freeze duration in ticks (1s at 60 Hz)
    pub const FREEZE_TICKS: u32 = 60;
    /// Freeze cooldown in ticks (10s at 60 Hz)
    pub const FREEZE_COOLDOWN_TICKS: u64 = 600;
}

/// Word list adversaries draw from (uniformly, with replacement)
pub mod words {
    pub const LIST: &[&str] = &[
        "react", "code", "game", "skill", "vite", "claw", "turbo", "speed", "logic", "state",
        "props", "hooks", "store", "types", "build", "deploy", "pages", "actions", "commit",
        "error", "debug", "test", "fetch", "async", "await", "query", "mutation", "render",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_duration_matches_rate() {
        assert_eq!(tick::DURATION_MS, 16);
    }

    #[test]
    fn test_word_list_has_no_empty_words() {
        assert!(!words::LIST.is_empty());
        assert!(words::LIST.iter().all(|w| !w.is_empty()));
    }
}
