use std::str::FromStr;
use std::time::Duration;

use crate::game::constants::{tick, wave};

/// Simulation configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Ticks per second
    pub tick_rate: u32,
    pub arena_width: f32,
    pub arena_height: f32,
    /// Real-time delay between a wave clearing and the next one starting
    pub wave_advance_delay_ms: u64,
    /// Fixed RNG seed (absent = seed from entropy)
    pub rng_seed: Option<u64>,
    /// Bounded capacity of the observer event feed
    pub event_feed_capacity: usize,
    /// Minimum time between lifesteal heals (0 = every defeat)
    pub lifesteal_cooldown_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: tick::RATE,
            arena_width: 800.0,
            arena_height: 600.0,
            wave_advance_delay_ms: wave::ADVANCE_DELAY_MS,
            rng_seed: None,
            event_feed_capacity: 1024,
            lifesteal_cooldown_ms: 0,
        }
    }
}

impl SimConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(rate) = env_parse::<u32>("TICK_RATE") {
            if rate > 0 && rate <= 1000 {
                config.tick_rate = rate;
            } else {
                tracing::warn!("TICK_RATE must be 1-1000, using default");
            }
        }

        if let Some(width) = env_parse::<f32>("ARENA_WIDTH") {
            if width.is_finite() && width > 0.0 {
                config.arena_width = width;
            } else {
                tracing::warn!("ARENA_WIDTH must be > 0, using default");
            }
        }

        if let Some(height) = env_parse::<f32>("ARENA_HEIGHT") {
            if height.is_finite() && height > 0.0 {
                config.arena_height = height;
            } else {
                tracing::warn!("ARENA_HEIGHT must be > 0, using default");
            }
        }

        if let Some(delay) = env_parse::<u64>("WAVE_ADVANCE_DELAY_MS") {
            config.wave_advance_delay_ms = delay;
        }

        if let Some(seed) = env_parse::<u64>("RNG_SEED") {
            config.rng_seed = Some(seed);
        }

        if let Some(capacity) = env_parse::<usize>("EVENT_FEED_CAPACITY") {
            if capacity > 0 {
                config.event_feed_capacity = capacity;
            } else {
                tracing::warn!("EVENT_FEED_CAPACITY must be > 0, using default");
            }
        }

        if let Some(cooldown) = env_parse::<u64>("LIFESTEAL_COOLDOWN_MS") {
            config.lifesteal_cooldown_ms = cooldown;
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if !(self.arena_width > 0.0 && self.arena_height > 0.0) {
            return Err(ConfigError::InvalidArena {
                width: self.arena_width,
                height: self.arena_height,
            });
        }
        if self.event_feed_capacity == 0 {
            return Err(ConfigError::ZeroFeedCapacity);
        }
        Ok(())
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }

    pub fn wave_advance_delay(&self) -> Duration {
        Duration::from_millis(self.wave_advance_delay_ms)
    }

    /// Lifesteal cooldown converted to ticks, rounded up
    pub fn lifesteal_cooldown_ticks(&self) -> u64 {
        (self.lifesteal_cooldown_ms * u64::from(self.tick_rate)).div_ceil(1000)
    }
}

/// Settings for the headless autotyper binary
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub words_per_minute: f64,
    /// Probability that a submitted word is deliberately wrong
    pub miss_rate: f64,
    pub stats_interval_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 40.0,
            miss_rate: 0.1,
            stats_interval_secs: 10,
        }
    }
}

impl BotConfig {
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(wpm) = env_parse::<f64>("BOT_WORDS_PER_MINUTE") {
            if wpm.is_finite() && wpm > 0.0 {
                config.words_per_minute = wpm;
            } else {
                tracing::warn!("BOT_WORDS_PER_MINUTE must be > 0, using default");
            }
        }

        if let Some(rate) = env_parse::<f64>("BOT_MISS_RATE") {
            if (0.0..=1.0).contains(&rate) {
                config.miss_rate = rate;
            } else {
                tracing::warn!("BOT_MISS_RATE must be within 0-1, using default");
            }
        }

        if let Some(secs) = env_parse::<u64>("STATS_INTERVAL_SECS") {
            if secs > 0 {
                config.stats_interval_secs = secs;
            } else {
                tracing::warn!("STATS_INTERVAL_SECS must be > 0, using default");
            }
        }

        config
    }
}

/// Read and parse an environment variable, warning on garbage
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("tick rate cannot be 0")]
    ZeroTickRate,
    #[error("arena dimensions must be positive, got {width}x{height}")]
    InvalidArena { width: f32, height: f32 },
    #[error("event feed capacity must be at least 1")]
    ZeroFeedCapacity,
}
