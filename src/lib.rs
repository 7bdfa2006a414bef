//! Word Siege simulation core
//!
//! A fixed-tick typing-combat simulation: waves of word-carrying adversaries
//! march on a defended point and are defeated by typing their words.
//!
//! - `game::game_loop` - owned state and the per-tick pipeline
//! - `game::session` - clock, deferred wave advance and the shared handle
//! - `bot` - autotyper used by the headless binary

pub mod bot;
pub mod config;
pub mod game;
pub mod metrics;
pub mod util;

pub use config::{BotConfig, ConfigError, SimConfig};
pub use game::game_loop::{GameLoop, GameLoopConfig, GameLoopEvent};
pub use game::session::Simulation;
pub use game::snapshot::SimulationSnapshot;
