use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use word_siege::{bot, BotConfig, SimConfig, Simulation};

/// Game overs before the runner exits (one auto-reset in between)
const MAX_GAME_OVERS: u32 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Word Siege v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = SimConfig::load_or_default();
    let bot_config = BotConfig::load_or_default();
    info!(
        "Configuration loaded: {} Hz, arena {}x{}, wave delay {}ms, bot {} wpm",
        config.tick_rate,
        config.arena_width,
        config.arena_height,
        config.wave_advance_delay_ms,
        bot_config.words_per_minute
    );

    let bot_seed = config.rng_seed.map(|seed| seed.wrapping_add(1));
    let stats_interval = Duration::from_secs(bot_config.stats_interval_secs);
    let simulation = Simulation::new(config)?;
    let metrics = simulation.metrics();
    let mut snapshots = simulation.subscribe();

    simulation.start();
    let bot_task = tokio::spawn(bot::run(simulation.clone(), bot_config, bot_seed));

    let mut stats = tokio::time::interval(stats_interval);
    stats.tick().await;

    // Shutdown signal handler
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut game_overs = 0;
    let mut was_over = false;
    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Shutdown signal received");
                break;
            }
            _ = stats.tick() => {
                let snapshot = simulation.snapshot();
                info!(
                    "Wave {}, score {}, combo {}, hp {:.1}/{:.1}, {} adversaries | {}",
                    snapshot.wave,
                    snapshot.score,
                    snapshot.combo,
                    snapshot.player.hp,
                    snapshot.player.max_hp,
                    snapshot.adversaries.len(),
                    metrics.summary()
                );
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    warn!("Snapshot channel closed");
                    break;
                }
                let over = snapshots.borrow_and_update().game_over;
                if over && !was_over {
                    game_overs += 1;
                    let snapshot = simulation.snapshot();
                    info!(
                        "Game over #{} at wave {} with score {}",
                        game_overs, snapshot.wave, snapshot.score
                    );
                    if game_overs >= MAX_GAME_OVERS {
                        break;
                    }
                    simulation.reset();
                }
                was_over = over;
            }
        }
    }

    // Cleanup
    bot_task.abort();
    simulation.stop();
    info!("Final metrics: {}", metrics.summary());
    println!("{}", serde_json::to_string_pretty(&simulation.snapshot())?);

    Ok(())
}
