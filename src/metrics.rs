//! Simulation metrics
//!
//! Plain atomic counters updated by the session and read by the binary's
//! periodic stats log.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::game::game_loop::GameLoopEvent;

/// Metrics registry for one simulation handle
#[derive(Debug)]
pub struct Metrics {
    pub tick_count: AtomicU64,
    /// Last tick duration (microseconds)
    pub tick_time_us: AtomicU64,
    pub tick_time_max_us: AtomicU64,

    pub adversaries_spawned: AtomicU64,
    pub adversaries_defeated: AtomicU64,
    pub adversaries_overrun: AtomicU64,
    pub words_missed: AtomicU64,
    pub waves_started: AtomicU64,
    pub resets: AtomicU64,

    /// Events lost because the feed was full
    pub events_dropped: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            tick_time_us: AtomicU64::new(0),
            tick_time_max_us: AtomicU64::new(0),
            adversaries_spawned: AtomicU64::new(0),
            adversaries_defeated: AtomicU64::new(0),
            adversaries_overrun: AtomicU64::new(0),
            words_missed: AtomicU64::new(0),
            waves_started: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a tick time
    pub fn record_tick_time(&self, duration: Duration) {
        let us = duration.as_micros() as u64;
        self.tick_time_us.store(us, Ordering::Relaxed);
        self.tick_time_max_us.fetch_max(us, Ordering::Relaxed);
        self.tick_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold a batch of game loop events into the counters
    pub fn record_events(&self, events: &[GameLoopEvent]) {
        for event in events {
            match event {
                GameLoopEvent::WaveStarted { count, .. } => {
                    self.waves_started.fetch_add(1, Ordering::Relaxed);
                    self.adversaries_spawned
                        .fetch_add(*count as u64, Ordering::Relaxed);
                }
                GameLoopEvent::AdversaryDefeated { .. } => {
                    self.adversaries_defeated.fetch_add(1, Ordering::Relaxed);
                }
                GameLoopEvent::Overrun { count, .. } => {
                    self.adversaries_overrun
                        .fetch_add(*count as u64, Ordering::Relaxed);
                }
                GameLoopEvent::Miss { .. } => {
                    self.words_missed.fetch_add(1, Ordering::Relaxed);
                }
                _ => {}
            }
        }
    }

    pub fn record_dropped_events(&self, count: usize) {
        if count > 0 {
            self.events_dropped
                .fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    pub fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// One-line summary for periodic logging
    pub fn summary(&self) -> String {
        format!(
            "ticks={} tick={}us (max {}us) spawned={} defeated={} overrun={} missed={} waves={} resets={} dropped={}",
            self.tick_count.load(Ordering::Relaxed),
            self.tick_time_us.load(Ordering::Relaxed),
            self.tick_time_max_us.load(Ordering::Relaxed),
            self.adversaries_spawned.load(Ordering::Relaxed),
            self.adversaries_defeated.load(Ordering::Relaxed),
            self.adversaries_overrun.load(Ordering::Relaxed),
            self.words_missed.load(Ordering::Relaxed),
            self.waves_started.load(Ordering::Relaxed),
            self.resets.load(Ordering::Relaxed),
            self.events_dropped.load(Ordering::Relaxed),
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
