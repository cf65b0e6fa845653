#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave controller system that composes waves and paces enemy spawns.

use tower_defence_core::{Command, EnemyKind, Event, Rules, WavePhase, WaveView};

/// Most entries a single wave may hold; larger compositions are truncated,
/// dropping air entries first.
pub const MAX_WAVE_ENTRIES: u32 = 100_000;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    base_size: u32,
    growth: u32,
    air_delay: u32,
    air_period: u32,
}

impl Config {
    /// Creates a configuration from explicit wave sizing parameters.
    #[must_use]
    pub const fn new(base_size: u32, growth: u32, air_delay: u32, air_period: u32) -> Self {
        Self {
            base_size,
            growth,
            air_delay,
            air_period,
        }
    }

    /// Extracts the wave sizing parameters from the simulation rules.
    #[must_use]
    pub const fn from_rules(rules: &Rules) -> Self {
        Self::new(
            rules.wave_base_size,
            rules.wave_growth,
            rules.air_wave_delay,
            rules.air_wave_period,
        )
    }
}

/// Pure system that decides when the world should spawn the next queued enemy
/// and when a wave is finished.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Spawn order for the wave: every ground entry first, then air.
    #[must_use]
    pub fn compose_wave(&self, wave: u32) -> Vec<EnemyKind> {
        let ground = self
            .config
            .base_size
            .saturating_add(self.config.growth.saturating_mul(wave));
        let air = if self.config.air_period == 0 {
            0
        } else {
            wave.saturating_sub(self.config.air_delay) / self.config.air_period
        };

        let ground = ground.min(MAX_WAVE_ENTRIES);
        let air = air.min(MAX_WAVE_ENTRIES - ground);

        let mut entries = Vec::with_capacity(ground.saturating_add(air) as usize);
        entries.extend(std::iter::repeat(EnemyKind::Ground).take(ground as usize));
        entries.extend(std::iter::repeat(EnemyKind::Air).take(air as usize));
        entries
    }

    /// Emits the request that starts the wave the view points at.
    ///
    /// The world decides whether the request is accepted, so this is emitted
    /// even while a wave is running.
    pub fn start_wave(&self, wave: &WaveView, out: &mut Vec<Command>) {
        out.push(Command::QueueWave {
            entries: self.compose_wave(wave.wave),
        });
    }

    /// Consumes tick events and the wave view to emit spawn or completion
    /// commands.
    pub fn handle(&mut self, events: &[Event], wave: &WaveView, out: &mut Vec<Command>) {
        if wave.phase != WavePhase::Spawning {
            return;
        }

        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        if wave.queued > 0 {
            if wave.spawn_timer <= 0.0 {
                out.push(Command::SpawnEnemy);
            }
        } else if wave.live_enemies == 0 {
            out.push(Command::CompleteWave);
        }
    }
}
