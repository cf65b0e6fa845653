//! Wave controller state owned by the world.

use std::collections::VecDeque;

use tower_defence_core::{EnemyKind, WavePhase};

#[derive(Debug)]
pub(crate) struct WaveState {
    pub(crate) phase: WavePhase,
    /// Wave that is running, or the next one to run while idle. Starts at 1.
    pub(crate) wave: u32,
    pub(crate) queue: VecDeque<EnemyKind>,
    pub(crate) spawn_timer: f32,
}

impl WaveState {
    pub(crate) fn new() -> Self {
        Self {
            phase: WavePhase::Idle,
            wave: 1,
            queue: VecDeque::new(),
            spawn_timer: 0.0,
        }
    }

    pub(crate) fn is_spawning(&self) -> bool {
        self.phase == WavePhase::Spawning
    }

    /// Enters the spawning phase with the provided queue.
    pub(crate) fn begin(&mut self, entries: Vec<EnemyKind>, initial_delay: f32) {
        self.queue = entries.into();
        self.spawn_timer = initial_delay;
        self.phase = WavePhase::Spawning;
    }

    /// Returns to idle and advances the wave counter.
    pub(crate) fn complete(&mut self) -> u32 {
        let finished = self.wave;
        self.phase = WavePhase::Idle;
        self.wave = self.wave.saturating_add(1);
        finished
    }

    /// Drops pending spawns and returns to idle without advancing.
    pub(crate) fn abort(&mut self) {
        self.queue.clear();
        self.phase = WavePhase::Idle;
    }
}
