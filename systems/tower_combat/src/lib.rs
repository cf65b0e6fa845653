#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits firing commands from targeting data.

use std::ops::Range;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tower_defence_core::{Command, TowerTarget, TowerView};

/// Pitch band, in hertz, that shot cues are drawn from.
pub const SHOT_PITCH_HZ: Range<f32> = 320.0..480.0;

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug)]
pub struct TowerCombat {
    rng: ChaCha8Rng,
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system whose shot pitches derive from the seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            scratch: Vec::new(),
        }
    }

    /// Emits `Command::FireTower` entries for towers that hold a target and
    /// whose cooldown has run out.
    pub fn handle(
        &mut self,
        towers: &TowerView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if tower_targets.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in tower_targets {
            let Some(enemy) = target.enemy else {
                continue;
            };
            let Some(snapshot) = towers.get(target.tower) else {
                continue;
            };
            if snapshot.cooldown > 0.0 {
                continue;
            }

            self.scratch.push(Command::FireTower {
                tower: target.tower,
                target: enemy,
                pitch_hint: self.rng.gen_range(SHOT_PITCH_HZ),
            });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
